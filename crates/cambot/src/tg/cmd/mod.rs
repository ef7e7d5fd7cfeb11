pub(crate) mod regular;

use crate::camera::Photo;
use crate::observability::metrics::{COMMANDS_TOTAL, COMMAND_ERRORS_TOTAL};
use crate::prelude::*;
use crate::util::DynResult;
use crate::{tg, Result};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile, User};

#[async_trait]
pub(crate) trait Command: fmt::Debug + Send + Sync + 'static {
    /// Short name of the command used in metrics labels
    fn name(&self) -> &'static str;

    /// Activity indicator to show in the chat while the command is handled
    fn chat_action(&self) -> Option<ChatAction>;

    async fn respond(self, ctx: &tg::Ctx) -> Result<Reply>;
}

/// Message the bot sends back to the chat where the command came from
#[derive(Debug)]
pub(crate) enum Reply {
    Text(String),
    Photo(Photo),
}

impl Reply {
    async fn deliver(self, bot: &tg::Bot, chat_id: ChatId) -> Result {
        match self {
            Reply::Text(text) => {
                bot.send_message(chat_id, text).await?;
            }
            Reply::Photo(photo) => {
                let file = InputFile::memory(photo.jpeg.to_vec()).file_name(photo.file_name);
                bot.send_photo(chat_id, file).await?;
            }
        }
        Ok(())
    }
}

/// Wraps the command handler with the behavior shared by all commands
pub(crate) fn handle<'a, C: Command>(
) -> impl Fn(Arc<tg::Ctx>, Message, C) -> BoxFuture<'a, DynResult> {
    move |ctx, msg, cmd| {
        let span = info_span!(
            "handle_command",
            sender = msg.from().map(User::debug_id).as_deref(),
            chat = %msg.chat.debug_id(),
            cmd = ?cmd,
        );

        let fut = async move {
            debug!("Processing command");
            process(&ctx, msg.chat.id, cmd).await.map_err(Into::into)
        };

        Box::pin(fut.instrument(span))
    }
}

/// Shows the command's chat action, then responds to the chat. Failures are
/// logged and returned to the caller, nothing is sent to the chat about them.
async fn process<C: Command>(ctx: &tg::Ctx, chat_id: ChatId, cmd: C) -> Result {
    let name = cmd.name();

    metrics::increment_counter!(COMMANDS_TOTAL, "command" => name);

    if let Some(action) = cmd.chat_action() {
        if let Err(err) = ctx.bot.send_chat_action(chat_id, action).await {
            warn!(err = tracing_err(&err), "Failed to send the chat action");
        }
    }

    let result = async {
        cmd.respond(ctx)
            .await?
            .deliver(&ctx.bot, chat_id)
            .await
    }
    .with_duration_log("Handled the command")
    .await;

    if let Err(err) = &result {
        let kind: &'static str = err.kind().into();

        metrics::increment_counter!(COMMAND_ERRORS_TOTAL, "command" => name, "kind" => kind);
        warn!(
            err = %err.display_chain(),
            id = err.id(),
            kind,
            "Command handler returned an error"
        );
    }

    result
}
