//! Telegram commands root module

mod cmd;

use crate::camera::Camera;
use crate::prelude::*;
use crate::Result;
use dptree::di::DependencyMap;
use std::sync::Arc;
use teloxide::adaptors::{Throttle, Trace};
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

pub(crate) type Bot = Trace<Throttle<teloxide::Bot>>;

pub(crate) struct Ctx {
    bot: Bot,
    camera: Arc<dyn Camera>,
}

pub(crate) struct RunBotOptions {
    pub(crate) token: String,
    pub(crate) camera: Arc<dyn Camera>,
}

fn create_bot(token: String) -> Bot {
    with_adaptors(teloxide::Bot::new(token))
}

fn with_adaptors(bot: teloxide::Bot) -> Bot {
    bot.throttle(Default::default())
        .trace(teloxide::adaptors::trace::Settings::all())
}

pub(crate) async fn run_bot(opts: RunBotOptions) -> Result {
    let mut di = DependencyMap::new();

    let bot = create_bot(opts.token);

    di.insert(Arc::new(Ctx {
        bot: bot.clone(),
        camera: opts.camera,
    }));

    info!("Starting bot...");

    bot.set_my_commands(cmd::regular::Cmd::bot_commands())
        .await?;

    let handler = Update::filter_message()
        .filter_command::<cmd::regular::Cmd>()
        .endpoint(cmd::handle::<cmd::regular::Cmd>());

    info!("Listening for commands");

    Dispatcher::builder(bot, handler)
        .dependencies(di)
        // Messages that aren't commands and unknown commands are ignored,
        // so to suppress the warning about unhandled updates we have
        // a noop default handler here
        .default_handler(|_| std::future::ready(()))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Bot stopped");

    Ok(())
}
