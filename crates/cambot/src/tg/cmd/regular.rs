use crate::tg::cmd::Reply;
use crate::{camera, tg, Result};
use async_trait::async_trait;
use teloxide::types::ChatAction;
use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
#[command(rename_rule = "lowercase")]
#[strum(serialize_all = "snake_case")]
pub(crate) enum Cmd {
    #[command(description = "Get photo from picamera")]
    Photo,

    #[command(description = "This message")]
    Help,
}

#[async_trait]
impl tg::cmd::Command for Cmd {
    fn name(&self) -> &'static str {
        self.into()
    }

    fn chat_action(&self) -> Option<ChatAction> {
        match self {
            Cmd::Photo => Some(ChatAction::UploadPhoto),
            Cmd::Help => None,
        }
    }

    async fn respond(self, ctx: &tg::Ctx) -> Result<Reply> {
        let reply = match self {
            Cmd::Photo => Reply::Photo(camera::take_photo(&*ctx.camera).await?),
            Cmd::Help => Reply::Text(help_text()),
        };
        Ok(reply)
    }
}

fn help_text() -> String {
    let commands: Vec<_> = Cmd::bot_commands()
        .into_iter()
        .map(|cmd| {
            let name = cmd.command.trim_start_matches('/');
            format!("/{name} {}", cmd.description)
        })
        .collect();

    format!("Available commands:\n{}", commands.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PlaceholderCamera;
    use crate::tg::cmd::Command;
    use assert_matches::assert_matches;
    use expect_test::expect;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn help() {
        expect![[r#"
            Available commands:
            /photo Get photo from picamera
            /help This message"#]]
        .assert_eq(&help_text());
    }

    #[test]
    fn lists_exactly_two_commands() {
        let commands = Cmd::bot_commands();

        assert_eq!(commands.len(), 2);
        assert_eq!(help_text().lines().filter(|line| line.starts_with('/')).count(), 2);
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Cmd::parse("/photo", "cambot_bot").unwrap(), Cmd::Photo);
        assert_eq!(Cmd::parse("/help@cambot_bot", "cambot_bot").unwrap(), Cmd::Help);
        assert!(Cmd::parse("/start", "cambot_bot").is_err());
        assert!(Cmd::parse("/help@other_bot", "cambot_bot").is_err());
    }

    #[test]
    fn chat_actions() {
        assert_eq!(Cmd::Photo.chat_action(), Some(ChatAction::UploadPhoto));
        assert_eq!(Cmd::Help.chat_action(), None);
        assert_eq!(Cmd::Photo.name(), "photo");
        assert_eq!(Cmd::Help.name(), "help");
    }

    fn ctx() -> tg::Ctx {
        tg::Ctx {
            bot: tg::create_bot("123456:test-token".to_owned()),
            camera: Arc::new(PlaceholderCamera::new(Duration::ZERO)),
        }
    }

    #[test_log::test(tokio::test)]
    async fn photo_replies_with_a_jpeg() {
        let reply = Cmd::Photo.respond(&ctx()).await.unwrap();

        assert_matches!(
            reply,
            Reply::Photo(photo) if photo.file_name.ends_with(".jpg")
                && image::guess_format(&photo.jpeg).ok() == Some(image::ImageFormat::Jpeg)
        );
    }

    #[test_log::test(tokio::test)]
    async fn help_replies_with_text() {
        let reply = Cmd::Help.respond(&ctx()).await.unwrap();

        assert_matches!(reply, Reply::Text(text) if text == help_text());
    }
}
