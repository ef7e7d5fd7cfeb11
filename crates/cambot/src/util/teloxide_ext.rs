use easy_ext::ext;
use std::fmt;
use teloxide::types::{Chat, User};

pub(crate) mod prelude {
    pub(crate) use super::{ChatExt as _, UserExt as _};
}

#[ext(UserExt)]
pub(crate) impl User {
    fn username(&self) -> String {
        self.username.clone().unwrap_or_else(|| self.full_name())
    }

    fn debug_id(&self) -> String {
        format!("{} ({})", self.username(), self.id)
    }
}

#[ext(ChatExt)]
pub(crate) impl Chat {
    fn debug_id(&self) -> String {
        chat_debug_id(self.title().or_else(|| self.username()), self.id)
    }
}

fn chat_debug_id(title: Option<&str>, id: impl fmt::Display) -> String {
    let title = title.unwrap_or("<unknown chat>");
    format!("{title} ({id})")
}
