mod camera;
mod config;
mod error;
mod observability;
mod tg;

pub mod util;

pub use crate::error::*;
pub use config::*;
pub use observability::*;

use crate::prelude::*;

#[allow(unused_imports)]
mod prelude {
    pub(crate) use crate::error::prelude::*;
    pub(crate) use crate::observability::logging::prelude::*;
    pub(crate) use crate::util::prelude::*;
}

/// Run the telegram bot processing loop
pub async fn run(config: Config) -> Result {
    if let Some(delay) = config.warm_up_delay {
        warn!(
            ?delay,
            "The warm up delay option is accepted but not applied, \
            the camera always warms up for {:?}",
            camera::WARM_UP
        );
    }

    let camera = camera::detect(&config.camera).await;

    let opts = tg::RunBotOptions {
        token: config.token,
        camera,
    };

    tg::run_bot(opts).await
}
