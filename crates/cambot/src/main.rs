use cambot::tracing_err;
use clap::Parser;
use display_error_chain::DisplayErrorChain;
use futures::prelude::*;
use std::panic::AssertUnwindSafe;
use std::process::ExitCode;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    if dotenvy::dotenv().is_err() {
        eprintln!("Dotenv config was not found, ignoring this...")
    }

    let args = cambot::Args::parse();

    // Nothing is logged yet at this point, so configuration errors go
    // straight to stderr
    let config = cambot::EnvConfig::load().and_then(|env| cambot::Config::resolve(args, env));

    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", DisplayErrorChain::new(&err));
            return ExitCode::FAILURE;
        }
    };

    let logging_task = match cambot::init_logging(&config.logging) {
        Ok(task) => task,
        Err(err) => {
            eprintln!("{}", DisplayErrorChain::new(&err));
            return ExitCode::FAILURE;
        }
    };

    let main_fut = AssertUnwindSafe(async {
        let result = try_main(config).await;

        result.map(|()| ExitCode::SUCCESS).unwrap_or_else(|err| {
            error!(err = tracing_err(&err), "Exiting with an error...");
            ExitCode::FAILURE
        })
    })
    .catch_unwind()
    .unwrap_or_else(|_| {
        error!("Exiting due to a panic...");
        ExitCode::FAILURE
    });

    let exit_code = if !cfg!(debug_assertions) {
        main_fut.await
    } else {
        // Don't wait for teloxide's shutdown logic when cancelling in debug mode.
        // That takes a lot of time for some reason:
        // https://github.com/teloxide/teloxide/issues/711
        tokio::select! {
            exit_code = main_fut => {
                info!("Main task has finished, exiting...");
                exit_code
            }
            () = abort_signal() => ExitCode::SUCCESS,
        }
    };

    logging_task.shutdown().await;

    exit_code
}

async fn try_main(config: cambot::Config) -> cambot::Result {
    cambot::init_metrics(&config.metrics)?;
    cambot::run(config).await
}

async fn abort_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            err = tracing_err(&err),
            "Failed to wait for Ctrl+C, exiting..."
        );
    } else {
        info!("Ctrl+C received, exiting forcefully...");
    }
}
