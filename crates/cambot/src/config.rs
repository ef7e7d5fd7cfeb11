use crate::camera::{CameraConfig, CameraSelection};
use crate::observability::{LoggingConfig, MetricsConfig};
use crate::{err, err_ctx, ConfigError, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Name of the environment variable, that the bot token is read from when
/// it isn't passed via the command line.
pub const TOKEN_ENV_VAR: &str = "CAMBOT_TOKEN";

const ENV_PREFIX: &str = "CAMBOT_";

/// Telegram bot that takes a photo with the Raspberry Pi camera on demand
#[derive(clap::Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Error)]
    log: LogLevel,

    /// Telegram bot token. Falls back to `CAMBOT_TOKEN` environment variable
    #[arg(short, long)]
    token: Option<String>,

    /// Warm up delay in seconds (accepted, but not applied yet)
    #[arg(short, long, allow_negative_numbers = true)]
    delay: Option<f64>,

    /// Camera to take photos with. `auto` probes the camera program
    #[arg(long, value_enum, default_value_t = CameraSelection::Auto)]
    camera: CameraSelection,

    /// Program that drives the camera module
    #[arg(long, default_value = crate::camera::DEFAULT_PROGRAM)]
    camera_program: PathBuf,
}

/// The set of levels is fixed, the names are case-sensitive.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "DEBUG")]
    Debug,

    #[value(name = "INFO")]
    Info,

    #[value(name = "WARNING")]
    Warning,

    #[value(name = "ERROR")]
    Error,

    #[value(name = "CRITICAL")]
    Critical,
}

impl LogLevel {
    pub(crate) fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            // `tracing` has no level above `ERROR`
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

/// Config values that come from `CAMBOT_`-prefixed environment variables
#[derive(Deserialize, Debug, Default)]
pub struct EnvConfig {
    token: Option<String>,
    loki_url: Option<url::Url>,
    metrics_addr: Option<SocketAddr>,
}

impl EnvConfig {
    pub fn load() -> Result<EnvConfig> {
        Self::from_vars(std::env::vars())
    }

    fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<EnvConfig> {
        envy::prefixed(ENV_PREFIX)
            .from_iter(vars)
            .map_err(err_ctx!(ConfigError::Env))
    }
}

pub struct Config {
    pub(crate) token: String,
    /// Any number is accepted, it is only reported in the logs
    pub(crate) warm_up_delay: Option<f64>,
    pub(crate) camera: CameraConfig,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl Config {
    /// Combines the command line arguments and the environment into the final
    /// config. Fails if the bot token isn't available from either of them.
    pub fn resolve(args: Args, env: EnvConfig) -> Result<Config> {
        let token = resolve_token(args.token, env.token)?;

        Ok(Config {
            token,
            warm_up_delay: args.delay,
            camera: CameraConfig {
                selection: args.camera,
                program: args.camera_program,
            },
            logging: LoggingConfig {
                level: args.log,
                loki_url: env.loki_url,
            },
            metrics: MetricsConfig {
                addr: env.metrics_addr,
            },
        })
    }
}

/// The token from the command line wins. Empty values are the same as
/// missing ones.
fn resolve_token(flag: Option<String>, env: Option<String>) -> Result<String> {
    match flag.into_iter().chain(env).find(|token| !token.is_empty()) {
        Some(token) => Ok(token),
        None => Err(err!(ConfigError::MissingToken)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use assert_matches::assert_matches;
    use clap::Parser;
    use expect_test::expect;

    fn try_parse_args(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("cambot").chain(argv.iter().copied()))
    }

    fn parse_args(argv: &[&str]) -> Args {
        try_parse_args(argv).unwrap()
    }

    fn env(vars: &[(&str, &str)]) -> EnvConfig {
        let vars = vars
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()));

        EnvConfig::from_vars(vars).unwrap()
    }

    #[track_caller]
    fn assert_missing_token(result: Result<Config>) {
        let Err(err) = result else {
            panic!("Expected the missing token error");
        };
        assert_matches!(
            err.kind(),
            ErrorKind::Config {
                source: ConfigError::MissingToken
            }
        );
    }

    #[test]
    fn flag_token_wins_over_env() {
        let config = Config::resolve(
            parse_args(&["--token", "from-flag"]),
            env(&[("CAMBOT_TOKEN", "from-env")]),
        )
        .unwrap();

        assert_eq!(config.token, "from-flag");
    }

    #[test]
    fn short_flag_token() {
        let config = Config::resolve(parse_args(&["-t", "from-flag"]), env(&[])).unwrap();

        assert_eq!(config.token, "from-flag");
    }

    #[test]
    fn env_token_is_a_fallback() {
        let config = Config::resolve(parse_args(&[]), env(&[("CAMBOT_TOKEN", "from-env")])).unwrap();

        assert_eq!(config.token, "from-env");
    }

    #[test]
    fn missing_token_is_an_error() {
        assert_missing_token(Config::resolve(parse_args(&[]), env(&[])));

        // Unrelated variables don't count
        assert_missing_token(Config::resolve(
            parse_args(&[]),
            env(&[("TOKEN", "nope"), ("TG_BOT_TOKEN", "nope")]),
        ));
    }

    #[test]
    fn empty_token_is_missing() {
        assert_missing_token(Config::resolve(
            parse_args(&["--token", ""]),
            env(&[("CAMBOT_TOKEN", "")]),
        ));

        let config = Config::resolve(
            parse_args(&["--token", ""]),
            env(&[("CAMBOT_TOKEN", "from-env")]),
        )
        .unwrap();

        assert_eq!(config.token, "from-env");
    }

    #[test]
    fn missing_token_message_mentions_both_sources() {
        let err = resolve_token(None, None).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("--token"), "{message}");
        assert!(message.contains(TOKEN_ENV_VAR), "{message}");
    }

    #[test]
    fn all_flags() {
        test_bat::debug::assert_eq(
            parse_args(&["-l", "DEBUG", "-t", "token", "-d", "2", "--camera", "pi"]),
            &expect![[r#"
                Args {
                    log: Debug,
                    token: Some(
                        "token",
                    ),
                    delay: Some(
                        2.0,
                    ),
                    camera: Pi,
                    camera_program: "rpicam-still",
                }"#]],
        );
    }

    #[test]
    fn log_level_defaults_to_error() {
        assert_eq!(parse_args(&[]).log, LogLevel::Error);
    }

    #[test]
    fn log_level_accepts_the_named_levels() {
        let cases = [
            ("DEBUG", LogLevel::Debug),
            ("INFO", LogLevel::Info),
            ("WARNING", LogLevel::Warning),
            ("ERROR", LogLevel::Error),
            ("CRITICAL", LogLevel::Critical),
        ];

        for (name, expected) in cases {
            assert_eq!(parse_args(&["--log", name]).log, expected);
            assert_eq!(parse_args(&["-l", name]).log, expected);
        }
    }

    #[test]
    fn log_level_rejects_unknown_levels() {
        for name in ["TRACE", "debug", "Warning", "WARN", ""] {
            let err = try_parse_args(&["--log", name]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue, "{name}");
        }
    }

    #[test]
    fn critical_maps_to_error_filter() {
        assert_eq!(LogLevel::Critical.to_level_filter(), LevelFilter::ERROR);
        assert_eq!(LogLevel::Warning.to_level_filter(), LevelFilter::WARN);
    }

    #[test]
    fn delay_is_parsed_as_seconds() {
        let config = Config::resolve(
            parse_args(&["-t", "token", "--delay", "1.5"]),
            EnvConfig::default(),
        )
        .unwrap();

        assert_eq!(config.warm_up_delay, Some(1.5));

        let config = Config::resolve(parse_args(&["-t", "token"]), EnvConfig::default()).unwrap();
        assert_eq!(config.warm_up_delay, None);
    }

    #[test]
    fn any_delay_value_is_accepted() {
        let resolve = |argv: &[&str]| {
            Config::resolve(parse_args(argv), EnvConfig::default())
                .map(|config| config.warm_up_delay)
                .unwrap()
        };

        assert_eq!(resolve(&["-t", "token", "-d", "-1"]), Some(-1.0));
        assert_eq!(resolve(&["-t", "token", "--delay=-0.5"]), Some(-0.5));
        assert_eq!(resolve(&["-t", "token", "-d", "inf"]), Some(f64::INFINITY));
        assert!(resolve(&["-t", "token", "-d", "nan"]).unwrap().is_nan());
    }

    #[test]
    fn non_numeric_delay_is_rejected() {
        let err = try_parse_args(&["-t", "token", "-d", "soon"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn observability_settings_come_from_env() {
        let config = Config::resolve(
            parse_args(&["-t", "token"]),
            env(&[
                ("CAMBOT_LOKI_URL", "http://loki:3100"),
                ("CAMBOT_METRICS_ADDR", "127.0.0.1:9000"),
            ]),
        )
        .unwrap();

        assert_eq!(
            config.logging.loki_url.map(String::from).as_deref(),
            Some("http://loki:3100/")
        );
        assert_eq!(
            config.metrics.addr,
            Some(SocketAddr::from(([127, 0, 0, 1], 9000)))
        );
    }

    #[test]
    fn malformed_env_is_an_error() {
        let vars = [("CAMBOT_METRICS_ADDR".to_owned(), "not an address".to_owned())];
        let err = EnvConfig::from_vars(vars).unwrap_err();

        assert_matches!(
            err.kind(),
            ErrorKind::Config {
                source: ConfigError::Env { .. }
            }
        );
    }

    #[test]
    fn camera_defaults() {
        let config = Config::resolve(parse_args(&["-t", "token"]), EnvConfig::default()).unwrap();

        assert_eq!(config.camera.selection, CameraSelection::Auto);
        assert_eq!(
            config.camera.program,
            PathBuf::from(crate::camera::DEFAULT_PROGRAM)
        );

        let config = Config::resolve(
            parse_args(&["-t", "token", "--camera", "placeholder"]),
            EnvConfig::default(),
        )
        .unwrap();

        assert_eq!(config.camera.selection, CameraSelection::Placeholder);
    }
}
