use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::append::rolling_file::policy::compound::{
    CompoundPolicy, roll::fixed_window::FixedWindowRoller, trigger::size::SizeTrigger,
};
use log4rs::config::{Appender, Config, Logger, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::{Path, PathBuf};

use super::devlog::DEV_TARGET;
use crate::config::AppConfig;
use crate::errors::AggError;

const ENC_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l}] {t} - {m}{n}";
const ROLL_SIZE: u64 = 10 * 1024 * 1024;

/// Maps `error|warn|info|debug|trace` to a level filter; anything else is `Info`.
#[must_use]
pub fn parse_level(level: Option<&str>) -> LevelFilter {
    match level.unwrap_or("info").to_ascii_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

fn config_err(e: impl std::fmt::Display) -> AggError {
    AggError::Config(format!("logging: {e}"))
}

fn rolling(base: &Path, stem: &str, keep: u32) -> Result<RollingFileAppender, AggError> {
    let roller = FixedWindowRoller::builder()
        .build(&format!("{}", base.join(format!("{stem}.{{}}.log")).display()), keep)
        .map_err(config_err)?;
    let policy = CompoundPolicy::new(Box::new(SizeTrigger::new(ROLL_SIZE)), Box::new(roller));
    RollingFileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(ENC_PATTERN)))
        .build(base.join(format!("{stem}.log")), Box::new(policy))
        .map_err(config_err)
}

/// Configure logging globally for the process.
/// - dir: base directory for logs; if None, current directory.
/// - level: error|warn|info|debug|trace
/// - retention: number of rolled files to keep (default 7)
///
/// Messages logged through `dev6!` go to `dev6.log` when `enable_dev6` is set.
/// If a logger is already installed the call leaves it in place.
///
/// # Errors
/// Returns `Config` when the log directory or appenders cannot be created.
pub fn configure_logging(
    dir: Option<&Path>,
    level: Option<&str>,
    retention: Option<usize>,
    enable_dev6: bool,
) -> Result<(), AggError> {
    let base = dir
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    std::fs::create_dir_all(&base)?;
    let keep = u32::try_from(retention.unwrap_or(7)).unwrap_or(u32::MAX);
    let lvl = parse_level(level);

    let mut builder =
        Config::builder().appender(Appender::builder().build("app", Box::new(rolling(&base, "folio", keep)?)));
    if enable_dev6 {
        builder = builder
            .appender(Appender::builder().build("dev6", Box::new(rolling(&base, "dev6", keep)?)))
            .logger(Logger::builder().appender("dev6").additive(false).build(DEV_TARGET, LevelFilter::Trace));
    } else {
        builder = builder.logger(Logger::builder().additive(false).build(DEV_TARGET, LevelFilter::Off));
    }
    let config = builder.build(Root::builder().appender("app").build(lvl)).map_err(config_err)?;
    if log4rs::init_config(config).is_err() {
        log::debug!("logger already initialized; keeping existing configuration");
    }
    Ok(())
}

/// Stderr-only logging for interactive use.
///
/// # Errors
/// Returns `Config` if the configuration cannot be built.
pub fn init_console(level: Option<&str>) -> Result<(), AggError> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("[{l}] {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(console)))
        .logger(Logger::builder().additive(false).build(DEV_TARGET, LevelFilter::Off))
        .build(Root::builder().appender("stderr").build(parse_level(level)))
        .map_err(config_err)?;
    let _ = log4rs::init_config(config);
    Ok(())
}

/// Picks file logging when a log directory is configured, stderr otherwise.
///
/// # Errors
/// See [`configure_logging`] and [`init_console`].
pub fn configure_from_config(cfg: &AppConfig) -> Result<(), AggError> {
    match &cfg.log_dir {
        Some(dir) => configure_logging(Some(dir), cfg.log_level.as_deref(), cfg.log_retention, cfg.dev6.unwrap_or(false)),
        None => init_console(Some(cfg.log_level.as_deref().unwrap_or("warn"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing_defaults_to_info() {
        assert_eq!(parse_level(Some("DEBUG")), LevelFilter::Debug);
        assert_eq!(parse_level(Some("warn")), LevelFilter::Warn);
        assert_eq!(parse_level(Some("loud")), LevelFilter::Info);
        assert_eq!(parse_level(None), LevelFilter::Info);
    }

    #[test]
    fn configure_logging_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        configure_logging(Some(&logs), Some("info"), Some(2), false).unwrap();
        assert!(logs.join("folio.log").exists());
    }
}
