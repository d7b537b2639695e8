use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

pub const LOG_CONFIG_FILE: &str = "log4rs.yml";
const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Invalid logging configuration: {0}")]
    Config(String),

    #[error("Logger already initialised: {0}")]
    AlreadyInitialized(String),
}

/// Initialise logging from `log4rs.yml`, or a console logger at info level
pub fn init() -> Result<(), LoggingError> {
    init_with(Path::new(LOG_CONFIG_FILE), LevelFilter::Info)
}

pub fn init_with(path: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    if path.exists() {
        return log4rs::init_file(path, Default::default())
            .map_err(|e| LoggingError::Config(e.to_string()));
    }

    log4rs::init_config(console_config(level)?)
        .map(|_| ())
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

pub fn console_config(level: LevelFilter) -> Result<Config, LoggingError> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();

    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| LoggingError::Config(e.to_string()))
}
