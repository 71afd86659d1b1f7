//! Logging facade.
//!
//! Crates of the workspace log through the macros exported here (`alba_core::info!` and friends) so that the
//! backend is decided once, by the binary calling [`init_logger`].

pub use log::{Level, LevelFilter};

mod appender;
mod consts;
mod logger;

pub use consts::DEFAULT_LOGGER_ENV;
pub use logger::LogError;

#[macro_export]
macro_rules! trace {
    ($($t:tt)*) => ( $crate::__log::trace!($($t)*) )
}

#[macro_export]
macro_rules! debug {
    ($($t:tt)*) => ( $crate::__log::debug!($($t)*) )
}

#[macro_export]
macro_rules! info {
    ($($t:tt)*) => ( $crate::__log::info!($($t)*) )
}

#[macro_export]
macro_rules! warn {
    ($($t:tt)*) => ( $crate::__log::warn!($($t)*) )
}

#[macro_export]
macro_rules! error {
    ($($t:tt)*) => ( $crate::__log::error!($($t)*) )
}

/// Initializes the global logger.
///
/// `filters` is a `RUST_LOG`-style expression (`info,alba_bridge=trace`) applied on top of the
/// [`DEFAULT_LOGGER_ENV`] environment variable. When `log_dir` is given, a rolling log file and a
/// warnings-only error file are written there in addition to the console.
pub fn init_logger(log_dir: Option<&str>, filters: &str) -> Result<(), LogError> {
    use appender::AppenderSpec;
    use consts::{ERR_LOG_FILE_NAME, LOG_FILE_NAME};
    use log4rs::{Config, config::Root};

    const CONSOLE_APPENDER: &str = "stdout";
    const LOG_FILE_APPENDER: &str = "log_file";
    const ERR_LOG_FILE_APPENDER: &str = "err_log_file";

    let loggers = logger::Builder::new().root_level(LevelFilter::Info).parse_env(DEFAULT_LOGGER_ENV).parse_expression(filters).build();

    let mut stdout_appender = AppenderSpec::console(CONSOLE_APPENDER, None);
    let mut file_appender = log_dir.map(|dir| AppenderSpec::roller(LOG_FILE_APPENDER, None, dir, LOG_FILE_NAME)).transpose()?;
    let mut err_file_appender =
        log_dir.map(|dir| AppenderSpec::roller(ERR_LOG_FILE_APPENDER, Some(LevelFilter::Warn), dir, ERR_LOG_FILE_NAME)).transpose()?;

    let mut appenders: Vec<&mut AppenderSpec> =
        [Some(&mut stdout_appender), file_appender.as_mut(), err_file_appender.as_mut()].into_iter().flatten().collect();
    let names: Vec<&'static str> = appenders.iter().map(|spec| spec.name).collect();

    let config = Config::builder()
        .appenders(appenders.iter_mut().filter_map(|spec| spec.appender()))
        .loggers(loggers.items())
        .build(Root::builder().appenders(names).build(loggers.root_level()))
        .map_err(|err| LogError::InitError(err.to_string()))?;

    log4rs::init_config(config).map_err(|err| LogError::InitError(err.to_string()))?;
    Ok(())
}
