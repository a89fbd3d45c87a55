mod logger; pub use logger::*;
mod logger_macro;
mod msg_fmt; pub use msg_fmt::LogMessage;
pub mod targets; pub use targets::{LogTarget, NoopLogTarget, ConsoleLogTarget, FileLogTarget};
mod writer;

use std::sync::LazyLock;

static LOGGER : LazyLock<Logger> = LazyLock::new(|| Logger::new(LogLevel::Info, 1, Box::new(NoopLogTarget)));


pub fn log(level: LogLevel, message: String) {
    LOGGER.log(level, message);
}

pub fn terminate() {
    LOGGER.terminate();
}

pub fn set_logger_level(level: LogLevel) {
    LOGGER.update_level(level);
}

pub fn set_logger_target(target: Box<dyn LogTarget + Send + Sync>) {
    LOGGER.update_target(target);
}

pub fn set_logger_cache_capacity(capacity: usize) {
    LOGGER.update_cache_capacity(capacity);
}

pub fn get_logger_level() -> LogLevel {
    LOGGER.get_log_level()
}
