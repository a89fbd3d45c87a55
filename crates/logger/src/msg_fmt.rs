use std::thread::ThreadId;
use chrono::{DateTime, Local};

use crate::LogLevel;

#[derive(Clone, Debug)]
pub struct LogMessage {
    pub(crate) level: LogLevel,
    pub(crate) thread_id: ThreadId,
    pub(crate) timestamp: DateTime<Local>,
    pub(crate) message: String,
}

impl LogMessage {
    pub(crate) fn color_code(&self) -> &'static str {
        match self.level {
            LogLevel::Error => "1;31", // red
            LogLevel::Warn => "1;33",  // yellow
            LogLevel::Info => "1;32",  // green
            LogLevel::Debug => "1;34", // blue
            LogLevel::Trace => "1;35", // magenta
        }
    }
}

impl std::fmt::Display for LogMessage {
    fn fmt(&self,
           f: &mut std::fmt::Formatter
    ) -> std::fmt::Result {
        write!(f, "{:?} - {} [{:5}] - {}",
               self.thread_id,
               self.timestamp.format("%d/%m/%Y %H:%M:%S%.3f"),
               self.level,
               self.message
        )
    }
}
