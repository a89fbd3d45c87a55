use std::{
    fmt::Display,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering},
        Arc, Mutex, RwLock,
    },
    thread::{self, JoinHandle},
};

use chrono::Local;
use crossbeam_channel::{bounded, unbounded, Sender};

use crate::{msg_fmt::LogMessage, targets::LogTarget, writer};

// Ordered by verbosity: a message passes when its level <= the logger level.
#[derive(Debug, Eq, PartialEq, PartialOrd, Ord, Clone, Copy)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        };
        f.pad(name)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

pub(crate) enum LogCommand {
    Message(LogMessage),
    Flush(Sender<()>),
    Terminate,
}

pub(crate) type SharedTarget = Arc<RwLock<Box<dyn LogTarget + Send + Sync>>>;

/// Leveled logger backed by a dedicated writer thread.
///
/// Messages are filtered on the calling thread and handed to the writer over
/// a channel; the writer caches up to `cache_capacity` messages before
/// forwarding them to the current [`LogTarget`].
pub struct Logger {
    severity_level: AtomicU8,
    cache_capacity: Arc<AtomicUsize>,
    is_running: AtomicBool,
    sender: Sender<LogCommand>,
    target: SharedTarget,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl Logger {
    pub fn new(level: LogLevel,
               cache_capacity: usize,
               target: Box<dyn LogTarget + Send + Sync>
    ) -> Self {
        let (sender, receiver) = unbounded();
        let target: SharedTarget = Arc::new(RwLock::new(target));
        let cache_capacity = Arc::new(AtomicUsize::new(cache_capacity.max(1)));

        let writer = writer::start_writer_thread(receiver, target.clone(), cache_capacity.clone());

        Logger {
            severity_level: AtomicU8::new(level as u8),
            cache_capacity,
            is_running: AtomicBool::new(true),
            sender,
            target,
            writer: Mutex::new(Some(writer)),
        }
    }

    pub fn log(&self, level: LogLevel, message: String) {
        if !self.is_running() || level > self.get_log_level() {
            return;
        }

        let message = LogMessage {
            level,
            thread_id: thread::current().id(),
            timestamp: Local::now(),
            message,
        };
        let _ = self.sender.send(LogCommand::Message(message));
    }

    /// Blocks until every message sent before this call reached the target.
    pub fn flush(&self) {
        if !self.is_running() {
            return;
        }

        let (ack_sender, ack_receiver) = bounded(1);
        if self.sender.send(LogCommand::Flush(ack_sender)).is_ok() {
            let _ = ack_receiver.recv();
        }
    }

    pub fn terminate(&self) {
        if !self.is_running.swap(false, Ordering::AcqRel) {
            return;
        }

        let _ = self.sender.send(LogCommand::Terminate);
        let handle = match self.writer.lock() {
            Ok(mut writer) => writer.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    pub fn update_level(&self, level: LogLevel) {
        self.severity_level.store(level as u8, Ordering::Release);
    }

    pub fn get_log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.severity_level.load(Ordering::Acquire))
    }

    pub fn update_target(&self, target: Box<dyn LogTarget + Send + Sync>) {
        // pending messages belong to the old target
        self.flush();
        match self.target.write() {
            Ok(mut current) => *current = target,
            Err(poisoned) => *poisoned.into_inner() = target,
        }
    }

    pub fn update_cache_capacity(&self, capacity: usize) {
        self.cache_capacity.store(capacity.max(1), Ordering::Release);
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.load(Ordering::Acquire)
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.terminate();
    }
}
