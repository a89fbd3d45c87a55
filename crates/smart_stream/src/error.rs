use std::fmt::Display;

#[derive(Debug)]
pub enum SmartStreamError {
    Io(std::io::Error),
    Timeout,
    LimitExceeded(usize),
    ClosedConnection(String),
    RuntimeError(String),
}

impl std::error::Error for SmartStreamError {}

impl Display for SmartStreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {}", err),
            Self::Timeout => write!(f, "Read timed out"),
            Self::LimitExceeded(limit) => write!(f, "Input exceeds {} bytes", limit),
            Self::ClosedConnection(context) => write!(f, "Connection closed: {}", context),
            Self::RuntimeError(context) => write!(f, "Runtime error: {}", context),
        }
    }
}

impl From<std::io::Error> for SmartStreamError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => Self::Timeout,
            _ => Self::Io(err),
        }
    }
}
