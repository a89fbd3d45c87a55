use smart_stream::error::SmartStreamError;

#[derive(Debug)]
pub enum HttpSessionError {
    ClosedConnection,
    SmartStream(SmartStreamError),
}

impl std::error::Error for HttpSessionError {}

impl std::fmt::Display for HttpSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClosedConnection => write!(f, "Session has no open connection"),
            Self::SmartStream(err) => write!(f, "{}", err),
        }
    }
}

impl From<SmartStreamError> for HttpSessionError {
    fn from(err: SmartStreamError) -> Self {
        Self::SmartStream(err)
    }
}
