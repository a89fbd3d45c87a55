use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParseError {
    #[error("Empty request")]
    EmptyRequest,

    #[error("Invalid request line: {0}")]
    InvalidRequestLine(String),

    #[error("Unsupported HTTP version: {0}")]
    UnsupportedVersion(String),

    #[error("Invalid Content-Length header: {0}")]
    InvalidContentLength(String),

    #[error("Chunked request bodies are not supported")]
    ChunkedBody,
}
