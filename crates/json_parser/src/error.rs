use std::num::ParseFloatError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum JsonError {
    #[error("JSON grammar could not be loaded")]
    Language,

    #[error("Malformed JSON document")]
    ParseError,

    #[error("JSON document is empty")]
    BrokenTree,

    #[error("Invalid escape sequence in JSON string: {0}")]
    InvalidEscape(String),
}

impl From<ParseFloatError> for JsonError {
    fn from(_err: ParseFloatError) -> Self {
        JsonError::ParseError
    }
}
