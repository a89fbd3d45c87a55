use json_parser::JsonError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RequestError {
    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonError),

    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing base64String")]
    MissingBase64String,
}
