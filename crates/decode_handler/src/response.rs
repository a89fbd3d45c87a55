use payload_decoder::DecodeError;
use serde::Serialize;

/// JSON body of every `/decode` reply.
///
/// Success carries `decodedContent` and an explicit `"error": null`;
/// failures carry `error` and, for rejected characters, `invalidChars`.
#[derive(Serialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DecodeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_content: Option<String>,
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_chars: Option<Vec<String>>,
}

impl DecodeResponse {
    pub fn success(decoded_content: String) -> Self {
        DecodeResponse {
            decoded_content: Some(decoded_content),
            error: None,
            invalid_chars: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        DecodeResponse {
            decoded_content: None,
            error: Some(error.into()),
            invalid_chars: None,
        }
    }
}

impl From<DecodeError> for DecodeResponse {
    fn from(err: DecodeError) -> Self {
        let mut response = DecodeResponse::failure(err.to_string());
        if let DecodeError::InvalidCharacters(chars) = err {
            response.invalid_chars = Some(chars.iter().map(char::to_string).collect());
        }
        response
    }
}
