pub mod error; pub use error::RequestError;
mod response; pub use response::DecodeResponse;

use http_codec::{HttpResponse, StatusCode};
use json_parser::JsonParser;
use payload_decoder::{decode_payload, EncodingType};
use logger_proc_macro::log;

/// Body of a `POST /decode` request.
#[derive(Debug, PartialEq)]
pub struct DecodeRequest {
    pub encoding_type: Option<String>,
    pub base64_string: String,
}

impl DecodeRequest {
    #[log(debug)]
    pub fn from_json(body: &str) -> Result<Self, RequestError> {
        let mut parser = JsonParser::new()?;
        let value = parser.parse(body)?;
        if value.as_object().is_none() {
            return Err(RequestError::NotAnObject);
        }

        let base64_string = value["base64String"].as_str()
            .ok_or(RequestError::MissingBase64String)?
            .to_string();

        Ok(DecodeRequest {
            encoding_type: value["encodingType"].as_str().map(str::to_string),
            base64_string,
        })
    }
}

/// Runs one decode request and returns the status with its reply body.
pub fn process(body: &[u8]) -> (StatusCode, DecodeResponse) {
    let body = String::from_utf8_lossy(body);
    let request = match DecodeRequest::from_json(&body) {
        Ok(request) => request,
        Err(err) => {
            logger::debug!("Rejected decode request: {}", err);
            return (StatusCode::BadRequest, DecodeResponse::failure(err.to_string()));
        }
    };

    let encoding = match request.encoding_type.as_deref().unwrap_or("").parse::<EncodingType>() {
        Ok(encoding) => encoding,
        Err(err) => {
            logger::debug!("Rejected encoding type {:?}", request.encoding_type);
            return (StatusCode::BadRequest, err.into());
        }
    };

    match decode_payload(encoding, &request.base64_string) {
        Ok(content) => {
            logger::debug!("Decoded {} payload of {} characters", encoding, request.base64_string.len());
            (StatusCode::Ok, DecodeResponse::success(content))
        }
        Err(err) => {
            logger::debug!("Failed to decode {} payload: {}", encoding, err);
            (StatusCode::BadRequest, err.into())
        }
    }
}

#[log(debug)]
pub fn handle_decode(body: &[u8]) -> HttpResponse {
    let (status, response) = process(body);
    json_response(status, &response)
}

/// `{"error": message}` reply used for routing and transport failures.
pub fn error_response(status: StatusCode, message: &str) -> HttpResponse {
    json_response(status, &DecodeResponse::failure(message))
}

fn json_response(status: StatusCode, response: &DecodeResponse) -> HttpResponse {
    match serde_json::to_string(response) {
        Ok(json) => HttpResponse::json(status, json),
        Err(err) => {
            logger::error!("Failed to serialize response: {}", err);
            HttpResponse::json(
                StatusCode::InternalServerError,
                r#"{"error":"Failed to serialize response"}"#.to_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(body: &str) -> (u16, String) {
        let response = handle_decode(body.as_bytes());
        (response.status.code(), String::from_utf8(response.body().to_vec()).unwrap())
    }

    #[test]
    fn test_pdf_example() {
        let (status, body) = reply(r#"{"encodingType":"pdf","base64String":"JVBERi0xLjQK"}"#);
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"decodedContent":"JVBERi0xLjQK","error":null}"#);
    }

    #[test]
    fn test_html_example() {
        let (status, body) = reply(r#"{"encodingType":"html","base64String":"PGgxPkhpPC9oMT4="}"#);
        assert_eq!(status, 200);
        assert_eq!(body, r#"{"decodedContent":"<h1>Hi</h1>","error":null}"#);
    }

    #[test]
    fn test_invalid_characters_example() {
        let (status, body) = reply(r#"{"encodingType":"pdf","base64String":"@@@"}"#);
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"error":"Invalid Base64 characters found","invalidChars":["@","@","@"]}"#);
    }

    #[test]
    fn test_invalid_pdf() {
        let (status, body) = reply(r#"{"encodingType":"pdf","base64String":"PGgxPkhpPC9oMT4="}"#);
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"error":"Invalid PDF file"}"#);
    }

    #[test]
    fn test_unsupported_encoding_type() {
        let (status, body) = reply(r#"{"encodingType":"docx","base64String":"QUJD"}"#);
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"error":"Unsupported encoding type"}"#);

        let (status, body) = reply(r#"{"base64String":"QUJD"}"#);
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"error":"Unsupported encoding type"}"#);
    }

    #[test]
    fn test_decode_error_is_reported_verbatim() {
        let (status, response) = process(br#"{"encodingType":"html","base64String":"PGgxPkhpPC9oMT4"}"#);
        let expected = payload_decoder::decode_strict("PGgxPkhpPC9oMT4").unwrap_err().to_string();

        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(response, DecodeResponse::failure(expected));
    }

    #[test]
    fn test_escaped_newline_is_an_invalid_character() {
        let (status, response) = process(br#"{"encodingType":"xml","base64String":"PGgx\nPg=="}"#);
        assert_eq!(status, StatusCode::BadRequest);
        assert_eq!(response.invalid_chars, Some(vec!["\n".to_string()]));
    }

    #[test]
    fn test_missing_base64_string() {
        let (status, body) = reply(r#"{"encodingType":"pdf"}"#);
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"error":"Missing base64String"}"#);

        let (status, body) = reply(r#"{"encodingType":"pdf","base64String":42}"#);
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"error":"Missing base64String"}"#);
    }

    #[test]
    fn test_body_must_be_object() {
        let (status, body) = reply(r#"["pdf","JVBERi0xLjQK"]"#);
        assert_eq!(status, 400);
        assert_eq!(body, r#"{"error":"Request body must be a JSON object"}"#);
    }

    #[test]
    fn test_malformed_json() {
        let (status, response) = process(b"encodingType=pdf&base64String=JVBERi0xLjQK");
        assert_eq!(status, StatusCode::BadRequest);
        assert!(response.error.unwrap().starts_with("Invalid JSON body"));
    }

    #[test]
    fn test_error_response_shape() {
        let response = error_response(StatusCode::NotFound, "Not Found");
        assert_eq!(response.status, StatusCode::NotFound);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.body(), br#"{"error":"Not Found"}"#);
    }

    #[test]
    fn test_request_from_json() {
        let request = DecodeRequest::from_json(r#"{"encodingType":"xml","base64String":"PGEvPg=="}"#).unwrap();
        assert_eq!(request, DecodeRequest {
            encoding_type: Some("xml".to_string()),
            base64_string: "PGEvPg==".to_string(),
        });
    }
}
