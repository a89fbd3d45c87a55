use std::collections::HashMap;
mod routes; pub use routes::*;
pub mod error; pub use error::ParseError;
mod response; pub use response::{HttpResponse, StatusCode, CONTINUE_RESPONSE};
use logger_proc_macro::log;

#[derive(Eq, Debug, PartialEq)]
pub enum RequestType {
    Index,
    Decode,
    MethodNotAllowed(&'static str),
    NotFound,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RequestType::Index => write!(f, "{GET} {INDEX_PATH}"),
            RequestType::Decode => write!(f, "{POST} {DECODE_PATH}"),
            RequestType::MethodNotAllowed(allow) => write!(f, "method not allowed (allow: {allow})"),
            RequestType::NotFound => write!(f, "not found"),
        }
    }
}

impl RequestType {
    pub fn parse(method: &str, path: &str) -> RequestType {
        match (path, method) {
            (INDEX_PATH, GET) => RequestType::Index,
            (INDEX_PATH, _) => RequestType::MethodNotAllowed(GET),
            (DECODE_PATH, POST) => RequestType::Decode,
            (DECODE_PATH, _) => RequestType::MethodNotAllowed(POST),
            _ => RequestType::NotFound,
        }
    }

    pub fn route(head: &RequestHead) -> RequestType {
        RequestType::parse(&head.method, head.path())
    }
}

/// Request line and headers of one HTTP/1.x request.
///
/// Header names are stored lower-cased; repeated headers are joined with
/// `", "`. Header lines without a colon are ignored.
#[derive(Debug, PartialEq)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub version: String,
    pub headers: HashMap<String, String>,
}

impl RequestHead {
    #[log(trace)]
    pub fn parse(raw_head: &str) -> Result<RequestHead, ParseError> {
        let mut lines = raw_head.lines().skip_while(|line| line.trim().is_empty());
        let request_line = lines.next().ok_or(ParseError::EmptyRequest)?;

        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine(request_line.to_string()));
        }

        let (method, target, version) = (parts[0], parts[1], parts[2]);
        if !method.chars().all(|c| c.is_ascii_uppercase()) || !target.starts_with('/') {
            return Err(ParseError::InvalidRequestLine(request_line.to_string()));
        }
        if version != HTTP_1_1 && version != HTTP_1_0 {
            return Err(ParseError::UnsupportedVersion(version.to_string()));
        }

        let mut headers: HashMap<String, String> = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                let name = name.trim().to_ascii_lowercase();
                let value = value.trim();
                headers.entry(name)
                    .and_modify(|existing| {
                        existing.push_str(", ");
                        existing.push_str(value);
                    })
                    .or_insert_with(|| value.to_string());
            }
        }

        Ok(RequestHead {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
            headers,
        })
    }

    /// Request target without its query string.
    pub fn path(&self) -> &str {
        match self.target.split_once('?') {
            Some((path, _)) => path,
            None => &self.target,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn content_length(&self) -> Result<usize, ParseError> {
        if self.header("transfer-encoding").is_some() {
            return Err(ParseError::ChunkedBody);
        }

        match self.header("content-length") {
            Some(value) => value.trim().parse()
                .map_err(|_| ParseError::InvalidContentLength(value.to_string())),
            None => Ok(0),
        }
    }

    pub fn keep_alive(&self) -> bool {
        let connection = self.header("connection").unwrap_or("").to_ascii_lowercase();
        let has_token = |token: &str| connection.split(',').any(|t| t.trim() == token);

        if has_token("close") {
            false
        } else if has_token("keep-alive") {
            true
        } else {
            self.version == HTTP_1_1
        }
    }

    pub fn expects_continue(&self) -> bool {
        self.header("expect")
            .map(|value| value.eq_ignore_ascii_case("100-continue"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(raw: &str) -> RequestHead {
        RequestHead::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_get_index() {
        let request = head("GET / HTTP/1.1\r\nHost: localhost\r\n");
        assert_eq!(request.method, "GET");
        assert_eq!(request.target, "/");
        assert_eq!(request.version, "HTTP/1.1");
        assert_eq!(request.header("Host"), Some("localhost"));
        assert_eq!(RequestType::route(&request), RequestType::Index);
    }

    #[test]
    fn test_parse_post_decode() {
        let request = head("POST /decode HTTP/1.1\r\nContent-Type: application/json\r\nContent-Length: 52\r\n");
        assert_eq!(request.content_length(), Ok(52));
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(RequestType::route(&request), RequestType::Decode);
    }

    #[test]
    fn test_query_string_is_ignored_for_routing() {
        let request = head("GET /?theme=dark HTTP/1.1\r\n");
        assert_eq!(request.path(), "/");
        assert_eq!(RequestType::route(&request), RequestType::Index);
    }

    #[test]
    fn test_route_wrong_method() {
        assert_eq!(RequestType::parse("GET", "/decode"), RequestType::MethodNotAllowed("POST"));
        assert_eq!(RequestType::parse("DELETE", "/"), RequestType::MethodNotAllowed("GET"));
    }

    #[test]
    fn test_route_unknown_path() {
        assert_eq!(RequestType::parse("GET", "/encode"), RequestType::NotFound);
        assert_eq!(RequestType::parse("POST", "/decode/"), RequestType::NotFound);
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(RequestHead::parse(""), Err(ParseError::EmptyRequest));
        assert_eq!(RequestHead::parse("\r\n\r\n"), Err(ParseError::EmptyRequest));
    }

    #[test]
    fn test_parse_broken_request_line() {
        assert!(matches!(RequestHead::parse("INVALID REQUEST"), Err(ParseError::InvalidRequestLine(_))));
        assert!(matches!(RequestHead::parse("get / HTTP/1.1"), Err(ParseError::InvalidRequestLine(_))));
        assert!(matches!(RequestHead::parse("GET decode HTTP/1.1"), Err(ParseError::InvalidRequestLine(_))));
    }

    #[test]
    fn test_parse_unsupported_version() {
        assert_eq!(
            RequestHead::parse("GET / HTTP/2.0"),
            Err(ParseError::UnsupportedVersion("HTTP/2.0".to_string()))
        );
    }

    #[test]
    fn test_malformed_header_lines_are_skipped() {
        let request = head("GET / HTTP/1.1\r\nInvalid-Header-Line\r\nAccept: text/html\r\n");
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.header("accept"), Some("text/html"));
    }

    #[test]
    fn test_repeated_headers_are_joined() {
        let request = head("GET / HTTP/1.1\r\nAccept: text/html\r\nAccept: application/json\r\n");
        assert_eq!(request.header("accept"), Some("text/html, application/json"));
    }

    #[test]
    fn test_content_length_errors() {
        let request = head("POST /decode HTTP/1.1\r\nContent-Length: lots\r\n");
        assert_eq!(request.content_length(), Err(ParseError::InvalidContentLength("lots".to_string())));

        let request = head("POST /decode HTTP/1.1\r\nTransfer-Encoding: chunked\r\n");
        assert_eq!(request.content_length(), Err(ParseError::ChunkedBody));

        let request = head("POST /decode HTTP/1.1\r\n");
        assert_eq!(request.content_length(), Ok(0));
    }

    #[test]
    fn test_keep_alive_defaults() {
        assert!(head("GET / HTTP/1.1\r\n").keep_alive());
        assert!(!head("GET / HTTP/1.0\r\n").keep_alive());
        assert!(!head("GET / HTTP/1.1\r\nConnection: close\r\n").keep_alive());
        assert!(head("GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n").keep_alive());
    }

    #[test]
    fn test_expects_continue() {
        assert!(head("POST /decode HTTP/1.1\r\nExpect: 100-continue\r\n").expects_continue());
        assert!(!head("POST /decode HTTP/1.1\r\n").expects_continue());
    }
}
