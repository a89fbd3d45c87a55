use std::time::Duration;

use logger_proc_macro::log;
use smart_stream::{error::SmartStreamError, AsyncStream};
use http_codec::{HttpResponse, RequestHead, RequestType, StatusCode, CONTINUE_RESPONSE};
use decode_handler::{error_response, handle_decode};

pub mod error;
use error::HttpSessionError;

const HEAD_DELIMITER: &[u8] = b"\r\n\r\n";
const MAX_HEAD_BYTES: usize = 16 * 1024;

pub const INDEX_PAGE: &str = include_str!("../assets/index.html");

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub read_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        SessionSettings {
            read_timeout: Duration::from_secs(30),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, PartialEq)]
enum ConnectionState {
    KeepAlive,
    Close,
}

/// One client connection, served request by request until either side
/// asks to close it.
pub struct HttpSession {
    connection: Option<AsyncStream>,
    peer: String,
    settings: SessionSettings,
}

impl HttpSession {
    #[log(debug)]
    pub fn new(connection: AsyncStream, settings: SessionSettings) -> Self {
        let peer = connection.peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown peer".to_string());

        Self {
            connection: Some(connection),
            peer,
            settings,
        }
    }

    #[log(trace)]
    pub async fn run(&mut self) -> Result<(), HttpSessionError> {
        while let Some(connection) = &self.connection {
            if !connection.is_open() {
                break;
            }
            if self.handle_new_request().await? == ConnectionState::Close {
                break;
            }
        }
        self.close();
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            connection.close();
            logger::debug!("Connection with {} closed", self.peer);
        }
    }

    #[log(trace)]
    async fn handle_new_request(&mut self) -> Result<ConnectionState, HttpSessionError> {
        let max_body_bytes = self.settings.max_body_bytes;
        let peer = self.peer.clone();
        let connection = self.connection.as_mut().ok_or(HttpSessionError::ClosedConnection)?;

        let head_result = connection.read_until(HEAD_DELIMITER, MAX_HEAD_BYTES).await;
        let raw_head = match head_result {
            Ok(raw_head) => raw_head,
            Err(SmartStreamError::LimitExceeded(_)) => {
                return Self::reject(connection, StatusCode::RequestHeaderFieldsTooLarge, "Request header is too large").await;
            }
            // a partially received request gets an answer, an idle connection does not
            Err(SmartStreamError::Timeout) if connection.buffered_len() > 0 => {
                return Self::reject(connection, StatusCode::RequestTimeout, "Request timed out").await;
            }
            Err(SmartStreamError::Timeout) | Err(SmartStreamError::ClosedConnection(_)) => {
                logger::debug!("Connection with {} went idle or was closed by the peer", peer);
                return Ok(ConnectionState::Close);
            }
            Err(err) => return Err(err.into()),
        };

        let raw_head = String::from_utf8_lossy(&raw_head).into_owned();
        let head = match RequestHead::parse(&raw_head) {
            Ok(head) => head,
            Err(err) => {
                return Self::reject(connection, StatusCode::BadRequest, &err.to_string()).await;
            }
        };

        let content_length = match head.content_length() {
            Ok(content_length) => content_length,
            Err(err) => {
                return Self::reject(connection, StatusCode::BadRequest, &err.to_string()).await;
            }
        };
        if content_length > max_body_bytes {
            return Self::reject(connection, StatusCode::PayloadTooLarge, "Request body is too large").await;
        }

        if head.expects_continue() && content_length > 0 {
            connection.write(CONTINUE_RESPONSE).await?;
        }

        let body_result = connection.read_exact(content_length).await;
        let body = match body_result {
            Ok(body) => body,
            Err(SmartStreamError::Timeout) => {
                return Self::reject(connection, StatusCode::RequestTimeout, "Request timed out").await;
            }
            Err(err) => return Err(err.into()),
        };

        let keep_alive = head.keep_alive();
        let response = Self::dispatch(&head, &body).with_connection(keep_alive);
        logger::info!("{} {} {} -> {}", peer, head.method, head.path(), response.status);

        connection.write(&response.to_bytes()).await?;
        Ok(if keep_alive { ConnectionState::KeepAlive } else { ConnectionState::Close })
    }

    fn dispatch(head: &RequestHead, body: &[u8]) -> HttpResponse {
        match RequestType::route(head) {
            RequestType::Index => HttpResponse::html(StatusCode::Ok, INDEX_PAGE),
            RequestType::Decode => handle_decode(body),
            RequestType::MethodNotAllowed(allow) => {
                error_response(StatusCode::MethodNotAllowed, StatusCode::MethodNotAllowed.reason())
                    .with_header("Allow", allow)
            }
            RequestType::NotFound => error_response(StatusCode::NotFound, StatusCode::NotFound.reason()),
        }
    }

    // Answers with an error and ends the session; whatever the client still
    // has in flight is not read.
    async fn reject(connection: &mut AsyncStream, status: StatusCode, message: &str)
    -> Result<ConnectionState, HttpSessionError> {
        logger::warn!("Rejecting request: {} ({})", status, message);
        let response = error_response(status, message).with_connection(false);
        connection.write(&response.to_bytes()).await?;
        Ok(ConnectionState::Close)
    }
}

impl Drop for HttpSession {
    fn drop(&mut self) {
        self.close();
    }
}
