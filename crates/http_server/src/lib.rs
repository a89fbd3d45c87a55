use std::net::{SocketAddr, TcpListener, TcpStream};

use concurrent_runtime::ConcurrentRuntime;
use http_session::HttpSession;
use logger_proc_macro::log;
use smart_stream::AsyncStream;

pub use http_session::SessionSettings;

#[derive(Debug)]
pub enum ServerError {
    Bind(String, std::io::Error),
    Io(std::io::Error),
}

impl std::error::Error for ServerError {}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bind(address, err) => write!(f, "Failed to bind {}: {}", address, err),
            Self::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Accepts connections and hands each one to the runtime as its own session.
pub struct HttpServer<'a> {
    runtime: &'a ConcurrentRuntime,
    listener: TcpListener,
    settings: SessionSettings,
}

impl<'a> HttpServer<'a> {
    #[log(debug)]
    pub fn bind(address: &str, runtime: &'a ConcurrentRuntime, settings: SessionSettings) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(address)
            .map_err(|err| ServerError::Bind(address.to_string(), err))?;

        Ok(HttpServer { runtime, listener, settings })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves until the listener fails; a failed accept only drops that client.
    pub fn run(&self) -> Result<(), ServerError> {
        logger::info!("Listening on http://{}", self.local_addr()?);

        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => self.accept_new_connection(stream),
                Err(err) => logger::warn!("Failed to accept connection: {}", err),
            }
        }
        Ok(())
    }

    #[log(debug)]
    fn accept_new_connection(&self, stream: TcpStream) {
        let settings = self.settings;
        let connection = match AsyncStream::new(stream, settings.read_timeout) {
            Ok(connection) => connection,
            Err(err) => {
                logger::warn!("Failed to set up connection: {}", err);
                return;
            }
        };

        self.runtime.spawn(async move {
            let mut session = HttpSession::new(connection, settings);
            match session.run().await {
                Ok(()) => logger::debug!("Session finished"),
                Err(err) => logger::warn!("Session error: {}", err),
            }
        });
    }
}
