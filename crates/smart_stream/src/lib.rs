use std::{
    net::{Shutdown, SocketAddr, TcpStream},
    time::Duration,
};

use async_std::{io as async_io, net::TcpStream as AsyncTcpStream};
use futures::io::{AsyncReadExt, AsyncWriteExt};

pub mod error;
use error::SmartStreamError;

use logger_proc_macro::log;

const READ_CHUNK_SIZE: usize = 8192;

/// Async TCP stream with a read buffer and a per-operation timeout.
///
/// Bytes read past the end of a returned frame stay buffered for the next
/// read, so pipelined requests are not lost.
pub struct AsyncStream {
    m_stream: Option<AsyncTcpStream>,
    m_buffer: Vec<u8>,
    m_buffsize: usize,
    m_timeout: Duration,
}

impl AsyncStream {
    #[log(debug)]
    pub fn new(stream: TcpStream, timeout: Duration) -> Result<Self, SmartStreamError> {
        stream.set_nodelay(true)?;
        let stream = AsyncTcpStream::from(stream);
        Ok(
            Self {
                m_stream: Some(stream),
                m_buffer: Vec::new(),
                m_buffsize: READ_CHUNK_SIZE,
                m_timeout: timeout,
            }
        )
    }

    #[log(debug)]
    pub fn close(&mut self) {
        if let Some(stream) = self.m_stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.m_buffer.clear();
    }

    #[log(trace)]
    pub fn is_open(&self) -> bool {
        match &self.m_stream {
            Some(stream) => stream.peer_addr().is_ok(),
            None => false,
        }
    }

    /// Bytes received but not yet handed out by a read.
    pub fn buffered_len(&self) -> usize {
        self.m_buffer.len()
    }

    pub fn peer_addr(&self) -> Result<SocketAddr, SmartStreamError> {
        match &self.m_stream {
            Some(stream) => Ok(stream.peer_addr()?),
            None => Err(SmartStreamError::ClosedConnection("Error on peer_addr occured".to_string())),
        }
    }

    #[log(debug)]
    pub async fn write(&mut self, buf: &[u8]) -> Result<(), SmartStreamError> {
        let timeout = self.m_timeout;
        let stream = self.m_stream.as_mut()
            .ok_or(SmartStreamError::ClosedConnection("Error on write occured".to_string()))?;

        async_io::timeout(timeout, async {
            stream.write_all(buf).await?;
            stream.flush().await
        }).await?;
        Ok(())
    }

    /// Reads until `delimiter` and returns everything before it; the
    /// delimiter itself is consumed. Fails once more than `limit` bytes are
    /// buffered without a match.
    #[log(debug)]
    pub async fn read_until(&mut self, delimiter: &[u8], limit: usize) -> Result<Vec<u8>, SmartStreamError> {
        if delimiter.is_empty() {
            return Err(SmartStreamError::RuntimeError("Empty delimiter".to_string()));
        }

        loop {
            if let Some(position) = self.m_buffer.windows(delimiter.len()).position(|window| window == delimiter) {
                let mut frame: Vec<u8> = self.m_buffer.drain(..position + delimiter.len()).collect();
                frame.truncate(position);
                return Ok(frame);
            }

            if self.m_buffer.len() > limit {
                return Err(SmartStreamError::LimitExceeded(limit));
            }

            if self.fill_buffer().await? == 0 {
                let context = if self.m_buffer.is_empty() {
                    "peer closed the connection"
                } else {
                    "stream ended before delimiter"
                };
                return Err(SmartStreamError::ClosedConnection(context.to_string()));
            }
        }
    }

    #[log(debug)]
    pub async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, SmartStreamError> {
        while self.m_buffer.len() < len {
            if self.fill_buffer().await? == 0 {
                return Err(SmartStreamError::ClosedConnection("stream ended before body was complete".to_string()));
            }
        }
        Ok(self.m_buffer.drain(..len).collect())
    }

    async fn fill_buffer(&mut self) -> Result<usize, SmartStreamError> {
        let timeout = self.m_timeout;
        let mut chunk = vec![0; self.m_buffsize];
        let stream = self.m_stream.as_mut()
            .ok_or(SmartStreamError::ClosedConnection("Error on read occured".to_string()))?;

        let n = async_io::timeout(timeout, stream.read(&mut chunk)).await?;
        self.m_buffer.extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl Drop for AsyncStream {
    fn drop(&mut self) {
        if let Some(stream) = self.m_stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_std::task::block_on;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn connected_pair(timeout: Duration) -> (AsyncStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        (AsyncStream::new(server_side, timeout).unwrap(), client)
    }

    #[test]
    fn test_read_until_keeps_leftover() {
        let (mut stream, mut client) = connected_pair(Duration::from_secs(5));
        client.write_all(b"POST /decode HTTP/1.1\r\nContent-Length: 4\r\n\r\nbody").unwrap();

        let head = block_on(stream.read_until(b"\r\n\r\n", 1024)).unwrap();
        assert_eq!(head, b"POST /decode HTTP/1.1\r\nContent-Length: 4".to_vec());

        let body = block_on(stream.read_exact(4)).unwrap();
        assert_eq!(body, b"body".to_vec());
    }

    #[test]
    fn test_read_exact_waits_for_more_data() {
        let (mut stream, mut client) = connected_pair(Duration::from_secs(5));
        let writer = std::thread::spawn(move || {
            client.write_all(b"ab").unwrap();
            std::thread::sleep(Duration::from_millis(50));
            client.write_all(b"cd").unwrap();
            client
        });

        let body = block_on(stream.read_exact(4)).unwrap();
        assert_eq!(body, b"abcd".to_vec());
        let _client = writer.join().unwrap();
    }

    #[test]
    fn test_read_until_limit() {
        let (mut stream, mut client) = connected_pair(Duration::from_secs(5));
        client.write_all(&[b'a'; 64]).unwrap();

        let result = block_on(stream.read_until(b"\r\n\r\n", 16));
        assert!(matches!(result, Err(SmartStreamError::LimitExceeded(16))));
    }

    #[test]
    fn test_read_timeout() {
        let (mut stream, _client) = connected_pair(Duration::from_millis(100));

        let result = block_on(stream.read_until(b"\r\n\r\n", 1024));
        assert!(matches!(result, Err(SmartStreamError::Timeout)));
    }

    #[test]
    fn test_peer_closed() {
        let (mut stream, client) = connected_pair(Duration::from_secs(5));
        drop(client);

        let result = block_on(stream.read_until(b"\r\n\r\n", 1024));
        assert!(matches!(result, Err(SmartStreamError::ClosedConnection(_))));
    }

    #[test]
    fn test_write_reaches_peer() {
        let (mut stream, mut client) = connected_pair(Duration::from_secs(5));
        block_on(stream.write(b"HTTP/1.1 200 OK\r\n\r\n")).unwrap();
        stream.close();
        assert!(!stream.is_open());

        let mut received = String::new();
        client.read_to_string(&mut received).unwrap();
        assert_eq!(received, "HTTP/1.1 200 OK\r\n\r\n");
    }

    #[test]
    fn test_closed_stream_rejects_io() {
        let (mut stream, _client) = connected_pair(Duration::from_secs(5));
        stream.close();

        assert!(matches!(block_on(stream.write(b"late")), Err(SmartStreamError::ClosedConnection(_))));
        assert!(matches!(block_on(stream.read_exact(1)), Err(SmartStreamError::ClosedConnection(_))));
    }
}
