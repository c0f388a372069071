// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! WebSocket Transport
//!
//! Real transport implementation using tungstenite for WebSocket connections.
//! Supports both native-tls and rustls TLS backends.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

#[cfg(all(feature = "network-native-tls", not(feature = "network-rustls")))]
use native_tls::TlsConnector;

#[cfg(feature = "network-rustls")]
use rustls::pki_types::ServerName;
#[cfg(feature = "network-rustls")]
use std::sync::Arc;

use tracing::debug;
use tungstenite::client::IntoClientRequest;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::error::NetworkError;
use super::transport::{ConnectionState, Frame, Transport, TransportConfig, TransportResult};

/// Host, port and scheme of a relay endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RelayUrl {
    host: String,
    port: u16,
    tls: bool,
}

impl RelayUrl {
    fn parse(url: &str) -> Result<Self, NetworkError> {
        let (tls, rest) = if let Some(rest) = url.strip_prefix("wss://") {
            (true, rest)
        } else if let Some(rest) = url.strip_prefix("ws://") {
            (false, rest)
        } else {
            return Err(NetworkError::ConnectionFailed(format!(
                "{} is not a ws:// or wss:// URL",
                url
            )));
        };

        let authority = rest.split(|c: char| matches!(c, '/' | '?' | '#')).next().unwrap_or_default();
        if authority.is_empty() {
            return Err(NetworkError::ConnectionFailed(format!("{} has no host", url)));
        }

        let default_port = if tls { 443 } else { 80 };
        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    NetworkError::ConnectionFailed(format!("{} has a bad port", url))
                })?;
                (host, port)
            }
            None => (authority, default_port),
        };

        Ok(RelayUrl {
            host: host.to_string(),
            port,
            tls,
        })
    }
}

/// WebSocket transport for relay communication.
///
/// Supports both ws:// (plaintext) and wss:// (TLS) connections. The read
/// timeout is kept short so `receive` behaves like a poll.
pub struct WebSocketTransport {
    socket: Option<WebSocket<MaybeTlsStream<TcpStream>>>,
    state: ConnectionState,
}

impl WebSocketTransport {
    /// Creates a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport {
            socket: None,
            state: ConnectionState::Disconnected,
        }
    }

    fn resolve(host: &str, port: u16) -> Result<SocketAddr, NetworkError> {
        (host, port)
            .to_socket_addrs()
            .map_err(|e| NetworkError::ConnectionFailed(format!("DNS lookup failed: {}", e)))?
            .next()
            .ok_or_else(|| NetworkError::ConnectionFailed(format!("No address for {}", host)))
    }

    /// Create a TLS stream using native-tls
    #[cfg(all(feature = "network-native-tls", not(feature = "network-rustls")))]
    fn create_tls_stream(
        host: &str,
        tcp_stream: TcpStream,
    ) -> Result<MaybeTlsStream<TcpStream>, NetworkError> {
        let connector = TlsConnector::new()
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS error: {}", e)))?;
        let tls_stream = connector
            .connect(host, tcp_stream)
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS handshake failed: {}", e)))?;
        Ok(MaybeTlsStream::NativeTls(tls_stream))
    }

    /// Create a TLS stream using rustls
    #[cfg(feature = "network-rustls")]
    fn create_tls_stream(
        host: &str,
        tcp_stream: TcpStream,
    ) -> Result<MaybeTlsStream<TcpStream>, NetworkError> {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let server_name: ServerName<'_> = host.try_into().map_err(|_| {
            NetworkError::ConnectionFailed(format!("Invalid server name: {}", host))
        })?;

        let tls_conn = rustls::ClientConnection::new(Arc::new(config), server_name.to_owned())
            .map_err(|e| NetworkError::ConnectionFailed(format!("TLS setup failed: {}", e)))?;

        let tls_stream = rustls::StreamOwned::new(tls_conn, tcp_stream);
        Ok(MaybeTlsStream::Rustls(tls_stream))
    }

    fn open_socket(
        config: &TransportConfig,
    ) -> Result<WebSocket<MaybeTlsStream<TcpStream>>, NetworkError> {
        let target = RelayUrl::parse(&config.server_url)?;
        let addr = Self::resolve(&target.host, target.port)?;

        let connect_timeout = Duration::from_millis(config.connect_timeout_ms.max(1));
        let tcp_stream = TcpStream::connect_timeout(&addr, connect_timeout)
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        // Handshakes run with the long timeout, polling reads with the short one.
        let timeout_handle = tcp_stream
            .try_clone()
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;
        timeout_handle
            .set_read_timeout(Some(connect_timeout))
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;
        timeout_handle
            .set_write_timeout(Some(connect_timeout))
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        let stream: MaybeTlsStream<TcpStream> = if target.tls {
            Self::create_tls_stream(&target.host, tcp_stream)?
        } else {
            MaybeTlsStream::Plain(tcp_stream)
        };

        let request = config
            .server_url
            .as_str()
            .into_client_request()
            .map_err(|e| NetworkError::ConnectionFailed(format!("Invalid WebSocket request: {}", e)))?;

        let (socket, _response) = tungstenite::client(request, stream).map_err(|e| {
            NetworkError::ConnectionFailed(format!("WebSocket handshake failed: {}", e))
        })?;

        timeout_handle
            .set_read_timeout(Some(Duration::from_millis(config.io_timeout_ms.max(1))))
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;

        Ok(socket)
    }

    fn mark_closed(&mut self) {
        self.socket = None;
        self.state = ConnectionState::Closed;
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self, config: &TransportConfig) -> TransportResult<()> {
        if self.state.is_open() {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;
        match Self::open_socket(config) {
            Ok(socket) => {
                debug!("WebSocket connected to {}", config.server_url);
                self.socket = Some(socket);
                self.state = ConnectionState::Open;
                Ok(())
            }
            Err(e) => {
                self.mark_closed();
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None); // Ignore errors on close
        }
        self.state = ConnectionState::Disconnected;
        Ok(())
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn send(&mut self, frame: &str) -> TransportResult<()> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;

        let result = socket
            .send(Message::Text(frame.to_string()))
            .and_then(|_| socket.flush());

        match result {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                self.mark_closed();
                Err(NetworkError::ConnectionClosed)
            }
            Err(tungstenite::Error::Io(e)) => {
                self.mark_closed();
                Err(NetworkError::SendFailed(e.to_string()))
            }
            Err(e) => Err(NetworkError::SendFailed(e.to_string())),
        }
    }

    fn receive(&mut self) -> TransportResult<Option<Frame>> {
        let socket = self.socket.as_mut().ok_or(NetworkError::NotConnected)?;

        match socket.read() {
            Ok(Message::Text(text)) => Ok(Some(Frame::Text(text))),
            Ok(Message::Binary(data)) => Ok(Some(Frame::Binary(data))),
            // tungstenite queues the pong itself
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => Ok(None),
            Ok(Message::Close(_)) => {
                self.mark_closed();
                Err(NetworkError::ConnectionClosed)
            }
            Err(tungstenite::Error::Io(ref e))
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                // No frame within the read timeout
                Ok(None)
            }
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => {
                self.mark_closed();
                Err(NetworkError::ConnectionClosed)
            }
            Err(e) => {
                self.mark_closed();
                Err(NetworkError::ReceiveFailed(e.to_string()))
            }
        }
    }

    fn has_pending(&self) -> bool {
        // Caller should use receive() with the read timeout
        false
    }
}
