//! Server Connection
//!
//! Owns the TCP stream to one server and performs single request/response
//! exchanges over it.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use crate::config::Config;
use crate::error::{Result, WireError};
use crate::protocol::{read_response, write_request, Request, Response};

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Socket connected, handshake not performed
    Connected,
    /// Handshake completed successfully
    Ready,
    /// A transport or framing error left the stream out of sync
    Broken,
    /// Closed by the client
    Closed,
}

/// A connection to a server
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    state: ConnectionState,

    /// Peer address for logging
    peer_addr: String,

    max_payload: usize,
    read_timeout_ms: u64,
    write_timeout_ms: u64,
}

impl Connection {
    /// Connect to `config.addr`, trying each resolved address in turn
    pub fn connect(config: &Config) -> Result<Self> {
        if config.addr.trim().is_empty() {
            return Err(WireError::Config("server address is empty".to_string()));
        }

        let addrs: Vec<SocketAddr> = config.addr.to_socket_addrs()?.collect();
        if addrs.is_empty() {
            return Err(WireError::Config(format!(
                "server address {} did not resolve",
                config.addr
            )));
        }

        let mut last_err = None;
        for addr in &addrs {
            let attempt = match config.connect_timeout() {
                Some(timeout) => TcpStream::connect_timeout(addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream, config),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        let err = last_err.unwrap_or_else(|| ErrorKind::NotConnected.into());
        Err(classify(err.into(), "connect", config.connect_timeout_ms))
    }

    /// Wrap an already connected stream
    ///
    /// Sets up buffered I/O and configures timeouts
    pub fn from_stream(stream: TcpStream, config: &Config) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nodelay(config.nodelay)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        tracing::debug!("Connected to {}", peer_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            state: ConnectionState::Connected,
            peer_addr,
            max_payload: config.max_payload_size,
            read_timeout_ms: config.read_timeout_ms,
            write_timeout_ms: config.write_timeout_ms,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub(crate) fn mark_ready(&mut self) {
        self.state = ConnectionState::Ready;
    }

    /// Send one request and read exactly one response.
    ///
    /// A fatal error moves the connection to `Broken`; a server-reported
    /// failure is returned as a normal response and leaves it usable.
    /// Until the handshake completes only handshake steps may be sent.
    pub(crate) fn exchange(&mut self, request: &Request) -> Result<Response> {
        match self.state {
            ConnectionState::Ready => {}
            ConnectionState::Connected if request.is_pre_login() => {}
            ConnectionState::Connected => {
                return Err(WireError::Protocol(format!(
                    "{} sent before login completed",
                    request.name()
                )))
            }
            ConnectionState::Broken => {
                return Err(WireError::Disconnected(format!(
                    "connection to {} is broken",
                    self.peer_addr
                )))
            }
            ConnectionState::Closed => {
                return Err(WireError::Disconnected(format!(
                    "connection to {} is closed",
                    self.peer_addr
                )))
            }
        }

        tracing::trace!(
            "-> {} op={} payload={}B",
            request.name(),
            request.code(),
            request.payload_len()
        );

        let result = self.round_trip(request);
        match &result {
            Ok(response) => tracing::trace!(
                "<- {} status={} payload={}B",
                request.name(),
                response.status.as_u8(),
                response.payload.len()
            ),
            Err(e) if e.is_fatal() => {
                tracing::debug!("Connection to {} broken during {}", self.peer_addr, request.name());
                self.state = ConnectionState::Broken;
            }
            Err(_) => {}
        }
        result
    }

    fn round_trip(&mut self, request: &Request) -> Result<Response> {
        let (read_ms, write_ms) = (self.read_timeout_ms, self.write_timeout_ms);

        write_request(&mut self.writer, request).map_err(|e| classify(e, "write", write_ms))?;

        read_response(&mut self.reader, request.layout(), request.class(), self.max_payload)
            .map_err(|e| classify(e, "read", read_ms))
    }

    /// Shut the socket down; further exchanges fail with `Disconnected`
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        // The peer may already be gone
        let _ = self.writer.get_ref().shutdown(std::net::Shutdown::Both);
        self.state = ConnectionState::Closed;
        tracing::debug!("Connection to {} closed", self.peer_addr);
    }
}

/// Map socket-level failures to the client taxonomy
fn classify(err: WireError, op: &'static str, timeout_ms: u64) -> WireError {
    match err {
        // Unix reports an expired socket timeout as WouldBlock, Windows as TimedOut
        WireError::Io(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            WireError::Timeout {
                op,
                after_ms: timeout_ms,
            }
        }
        WireError::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof => {
            WireError::Disconnected("server closed the connection mid-frame".to_string())
        }
        other => other,
    }
}
