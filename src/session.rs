//! Session Module
//!
//! An authenticated connection, shared safely between callers.
//!
//! ## Concurrency Model: one request in flight
//!
//! Responses carry no request id: they are matched to requests purely by
//! arrival order. Every exchange therefore holds the session's gate from
//! "write request" until "response fully read", so concurrent callers are
//! serialized instead of interleaving frames on the stream.

use parking_lot::Mutex;

use crate::auth;
use crate::codec::Decoder;
use crate::config::Config;
use crate::error::Result;
use crate::network::{Connection, ConnectionState};
use crate::protocol::Request;

/// An authenticated session with the server
pub struct Session {
    /// Send gate; owns the socket exclusively
    conn: Mutex<Connection>,

    protocol_version: u8,
    session_key: String,
    peer_addr: String,
    config: Config,
}

impl Session {
    /// Connect to `config.addr` and log in with `config`'s credentials.
    pub fn connect(config: Config) -> Result<Self> {
        let conn = Connection::connect(&config)?;
        Self::handshake(conn, config)
    }

    /// Log in over an already established connection
    pub fn handshake(mut conn: Connection, config: Config) -> Result<Self> {
        let handshake = auth::perform(&mut conn, &config.login, &config.password)?;
        let peer_addr = conn.peer_addr().to_string();

        Ok(Self {
            conn: Mutex::new(conn),
            protocol_version: handshake.protocol_version,
            session_key: handshake.session_key,
            peer_addr,
            config,
        })
    }

    /// Protocol version negotiated during the handshake
    pub fn protocol_version(&self) -> u8 {
        self.protocol_version
    }

    /// Session key issued by the server
    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.conn.lock().state()
    }

    /// Whether requests can still be issued
    pub fn is_usable(&self) -> bool {
        self.state() == ConnectionState::Ready
    }

    /// Close the underlying socket
    pub fn close(&self) {
        self.conn.lock().close();
    }

    /// One gated exchange; a failure status becomes `WireError::Server`.
    pub(crate) fn call(&self, request: Request) -> Result<Decoder> {
        let response = {
            let mut conn = self.conn.lock();
            conn.exchange(&request)?
        };
        response.into_decoder(request.name())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("peer_addr", &self.peer_addr)
            .field("protocol_version", &self.protocol_version)
            .finish_non_exhaustive()
    }
}
