//! Authentication Handshake
//!
//! Three exchanges on a fresh connection, in order:
//!
//! ```text
//! client                                   server
//!   │ ── GetProtocolVersion (254) ───────────▶ │
//!   │ ◀──────────────────────────── version ── │
//!   │ ── LoginGetKeys (0) + login ───────────▶ │
//!   │ ◀──────────── salt 0x00 challenge ────── │
//!   │ ── LoginValidPass (1) + client hash ───▶ │
//!   │ ◀──────────────────────── session key ── │
//! ```
//!
//! The client proves knowledge of the password with
//! `hash = md5hex(md5hex(password ‖ salt) ‖ challenge)`; the password
//! itself never leaves the process.

use crate::codec::{Encode, Writer};
use crate::error::{Result, WireError};
use crate::network::Connection;
use crate::protocol::{HandshakeOp, Operation, Request};

/// Keys derived from the server's salt and challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientKeys {
    /// `hex(md5(password ‖ server_salt))`
    pub salt: String,
    /// `hex(md5(salt ‖ server_challenge))`, sent to the server
    pub hash: String,
}

/// Outcome of a successful handshake
#[derive(Debug, Clone)]
pub struct Handshake {
    pub protocol_version: u8,
    pub session_key: String,
}

/// Derive the client keys from the `LoginGetKeys` payload
/// (`server_salt 0x00 server_challenge`).
pub fn derive_client_keys(password: &[u8], server_keys: &[u8]) -> Result<ClientKeys> {
    let split = server_keys
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| WireError::Handshake {
            step: HandshakeOp::LoginGetKeys.name(),
            message: "server keys lack the salt/challenge separator".to_string(),
        })?;
    let (server_salt, server_challenge) = (&server_keys[..split], &server_keys[split + 1..]);

    let salt = md5_hex(&[password, server_salt]);
    let hash = md5_hex(&[salt.as_bytes(), server_challenge]);
    Ok(ClientKeys { salt, hash })
}

/// Lower-case hex MD5 of the concatenated parts
fn md5_hex(parts: &[&[u8]]) -> String {
    let mut ctx = md5::Context::new();
    for part in parts {
        ctx.consume(part);
    }
    hex::encode(ctx.compute().0)
}

/// A login-step payload.
///
/// The frame's length field doubles as the string's length prefix, so the
/// text is written raw.
struct Credential<'a>(&'a str);

impl Encode for Credential<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_raw(self.0.as_bytes());
    }
}

/// Run the three handshake steps over `conn`.
///
/// On any failure the connection is closed; nothing about it is usable.
pub fn perform(conn: &mut Connection, login: &str, password: &str) -> Result<Handshake> {
    match run_steps(conn, login, password) {
        Ok(handshake) => {
            conn.mark_ready();
            tracing::debug!(
                "Handshake with {} complete (protocol v{})",
                conn.peer_addr(),
                handshake.protocol_version
            );
            Ok(handshake)
        }
        Err(e) => {
            conn.close();
            Err(e)
        }
    }
}

fn run_steps(conn: &mut Connection, login: &str, password: &str) -> Result<Handshake> {
    let protocol_version = step(conn, Request::bare(HandshakeOp::GetProtocolVersion))?.u8()?;

    let request = Request::new(HandshakeOp::LoginGetKeys, &Credential(login))?;
    let server_keys = step(conn, request)?.into_remaining();
    let keys = derive_client_keys(password.as_bytes(), &server_keys)?;

    let request = Request::new(HandshakeOp::LoginValidPass, &Credential(&keys.hash))?;
    let session_key = step(conn, request)?.string()?;

    Ok(Handshake {
        protocol_version,
        session_key,
    })
}

/// One exchange; a server failure becomes a handshake error for this step
fn step(conn: &mut Connection, request: Request) -> Result<crate::codec::Decoder> {
    let name = request.name();
    conn.exchange(&request)?
        .into_decoder(name)
        .map_err(|e| match e {
            WireError::Server { message, .. } => WireError::Handshake { step: name, message },
            other => other,
        })
}
