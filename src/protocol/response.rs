//! Response definitions
//!
//! A fully reassembled response frame.

use bytes::{Buf, Bytes};

use crate::codec::Decoder;
use crate::error::{Result, WireError};

/// Response status byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    /// Any non-zero byte
    Failed(u8),
}

impl From<u8> for Status {
    fn from(byte: u8) -> Self {
        match byte {
            0 => Status::Ok,
            code => Status::Failed(code),
        }
    }
}

impl Status {
    pub fn as_u8(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Failed(code) => code,
        }
    }
}

/// A response read off the wire
#[derive(Debug, Clone)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Success payload (after the redundant length, if any) or the raw
    /// error payload on failure
    pub payload: Bytes,
}

impl Response {
    /// Create an OK response
    pub fn ok(payload: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Ok,
            payload: payload.into(),
        }
    }

    /// Create a failed response carrying the raw error payload
    pub fn failed(code: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            status: Status::Failed(code),
            payload: payload.into(),
        }
    }

    /// Turn a failure into `WireError::Server` tagged with `command`, or
    /// hand back a decoder over the success payload.
    pub fn into_decoder(self, command: &'static str) -> Result<Decoder> {
        match self.status {
            Status::Ok => Ok(Decoder::new(self.payload)),
            Status::Failed(_) => Err(WireError::Server {
                command,
                message: error_message(&self.payload),
            }),
        }
    }

    /// The server's message if this is a failure
    pub fn error_message(&self) -> Option<String> {
        match self.status {
            Status::Ok => None,
            Status::Failed(_) => Some(error_message(&self.payload)),
        }
    }
}

/// Extract the message from a failure payload.
///
/// The payload normally holds one length-prefixed string filling it
/// exactly; anything else is taken verbatim as the message.
pub fn error_message(payload: &[u8]) -> String {
    let mut buf = payload;
    if buf.len() >= 4 {
        let declared = buf.get_i32();
        if declared >= 0 && declared as usize == buf.len() {
            return String::from_utf8_lossy(buf).into_owned();
        }
    }
    String::from_utf8_lossy(payload).into_owned()
}
