//! Protocol Module
//!
//! Defines the wire protocol spoken with the server.
//!
//! ## Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Op (1)   │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ## Response Format
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │Status(1) │ failure: Len (4) + message              │
//! │          │ success: opcode-specific (ReplyLayout)  │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - anything else: failure, message attached

mod opcode;
mod response;
mod envelope;
pub mod value;

pub use opcode::{HandshakeOp, Opcode, Operation, ReplyLayout};
pub use response::{error_message, Response, Status};
pub use envelope::{read_response, write_request, Request, HEADER_SIZE};
pub use value::{pack_row, read_value, RowBatch, TypedValue, Value, ValueClass};
