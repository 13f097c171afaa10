//! # tsdbwire
//!
//! Client for the binary TCP protocol of a time-series database server:
//! - Exactly-sized big-endian codec (size → encode → decode)
//! - Opcode + length request framing, status-tagged responses reassembled
//!   by their declared lengths
//! - Salted MD5 challenge-response login
//! - Fixed-width and length-prefixed row values, chosen per series class
//! - Checkpoint-based pagination of range scans
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Command Set (Session methods)               │
//! │        database / series / data / scan + Pager               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Session (send gate: Mutex)                  │
//! │           protocol version + session key (auth)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │ Connection  │
//!   │ (envelope,  │          │ (TcpStream) │
//!   │  values)    │          └─────────────┘
//!   └──────┬──────┘
//!          ▼
//!   ┌─────────────┐
//!   │    Codec    │
//!   │ Sizer/Enc/  │
//!   │   Decoder   │
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use tsdbwire::{Config, RangeQuery, Session, ValueClass};
//!
//! # fn main() -> tsdbwire::Result<()> {
//! let config = Config::builder()
//!     .addr("127.0.0.1:7777")
//!     .credentials("admin", "admin")
//!     .build();
//! let session = Session::connect(config)?;
//!
//! session.open_database(1, "metrics")?;
//! let query = RangeQuery::new(1, 0, ValueClass::Fixed).between(0, 100).limit(50);
//! for page in session.pages(query) {
//!     for row in page?.rows {
//!         println!("{} = {:?}", row.timestamp(), row.as_i64());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod protocol;
pub mod model;
pub mod auth;
pub mod network;
pub mod session;
pub mod commands;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, WireError};
pub use config::Config;
pub use session::Session;
pub use commands::{Pager, RangeQuery};
pub use model::{Boundary, Checkpoint, Database, Direction, Looping, Page, Row, Series, StorageKind};
pub use protocol::{RowBatch, Value, ValueClass};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of tsdbwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
