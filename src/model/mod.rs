//! Data Model
//!
//! Descriptors and results exchanged with the server.
//!
//! ## Ownership
//! - A server holds databases, keyed by unique name (or by numeric id once
//!   opened)
//! - A database owns series, keyed by caller-assigned id
//! - A series holds rows ordered by timestamp

mod database;
mod series;
mod row;

pub use database::{Database, Looping, StorageKind};
pub use series::Series;
pub use row::{Boundary, Checkpoint, Direction, Page, Row};
