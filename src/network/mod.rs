//! Network Module
//!
//! TCP transport to the server.
//!
//! ## Model
//! - One blocking stream per connection
//! - One request in flight; the next request is written only after the
//!   previous response has been read in full

mod connection;

pub use connection::{Connection, ConnectionState};
