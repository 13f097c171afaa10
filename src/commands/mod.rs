//! Command Set
//!
//! One `Session` method per server operation. Each method is a pure
//! request/response exchange: build the payload, send it through the
//! session gate, decode the reply or surface the server's error.
//!
//! | Area     | Opcodes                         |
//! |----------|---------------------------------|
//! | database | 1-7                             |
//! | series   | 8                               |
//! | data     | 21, 22, 26-30, 32               |
//! | scan     | 23-25 (pages and checkpoints)   |

mod database;
mod series;
mod data;
mod scan;

pub use scan::{Pager, RangeQuery};

use crate::codec::{Decoder, Encode, Writer};
use crate::error::{Result, WireError};

/// A single length-prefixed string payload
struct Name<'a>(&'a str);

impl Encode for Name<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_str(self.0);
    }
}

/// Read an 8-byte count and reject negative values
fn read_count(dec: &mut Decoder, what: &str) -> Result<u64> {
    let count = dec.i64()?;
    u64::try_from(count)
        .map_err(|_| WireError::Protocol(format!("negative {}: {}", what, count)))
}
