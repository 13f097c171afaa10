//! Data commands: insert, delete, point reads, boundaries

use crate::codec::{Encode, Writer};
use crate::error::Result;
use crate::model::{Boundary, Checkpoint, Row};
use crate::protocol::{Opcode, Request, RowBatch, TypedValue, Value, ValueClass};
use crate::session::Session;
use super::read_count;

/// `base_id + series_id [+ timestamps]`
struct SeriesKey<'a> {
    base_id: i64,
    series_id: i64,
    times: &'a [i64],
}

impl Encode for SeriesKey<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_i64(self.base_id);
        w.put_i64(self.series_id);
        for t in self.times {
            w.put_i64(*t);
        }
    }
}

struct AddRow<'a> {
    base_id: i64,
    series_id: i64,
    timestamp: i64,
    quality: u32,
    value: TypedValue<'a>,
}

impl Encode for AddRow<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_i64(self.base_id);
        w.put_i64(self.series_id);
        w.put_u8(self.value.class() as u8);
        w.put_i64(self.timestamp);
        self.value.encode(w);
        w.put_u32(self.quality);
    }
}

/// `base_id` followed by packed rows; the frame length delimits the rows
struct Batch<'a> {
    base_id: i64,
    rows: &'a RowBatch,
}

impl Encode for Batch<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_i64(self.base_id);
        w.put_raw(self.rows.as_bytes());
    }
}

impl Session {
    /// Time range, row count and edge checkpoints of a series
    pub fn boundary(&self, base_id: i64, series_id: i64) -> Result<Boundary> {
        let key = SeriesKey { base_id, series_id, times: &[] };
        let mut dec = self.call(Request::new(Opcode::DataGetBoundary, &key)?)?;
        Boundary::decode(&mut dec)
    }

    /// Checkpoint positioned at `timestamp`
    pub fn checkpoint_at(&self, base_id: i64, series_id: i64, timestamp: i64) -> Result<Checkpoint> {
        let key = SeriesKey { base_id, series_id, times: &[timestamp] };
        let mut dec = self.call(Request::new(Opcode::DataGetCP, &key)?)?;
        Checkpoint::decode(&mut dec)
    }

    /// Insert a single row.
    ///
    /// `value` is checked against `class` before anything is sent.
    pub fn add_row(
        &self,
        base_id: i64,
        series_id: i64,
        class: ValueClass,
        timestamp: i64,
        quality: u32,
        value: &Value,
    ) -> Result<()> {
        let payload = AddRow {
            base_id,
            series_id,
            timestamp,
            quality,
            value: TypedValue::new(class, value)?,
        };
        self.call(Request::new(Opcode::DataAddRow, &payload)?)?;
        Ok(())
    }

    /// Insert packed rows directly
    pub fn add_rows(&self, base_id: i64, rows: &RowBatch) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }
        self.call(Request::new(Opcode::DataAddRows, &Batch { base_id, rows })?)?;
        Ok(())
    }

    /// Insert packed rows through the server's write cache.
    ///
    /// Returns the number of rows the server accepted.
    pub fn add_rows_cached(&self, base_id: i64, rows: &RowBatch) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut dec = self.call(Request::new(Opcode::DataAddRowCache, &Batch { base_id, rows })?)?;
        read_count(&mut dec, "accepted row count")
    }

    /// Delete the row stored at `timestamp`; returns the deleted count
    pub fn delete_row(&self, base_id: i64, series_id: i64, timestamp: i64) -> Result<u64> {
        let key = SeriesKey { base_id, series_id, times: &[timestamp] };
        let mut dec = self.call(Request::new(Opcode::DataDeleteRow, &key)?)?;
        read_count(&mut dec, "deleted row count")
    }

    /// Delete rows between `from` and `to`; returns the deleted count.
    ///
    /// Bound inclusivity is decided by the server.
    pub fn delete_rows(&self, base_id: i64, series_id: i64, from: i64, to: i64) -> Result<u64> {
        let key = SeriesKey { base_id, series_id, times: &[from, to] };
        let mut dec = self.call(Request::new(Opcode::DataDeleteRows, &key)?)?;
        read_count(&mut dec, "deleted row count")
    }

    /// The row in effect at `timestamp`
    pub fn value_at_time(
        &self,
        base_id: i64,
        series_id: i64,
        timestamp: i64,
        class: ValueClass,
    ) -> Result<Row> {
        let key = SeriesKey { base_id, series_id, times: &[timestamp] };
        let request = Request::new(Opcode::DataGetValueAtTime, &key)?.with_class(class);
        let mut dec = self.call(request)?;
        Row::decode(&mut dec, class)
    }
}
