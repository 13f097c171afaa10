//! Series lifecycle commands

use crate::codec::{Encode, Writer};
use crate::error::Result;
use crate::model::Series;
use crate::protocol::{Opcode, Request};
use crate::session::Session;

struct CreateSeries<'a> {
    database: &'a str,
    series: &'a Series,
}

impl Encode for CreateSeries<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        let s = self.series;
        w.put_str(self.database);
        w.put_i64(s.id);
        w.put_str(&s.name);
        w.put_i64(s.data_type);
        w.put_u8(s.view_time_mod);
        w.put_str(&s.comment);
        w.put_u8(s.looping.kind);
        w.put_str(&s.looping.lifetime);
    }
}

impl Session {
    /// Create `series` inside the database named `database`.
    ///
    /// The series' class is not sent; pass it on each data call instead.
    pub fn create_series(&self, database: &str, series: &Series) -> Result<()> {
        self.call(Request::new(Opcode::SeriesCreate, &CreateSeries { database, series })?)?;
        Ok(())
    }
}
