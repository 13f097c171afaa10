//! Range scans and checkpoint pagination
//!
//! A scan returns a [`Page`] bounded by two opaque checkpoints. To continue,
//! the caller hands the checkpoint at the page edge back to the server along
//! with a direction, and stops once a page reports no continuation.
//!
//! ```text
//! range(q) ──▶ Page{rows, start_cp, end_cp, more=true}
//!                                        │
//! range_from_checkpoint(q, end_cp) ◀─────┘ ──▶ Page{.., more=false} ──▶ done
//! ```

use crate::codec::{Encode, Writer};
use crate::error::Result;
use crate::model::{Checkpoint, Direction, Page, Row};
use crate::protocol::{Opcode, Request, ValueClass};
use crate::session::Session;

/// Parameters of a time-bounded scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub base_id: i64,
    pub series_id: i64,
    pub class: ValueClass,
    pub direction: Direction,
    /// Maximum rows per page
    pub limit: i64,
    pub min: i64,
    pub max: i64,
    /// Thinning precision; 0 returns every row
    pub precision: i16,
}

impl RangeQuery {
    /// Default page size
    pub const DEFAULT_LIMIT: i64 = 1000;

    /// Forward scan over the whole series
    pub fn new(base_id: i64, series_id: i64, class: ValueClass) -> Self {
        Self {
            base_id,
            series_id,
            class,
            direction: Direction::Forward,
            limit: Self::DEFAULT_LIMIT,
            min: i64::MIN,
            max: i64::MAX,
            precision: 0,
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Restrict to timestamps between `min` and `max`
    pub fn between(mut self, min: i64, max: i64) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn precision(mut self, precision: i16) -> Self {
        self.precision = precision;
        self
    }
}

/// Opcode 25: ids, direction, limit, bounds, precision
struct RangeDirection<'a>(&'a RangeQuery);

impl Encode for RangeDirection<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        let q = self.0;
        w.put_i64(q.base_id);
        w.put_i64(q.series_id);
        w.put_u8(q.direction as u8);
        w.put_i64(q.limit);
        w.put_i64(q.min);
        w.put_i64(q.max);
        w.put_i16(q.precision);
    }
}

/// Opcodes 23/24: base id, checkpoint, direction, limit [+ bounds, precision]
struct FromCheckpoint<'a> {
    base_id: i64,
    checkpoint: &'a Checkpoint,
    direction: Direction,
    limit: i64,
    bounds: Option<(i64, i64, i16)>,
}

impl Encode for FromCheckpoint<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_i64(self.base_id);
        w.put_blob(self.checkpoint.as_bytes());
        w.put_u8(self.direction as u8);
        w.put_i64(self.limit);
        if let Some((min, max, precision)) = self.bounds {
            w.put_i64(min);
            w.put_i64(max);
            w.put_i16(precision);
        }
    }
}

impl Session {
    /// First page of a time-bounded scan
    pub fn range(&self, query: &RangeQuery) -> Result<Page> {
        let mut dec = self.call(Request::new(Opcode::DataGetRangeDirection, &RangeDirection(query))?)?;
        Page::decode(&mut dec, query.class)
    }

    /// Page starting at `checkpoint`, unbounded in time
    pub fn scan_from_checkpoint(
        &self,
        base_id: i64,
        checkpoint: &Checkpoint,
        direction: Direction,
        limit: i64,
        class: ValueClass,
    ) -> Result<Page> {
        let payload = FromCheckpoint {
            base_id,
            checkpoint,
            direction,
            limit,
            bounds: None,
        };
        let mut dec = self.call(Request::new(Opcode::DataGetFromCP, &payload)?)?;
        Page::decode(&mut dec, class)
    }

    /// Page starting at `checkpoint`, still bounded by the query's range
    pub fn range_from_checkpoint(&self, query: &RangeQuery, checkpoint: &Checkpoint) -> Result<Page> {
        let payload = FromCheckpoint {
            base_id: query.base_id,
            checkpoint,
            direction: query.direction,
            limit: query.limit,
            bounds: Some((query.min, query.max, query.precision)),
        };
        let mut dec = self.call(Request::new(Opcode::DataGetRangeFromCP, &payload)?)?;
        Page::decode(&mut dec, query.class)
    }

    /// Iterate over every page of `query`
    pub fn pages(&self, query: RangeQuery) -> Pager<'_> {
        Pager {
            session: self,
            query,
            state: PagerState::Start,
            last_seen: None,
        }
    }

    /// All rows of `query`, following checkpoints until the scan ends
    pub fn scan_all(&self, query: RangeQuery) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        for page in self.pages(query) {
            rows.extend(page?.rows);
        }
        Ok(rows)
    }
}

enum PagerState {
    Start,
    Resume(Checkpoint),
    Done,
}

/// Iterator over the pages of a range scan.
///
/// A server may resume at the checkpoint row itself or just past it, so
/// rows at or behind the last timestamp already yielded are dropped. A
/// resumed page left with no new rows ends the scan. So does a page without
/// continuation or the first error.
pub struct Pager<'a> {
    session: &'a Session,
    query: RangeQuery,
    state: PagerState,
    /// Furthest timestamp yielded so far in the scan direction
    last_seen: Option<i64>,
}

impl Pager<'_> {
    pub fn query(&self) -> &RangeQuery {
        &self.query
    }
}

/// Whether `ts` lies strictly beyond `last` when moving in `direction`
fn is_beyond(direction: Direction, ts: i64, last: i64) -> bool {
    match direction {
        Direction::Forward => ts > last,
        Direction::Backward => ts < last,
    }
}

impl Iterator for Pager<'_> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = match std::mem::replace(&mut self.state, PagerState::Done) {
            PagerState::Done => return None,
            PagerState::Start => self.session.range(&self.query),
            PagerState::Resume(cp) => self.session.range_from_checkpoint(&self.query, &cp),
        };
        let mut page = match result {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };

        let direction = self.query.direction;
        if let Some(last) = self.last_seen {
            page.rows.retain(|row| is_beyond(direction, row.timestamp(), last));
            if page.is_empty() {
                tracing::trace!("Resumed page added no rows; scan ends");
                return None;
            }
        }

        let edge = match direction {
            Direction::Forward => page.rows.iter().map(Row::timestamp).max(),
            Direction::Backward => page.rows.iter().map(Row::timestamp).min(),
        };
        if let Some(edge) = edge {
            self.last_seen = Some(edge);
        }

        if page.has_continuation && !page.is_empty() {
            let resume = page.resume_point(direction).clone();
            tracing::trace!("Scan continues from checkpoint {}", resume);
            self.state = PagerState::Resume(resume);
        }
        Some(Ok(page))
    }
}
