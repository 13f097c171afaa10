//! In-process mock of the time-series server
//!
//! Speaks the real wire format on a loopback socket and keeps an in-memory
//! store, so session tests exercise the full client stack.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;
use tsdbwire::codec::{encode_exact, Decoder, Encode, Writer};
use tsdbwire::protocol::{read_value, ValueClass};
use tsdbwire::{Config, Database, Looping, StorageKind};

pub const SERVER_SALT: &str = "abc123";
pub const SERVER_CHALLENGE: &str = "def456";
pub const SESSION_KEY: &str = "session-0001";

/// Behaviour switches for one mock instance
#[derive(Debug, Clone)]
pub struct MockOptions {
    pub password: String,
    pub protocol_version: u8,
    /// Write every reply in chunks of this many bytes
    pub chunk: Option<usize>,
    /// Accept connections but never answer
    pub silent: bool,
    /// Stop answering once this opcode arrives
    pub stall_on: Option<u8>,
    /// Resume scans at the checkpoint row itself instead of just past it
    pub inclusive_resume: bool,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            password: "admin".to_string(),
            protocol_version: 3,
            chunk: None,
            silent: false,
            stall_on: None,
            inclusive_resume: false,
        }
    }
}

pub struct MockServer {
    addr: SocketAddr,
}

impl MockServer {
    pub fn start() -> Self {
        Self::with_options(MockOptions::default())
    }

    pub fn with_options(options: MockOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let store = Arc::new(Mutex::new(Store::default()));
        let options = Arc::new(options);

        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let store = Arc::clone(&store);
                let options = Arc::clone(&options);
                thread::spawn(move || {
                    let _ = serve(stream, &store, &options);
                });
            }
        });

        Self { addr }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Client config pointed at this server with the default credentials
    pub fn config(&self) -> Config {
        Config::builder()
            .addr(self.addr())
            .credentials("admin", "admin")
            .read_timeout_ms(2000)
            .write_timeout_ms(2000)
            .build()
    }
}

// =============================================================================
// Store
// =============================================================================

struct SeriesData {
    class: ValueClass,
    rows: BTreeMap<i64, (Bytes, u32)>,
}

#[derive(Default)]
struct Store {
    bases: BTreeMap<String, Database>,
    open: HashMap<i64, String>,
    series: HashMap<(String, i64), SeriesData>,
}

impl Store {
    fn series_mut(&mut self, base_id: i64, series_id: i64) -> Result<&mut SeriesData, String> {
        let base = self
            .open
            .get(&base_id)
            .ok_or_else(|| format!("base {} is not open", base_id))?
            .clone();
        self.series
            .get_mut(&(base, series_id))
            .ok_or_else(|| format!("series {} not found", series_id))
    }
}

// =============================================================================
// Replies
// =============================================================================

enum Reply {
    /// Status byte alone
    Status,
    /// Status + length + payload
    Payload(Bytes),
    /// Status + payload with no length
    Inline(Bytes),
    /// Failure carrying an inner length-prefixed message
    Fail(String),
    /// Failure carrying the message as bare text
    FailBare(String),
}

/// Adapts a closure to `Encode` so replies can be built inline
struct Fields<F>(F);

impl<F: Fn(&mut dyn Writer)> Encode for Fields<F> {
    fn encode<W: Writer>(&self, w: &mut W) {
        (self.0)(w)
    }
}

fn encode<F: Fn(&mut dyn Writer)>(f: F) -> Bytes {
    encode_exact(&Fields(f)).unwrap()
}

impl Reply {
    fn frame(&self) -> Bytes {
        match self {
            Reply::Status => Bytes::from_static(&[0]),
            Reply::Payload(p) => encode(|w| {
                w.put_u8(0);
                w.put_blob(p);
            }),
            Reply::Inline(p) => encode(|w| {
                w.put_u8(0);
                w.put_raw(p);
            }),
            Reply::Fail(msg) => encode(|w| {
                w.put_u8(1);
                w.put_i32(4 + msg.len() as i32);
                w.put_str(msg);
            }),
            Reply::FailBare(msg) => encode(|w| {
                w.put_u8(1);
                w.put_str(msg);
            }),
        }
    }
}

// =============================================================================
// Connection loop
// =============================================================================

fn serve(mut stream: TcpStream, store: &Mutex<Store>, options: &MockOptions) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    if options.silent {
        return drain(&mut stream);
    }

    let mut authed = false;
    while let Some((op, payload)) = read_frame(&mut stream, authed)? {
        if authed && options.stall_on == Some(op) {
            return drain(&mut stream);
        }

        let reply = if authed {
            dispatch(op, payload, store, options)
        } else {
            let (reply, done) = login_step(op, payload, options);
            authed = done;
            reply
        };
        write_reply(&mut stream, &reply.frame(), options.chunk)?;
    }
    Ok(())
}

/// Read and discard until the client goes away
fn drain(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = [0u8; 256];
    while stream.read(&mut buf)? > 0 {}
    Ok(())
}

fn read_frame(stream: &mut TcpStream, authed: bool) -> std::io::Result<Option<(u8, Bytes)>> {
    let mut op = [0u8; 1];
    match stream.read_exact(&mut op) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }

    let bare = if authed { op[0] == 4 } else { op[0] == 254 };
    if bare {
        return Ok(Some((op[0], Bytes::new())));
    }

    let mut len = [0u8; 4];
    stream.read_exact(&mut len)?;
    let mut payload = vec![0u8; i32::from_be_bytes(len) as usize];
    stream.read_exact(&mut payload)?;
    Ok(Some((op[0], Bytes::from(payload))))
}

fn write_reply(stream: &mut TcpStream, frame: &[u8], chunk: Option<usize>) -> std::io::Result<()> {
    match chunk {
        Some(size) => {
            for piece in frame.chunks(size.max(1)) {
                stream.write_all(piece)?;
                stream.flush()?;
                thread::sleep(Duration::from_millis(1));
            }
        }
        None => stream.write_all(frame)?,
    }
    stream.flush()
}

// =============================================================================
// Handshake
// =============================================================================

pub fn md5_hex(parts: &[&[u8]]) -> String {
    let mut ctx = md5::Context::new();
    for part in parts {
        ctx.consume(part);
    }
    hex::encode(ctx.compute().0)
}

/// Hash the client must present for `password`
pub fn expected_hash(password: &str) -> String {
    let salt = md5_hex(&[password.as_bytes(), SERVER_SALT.as_bytes()]);
    md5_hex(&[salt.as_bytes(), SERVER_CHALLENGE.as_bytes()])
}

fn login_step(op: u8, payload: Bytes, options: &MockOptions) -> (Reply, bool) {
    match op {
        254 => (Reply::Payload(Bytes::from(vec![options.protocol_version])), false),
        0 => {
            let keys = format!("{}\0{}", SERVER_SALT, SERVER_CHALLENGE);
            (Reply::Payload(Bytes::from(keys.into_bytes())), false)
        }
        1 => {
            if &payload[..] == expected_hash(&options.password).as_bytes() {
                let key = encode(|w| w.put_str(SESSION_KEY));
                (Reply::Payload(key), true)
            } else {
                (Reply::Fail("invalid login or password".to_string()), false)
            }
        }
        _ => (Reply::Fail("not logged in".to_string()), false),
    }
}

// =============================================================================
// Commands
// =============================================================================

fn dispatch(op: u8, payload: Bytes, store: &Mutex<Store>, options: &MockOptions) -> Reply {
    let mut dec = Decoder::new(payload);
    let mut store = store.lock();
    match handle(op, &mut dec, &mut store, options) {
        Ok(Ok(reply)) => reply,
        Ok(Err(message)) => Reply::Fail(message),
        Err(decode) => Reply::Fail(decode.to_string()),
    }
}

type Outcome = tsdbwire::Result<Result<Reply, String>>;

fn handle(op: u8, dec: &mut Decoder, store: &mut Store, options: &MockOptions) -> Outcome {
    match op {
        1 => {
            let db = Database {
                name: dec.string()?,
                comment: dec.string()?,
                path: dec.string()?,
                storage: StorageKind::from_tag(&dec.string()?),
                size_limit: dec.string()?,
                looping: Looping {
                    kind: dec.u8()?,
                    lifetime: dec.string()?,
                    lifetime_secs: 0,
                },
                auto_add_series: dec.bool()?,
                auto_save: dec.bool()?,
                auto_save_duration: dec.string()?,
                auto_save_interval: dec.string()?,
                status: 0,
            };
            if store.bases.contains_key(&db.name) {
                return Ok(Err(format!("base {} already exists", db.name)));
            }
            store.bases.insert(db.name.clone(), db);
            Ok(Ok(Reply::Status))
        }
        2 => {
            let id = dec.i64()?;
            let name = dec.string()?;
            if !store.bases.contains_key(&name) {
                return Ok(Err(format!("base {} not found", name)));
            }
            store.open.insert(id, name);
            Ok(Ok(Reply::Status))
        }
        3 => {
            let name = dec.string()?;
            Ok(match store.bases.get(&name) {
                Some(db) => Ok(Reply::Payload(describe(db))),
                None => Err(format!("base {} not found", name)),
            })
        }
        4 => {
            let bases: Vec<&Database> = store.bases.values().collect();
            let mut payload = encode(|w| w.put_i64(bases.len() as i64)).to_vec();
            for db in bases {
                payload.extend_from_slice(&describe(db));
            }
            Ok(Ok(Reply::Payload(Bytes::from(payload))))
        }
        5 => {
            let name = dec.string()?;
            if name == "oops" {
                return Ok(Ok(Reply::FailBare("oops!".to_string())));
            }
            if store.bases.remove(&name).is_none() {
                return Ok(Err(format!("base {} not found", name)));
            }
            store.open.retain(|_, base| *base != name);
            store.series.retain(|(base, _), _| *base != name);
            Ok(Ok(Reply::Status))
        }
        6 => {
            let old_name = dec.string()?;
            let Some(mut db) = store.bases.remove(&old_name) else {
                return Ok(Err(format!("base {} not found", old_name)));
            };
            db.name = dec.string()?;
            db.comment = dec.string()?;
            db.path = dec.string()?;
            db.size_limit = dec.string()?;
            db.looping.kind = dec.u8()?;
            db.looping.lifetime = dec.string()?;
            db.auto_add_series = dec.bool()?;
            db.auto_save = dec.bool()?;
            db.auto_save_duration = dec.string()?;
            db.auto_save_interval = dec.string()?;
            store.bases.insert(db.name.clone(), db);
            Ok(Ok(Reply::Status))
        }
        7 => {
            let id = dec.i64()?;
            store.open.remove(&id);
            Ok(Ok(Reply::Status))
        }
        8 => {
            let base = dec.string()?;
            let id = dec.i64()?;
            let _name = dec.string()?;
            let _data_type = dec.i64()?;
            let _view_time_mod = dec.u8()?;
            let _comment = dec.string()?;
            let _looping = (dec.u8()?, dec.string()?);
            if !store.bases.contains_key(&base) {
                return Ok(Err(format!("base {} not found", base)));
            }
            if store.series.contains_key(&(base.clone(), id)) {
                return Ok(Err(format!("series {} already exists", id)));
            }
            let data = SeriesData {
                class: ValueClass::Fixed,
                rows: BTreeMap::new(),
            };
            store.series.insert((base, id), data);
            Ok(Ok(Reply::Status))
        }
        21 => {
            let (base_id, series_id) = (dec.i64()?, dec.i64()?);
            Ok(store.series_mut(base_id, series_id).map(|s| {
                let first = s.rows.keys().next().copied();
                let last = s.rows.keys().next_back().copied();
                let count = s.rows.len() as i64;
                Reply::Payload(encode(|w| {
                    w.put_i64(first.unwrap_or(0));
                    w.put_i64(last.unwrap_or(0));
                    w.put_i64(count);
                    w.put_str(&first.map(|t| checkpoint(series_id, t)).unwrap_or_default());
                    w.put_str(&last.map(|t| checkpoint(series_id, t)).unwrap_or_default());
                }))
            }))
        }
        22 => {
            let (base_id, series_id, ts) = (dec.i64()?, dec.i64()?, dec.i64()?);
            Ok(store
                .series_mut(base_id, series_id)
                .map(|_| Reply::Payload(encode(|w| w.put_str(&checkpoint(series_id, ts))))))
        }
        23 | 24 => {
            let base_id = dec.i64()?;
            let cp = dec.string()?;
            let direction = dec.u8()?;
            let limit = dec.i64()?;
            let (min, max) = if op == 24 {
                let bounds = (dec.i64()?, dec.i64()?);
                let _precision = dec.i16()?;
                bounds
            } else {
                (i64::MIN, i64::MAX)
            };
            let Some((series_id, after)) = parse_checkpoint(&cp) else {
                return Ok(Err(format!("bad checkpoint: {:?}", cp)));
            };
            let resume = Resume {
                at: after,
                inclusive: options.inclusive_resume,
            };
            Ok(store
                .series_mut(base_id, series_id)
                .map(|s| page(series_id, s, direction, limit, min, max, Some(resume))))
        }
        25 => {
            let (base_id, series_id) = (dec.i64()?, dec.i64()?);
            let direction = dec.u8()?;
            let limit = dec.i64()?;
            let (min, max) = (dec.i64()?, dec.i64()?);
            let _precision = dec.i16()?;
            Ok(store
                .series_mut(base_id, series_id)
                .map(|s| page(series_id, s, direction, limit, min, max, None)))
        }
        26 => {
            let (base_id, series_id) = (dec.i64()?, dec.i64()?);
            let class = ValueClass::try_from(dec.u8()?)?;
            let ts = dec.i64()?;
            let value = read_value(dec, class)?;
            let quality = dec.u32()?;
            Ok(store.series_mut(base_id, series_id).map(|s| {
                s.class = class;
                s.rows.insert(ts, (value, quality));
                Reply::Status
            }))
        }
        27 => {
            let (base_id, series_id, ts) = (dec.i64()?, dec.i64()?, dec.i64()?);
            Ok(store.series_mut(base_id, series_id).map(|s| {
                let removed = s.rows.remove(&ts).is_some() as i64;
                Reply::Payload(encode(|w| w.put_i64(removed)))
            }))
        }
        28 => {
            let (base_id, series_id) = (dec.i64()?, dec.i64()?);
            let (from, to) = (dec.i64()?, dec.i64()?);
            Ok(store.series_mut(base_id, series_id).map(|s| {
                let before = s.rows.len();
                s.rows.retain(|ts, _| *ts < from || *ts >= to);
                let removed = (before - s.rows.len()) as i64;
                Reply::Payload(encode(|w| w.put_i64(removed)))
            }))
        }
        29 | 32 => {
            let base_id = dec.i64()?;
            let mut accepted = 0i64;
            while !dec.is_empty() {
                let series_id = dec.i64()?;
                let class = ValueClass::try_from(dec.u8()?)?;
                let ts = dec.i64()?;
                let value = read_value(dec, class)?;
                let quality = dec.u32()?;
                match store.series_mut(base_id, series_id) {
                    Ok(s) => {
                        s.class = class;
                        s.rows.insert(ts, (value, quality));
                        accepted += 1;
                    }
                    Err(message) => return Ok(Err(message)),
                }
            }
            if op == 32 {
                Ok(Ok(Reply::Status))
            } else {
                Ok(Ok(Reply::Payload(encode(|w| w.put_i64(accepted)))))
            }
        }
        30 => {
            let (base_id, series_id, ts) = (dec.i64()?, dec.i64()?, dec.i64()?);
            Ok(store.series_mut(base_id, series_id).and_then(|s| {
                let class = s.class;
                s.rows
                    .range(..=ts)
                    .next_back()
                    .map(|(t, (value, quality))| Reply::Inline(row(*t, class, value, *quality)))
                    .ok_or_else(|| format!("no value at {}", ts))
            }))
        }
        other => Ok(Err(format!("unsupported opcode {}", other))),
    }
}

/// Descriptor in get-info/get-list field order
fn describe(db: &Database) -> Bytes {
    encode(|w| {
        w.put_str(&db.name);
        w.put_str(&db.path);
        w.put_str(&db.comment);
        w.put_i64(db.status);
        w.put_u8(db.looping.kind);
        w.put_str(&db.looping.lifetime);
        w.put_str(&db.size_limit);
        w.put_str(db.storage.as_tag());
        w.put_bool(db.auto_add_series);
        w.put_bool(db.auto_save);
        w.put_str(&db.auto_save_duration);
        w.put_str(&db.auto_save_interval);
    })
}

fn checkpoint(series_id: i64, ts: i64) -> String {
    format!("{}:{}", series_id, ts)
}

fn parse_checkpoint(cp: &str) -> Option<(i64, i64)> {
    let (series, ts) = cp.split_once(':')?;
    Some((series.parse().ok()?, ts.parse().ok()?))
}

/// Where a resumed scan picks up
#[derive(Clone, Copy)]
struct Resume {
    at: i64,
    inclusive: bool,
}

impl Resume {
    fn admits(self, ts: i64, forward: bool) -> bool {
        match (forward, self.inclusive) {
            (true, false) => ts > self.at,
            (true, true) => ts >= self.at,
            (false, false) => ts < self.at,
            (false, true) => ts <= self.at,
        }
    }
}

fn row(ts: i64, class: ValueClass, value: &Bytes, quality: u32) -> Bytes {
    encode(|w| {
        w.put_i64(ts);
        match class {
            ValueClass::Fixed => w.put_raw(value),
            ValueClass::Blob => w.put_blob(value),
        }
        w.put_u32(quality);
    })
}

/// One page of rows in ascending time order.
///
/// Forward pages start at the resume point, backward pages end at it. The
/// checkpoints name the first and last row of the page.
fn page(
    series_id: i64,
    series: &SeriesData,
    direction: u8,
    limit: i64,
    min: i64,
    max: i64,
    resume: Option<Resume>,
) -> Reply {
    let limit = limit.max(0) as usize;
    let forward = direction == 1;
    let in_range = |ts: &i64| {
        min <= *ts && *ts <= max && resume.map_or(true, |r| r.admits(*ts, forward))
    };

    let mut picked: Vec<(&i64, &(Bytes, u32))> = if forward {
        series.rows.iter().filter(|(ts, _)| in_range(ts)).take(limit + 1).collect()
    } else {
        series.rows.iter().rev().filter(|(ts, _)| in_range(ts)).take(limit + 1).collect()
    };

    let more = picked.len() > limit;
    picked.truncate(limit);
    if !forward {
        picked.reverse();
    }

    let start_cp = picked.first().map(|(ts, _)| checkpoint(series_id, **ts)).unwrap_or_default();
    let end_cp = picked.last().map(|(ts, _)| checkpoint(series_id, **ts)).unwrap_or_default();

    let mut payload = encode(|w| {
        w.put_str(&start_cp);
        w.put_str(&end_cp);
        w.put_bool(more);
        w.put_i64(picked.len() as i64);
    })
    .to_vec();
    for (ts, (value, quality)) in &picked {
        payload.extend_from_slice(&row(**ts, series.class, value, *quality));
    }
    Reply::Payload(Bytes::from(payload))
}
