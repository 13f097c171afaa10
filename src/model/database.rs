//! Database descriptor

use std::fmt;

use crate::codec::Decoder;
use crate::error::Result;

/// Storage layout of a database on the server
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StorageKind {
    /// Whole database in a single segment file
    #[default]
    SingleSegment,
    /// Split into 1 GB parts
    Multipart,
    /// Held in memory
    Memory,
    /// A tag this client does not know, kept verbatim
    Other(String),
}

impl StorageKind {
    /// Tag sent on the wire
    pub fn as_tag(&self) -> &str {
        match self {
            StorageKind::SingleSegment => "fs",
            StorageKind::Multipart => "fs_mp",
            StorageKind::Memory => "mem_fs",
            StorageKind::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "fs" => StorageKind::SingleSegment,
            "fs_mp" => StorageKind::Multipart,
            "mem_fs" => StorageKind::Memory,
            other => StorageKind::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Retention policy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Looping {
    /// Policy type byte
    pub kind: u8,

    /// Lifetime literal as the server understands it
    pub lifetime: String,

    /// Lifetime in seconds; client-side only, not carried on the wire
    pub lifetime_secs: u64,
}

/// Database descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Database {
    /// Unique within a server instance
    pub name: String,
    pub path: String,
    pub comment: String,
    /// Status flags, set by the server
    pub status: i64,
    pub looping: Looping,
    /// Storage size limit, e.g. "100m"
    pub size_limit: String,
    pub storage: StorageKind,
    pub auto_add_series: bool,
    pub auto_save: bool,
    pub auto_save_duration: String,
    pub auto_save_interval: String,
}

impl Database {
    /// Create a descriptor with the given name and defaults elsewhere
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_size_limit(mut self, limit: impl Into<String>) -> Self {
        self.size_limit = limit.into();
        self
    }

    pub fn with_storage(mut self, storage: StorageKind) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_looping(mut self, looping: Looping) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_auto_add_series(mut self, enabled: bool) -> Self {
        self.auto_add_series = enabled;
        self
    }

    /// Enable auto-save with the given duration and interval literals
    pub fn with_auto_save(mut self, duration: impl Into<String>, interval: impl Into<String>) -> Self {
        self.auto_save = true;
        self.auto_save_duration = duration.into();
        self.auto_save_interval = interval.into();
        self
    }

    /// Decode a descriptor as returned by get-info and get-list.
    ///
    /// Field order differs from the create/update requests.
    pub fn decode(dec: &mut Decoder) -> Result<Self> {
        Ok(Self {
            name: dec.string()?,
            path: dec.string()?,
            comment: dec.string()?,
            status: dec.i64()?,
            looping: Looping {
                kind: dec.u8()?,
                lifetime: dec.string()?,
                lifetime_secs: 0,
            },
            size_limit: dec.string()?,
            storage: StorageKind::from_tag(&dec.string()?),
            auto_add_series: dec.bool()?,
            auto_save: dec.bool()?,
            auto_save_duration: dec.string()?,
            auto_save_interval: dec.string()?,
        })
    }
}
