//! Series descriptor

use crate::protocol::ValueClass;
use super::Looping;

/// A series inside a database
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Series {
    /// Caller-assigned id, unique within the database
    pub id: i64,
    pub name: String,
    /// Logical data type as enumerated by the server
    pub data_type: i64,
    /// Value layout; the create request does not carry it, data calls do
    pub class: ValueClass,
    pub view_time_mod: u8,
    pub comment: String,
    pub looping: Looping,
}

impl Series {
    pub fn new(id: i64, name: impl Into<String>, data_type: i64) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: ValueClass) -> Self {
        self.class = class;
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_view_time_mod(mut self, modifier: u8) -> Self {
        self.view_time_mod = modifier;
        self
    }

    pub fn with_looping(mut self, looping: Looping) -> Self {
        self.looping = looping;
        self
    }
}
