//! Database lifecycle commands

use crate::codec::{Encode, Writer};
use crate::error::Result;
use crate::model::Database;
use crate::protocol::{Opcode, Request};
use crate::session::Session;
use super::{read_count, Name};

/// Create payload: name, comment, path, storage, size limit, looping,
/// flags, auto-save literals
struct CreateDatabase<'a>(&'a Database);

impl Encode for CreateDatabase<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        let db = self.0;
        w.put_str(&db.name);
        w.put_str(&db.comment);
        w.put_str(&db.path);
        w.put_str(db.storage.as_tag());
        w.put_str(&db.size_limit);
        w.put_u8(db.looping.kind);
        w.put_str(&db.looping.lifetime);
        w.put_bool(db.auto_add_series);
        w.put_bool(db.auto_save);
        w.put_str(&db.auto_save_duration);
        w.put_str(&db.auto_save_interval);
    }
}

/// Update payload: like create, keyed by the old name, without storage kind
struct UpdateDatabase<'a> {
    old_name: &'a str,
    db: &'a Database,
}

impl Encode for UpdateDatabase<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        let db = self.db;
        w.put_str(self.old_name);
        w.put_str(&db.name);
        w.put_str(&db.comment);
        w.put_str(&db.path);
        w.put_str(&db.size_limit);
        w.put_u8(db.looping.kind);
        w.put_str(&db.looping.lifetime);
        w.put_bool(db.auto_add_series);
        w.put_bool(db.auto_save);
        w.put_str(&db.auto_save_duration);
        w.put_str(&db.auto_save_interval);
    }
}

struct OpenDatabase<'a> {
    id: i64,
    name: &'a str,
}

impl Encode for OpenDatabase<'_> {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_i64(self.id);
        w.put_str(self.name);
    }
}

struct DatabaseId(i64);

impl Encode for DatabaseId {
    fn encode<W: Writer>(&self, w: &mut W) {
        w.put_i64(self.0);
    }
}

impl Session {
    /// Create a database from its descriptor
    pub fn create_database(&self, db: &Database) -> Result<()> {
        self.call(Request::new(Opcode::BaseCreate, &CreateDatabase(db))?)?;
        Ok(())
    }

    /// Open database `name` under the caller-chosen numeric `id`.
    ///
    /// Data commands address the database by this id afterwards.
    pub fn open_database(&self, id: i64, name: &str) -> Result<()> {
        self.call(Request::new(Opcode::BaseOpen, &OpenDatabase { id, name })?)?;
        Ok(())
    }

    /// Fetch one descriptor by name
    pub fn database_info(&self, name: &str) -> Result<Database> {
        let mut dec = self.call(Request::new(Opcode::BaseGetInfo, &Name(name))?)?;
        Database::decode(&mut dec)
    }

    /// Fetch every database descriptor on the server
    pub fn list_databases(&self) -> Result<Vec<Database>> {
        let mut dec = self.call(Request::bare(Opcode::BaseGetList))?;
        let count = read_count(&mut dec, "database count")?;
        (0..count).map(|_| Database::decode(&mut dec)).collect()
    }

    pub fn remove_database(&self, name: &str) -> Result<()> {
        self.call(Request::new(Opcode::BaseRemove, &Name(name))?)?;
        Ok(())
    }

    /// Replace the descriptor of `old_name` (renaming it if `db.name` differs)
    pub fn update_database(&self, old_name: &str, db: &Database) -> Result<()> {
        self.call(Request::new(Opcode::BaseUpdate, &UpdateDatabase { old_name, db })?)?;
        Ok(())
    }

    /// Close a database opened with `open_database`
    pub fn close_database(&self, id: i64) -> Result<()> {
        self.call(Request::new(Opcode::BaseClose, &DatabaseId(id))?)?;
        Ok(())
    }
}
