use crate::{
    dialect::{Dialect, SqliteDialect},
    error::Result,
    fields::CachedFields,
    object::ObjectInfo,
    record::Record,
    transaction::Transaction,
};

use std::{
    any::{Any, TypeId},
    cell::{Cell, RefCell},
    collections::HashMap,
    path::Path,
    rc::{Rc, Weak},
};
use tracing::debug;

/// An open database: the connection, the dialect it speaks, and the
/// per-type registry of object infos.
///
/// Cheap to clone; clones share one underlying connection. The handle is
/// single-threaded (`rusqlite::Connection` is not `Sync`); callers wanting
/// cross-thread access open one database per thread.
#[derive(Debug, Clone)]
pub struct Database {
    inner: Rc<Inner>,
}

#[derive(Debug)]
struct Inner {
    conn: rusqlite::Connection,
    dialect: Box<dyn Dialect>,

    /// One `ObjectInfo` per mapped type, shared by every consumer of that
    /// (type, connection) pair. Held weakly so infos do not keep the
    /// connection alive through a cycle; dropped entries are rebuilt on
    /// the next request.
    registry: RefCell<HashMap<TypeId, Weak<dyn Any>>>,

    /// Set while a transaction guard is alive. Transactions do not nest.
    tx_open: Cell<bool>,
}

impl Database {
    /// Opens (creating if missing) a SQLite database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_dialect(rusqlite::Connection::open(path)?, Box::new(SqliteDialect))
    }

    /// Opens a fresh in-memory SQLite database.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_dialect(
            rusqlite::Connection::open_in_memory()?,
            Box::new(SqliteDialect),
        )
    }

    /// Wraps an already-open connection with an explicit dialect.
    pub fn with_dialect(conn: rusqlite::Connection, dialect: Box<dyn Dialect>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self {
            inner: Rc::new(Inner {
                conn,
                dialect,
                registry: RefCell::new(HashMap::new()),
                tx_open: Cell::new(false),
            }),
        })
    }

    /// Returns the live CRUD handle for `T`, creating it on first use.
    ///
    /// First use validates the table definition (configuration errors
    /// surface here, before any SQL), executes the dialect's CREATE TABLE
    /// IF NOT EXISTS, and builds the field cache. Subsequent calls return
    /// the shared handle.
    pub fn object_info<T: Record + 'static>(&self) -> Result<Rc<ObjectInfo<T>>> {
        let type_id = TypeId::of::<T>();

        if let Some(existing) = self
            .inner
            .registry
            .borrow()
            .get(&type_id)
            .and_then(Weak::upgrade)
            .and_then(|any| any.downcast::<ObjectInfo<T>>().ok())
        {
            return Ok(existing);
        }

        let def = T::table();
        def.validate()?;

        let ddl = self.inner.dialect.create_table_sql(&def);
        debug!(table = def.name, "ensuring table exists");
        self.inner.conn.execute_batch(&ddl)?;

        let fields = Rc::new(CachedFields::new(&def, &*self.inner.dialect));
        let insert = self.inner.dialect.insert_builder(&fields);
        let info = Rc::new(ObjectInfo::new(self.clone(), fields, insert));

        let any: Rc<dyn Any> = info.clone();
        self.inner
            .registry
            .borrow_mut()
            .insert(type_id, Rc::downgrade(&any));

        Ok(info)
    }

    /// Starts a transaction. Errors with
    /// [`Error::NestedTransaction`](crate::Error::NestedTransaction) if one
    /// is already open on this connection.
    pub fn begin(&self) -> Result<Transaction> {
        Transaction::begin(self.clone())
    }

    /// The raw connection, for queries the typed surface does not cover.
    pub fn handle(&self) -> &rusqlite::Connection {
        &self.inner.conn
    }

    pub fn dialect(&self) -> &dyn Dialect {
        &*self.inner.dialect
    }

    pub(crate) fn conn(&self) -> &rusqlite::Connection {
        &self.inner.conn
    }

    pub(crate) fn tx_open(&self) -> &Cell<bool> {
        &self.inner.tx_open
    }
}
