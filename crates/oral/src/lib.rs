//! A small object-relational persistence layer over SQLite.
//!
//! A record type describes its table once ([`Record::table`]); opening a
//! [`Database`] and asking for an [`ObjectInfo`] handle creates the table,
//! derives the per-type field cache, and exposes typed CRUD operations
//! backed by lazily-built, connection-cached prepared statements. SQL
//! phrasing that differs between engines (autoincrement literals, insert
//! conflict policies) lives behind the [`Dialect`] trait.

mod database;
mod dialect;
mod error;
mod fields;
mod object;
mod query;
mod record;
mod schema;
mod transaction;
mod value;

pub use database::Database;
pub use dialect::{Dialect, PostgresqlDialect, SqliteDialect};
pub use error::{Error, Result};
pub use fields::CachedFields;
pub use object::{Inserted, ObjectInfo};
pub use query::{Filter, InsertAction, InsertQueryBuilder};
pub use record::Record;
pub use schema::{ColumnDef, TableDef, Type};
pub use transaction::Transaction;
pub use value::{Timestamp, Value};

/// Re-exported so consumers can implement [`Record::from_row`] without
/// depending on rusqlite directly.
pub use rusqlite;
