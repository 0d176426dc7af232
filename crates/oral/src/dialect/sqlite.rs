use super::Dialect;
use crate::{
    fields::CachedFields,
    query::{InsertAction, InsertQueryBuilder},
    schema::Type,
};

use std::cell::OnceCell;

/// The dialect that actually executes: SQLite via rusqlite.
#[derive(Debug, Default)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn auto_increment_literal(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn column_type(&self, ty: Type) -> &'static str {
        match ty {
            Type::Integer => "INTEGER",
            Type::Real => "REAL",
            Type::Text => "TEXT",
            Type::Blob => "BLOB",
            Type::Boolean => "BOOLEAN",
            Type::Timestamp => "TIMESTAMP",
        }
    }

    fn placeholder(&self, _index: usize) -> String {
        "?".to_string()
    }

    fn insert_builder(&self, fields: &CachedFields) -> Box<dyn InsertQueryBuilder> {
        Box::new(SqliteInsertBuilder::new(fields))
    }
}

/// The suffix (column list + VALUES placeholders) is computed once; only
/// the prefix varies per action, cached one slot per [`InsertAction`].
struct SqliteInsertBuilder {
    suffix: String,
    sql: [OnceCell<String>; InsertAction::COUNT],
}

impl SqliteInsertBuilder {
    fn new(fields: &CachedFields) -> Self {
        Self {
            suffix: format!(
                " INTO {} ({}) VALUES ({})",
                fields.table,
                fields.insert_fields.join(", "),
                fields.insert_placeholders.join(", ")
            ),
            sql: Default::default(),
        }
    }
}

impl InsertQueryBuilder for SqliteInsertBuilder {
    fn sql(&self, action: InsertAction) -> &str {
        self.sql[action.index()].get_or_init(|| {
            let prefix = match action {
                InsertAction::Default => "INSERT",
                InsertAction::Ignore => "INSERT OR IGNORE",
                InsertAction::Replace => "INSERT OR REPLACE",
            };
            format!("{prefix}{}", self.suffix)
        })
    }
}
