mod postgresql;
mod sqlite;

pub use postgresql::PostgresqlDialect;
pub use sqlite::SqliteDialect;

use crate::{
    fields::CachedFields,
    query::InsertQueryBuilder,
    schema::{TableDef, Type},
};

use std::fmt;

/// SQL-engine strategy: everything whose phrasing differs between engines.
///
/// One implementation per supported engine, injected when the
/// [`Database`](crate::Database) is constructed. Adding an engine means
/// implementing this trait; query builders and object infos are untouched.
/// The observable difference is the generated SQL text, most visibly the
/// insert conflict policies ([`SqliteDialect`] emits `INSERT OR
/// IGNORE/REPLACE`, [`PostgresqlDialect`] emits `ON CONFLICT` clauses) and
/// the auto-increment primary-key literal.
pub trait Dialect: fmt::Debug {
    /// Column literal for an engine-assigned integer primary key.
    fn auto_increment_literal(&self) -> &'static str;

    /// Engine spelling of a column storage type.
    fn column_type(&self, ty: Type) -> &'static str;

    /// Bound-parameter placeholder for the `index`-th parameter (1-based).
    fn placeholder(&self, index: usize) -> String;

    /// Builds the per-type insert-statement source.
    fn insert_builder(&self, fields: &CachedFields) -> Box<dyn InsertQueryBuilder>;

    /// `CREATE TABLE IF NOT EXISTS` DDL for a validated definition,
    /// including constraints and foreign-key clauses.
    fn create_table_sql(&self, def: &TableDef) -> String {
        let columns: Vec<String> = def
            .columns
            .iter()
            .map(|column| {
                if column.auto_increment {
                    return format!("{} {}", column.name, self.auto_increment_literal());
                }

                let mut out = format!("{} {}", column.name, self.column_type(column.ty));
                if column.primary_key {
                    out.push_str(" PRIMARY KEY");
                } else if !column.nullable {
                    out.push_str(" NOT NULL");
                }
                if column.unique {
                    out.push_str(" UNIQUE");
                }
                if let Some((table, target)) = column.references {
                    out.push_str(&format!(" REFERENCES {table} ({target})"));
                }
                out
            })
            .collect();

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            def.name,
            columns.join(", ")
        )
    }
}
