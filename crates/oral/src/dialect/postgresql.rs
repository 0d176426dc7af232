use super::Dialect;
use crate::{
    fields::CachedFields,
    query::{InsertAction, InsertQueryBuilder},
    schema::Type,
};

use std::cell::OnceCell;

/// Standard-SQL flavor. Generates text only; execution in this crate goes
/// through rusqlite. It exists to keep the dialect seam honest: conflict
/// handling is spelled with `ON CONFLICT` clauses rather than SQLite's
/// `INSERT OR …` prefixes.
#[derive(Debug, Default)]
pub struct PostgresqlDialect;

impl Dialect for PostgresqlDialect {
    fn auto_increment_literal(&self) -> &'static str {
        "BIGSERIAL PRIMARY KEY"
    }

    fn column_type(&self, ty: Type) -> &'static str {
        match ty {
            Type::Integer => "BIGINT",
            Type::Real => "DOUBLE PRECISION",
            Type::Text => "TEXT",
            Type::Blob => "BYTEA",
            Type::Boolean => "BOOLEAN",
            Type::Timestamp => "TIMESTAMPTZ",
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("${index}")
    }

    fn insert_builder(&self, fields: &CachedFields) -> Box<dyn InsertQueryBuilder> {
        Box::new(PostgresqlInsertBuilder::new(fields))
    }
}

struct PostgresqlInsertBuilder {
    head: String,

    /// `(conflict target, SET list)` when the table has a column worth
    /// upserting on; `Replace` without one degrades to a plain insert.
    upsert: Option<(String, String)>,

    sql: [OnceCell<String>; InsertAction::COUNT],
}

impl PostgresqlInsertBuilder {
    fn new(fields: &CachedFields) -> Self {
        let head = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            fields.table,
            fields.insert_fields.join(", "),
            fields.insert_placeholders.join(", ")
        );

        let upsert = fields.conflict_target.as_ref().map(|target| {
            let set: Vec<String> = fields
                .insert_fields
                .iter()
                .filter(|field| *field != target)
                .map(|field| format!("{field} = EXCLUDED.{field}"))
                .collect();
            (target.clone(), set.join(", "))
        });

        Self {
            head,
            upsert,
            sql: Default::default(),
        }
    }
}

impl InsertQueryBuilder for PostgresqlInsertBuilder {
    fn sql(&self, action: InsertAction) -> &str {
        self.sql[action.index()].get_or_init(|| match action {
            InsertAction::Default => self.head.clone(),
            InsertAction::Ignore => format!("{} ON CONFLICT DO NOTHING", self.head),
            InsertAction::Replace => match &self.upsert {
                Some((target, set)) if !set.is_empty() => {
                    format!("{} ON CONFLICT ({target}) DO UPDATE SET {set}", self.head)
                }
                _ => self.head.clone(),
            },
        })
    }
}
