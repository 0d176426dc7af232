use crate::{
    database::Database,
    error::{Error, Result},
    fields::CachedFields,
    query::{Filter, InsertAction, InsertQueryBuilder},
    record::Record,
    value::Value,
};

use rusqlite::params_from_iter;
use std::{cell::OnceCell, marker::PhantomData, rc::Rc};

/// Outcome of an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    /// Rows actually written. Zero when [`InsertAction::Ignore`] hit an
    /// existing row.
    pub rows: usize,

    /// The engine-assigned key, when the table has an auto-increment
    /// primary key and a row was written.
    pub id: Option<i64>,
}

/// The live CRUD handle binding one record type to one open database.
///
/// Obtained from [`Database::object_info`] and shared (`Rc`) by every
/// consumer of that (type, connection) pair. Enum-keyed statement text is
/// built lazily and cached for the handle's lifetime; preparation goes
/// through the connection's statement cache, so each distinct statement is
/// prepared once per connection. All operations execute in call order on
/// the single owning thread.
pub struct ObjectInfo<T: Record> {
    db: Database,
    fields: Rc<CachedFields>,
    insert: Box<dyn InsertQueryBuilder>,
    update_sql: OnceCell<String>,
    select_all_sql: OnceCell<String>,
    select_by_key_sql: OnceCell<String>,
    delete_by_key_sql: OnceCell<String>,
    count_all_sql: OnceCell<String>,
    _record: PhantomData<T>,
}

impl<T: Record> ObjectInfo<T> {
    pub(crate) fn new(
        db: Database,
        fields: Rc<CachedFields>,
        insert: Box<dyn InsertQueryBuilder>,
    ) -> Self {
        Self {
            db,
            fields,
            insert,
            update_sql: OnceCell::new(),
            select_all_sql: OnceCell::new(),
            select_by_key_sql: OnceCell::new(),
            delete_by_key_sql: OnceCell::new(),
            count_all_sql: OnceCell::new(),
            _record: PhantomData,
        }
    }

    /// The derived field metadata for this type.
    pub fn fields(&self) -> &CachedFields {
        &self.fields
    }

    /// Inserts with [`InsertAction::Default`].
    pub fn insert(&self, record: &T) -> Result<Inserted> {
        self.insert_action(record, InsertAction::Default)
    }

    /// Inserts with an explicit conflict policy. An auto-increment primary
    /// key is not bound; the assigned key comes back in [`Inserted::id`].
    pub fn insert_action(&self, record: &T, action: InsertAction) -> Result<Inserted> {
        let values = self.bound_values(record)?;
        let params: Vec<&Value> = values
            .iter()
            .enumerate()
            .filter(|(index, _)| !(self.fields.auto_increment && Some(*index) == self.fields.pk))
            .map(|(_, value)| value)
            .collect();

        let mut stmt = self.db.conn().prepare_cached(self.insert.sql(action))?;
        let rows = stmt.execute(params_from_iter(params))?;

        let id = (self.fields.auto_increment && rows > 0)
            .then(|| self.db.conn().last_insert_rowid());

        Ok(Inserted { rows, id })
    }

    /// Writes all non-key fields of the row matching the record's primary
    /// key. Zero affected rows is not an error; a table with no non-key
    /// columns has nothing to write and reports zero without touching the
    /// engine.
    pub fn update(&self, record: &T) -> Result<usize> {
        let pk = self.pk_index()?;
        let values = self.bound_values(record)?;

        if self.fields.fields.len() == 1 {
            return Ok(0);
        }

        let sql = self.update_sql.get_or_init(|| {
            let dialect = self.db.dialect();
            let mut bound = 0;
            let assignments: Vec<String> = self
                .fields
                .fields
                .iter()
                .enumerate()
                .filter(|(index, _)| *index != pk)
                .map(|(_, field)| {
                    bound += 1;
                    format!("{field} = {}", dialect.placeholder(bound))
                })
                .collect();

            format!(
                "UPDATE {} SET {} WHERE {} = {}",
                self.fields.table,
                assignments.join(", "),
                self.fields.fields[pk],
                dialect.placeholder(bound + 1)
            )
        });

        let mut params: Vec<&Value> = values
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != pk)
            .map(|(_, value)| value)
            .collect();
        params.push(&values[pk]);

        let mut stmt = self.db.conn().prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter(params))?)
    }

    /// All rows matching the filter, materialized in engine order.
    pub fn select(&self, filter: &Filter) -> Result<Vec<T>> {
        let mut params = Vec::new();
        let clause = filter.to_where(self.db.dialect(), &mut params);

        if clause.is_empty() {
            let sql = self.select_all_sql.get_or_init(|| {
                format!(
                    "SELECT {} FROM {}",
                    self.fields.projection(),
                    self.fields.table
                )
            });
            self.query(sql, &params)
        } else {
            let sql = format!(
                "SELECT {} FROM {}{}",
                self.fields.projection(),
                self.fields.table,
                clause
            );
            self.query(&sql, &params)
        }
    }

    /// The first row matching the filter, or `None`.
    pub fn select_one(&self, filter: &Filter) -> Result<Option<T>> {
        let mut params = Vec::new();
        let clause = filter.to_where(self.db.dialect(), &mut params);
        let sql = format!(
            "SELECT {} FROM {}{} LIMIT 1",
            self.fields.projection(),
            self.fields.table,
            clause
        );
        Ok(self.query(&sql, &params)?.pop())
    }

    /// The matching row with the highest primary key, or `None`.
    pub fn last(&self, filter: &Filter) -> Result<Option<T>> {
        let pk = self.pk_index()?;
        let mut params = Vec::new();
        let clause = filter.to_where(self.db.dialect(), &mut params);
        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} DESC LIMIT 1",
            self.fields.projection(),
            self.fields.table,
            clause,
            self.fields.fields[pk]
        );
        Ok(self.query(&sql, &params)?.pop())
    }

    /// Looks a row up by primary key. A missing key is `None`, not an
    /// error.
    pub fn find(&self, key: &Value) -> Result<Option<T>> {
        let pk = self.pk_index()?;

        let sql = self.select_by_key_sql.get_or_init(|| {
            format!(
                "SELECT {} FROM {} WHERE {} = {}",
                self.fields.projection(),
                self.fields.table,
                self.fields.fields[pk],
                self.db.dialect().placeholder(1)
            )
        });

        Ok(self.query(sql, std::slice::from_ref(key))?.pop())
    }

    /// Number of rows matching the filter.
    pub fn count(&self, filter: &Filter) -> Result<u64> {
        let mut params = Vec::new();
        let clause = filter.to_where(self.db.dialect(), &mut params);

        let count: i64 = if clause.is_empty() {
            let sql = self
                .count_all_sql
                .get_or_init(|| format!("SELECT COUNT(*) FROM {}", self.fields.table));
            self.db
                .conn()
                .prepare_cached(sql)?
                .query_row([], |row| row.get(0))?
        } else {
            let sql = format!("SELECT COUNT(*) FROM {}{}", self.fields.table, clause);
            self.db
                .conn()
                .prepare_cached(&sql)?
                .query_row(params_from_iter(params.iter()), |row| row.get(0))?
        };

        Ok(count as u64)
    }

    /// Deletes all rows matching the filter; returns the affected count.
    pub fn delete(&self, filter: &Filter) -> Result<usize> {
        let mut params = Vec::new();
        let clause = filter.to_where(self.db.dialect(), &mut params);
        let sql = format!("DELETE FROM {}{}", self.fields.table, clause);

        let mut stmt = self.db.conn().prepare_cached(&sql)?;
        Ok(stmt.execute(params_from_iter(params.iter()))?)
    }

    /// Deletes the row with the given primary key; zero affected rows is
    /// not an error.
    pub fn delete_by_key(&self, key: &Value) -> Result<usize> {
        let pk = self.pk_index()?;

        let sql = self.delete_by_key_sql.get_or_init(|| {
            format!(
                "DELETE FROM {} WHERE {} = {}",
                self.fields.table,
                self.fields.fields[pk],
                self.db.dialect().placeholder(1)
            )
        });

        let mut stmt = self.db.conn().prepare_cached(sql)?;
        Ok(stmt.execute(params_from_iter([key]))?)
    }

    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<T>> {
        let mut stmt = self.db.conn().prepare_cached(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| T::from_row(row))?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Error::from)
    }

    fn bound_values(&self, record: &T) -> Result<Vec<Value>> {
        let values = record.values();
        if values.len() != self.fields.fields.len() {
            return Err(Error::InvalidSchema {
                table: self.fields.table.clone(),
                message: format!(
                    "record bound {} values for {} columns",
                    values.len(),
                    self.fields.fields.len()
                ),
            });
        }
        Ok(values)
    }

    fn pk_index(&self) -> Result<usize> {
        self.fields.pk.ok_or_else(|| Error::InvalidSchema {
            table: self.fields.table.clone(),
            message: "operation requires a primary key".to_string(),
        })
    }
}
