use crate::{dialect::Dialect, schema::TableDef};

/// Per-type column and placeholder metadata, derived once from a validated
/// [`TableDef`] and shared for the lifetime of the connection's handle.
///
/// Immutable after construction. All binding in the crate follows the
/// ordering captured here, which is the column declaration order.
#[derive(Debug)]
pub struct CachedFields {
    /// Table name
    pub table: String,

    /// Column names, declaration order
    pub fields: Vec<String>,

    /// One bound-parameter placeholder per column, dialect-rendered
    pub placeholders: Vec<String>,

    /// Columns bound on insert: `fields` minus an auto-increment key
    pub insert_fields: Vec<String>,

    /// Placeholders matching `insert_fields`, numbered from 1
    pub insert_placeholders: Vec<String>,

    /// Index of the primary-key column within `fields`
    pub pk: Option<usize>,

    /// True when the primary key is engine-assigned on insert
    pub auto_increment: bool,

    /// Column to name in a conflict clause for upsert-style inserts: the
    /// first UNIQUE column, else a caller-assigned primary key. An
    /// auto-increment key never conflicts since it is not bound.
    pub conflict_target: Option<String>,
}

impl CachedFields {
    pub fn new(def: &TableDef, dialect: &dyn Dialect) -> Self {
        let fields: Vec<String> = def
            .columns
            .iter()
            .map(|column| column.name.to_string())
            .collect();

        let placeholders = (1..=fields.len())
            .map(|index| dialect.placeholder(index))
            .collect();

        let pk = def.primary_key().map(|(index, _)| index);
        let auto_increment = def.columns.iter().any(|column| column.auto_increment);

        let insert_fields: Vec<String> = def
            .columns
            .iter()
            .filter(|column| !column.auto_increment)
            .map(|column| column.name.to_string())
            .collect();

        let insert_placeholders = (1..=insert_fields.len())
            .map(|index| dialect.placeholder(index))
            .collect();

        let conflict_target = def
            .columns
            .iter()
            .find(|column| column.unique)
            .or_else(|| {
                def.columns
                    .iter()
                    .find(|column| column.primary_key && !column.auto_increment)
            })
            .map(|column| column.name.to_string());

        Self {
            table: def.name.to_string(),
            fields,
            placeholders,
            insert_fields,
            insert_placeholders,
            pk,
            auto_increment,
            conflict_target,
        }
    }

    /// Name of the primary-key column, if any.
    pub fn pk_name(&self) -> Option<&str> {
        self.pk.map(|index| self.fields[index].as_str())
    }

    /// Comma-separated column list for SELECT projections.
    pub(crate) fn projection(&self) -> String {
        self.fields.join(", ")
    }
}
