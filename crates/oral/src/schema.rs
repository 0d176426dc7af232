use crate::{Error, Result};

/// Column storage type, from the mapping layer's point of view.
///
/// Optionality is a column modifier ([`ColumnDef::nullable`]), not a type;
/// dialects decide the engine-specific spelling of each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    Integer,
    Real,
    Text,
    Blob,
    Boolean,
    Timestamp,
}

/// A single column of a mapped table.
#[derive(Debug, Clone)]
pub struct ColumnDef {
    /// The name of the column in the database.
    pub name: &'static str,

    /// The column storage type.
    pub ty: Type,

    /// Whether or not the column accepts NULL.
    pub nullable: bool,

    /// True if the column is the table's primary key.
    pub primary_key: bool,

    /// True if the column is an integer key assigned by the engine on
    /// insert. Implies `primary_key`.
    pub auto_increment: bool,

    /// True if the column carries a UNIQUE constraint.
    pub unique: bool,

    /// Foreign-key reference as `(table, column)`.
    pub references: Option<(&'static str, &'static str)>,
}

/// A mapped record type: table name plus ordered column definitions.
///
/// Column order is the binding order everywhere else in the crate; it is
/// fixed at declaration and never reordered.
#[derive(Debug, Clone)]
pub struct TableDef {
    /// Name of the table
    pub name: &'static str,

    /// The table's columns, in declaration order
    pub columns: Vec<ColumnDef>,
}

impl ColumnDef {
    pub fn new(name: &'static str, ty: Type) -> Self {
        Self {
            name,
            ty,
            nullable: false,
            primary_key: false,
            auto_increment: false,
            unique: false,
            references: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.primary_key = true;
        self.auto_increment = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some((table, column));
        self
    }
}

impl TableDef {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: vec![],
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    /// The primary-key column, if the table declares one.
    pub fn primary_key(&self) -> Option<(usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.primary_key)
    }

    /// Checks the definition for configuration errors. Runs at registration
    /// time, before any SQL touches the connection.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(self.invalid("table has no columns"));
        }

        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|prev| prev.name == column.name) {
                return Err(self.invalid(format!("duplicate column `{}`", column.name)));
            }

            if column.auto_increment {
                if column.ty != Type::Integer {
                    return Err(self.invalid(format!(
                        "auto-increment column `{}` must be an integer",
                        column.name
                    )));
                }
                if !column.primary_key {
                    return Err(self.invalid(format!(
                        "auto-increment column `{}` must be the primary key",
                        column.name
                    )));
                }
            }
        }

        let pk_count = self
            .columns
            .iter()
            .filter(|column| column.primary_key)
            .count();
        if pk_count > 1 {
            return Err(self.invalid("more than one primary key column"));
        }

        Ok(())
    }

    fn invalid(&self, message: impl Into<String>) -> Error {
        Error::InvalidSchema {
            table: self.name.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TableDef {
        TableDef::new("things")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(ColumnDef::new("name", Type::Text).unique())
    }

    #[test]
    fn valid_definition_passes() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = TableDef::new("empty").validate().unwrap_err();
        assert!(matches!(err, Error::InvalidSchema { .. }));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let def = base().column(ColumnDef::new("name", Type::Text));
        assert!(def.validate().is_err());
    }

    #[test]
    fn auto_increment_requires_integer() {
        let def = TableDef::new("bad").column(ColumnDef::new("id", Type::Text).auto_increment());
        assert!(def.validate().is_err());
    }
}
