use crate::{schema::TableDef, value::Value};

/// Binds a plain Rust struct to one SQL table.
///
/// Implementations describe their table shape once and convert between the
/// struct and bound parameters / result rows. Field order must match the
/// column order of [`Record::table`] exactly: [`values`](Record::values)
/// returns one value per declared column (including an auto-increment key,
/// which the layer skips on insert), and [`from_row`](Record::from_row)
/// reads columns by the same indices.
pub trait Record: Sized {
    /// The table this record maps to.
    fn table() -> TableDef;

    /// The record's field values, in column declaration order.
    fn values(&self) -> Vec<Value>;

    /// Materializes a record from a result row. Column indices follow the
    /// declaration order of [`Record::table`].
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}
