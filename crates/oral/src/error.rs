/// Errors surfaced by the persistence layer.
///
/// "Not found" is never an error: lookups return `Option`/empty collections
/// instead. The variants here separate configuration mistakes (caught at
/// registration, before any SQL runs) from SQL execution failures and
/// filesystem failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A malformed table definition: no columns, duplicate column names,
    /// misplaced auto-increment, and the like.
    #[error("invalid schema for table `{table}`: {message}")]
    InvalidSchema { table: String, message: String },

    /// Statement preparation or execution failed.
    #[error("sql error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A filesystem operation failed (companion flat-file payloads).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// `begin` was called while another transaction guard was alive.
    /// Transactions do not nest; one per connection at a time.
    #[error("a transaction is already open on this connection")]
    NestedTransaction,
}

pub type Result<T> = std::result::Result<T, Error>;
