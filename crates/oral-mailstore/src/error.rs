/// Facade-level errors. Lookups that simply find nothing return `Option`;
/// these variants are genuine failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The persistence layer failed (schema, SQL, transaction misuse).
    #[error(transparent)]
    Oral(#[from] oral::Error),

    /// Flat-file body I/O failed. Relational metadata is left untouched.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A stored body payload did not decode.
    #[error("corrupt message body payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// The database contradicts itself, e.g. a folder row that vanished
    /// between an insert-or-ignore and the readback.
    #[error("database inconsistency: {0}")]
    Inconsistent(String),
}

pub type Result<T> = std::result::Result<T, Error>;
