//! Mail storage on top of [`oral`]: one SQLite database per account for
//! structured metadata (messages, addresses, attachments, folders, header
//! cache) and compressed flat files beside it for bulk message bodies.
//!
//! Folder paths are interned to small integer ids on first sight; every
//! message-to-folder association is stored as an integer pair rather than
//! a repeated path, with the path↔id map cached in memory for the lifetime
//! of the open database.

mod bodies;
mod database;
mod error;
mod records;
mod storage;

pub use bodies::MessageBodies;
pub use database::{AccountDatabase, AddressEntry, AttachmentInfo, MessageInfo};
pub use error::{Error, Result};
pub use records::AddressKind;
pub use storage::Storage;

pub use oral::Transaction;
