//! The mapped record set behind one account database. Consumers see
//! [`MessageInfo`](crate::MessageInfo); these rows are the relational shape
//! it is split into.

use chrono::{DateTime, Utc};
use oral::{ColumnDef, Record, TableDef, Timestamp, Type, Value};
use rusqlite::Row;

/// Which header an address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    From,
    To,
    Cc,
    Bcc,
}

impl AddressKind {
    pub(crate) fn as_i64(self) -> i64 {
        match self {
            AddressKind::From => 0,
            AddressKind::To => 1,
            AddressKind::Cc => 2,
            AddressKind::Bcc => 3,
        }
    }

    pub(crate) fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(AddressKind::From),
            1 => Some(AddressKind::To),
            2 => Some(AddressKind::Cc),
            3 => Some(AddressKind::Bcc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Message {
    pub id: Option<i64>,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub size: i64,
    pub is_read: bool,
}

impl Record for Message {
    fn table() -> TableDef {
        TableDef::new("messages")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(ColumnDef::new("subject", Type::Text))
            .column(ColumnDef::new("date", Type::Timestamp))
            .column(ColumnDef::new("size", Type::Integer))
            .column(ColumnDef::new("is_read", Type::Boolean))
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.subject.clone().into(),
            self.date.into(),
            self.size.into(),
            self.is_read.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            subject: row.get(1)?,
            date: row.get::<_, Timestamp>(2)?.0,
            size: row.get(3)?,
            is_read: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Address {
    pub id: Option<i64>,
    pub message: i64,
    pub kind: AddressKind,
    pub name: String,
    pub email: String,
}

impl Record for Address {
    fn table() -> TableDef {
        TableDef::new("addresses")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(ColumnDef::new("message", Type::Integer).references("messages", "id"))
            .column(ColumnDef::new("kind", Type::Integer))
            .column(ColumnDef::new("name", Type::Text))
            .column(ColumnDef::new("email", Type::Text))
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.message.into(),
            self.kind.as_i64().into(),
            self.name.clone().into(),
            self.email.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let raw_kind: i64 = row.get(2)?;
        let kind = AddressKind::from_i64(raw_kind).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Integer,
                format!("unknown address kind {raw_kind}").into(),
            )
        })?;

        Ok(Self {
            id: row.get(0)?,
            message: row.get(1)?,
            kind,
            name: row.get(3)?,
            email: row.get(4)?,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Attachment {
    pub id: Option<i64>,
    pub message: i64,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
}

impl Record for Attachment {
    fn table() -> TableDef {
        TableDef::new("attachments")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(ColumnDef::new("message", Type::Integer).references("messages", "id"))
            .column(ColumnDef::new("name", Type::Text))
            .column(ColumnDef::new("mime_type", Type::Text))
            .column(ColumnDef::new("size", Type::Integer))
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.message.into(),
            self.name.clone().into(),
            self.mime_type.clone().into(),
            self.size.into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            message: row.get(1)?,
            name: row.get(2)?,
            mime_type: row.get(3)?,
            size: row.get(4)?,
        })
    }
}

/// An interned folder path. `path` is the segments joined with `/`.
#[derive(Debug, Clone)]
pub(crate) struct Folder {
    pub id: Option<i64>,
    pub path: String,
}

impl Record for Folder {
    fn table() -> TableDef {
        TableDef::new("folders")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(ColumnDef::new("path", Type::Text).unique())
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.path.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            path: row.get(1)?,
        })
    }
}

/// Message-to-folder association. `msg_id` is the server-side message id
/// within that folder.
#[derive(Debug, Clone)]
pub(crate) struct Msg2Folder {
    pub id: Option<i64>,
    pub msg: i64,
    pub folder: i64,
    pub msg_id: Vec<u8>,
}

impl Record for Msg2Folder {
    fn table() -> TableDef {
        TableDef::new("msg2folder")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(ColumnDef::new("msg", Type::Integer).references("messages", "id"))
            .column(ColumnDef::new("folder", Type::Integer).references("folders", "id"))
            .column(ColumnDef::new("msg_id", Type::Blob))
    }

    fn values(&self) -> Vec<Value> {
        vec![
            self.id.into(),
            self.msg.into(),
            self.folder.into(),
            self.msg_id.clone().into(),
        ]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            msg: row.get(1)?,
            folder: row.get(2)?,
            msg_id: row.get(3)?,
        })
    }
}

/// Cached raw header bytes, one row per message.
#[derive(Debug, Clone)]
pub(crate) struct MsgHeader {
    pub id: Option<i64>,
    pub msg: i64,
    pub header: Vec<u8>,
}

impl Record for MsgHeader {
    fn table() -> TableDef {
        TableDef::new("msg_header")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(
                ColumnDef::new("msg", Type::Integer)
                    .unique()
                    .references("messages", "id"),
            )
            .column(ColumnDef::new("header", Type::Blob))
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.msg.into(), self.header.clone().into()]
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            msg: row.get(1)?,
            header: row.get(2)?,
        })
    }
}
