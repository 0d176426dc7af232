use crate::{
    error::{Error, Result},
    records::{Address, AddressKind, Attachment, Folder, Message, Msg2Folder, MsgHeader},
};

use chrono::{DateTime, Utc};
use oral::{Database, Filter, InsertAction, ObjectInfo, Transaction, Value};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::{debug, warn};

/// One address attached to a message.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressEntry {
    pub kind: AddressKind,
    pub name: String,
    pub email: String,
}

/// Attachment metadata; the payload itself is never stored here.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentInfo {
    pub name: String,
    pub mime_type: String,
    pub size: i64,
}

/// The consumer-facing message aggregate. [`AccountDatabase::add_message`]
/// splits it across the relational tables;
/// [`AccountDatabase::get_message_info`] reassembles it.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageInfo {
    /// Server-side message id within `folder`.
    pub msg_id: Vec<u8>,
    /// Folder path segments, root first.
    pub folder: Vec<String>,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub size: i64,
    pub is_read: bool,
    pub addresses: Vec<AddressEntry>,
    pub attachments: Vec<AttachmentInfo>,
}

/// The per-account metadata database.
///
/// Composes one object info per table over a single `msgs.db` connection.
/// Folder paths are interned to integer ids; the path↔id map is loaded
/// eagerly at open and only ever extended afterwards; external folder
/// removals are not observed, a known limitation carried over from the
/// behavior this models.
pub struct AccountDatabase {
    dir: PathBuf,
    db: Database,

    messages: Rc<ObjectInfo<Message>>,
    addresses: Rc<ObjectInfo<Address>>,
    attachments: Rc<ObjectInfo<Attachment>>,
    folders: Rc<ObjectInfo<Folder>>,
    msg2folder: Rc<ObjectInfo<Msg2Folder>>,
    headers: Rc<ObjectInfo<MsgHeader>>,

    known_folders: RefCell<BTreeMap<Vec<String>, i64>>,
}

/// Joins segments with `'/'`, backslash-escaping any separator or escape
/// character inside a segment so distinct sequences never produce the
/// same stored path. [`split_path`] reverses it exactly.
fn join_path(folder: &[String]) -> String {
    let escaped: Vec<String> = folder
        .iter()
        .map(|segment| segment.replace('\\', "\\\\").replace('/', "\\/"))
        .collect();
    escaped.join("/")
}

fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            '/' => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);
    segments
}

impl AccountDatabase {
    /// Opens (creating if needed) the account directory and its database,
    /// registering every mapped table.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let db = Database::open(dir.join("msgs.db"))?;

        let this = Self {
            messages: db.object_info()?,
            addresses: db.object_info()?,
            attachments: db.object_info()?,
            folders: db.object_info()?,
            msg2folder: db.object_info()?,
            headers: db.object_info()?,
            known_folders: RefCell::new(BTreeMap::new()),
            db,
            dir,
        };

        this.load_known_folders()?;
        Ok(this)
    }

    /// Starts a unit of work spanning several calls on this database.
    pub fn begin_transaction(&self) -> Result<Transaction> {
        Ok(self.db.begin()?)
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    /// Server-side ids of every message in the folder; empty for an
    /// unknown folder.
    pub fn get_ids(&self, folder: &[String]) -> Result<Vec<Vec<u8>>> {
        let Some(folder_id) = self.folder_id(folder) else {
            return Ok(vec![]);
        };

        let links = self
            .msg2folder
            .select(&Filter::Eq("folder", Value::Integer(folder_id)))?;
        Ok(links.into_iter().map(|link| link.msg_id).collect())
    }

    /// The most recently linked message id in the folder.
    pub fn get_last_id(&self, folder: &[String]) -> Result<Option<Vec<u8>>> {
        let Some(folder_id) = self.folder_id(folder) else {
            return Ok(None);
        };

        let link = self
            .msg2folder
            .last(&Filter::Eq("folder", Value::Integer(folder_id)))?;
        Ok(link.map(|link| link.msg_id))
    }

    pub fn get_message_count(&self, folder: &[String]) -> Result<u64> {
        let Some(folder_id) = self.folder_id(folder) else {
            return Ok(0);
        };
        Ok(self
            .msg2folder
            .count(&Filter::Eq("folder", Value::Integer(folder_id)))?)
    }

    pub fn get_unread_count(&self, folder: &[String]) -> Result<u64> {
        let Some(folder_id) = self.folder_id(folder) else {
            return Ok(0);
        };

        // Crosses two tables, so this one bypasses the typed surface.
        let count: i64 = self
            .db
            .handle()
            .query_row(
                "SELECT COUNT(*) FROM messages \
                 JOIN msg2folder ON msg2folder.msg = messages.id \
                 WHERE msg2folder.folder = ?1 AND messages.is_read = 0",
                [folder_id],
                |row| row.get(0),
            )
            .map_err(oral::Error::from)?;
        Ok(count as u64)
    }

    /// Messages across all folders.
    pub fn get_total_count(&self) -> Result<u64> {
        Ok(self.messages.count(&Filter::All)?)
    }

    /// Stores a message: the row itself, its addresses and attachments,
    /// and the folder link, all in one transaction. Re-adding an existing
    /// (folder, msg_id) pair rewrites the stored fields in place and
    /// returns the existing table id. Returns the message's table id.
    pub fn add_message(&self, info: &MessageInfo) -> Result<i64> {
        let tx = self.db.begin()?;
        let id = self.add_message_locked(info)?;
        tx.good()?;
        Ok(id)
    }

    fn add_message_locked(&self, info: &MessageInfo) -> Result<i64> {
        let row = Message {
            id: None,
            subject: info.subject.clone(),
            date: info.date,
            size: info.size,
            is_read: info.is_read,
        };

        if let Some(existing) = self.get_msg_table_id(&info.msg_id, &info.folder)? {
            let mut row = row;
            row.id = Some(existing);
            self.messages.update(&row)?;

            self.addresses
                .delete(&Filter::Eq("message", Value::Integer(existing)))?;
            self.attachments
                .delete(&Filter::Eq("message", Value::Integer(existing)))?;
            self.insert_details(existing, info)?;
            return Ok(existing);
        }

        let inserted = self.messages.insert(&row)?;
        let msg = inserted
            .id
            .ok_or_else(|| Error::Inconsistent("message insert returned no key".to_string()))?;

        self.insert_details(msg, info)?;

        let folder_id = self.add_folder(&info.folder)?;
        self.msg2folder.insert_action(
            &Msg2Folder {
                id: None,
                msg,
                folder: folder_id,
                msg_id: info.msg_id.clone(),
            },
            InsertAction::Ignore,
        )?;

        Ok(msg)
    }

    fn insert_details(&self, msg: i64, info: &MessageInfo) -> Result<()> {
        for address in &info.addresses {
            self.addresses.insert(&Address {
                id: None,
                message: msg,
                kind: address.kind,
                name: address.name.clone(),
                email: address.email.clone(),
            })?;
        }

        for attachment in &info.attachments {
            self.attachments.insert(&Attachment {
                id: None,
                message: msg,
                name: attachment.name.clone(),
                mime_type: attachment.mime_type.clone(),
                size: attachment.size,
            })?;
        }

        Ok(())
    }

    pub fn get_message_infos(&self, folder: &[String]) -> Result<Vec<MessageInfo>> {
        let Some(folder_id) = self.folder_id(folder) else {
            return Ok(vec![]);
        };

        let links = self
            .msg2folder
            .select(&Filter::Eq("folder", Value::Integer(folder_id)))?;

        let mut infos = Vec::with_capacity(links.len());
        for link in links {
            let Some(message) = self.messages.find(&Value::Integer(link.msg))? else {
                warn!(msg = link.msg, "dangling msg2folder entry");
                continue;
            };
            infos.push(self.build_info(link.msg, message, folder.to_vec(), link.msg_id)?);
        }
        Ok(infos)
    }

    /// `None` when the folder or the message is unknown.
    pub fn get_message_info(&self, folder: &[String], msg_id: &[u8]) -> Result<Option<MessageInfo>> {
        let Some(table_id) = self.get_msg_table_id(msg_id, folder)? else {
            return Ok(None);
        };
        let Some(message) = self.messages.find(&Value::Integer(table_id))? else {
            return Ok(None);
        };
        Ok(Some(self.build_info(
            table_id,
            message,
            folder.to_vec(),
            msg_id.to_vec(),
        )?))
    }

    fn build_info(
        &self,
        table_id: i64,
        message: Message,
        folder: Vec<String>,
        msg_id: Vec<u8>,
    ) -> Result<MessageInfo> {
        let addresses = self
            .addresses
            .select(&Filter::Eq("message", Value::Integer(table_id)))?
            .into_iter()
            .map(|address| AddressEntry {
                kind: address.kind,
                name: address.name,
                email: address.email,
            })
            .collect();

        let attachments = self
            .attachments
            .select(&Filter::Eq("message", Value::Integer(table_id)))?
            .into_iter()
            .map(|attachment| AttachmentInfo {
                name: attachment.name,
                mime_type: attachment.mime_type,
                size: attachment.size,
            })
            .collect();

        Ok(MessageInfo {
            msg_id,
            folder,
            subject: message.subject,
            date: message.date,
            size: message.size,
            is_read: message.is_read,
            addresses,
            attachments,
        })
    }

    /// Unlinks the message from the folder; when no other folder still
    /// references it, the row and its dependents go too. Unknown ids are
    /// a no-op.
    pub fn remove_message(&self, msg_id: &[u8], folder: &[String]) -> Result<()> {
        let Some(folder_id) = self.folder_id(folder) else {
            return Ok(());
        };

        let tx = self.db.begin()?;

        let filter =
            Filter::Eq("folder", Value::Integer(folder_id)).and(Filter::Eq("msg_id", msg_id.into()));
        let Some(link) = self.msg2folder.select_one(&filter)? else {
            tx.good()?;
            return Ok(());
        };

        self.msg2folder.delete(&filter)?;

        if self
            .msg2folder
            .count(&Filter::Eq("msg", Value::Integer(link.msg)))?
            == 0
        {
            self.addresses
                .delete(&Filter::Eq("message", Value::Integer(link.msg)))?;
            self.attachments
                .delete(&Filter::Eq("message", Value::Integer(link.msg)))?;
            self.headers
                .delete(&Filter::Eq("msg", Value::Integer(link.msg)))?;
            self.messages.delete_by_key(&Value::Integer(link.msg))?;
        }

        tx.good()?;
        Ok(())
    }

    /// `None` when the message is unknown in that folder.
    pub fn is_message_read(&self, msg_id: &[u8], folder: &[String]) -> Result<Option<bool>> {
        let Some(table_id) = self.get_msg_table_id(msg_id, folder)? else {
            return Ok(None);
        };
        Ok(self
            .messages
            .find(&Value::Integer(table_id))?
            .map(|message| message.is_read))
    }

    /// Unknown ids are a no-op.
    pub fn set_message_read(&self, msg_id: &[u8], folder: &[String], read: bool) -> Result<()> {
        let Some(table_id) = self.get_msg_table_id(msg_id, folder)? else {
            warn!(
                msg_id = %hex::encode(msg_id),
                "set_message_read on unknown message"
            );
            return Ok(());
        };

        let Some(mut message) = self.messages.find(&Value::Integer(table_id))? else {
            return Ok(());
        };
        message.is_read = read;
        self.messages.update(&message)?;
        Ok(())
    }

    pub fn set_message_header(&self, msg_id: &[u8], folder: &[String], header: &[u8]) -> Result<()> {
        let Some(table_id) = self.get_msg_table_id(msg_id, folder)? else {
            warn!(
                msg_id = %hex::encode(msg_id),
                "set_message_header on unknown message"
            );
            return Ok(());
        };

        self.headers.insert_action(
            &MsgHeader {
                id: None,
                msg: table_id,
                header: header.to_vec(),
            },
            InsertAction::Replace,
        )?;
        Ok(())
    }

    pub fn get_message_header(&self, msg_id: &[u8], folder: &[String]) -> Result<Option<Vec<u8>>> {
        let Some(table_id) = self.get_msg_table_id(msg_id, folder)? else {
            return Ok(None);
        };
        Ok(self
            .headers
            .select_one(&Filter::Eq("msg", Value::Integer(table_id)))?
            .map(|row| row.header))
    }

    /// The message's table id, used to key the dependent tables.
    pub fn get_msg_table_id(&self, msg_id: &[u8], folder: &[String]) -> Result<Option<i64>> {
        let Some(folder_id) = self.folder_id(folder) else {
            return Ok(None);
        };

        let filter =
            Filter::Eq("folder", Value::Integer(folder_id)).and(Filter::Eq("msg_id", msg_id.into()));
        Ok(self.msg2folder.select_one(&filter)?.map(|link| link.msg))
    }

    fn folder_id(&self, folder: &[String]) -> Option<i64> {
        self.known_folders.borrow().get(folder).copied()
    }

    /// Interns a folder path: same path in, same id out.
    fn add_folder(&self, folder: &[String]) -> Result<i64> {
        if let Some(id) = self.folder_id(folder) {
            return Ok(id);
        }

        let path = join_path(folder);
        self.folders.insert_action(
            &Folder {
                id: None,
                path: path.clone(),
            },
            InsertAction::Ignore,
        )?;

        let row = self
            .folders
            .select_one(&Filter::Eq("path", path.clone().into()))?
            .ok_or_else(|| Error::Inconsistent(format!("folder `{path}` missing after insert")))?;
        let id = row
            .id
            .ok_or_else(|| Error::Inconsistent(format!("folder `{path}` has no id")))?;

        self.known_folders.borrow_mut().insert(folder.to_vec(), id);
        Ok(id)
    }

    fn load_known_folders(&self) -> Result<()> {
        let mut cache = self.known_folders.borrow_mut();
        for folder in self.folders.select(&Filter::All)? {
            let Some(id) = folder.id else { continue };
            cache.insert(split_path(&folder.path), id);
        }
        debug!(folders = cache.len(), "loaded known folders");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{join_path, split_path};

    fn segments(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn path_encoding_round_trips_awkward_segments() {
        for raw in [
            &["INBOX"] as &[&str],
            &["INBOX", "work"],
            &["a/b"],
            &["a", "b"],
            &["back\\slash", "mixed/seg"],
            &[""],
            &["", ""],
        ] {
            let folder = segments(raw);
            assert_eq!(split_path(&join_path(&folder)), folder);
        }
    }

    #[test]
    fn distinct_sequences_encode_distinctly() {
        assert_ne!(join_path(&segments(&["a", "b"])), join_path(&segments(&["a/b"])));
        assert_ne!(
            join_path(&segments(&["a\\", "b"])),
            join_path(&segments(&["a\\/b"]))
        );
    }
}
