use crate::{
    bodies::MessageBodies,
    database::{AccountDatabase, MessageInfo},
    error::Result,
};

use std::{cell::RefCell, collections::HashMap, path::PathBuf, rc::Rc};
use tracing::info;

/// Multi-account front over [`AccountDatabase`]. Each account gets its own
/// directory (and so its own database) under the storage root; opened
/// databases are cached for the lifetime of the storage.
pub struct Storage {
    root: PathBuf,
    accounts: RefCell<HashMap<String, Rc<AccountDatabase>>>,
}

impl Storage {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            accounts: RefCell::new(HashMap::new()),
        }
    }

    /// The database for an account, opened on first use. The directory name
    /// is the hex of the account id, so ids are free to contain anything.
    pub fn database(&self, account_id: &str) -> Result<Rc<AccountDatabase>> {
        if let Some(db) = self.accounts.borrow().get(account_id) {
            return Ok(Rc::clone(db));
        }

        let dir = self.root.join(hex::encode(account_id));
        info!(account = account_id, dir = %dir.display(), "opening account database");
        let db = Rc::new(AccountDatabase::open(dir)?);
        self.accounts
            .borrow_mut()
            .insert(account_id.to_string(), Rc::clone(&db));
        Ok(db)
    }

    pub fn save_message(
        &self,
        account_id: &str,
        info: &MessageInfo,
        bodies: &MessageBodies,
    ) -> Result<i64> {
        let db = self.database(account_id)?;
        let id = db.add_message(info)?;
        db.save_message_bodies(&info.folder, &info.msg_id, bodies)?;
        Ok(id)
    }

    pub fn load_message(
        &self,
        account_id: &str,
        folder: &[String],
        msg_id: &[u8],
    ) -> Result<Option<(MessageInfo, Option<MessageBodies>)>> {
        let db = self.database(account_id)?;
        let Some(info) = db.get_message_info(folder, msg_id)? else {
            return Ok(None);
        };
        let bodies = db.get_message_bodies(folder, msg_id)?;
        Ok(Some((info, bodies)))
    }

    /// Removes both the metadata and the body file.
    pub fn remove_message(
        &self,
        account_id: &str,
        folder: &[String],
        msg_id: &[u8],
    ) -> Result<()> {
        let db = self.database(account_id)?;
        db.remove_message(msg_id, folder)?;
        db.remove_message_file(folder, msg_id)?;
        Ok(())
    }

    pub fn is_message_read(
        &self,
        account_id: &str,
        folder: &[String],
        msg_id: &[u8],
    ) -> Result<Option<bool>> {
        self.database(account_id)?.is_message_read(msg_id, folder)
    }

    /// Flips the read flag for a batch of messages inside one transaction,
    /// so a partial failure leaves every flag as it was.
    pub fn set_messages_read(
        &self,
        account_id: &str,
        folder: &[String],
        msg_ids: &[Vec<u8>],
        read: bool,
    ) -> Result<()> {
        let db = self.database(account_id)?;
        let tx = db.begin_transaction()?;
        for msg_id in msg_ids {
            db.set_message_read(msg_id, folder, read)?;
        }
        tx.good()?;
        Ok(())
    }
}
