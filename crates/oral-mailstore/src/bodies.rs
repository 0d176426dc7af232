//! Flat-file storage for bulk message bodies. Bodies would dwarf the
//! relational rows, so they live as zlib-compressed JSON files under the
//! account directory instead.

use crate::{database::AccountDatabase, error::Result};

use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::{ErrorKind, Read, Write},
    path::PathBuf,
};
use tracing::debug;

/// Both renditions of a message body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBodies {
    pub plain: String,
    pub html: String,
}

impl AccountDatabase {
    /// Writes the bodies for a message, replacing any previous file.
    pub fn save_message_bodies(
        &self,
        folder: &[String],
        msg_id: &[u8],
        bodies: &MessageBodies,
    ) -> Result<()> {
        let path = self.body_path(folder, msg_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let payload = serde_json::to_vec(bodies)?;
        let file = fs::File::create(&path)?;
        let mut encoder = ZlibEncoder::new(file, Compression::best());
        encoder.write_all(&payload)?;
        encoder.finish()?;

        debug!(path = %path.display(), raw = payload.len(), "saved message bodies");
        Ok(())
    }

    /// Reads the bodies back; `None` when none were ever saved.
    pub fn get_message_bodies(
        &self,
        folder: &[String],
        msg_id: &[u8],
    ) -> Result<Option<MessageBodies>> {
        let path = self.body_path(folder, msg_id);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let mut payload = Vec::new();
        ZlibDecoder::new(file).read_to_end(&mut payload)?;
        Ok(Some(serde_json::from_slice(&payload)?))
    }

    /// Deletes the body file. Missing files are a no-op.
    pub fn remove_message_file(&self, folder: &[String], msg_id: &[u8]) -> Result<()> {
        let path = self.body_path(folder, msg_id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// `bodies/<hex(segment)>/…/<last 3 hex chars of id>/<hex(id)>`. Hex
    /// encoding keeps arbitrary folder names filesystem-safe; the short
    /// suffix directory fans files out so no single directory grows huge.
    /// An empty id gets the name `0`, which no hex encoding (always even
    /// length) can produce.
    fn body_path(&self, folder: &[String], msg_id: &[u8]) -> PathBuf {
        let mut path = self.dir().join("bodies");
        for segment in folder {
            path.push(hex::encode(segment));
        }

        let name = if msg_id.is_empty() {
            "0".to_string()
        } else {
            hex::encode(msg_id)
        };
        let tail = &name[name.len().saturating_sub(3)..];
        path.push(tail);
        path.push(&name);
        path
    }
}
