use chrono::{TimeZone, Utc};
use oral_mailstore::{AccountDatabase, MessageBodies, MessageInfo, Storage};
use pretty_assertions::assert_eq;

fn folder(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

fn info(msg_id: &[u8], folder_path: &[&str]) -> MessageInfo {
    MessageInfo {
        msg_id: msg_id.to_vec(),
        folder: folder(folder_path),
        subject: "bodies".to_string(),
        date: Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap(),
        size: 64,
        is_read: false,
        addresses: vec![],
        attachments: vec![],
    }
}

fn bodies() -> MessageBodies {
    MessageBodies {
        plain: "plain text body\nwith two lines".to_string(),
        html: "<p>plain text body</p>".to_string(),
    }
}

#[test]
fn bodies_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = AccountDatabase::open(dir.path()).unwrap();
    let path = folder(&["INBOX", "work"]);

    db.save_message_bodies(&path, b"uid-1", &bodies()).unwrap();
    let loaded = db.get_message_bodies(&path, b"uid-1").unwrap();
    assert_eq!(loaded, Some(bodies()));

    // The fan-out tree lives under bodies/ in the account directory.
    assert!(dir.path().join("bodies").is_dir());
}

#[test]
fn missing_bodies_are_none() {
    let dir = tempfile::tempdir().unwrap();
    let db = AccountDatabase::open(dir.path()).unwrap();

    let loaded = db.get_message_bodies(&folder(&["INBOX"]), b"uid-1").unwrap();
    assert_eq!(loaded, None);
}

#[test]
fn save_replaces_previous_bodies() {
    let dir = tempfile::tempdir().unwrap();
    let db = AccountDatabase::open(dir.path()).unwrap();
    let path = folder(&["INBOX"]);

    db.save_message_bodies(&path, b"uid-1", &bodies()).unwrap();

    let revised = MessageBodies {
        plain: "revised".to_string(),
        html: String::new(),
    };
    db.save_message_bodies(&path, b"uid-1", &revised).unwrap();

    assert_eq!(
        db.get_message_bodies(&path, b"uid-1").unwrap(),
        Some(revised)
    );
}

#[test]
fn remove_message_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let db = AccountDatabase::open(dir.path()).unwrap();
    let path = folder(&["INBOX"]);

    db.save_message_bodies(&path, b"uid-1", &bodies()).unwrap();
    db.remove_message_file(&path, b"uid-1").unwrap();
    assert_eq!(db.get_message_bodies(&path, b"uid-1").unwrap(), None);

    // Removing again, or removing something never saved, is fine.
    db.remove_message_file(&path, b"uid-1").unwrap();
    db.remove_message_file(&path, b"uid-2").unwrap();
}

#[test]
fn storage_saves_and_loads_per_account() {
    let root = tempfile::tempdir().unwrap();
    let storage = Storage::open(root.path());
    let path = folder(&["INBOX"]);

    let message = info(b"uid-1", &["INBOX"]);
    storage.save_message("alice@example.com", &message, &bodies()).unwrap();

    let (loaded_info, loaded_bodies) = storage
        .load_message("alice@example.com", &path, b"uid-1")
        .unwrap()
        .unwrap();
    assert_eq!(loaded_info, message);
    assert_eq!(loaded_bodies, Some(bodies()));

    // Accounts do not see each other's messages.
    assert_eq!(
        storage.load_message("bob@example.com", &path, b"uid-1").unwrap(),
        None
    );

    // The cached handle is shared across calls.
    let first = storage.database("alice@example.com").unwrap();
    let second = storage.database("alice@example.com").unwrap();
    assert!(std::rc::Rc::ptr_eq(&first, &second));
}

#[test]
fn storage_remove_drops_metadata_and_file() {
    let root = tempfile::tempdir().unwrap();
    let storage = Storage::open(root.path());
    let path = folder(&["INBOX"]);

    storage
        .save_message("alice@example.com", &info(b"uid-1", &["INBOX"]), &bodies())
        .unwrap();
    storage.remove_message("alice@example.com", &path, b"uid-1").unwrap();

    assert_eq!(
        storage.load_message("alice@example.com", &path, b"uid-1").unwrap(),
        None
    );
    let db = storage.database("alice@example.com").unwrap();
    assert_eq!(db.get_message_bodies(&path, b"uid-1").unwrap(), None);
}

#[test]
fn storage_batch_read_flag() {
    let root = tempfile::tempdir().unwrap();
    let storage = Storage::open(root.path());
    let path = folder(&["INBOX"]);

    for uid in [b"a" as &[u8], b"b", b"c"] {
        storage
            .save_message("alice@example.com", &info(uid, &["INBOX"]), &bodies())
            .unwrap();
    }

    let ids = vec![b"a".to_vec(), b"c".to_vec()];
    storage
        .set_messages_read("alice@example.com", &path, &ids, true)
        .unwrap();

    assert_eq!(
        storage.is_message_read("alice@example.com", &path, b"a").unwrap(),
        Some(true)
    );
    assert_eq!(
        storage.is_message_read("alice@example.com", &path, b"b").unwrap(),
        Some(false)
    );
    assert_eq!(
        storage.is_message_read("alice@example.com", &path, b"c").unwrap(),
        Some(true)
    );
}

#[test]
fn empty_msg_id_still_stores_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let db = AccountDatabase::open(dir.path()).unwrap();
    let path = folder(&["INBOX"]);

    db.save_message_bodies(&path, b"", &bodies()).unwrap();
    assert_eq!(db.get_message_bodies(&path, b"").unwrap(), Some(bodies()));

    // It must not share a file with the single zero byte id.
    assert_eq!(db.get_message_bodies(&path, &[0u8]).unwrap(), None);

    db.remove_message_file(&path, b"").unwrap();
    assert_eq!(db.get_message_bodies(&path, b"").unwrap(), None);
}
