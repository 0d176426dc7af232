use oral::{ColumnDef, Database, Error, Filter, Record, TableDef, Type, Value};
use pretty_assertions::assert_eq;

#[derive(Debug)]
struct Entry {
    id: Option<i64>,
    label: String,
}

impl Record for Entry {
    fn table() -> TableDef {
        TableDef::new("entries")
            .column(ColumnDef::new("id", Type::Integer).auto_increment())
            .column(ColumnDef::new("label", Type::Text))
    }

    fn values(&self) -> Vec<Value> {
        vec![self.id.into(), self.label.clone().into()]
    }

    fn from_row(row: &oral::rusqlite::Row<'_>) -> oral::rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            label: row.get(1)?,
        })
    }
}

fn entry(label: &str) -> Entry {
    Entry {
        id: None,
        label: label.to_string(),
    }
}

#[test]
fn dropped_guard_rolls_back() {
    let db = Database::open_in_memory().unwrap();
    let entries = db.object_info::<Entry>().unwrap();

    {
        let _tx = db.begin().unwrap();
        entries.insert(&entry("a")).unwrap();
        entries.insert(&entry("b")).unwrap();
        // no good(): rollback on drop
    }

    assert_eq!(entries.count(&Filter::All).unwrap(), 0);
}

#[test]
fn good_commits_the_batch() {
    let db = Database::open_in_memory().unwrap();
    let entries = db.object_info::<Entry>().unwrap();

    let tx = db.begin().unwrap();
    entries.insert(&entry("a")).unwrap();
    entries.insert(&entry("b")).unwrap();
    tx.good().unwrap();

    assert_eq!(entries.count(&Filter::All).unwrap(), 2);
}

#[test]
fn early_error_exit_leaves_state_unchanged() {
    let db = Database::open_in_memory().unwrap();
    let entries = db.object_info::<Entry>().unwrap();

    fn doomed(db: &Database, entries: &oral::ObjectInfo<Entry>) -> oral::Result<()> {
        let _tx = db.begin()?;
        entries.insert(&entry("kept?"))?;
        Err(Error::InvalidSchema {
            table: "entries".to_string(),
            message: "simulated failure".to_string(),
        })
        // guard drops here, rolling back
    }

    assert!(doomed(&db, &entries).is_err());
    assert_eq!(entries.count(&Filter::All).unwrap(), 0);
}

#[test]
fn transactions_do_not_nest() {
    let db = Database::open_in_memory().unwrap();

    let tx = db.begin().unwrap();
    assert!(matches!(db.begin(), Err(Error::NestedTransaction)));
    tx.good().unwrap();

    // After the guard is resolved a new transaction may start.
    let tx = db.begin().unwrap();
    tx.good().unwrap();
}
