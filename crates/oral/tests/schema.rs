use oral::{
    CachedFields, ColumnDef, Dialect, Error, InsertAction, PostgresqlDialect, SqliteDialect,
    TableDef, Type,
};
use pretty_assertions::assert_eq;

fn folders() -> TableDef {
    TableDef::new("folders")
        .column(ColumnDef::new("id", Type::Integer).auto_increment())
        .column(ColumnDef::new("path", Type::Text).unique())
}

fn links() -> TableDef {
    TableDef::new("links")
        .column(ColumnDef::new("id", Type::Integer).auto_increment())
        .column(ColumnDef::new("folder", Type::Integer).references("folders", "id"))
        .column(ColumnDef::new("note", Type::Text).nullable())
}

#[test]
fn sqlite_create_table_uses_autoincrement_literal() {
    let sql = SqliteDialect.create_table_sql(&folders());
    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS folders \
         (id INTEGER PRIMARY KEY AUTOINCREMENT, path TEXT NOT NULL UNIQUE)"
    );
}

#[test]
fn postgresql_create_table_uses_serial_literal() {
    let sql = PostgresqlDialect.create_table_sql(&folders());
    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS folders \
         (id BIGSERIAL PRIMARY KEY, path TEXT NOT NULL UNIQUE)"
    );
}

#[test]
fn foreign_keys_and_nullable_columns_render() {
    let sql = SqliteDialect.create_table_sql(&links());
    assert_eq!(
        sql,
        "CREATE TABLE IF NOT EXISTS links \
         (id INTEGER PRIMARY KEY AUTOINCREMENT, \
          folder INTEGER NOT NULL REFERENCES folders (id), \
          note TEXT)"
    );
}

#[test]
fn cached_fields_preserve_declaration_order() {
    let def = links();
    let fields = CachedFields::new(&def, &SqliteDialect);

    assert_eq!(fields.fields.len(), def.columns.len());
    assert_eq!(fields.fields, vec!["id", "folder", "note"]);
    assert_eq!(fields.placeholders.len(), def.columns.len());

    // Rebuilding yields the same ordering.
    let again = CachedFields::new(&def, &SqliteDialect);
    assert_eq!(again.fields, fields.fields);
}

#[test]
fn cached_fields_skip_auto_increment_key_on_insert() {
    let fields = CachedFields::new(&folders(), &SqliteDialect);

    assert_eq!(fields.insert_fields, vec!["path"]);
    assert_eq!(fields.pk, Some(0));
    assert!(fields.auto_increment);
    assert_eq!(fields.conflict_target.as_deref(), Some("path"));
}

#[test]
fn sqlite_insert_variants_share_the_suffix() {
    let fields = CachedFields::new(&folders(), &SqliteDialect);
    let builder = SqliteDialect.insert_builder(&fields);

    assert_eq!(
        builder.sql(InsertAction::Default),
        "INSERT INTO folders (path) VALUES (?)"
    );
    assert_eq!(
        builder.sql(InsertAction::Ignore),
        "INSERT OR IGNORE INTO folders (path) VALUES (?)"
    );
    assert_eq!(
        builder.sql(InsertAction::Replace),
        "INSERT OR REPLACE INTO folders (path) VALUES (?)"
    );
}

#[test]
fn postgresql_insert_variants_use_conflict_clauses() {
    let fields = CachedFields::new(&folders(), &PostgresqlDialect);
    let builder = PostgresqlDialect.insert_builder(&fields);

    assert_eq!(
        builder.sql(InsertAction::Default),
        "INSERT INTO folders (path) VALUES ($1)"
    );
    assert_eq!(
        builder.sql(InsertAction::Ignore),
        "INSERT INTO folders (path) VALUES ($1) ON CONFLICT DO NOTHING"
    );
    // With only the conflict target bound there is nothing to overwrite,
    // so the upsert degrades to a plain insert.
    assert_eq!(
        builder.sql(InsertAction::Replace),
        "INSERT INTO folders (path) VALUES ($1)"
    );
}

#[test]
fn postgresql_upsert_overwrites_non_target_columns() {
    let def = TableDef::new("folders")
        .column(ColumnDef::new("id", Type::Integer).auto_increment())
        .column(ColumnDef::new("path", Type::Text).unique())
        .column(ColumnDef::new("label", Type::Text));
    let fields = CachedFields::new(&def, &PostgresqlDialect);
    let builder = PostgresqlDialect.insert_builder(&fields);

    assert_eq!(
        builder.sql(InsertAction::Replace),
        "INSERT INTO folders (path, label) VALUES ($1, $2) \
         ON CONFLICT (path) DO UPDATE SET label = EXCLUDED.label"
    );
}

#[test]
fn registration_rejects_malformed_definitions() {
    assert!(matches!(
        TableDef::new("empty").validate(),
        Err(Error::InvalidSchema { .. })
    ));

    let duplicated = TableDef::new("dup")
        .column(ColumnDef::new("a", Type::Text))
        .column(ColumnDef::new("a", Type::Integer));
    assert!(duplicated.validate().is_err());

    let two_keys = TableDef::new("keys")
        .column(ColumnDef::new("a", Type::Integer).primary_key())
        .column(ColumnDef::new("b", Type::Integer).primary_key());
    assert!(two_keys.validate().is_err());
}
