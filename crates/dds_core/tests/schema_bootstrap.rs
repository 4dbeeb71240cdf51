use dds_core::db::schema::{
    apply_schema, create_schema, ddl_statements, schema_status, schema_version, StoreLocation,
    INDEX_LINK_POSTS_UNIQUE, SCHEMA_VERSION, VAULT_TABLES,
};
use dds_core::db::{open_db, open_db_in_memory, DbError};
use dds_core::{
    ConstraintKind, HashKey, HubRepository, ListQuery, RepoError, SqliteHubRepository, UserHub,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_vault_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    for table in VAULT_TABLES {
        assert_object_exists(&conn, "table", table);
    }
    assert_object_exists(&conn, "index", INDEX_LINK_POSTS_UNIQUE);
}

#[test]
fn reapplying_schema_is_idempotent_and_keeps_rows() {
    let mut conn = open_db_in_memory().unwrap();
    SqliteHubRepository::try_new(&conn)
        .unwrap()
        .create_user(&UserHub::new(1, key('a')))
        .unwrap();

    create_schema(&conn, StoreLocation::Memory).unwrap();
    apply_schema(&mut conn).unwrap();
    apply_schema(&mut conn).unwrap();

    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    let status = schema_status(&conn).unwrap();
    assert_eq!(status.tables[0].table, "h_users");
    assert_eq!(status.tables[0].rows, 1);
}

#[test]
fn raw_ddl_runs_twice_without_error() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("ATTACH DATABASE ':memory:' AS dds;")
        .unwrap();

    for _ in 0..2 {
        for statement in ddl_statements() {
            conn.execute_batch(statement).unwrap();
        }
    }
    assert_object_exists(&conn, "table", "l_posts");
}

#[test]
fn opening_same_store_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.sqlite3");

    let conn_first = open_db(&path).unwrap();
    SqliteHubRepository::try_new(&conn_first)
        .unwrap()
        .create_user(&UserHub::new(7, key('c')))
        .unwrap();
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second).unwrap(), SCHEMA_VERSION);
    let stored = SqliteHubRepository::try_new(&conn_second)
        .unwrap()
        .get_user(&key('c'))
        .unwrap();
    assert_eq!(stored, Some(UserHub::new(7, key('c'))));
}

#[test]
fn store_file_holds_vault_tables_at_top_level() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vault.sqlite3");
    drop(open_db(&path).unwrap());

    let raw = Connection::open(&path).unwrap();
    let count: i64 = raw
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                ('h_users', 'h_letters', 's_letters', 'l_posts');",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 4);
}

#[test]
fn opening_store_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn schema_status_reports_every_table() {
    let conn = open_db_in_memory().unwrap();
    let status = schema_status(&conn).unwrap();

    assert_eq!(status.schema, "dds");
    assert_eq!(status.version, SCHEMA_VERSION);
    let tables: Vec<_> = status.tables.iter().map(|table| table.table).collect();
    assert_eq!(tables, VAULT_TABLES.to_vec());
    assert!(status.tables.iter().all(|table| table.rows == 0));
}

#[test]
fn hash_columns_reject_null_and_overlong_values() {
    let conn = open_db_in_memory().unwrap();

    let null_err = conn
        .execute("INSERT INTO dds.h_users (user_id, user_id_hash) VALUES (1, NULL);", [])
        .unwrap_err();
    assert_eq!(
        RepoError::from(null_err).constraint_kind(),
        Some(ConstraintKind::NotNull)
    );

    let overlong_err = conn
        .execute(
            "INSERT INTO dds.h_letters (letter_id, letter_id_hash) VALUES (1, ?1);",
            ["x".repeat(33)],
        )
        .unwrap_err();
    assert_eq!(
        RepoError::from(overlong_err).constraint_kind(),
        Some(ConstraintKind::Check)
    );
}

#[test]
fn business_id_columns_reject_text_and_out_of_range_values() {
    let conn = open_db_in_memory().unwrap();

    let text_err = conn
        .execute(
            "INSERT INTO dds.h_users (user_id, user_id_hash) VALUES ('not a number', ?1);",
            [key('a').as_str()],
        )
        .unwrap_err();
    assert_eq!(
        RepoError::from(text_err).constraint_kind(),
        Some(ConstraintKind::Check)
    );

    let wide_err = conn
        .execute(
            "INSERT INTO dds.h_letters (letter_id, letter_id_hash) VALUES (5000000000, ?1);",
            [key('b').as_str()],
        )
        .unwrap_err();
    assert_eq!(
        RepoError::from(wide_err).constraint_kind(),
        Some(ConstraintKind::Check)
    );

    conn.execute(
        "INSERT INTO dds.h_users (user_id, user_id_hash) VALUES ('42', ?1);",
        [key('c').as_str()],
    )
    .unwrap();
    let hubs = SqliteHubRepository::try_new(&conn).unwrap();
    assert_eq!(hubs.list_users(&ListQuery::default()).unwrap()[0].user_id, 42);
    assert!(hubs.list_letters(&ListQuery::default()).unwrap().is_empty());
}

fn key(ch: char) -> HashKey {
    HashKey::parse(ch.to_string().repeat(32)).unwrap()
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM dds.sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}
