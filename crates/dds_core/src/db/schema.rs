//! Vault DDL and schema bootstrap.
//!
//! # Responsibility
//! - Own the `dds` schema contract: table names, columns, constraints.
//! - Attach the store as the `dds` schema and apply the DDL idempotently.
//!
//! # Invariants
//! - Every statement is guarded by `IF NOT EXISTS`; re-applying is a no-op.
//! - Primary-key columns are `NOT NULL`. `VARCHAR(32)` lengths and `INT`
//!   columns (stored integers within `i32` range) are enforced with `CHECK`,
//!   since SQLite enforces neither on its own.
//! - Satellite and link rows reference their hubs through foreign keys.
//! - `PRAGMA dds.user_version` never moves backwards.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Name the store is attached under.
pub const SCHEMA_NAME: &str = "dds";
/// Schema version written to `PRAGMA dds.user_version`.
pub const SCHEMA_VERSION: u32 = 1;

pub const TABLE_HUB_USERS: &str = "h_users";
pub const TABLE_HUB_LETTERS: &str = "h_letters";
pub const TABLE_SATELLITE_LETTERS: &str = "s_letters";
pub const TABLE_LINK_POSTS: &str = "l_posts";
pub const INDEX_LINK_POSTS_UNIQUE: &str = "l_posts_user_letter_uq";

/// Vault tables in dependency order (hubs before dependents).
pub const VAULT_TABLES: [&str; 4] = [
    TABLE_HUB_USERS,
    TABLE_HUB_LETTERS,
    TABLE_SATELLITE_LETTERS,
    TABLE_LINK_POSTS,
];

const CREATE_HUB_USERS: &str = "CREATE TABLE IF NOT EXISTS dds.h_users (
    user_id      INT NOT NULL CHECK (
        typeof(user_id) = 'integer' AND user_id BETWEEN -2147483648 AND 2147483647
    ),
    user_id_hash VARCHAR(32) NOT NULL CHECK (length(user_id_hash) <= 32),
    PRIMARY KEY (user_id_hash)
);";

const CREATE_HUB_LETTERS: &str = "CREATE TABLE IF NOT EXISTS dds.h_letters (
    letter_id      INT NOT NULL CHECK (
        typeof(letter_id) = 'integer' AND letter_id BETWEEN -2147483648 AND 2147483647
    ),
    letter_id_hash VARCHAR(32) NOT NULL CHECK (length(letter_id_hash) <= 32),
    PRIMARY KEY (letter_id_hash)
);";

const CREATE_SATELLITE_LETTERS: &str = "CREATE TABLE IF NOT EXISTS dds.s_letters (
    letter_id_hash VARCHAR(32) NOT NULL CHECK (length(letter_id_hash) <= 32),
    letter_title   TEXT NOT NULL,
    letter_body    TEXT NOT NULL,
    PRIMARY KEY (letter_id_hash),
    FOREIGN KEY (letter_id_hash) REFERENCES h_letters (letter_id_hash)
);";

const CREATE_LINK_POSTS: &str = "CREATE TABLE IF NOT EXISTS dds.l_posts (
    user_id_hash   VARCHAR(32) NOT NULL CHECK (length(user_id_hash) <= 32),
    letter_id_hash VARCHAR(32) NOT NULL CHECK (length(letter_id_hash) <= 32),
    FOREIGN KEY (user_id_hash) REFERENCES h_users (user_id_hash),
    FOREIGN KEY (letter_id_hash) REFERENCES h_letters (letter_id_hash)
);";

const CREATE_LINK_POSTS_UNIQUE: &str = "CREATE UNIQUE INDEX IF NOT EXISTS dds.l_posts_user_letter_uq
    ON l_posts (user_id_hash, letter_id_hash);";

const CREATE_LINK_POSTS_LETTER_IDX: &str = "CREATE INDEX IF NOT EXISTS dds.l_posts_letter_idx
    ON l_posts (letter_id_hash);";

const CREATE_HUB_USERS_BUSINESS_IDX: &str = "CREATE INDEX IF NOT EXISTS dds.h_users_user_id_idx
    ON h_users (user_id);";

const CREATE_HUB_LETTERS_BUSINESS_IDX: &str =
    "CREATE INDEX IF NOT EXISTS dds.h_letters_letter_id_idx
    ON h_letters (letter_id);";

const DDL_STATEMENTS: &[&str] = &[
    CREATE_HUB_USERS,
    CREATE_HUB_LETTERS,
    CREATE_SATELLITE_LETTERS,
    CREATE_LINK_POSTS,
    CREATE_LINK_POSTS_UNIQUE,
    CREATE_LINK_POSTS_LETTER_IDX,
    CREATE_HUB_USERS_BUSINESS_IDX,
    CREATE_HUB_LETTERS_BUSINESS_IDX,
];

/// Where the `dds` schema is stored.
#[derive(Debug, Clone, Copy)]
pub enum StoreLocation<'a> {
    File(&'a Path),
    Memory,
}

/// Row count of one vault table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStatus {
    pub table: &'static str,
    pub rows: i64,
}

/// Snapshot of the attached schema: recorded version and table sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaStatus {
    pub schema: &'static str,
    pub version: u32,
    pub tables: Vec<TableStatus>,
}

/// Returns the ordered DDL that defines the vault.
pub fn ddl_statements() -> &'static [&'static str] {
    DDL_STATEMENTS
}

/// Attaches the store as the `dds` schema unless it already is.
///
/// This is the SQLite counterpart of `CREATE SCHEMA IF NOT EXISTS dds`.
/// Returns `true` when an attach happened, `false` when already attached.
///
/// # Errors
/// - `DbError::NonUtf8Path` when a file location cannot be passed to SQLite.
/// - `DbError::Sqlite` when the attach itself fails.
pub fn create_schema(conn: &Connection, location: StoreLocation<'_>) -> DbResult<bool> {
    if is_schema_attached(conn)? {
        return Ok(false);
    }

    let target = match location {
        StoreLocation::File(path) => path
            .to_str()
            .ok_or_else(|| DbError::NonUtf8Path(path.to_path_buf()))?,
        StoreLocation::Memory => ":memory:",
    };
    conn.execute(&format!("ATTACH DATABASE ?1 AS {SCHEMA_NAME};"), [target])?;
    Ok(true)
}

/// Applies every vault DDL statement in one transaction.
///
/// Safe to call on an already-initialized store: nothing changes.
///
/// # Errors
/// - `DbError::SchemaNotAttached` when `create_schema` has not run.
/// - `DbError::UnsupportedSchemaVersion` when the store was written by a newer
///   schema version.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    if !is_schema_attached(conn)? {
        return Err(DbError::SchemaNotAttached);
    }

    let current = schema_version(conn)?;
    if current > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.transaction()?;
    for statement in DDL_STATEMENTS {
        tx.execute_batch(statement)?;
    }
    if current < SCHEMA_VERSION {
        tx.execute_batch(&format!(
            "PRAGMA {SCHEMA_NAME}.user_version = {SCHEMA_VERSION};"
        ))?;
    }
    tx.commit()?;

    Ok(())
}

/// Returns whether the `dds` schema is attached to `conn`.
pub fn is_schema_attached(conn: &Connection) -> DbResult<bool> {
    let attached = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_database_list WHERE name = ?1);",
        [SCHEMA_NAME],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(attached)
}

/// Reads `PRAGMA dds.user_version`. Requires the schema to be attached.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row(
        &format!("PRAGMA {SCHEMA_NAME}.user_version;"),
        [],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(version)
}

/// Returns whether `table` exists inside the attached `dds` schema.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists = conn.query_row(
        &format!(
            "SELECT EXISTS(
                SELECT 1
                FROM {SCHEMA_NAME}.sqlite_master
                WHERE type = 'table' AND name = ?1
            );"
        ),
        [table],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(exists)
}

/// Reports the recorded schema version and the row count of each vault table.
///
/// # Errors
/// - `DbError::SchemaNotAttached` when the schema is missing.
/// - `DbError::Sqlite` when a table is missing or unreadable.
pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    if !is_schema_attached(conn)? {
        return Err(DbError::SchemaNotAttached);
    }

    let version = schema_version(conn)?;
    let mut tables = Vec::with_capacity(VAULT_TABLES.len());
    for table in VAULT_TABLES {
        let rows = conn.query_row(
            &format!("SELECT COUNT(*) FROM {SCHEMA_NAME}.{table};"),
            [],
            |row| row.get::<_, i64>(0),
        )?;
        tables.push(TableStatus { table, rows });
    }

    Ok(SchemaStatus {
        schema: SCHEMA_NAME,
        version,
        tables,
    })
}
