//! Hub repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/read APIs over `dds.h_users` and `dds.h_letters`.
//!
//! # Invariants
//! - A duplicate hash key surfaces as `ConstraintKind::PrimaryKey`.
//! - Business ids are not unique; lookups by id return every matching row.
//! - Lists are ordered by hash key.

use crate::db::schema::{TABLE_HUB_LETTERS, TABLE_HUB_USERS};
use crate::model::hub::{LetterHub, UserHub};
use crate::model::key::HashKey;
use crate::repo::{
    ensure_vault_ready, parse_hash_key, push_pagination, ListQuery, RepoResult, HUB_LETTERS,
    HUB_USERS,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

/// Column layout shared by both hub tables.
struct HubTable {
    table: &'static str,
    id_column: &'static str,
    hash_column: &'static str,
    /// `table.column` used in invalid-data messages.
    hash_path: &'static str,
}

const USERS: HubTable = HubTable {
    table: TABLE_HUB_USERS,
    id_column: "user_id",
    hash_column: "user_id_hash",
    hash_path: "h_users.user_id_hash",
};

const LETTERS: HubTable = HubTable {
    table: TABLE_HUB_LETTERS,
    id_column: "letter_id",
    hash_column: "letter_id_hash",
    hash_path: "h_letters.letter_id_hash",
};

/// Repository interface for hub rows.
pub trait HubRepository {
    fn create_user(&self, hub: &UserHub) -> RepoResult<()>;
    fn get_user(&self, user_id_hash: &HashKey) -> RepoResult<Option<UserHub>>;
    /// Every hub row carrying `user_id`, ordered by hash key.
    fn find_users_by_id(&self, user_id: i32) -> RepoResult<Vec<UserHub>>;
    fn list_users(&self, query: &ListQuery) -> RepoResult<Vec<UserHub>>;

    fn create_letter(&self, hub: &LetterHub) -> RepoResult<()>;
    fn get_letter(&self, letter_id_hash: &HashKey) -> RepoResult<Option<LetterHub>>;
    /// Every hub row carrying `letter_id`, ordered by hash key.
    fn find_letters_by_id(&self, letter_id: i32) -> RepoResult<Vec<LetterHub>>;
    fn list_letters(&self, query: &ListQuery) -> RepoResult<Vec<LetterHub>>;
}

/// SQLite-backed hub repository.
pub struct SqliteHubRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHubRepository<'conn> {
    /// Constructs a repository from a connection with the vault schema applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_vault_ready(conn, &[HUB_USERS, HUB_LETTERS])?;
        Ok(Self { conn })
    }
}

impl HubRepository for SqliteHubRepository<'_> {
    fn create_user(&self, hub: &UserHub) -> RepoResult<()> {
        insert_hub(self.conn, &USERS, hub.user_id, &hub.user_id_hash)
    }

    fn get_user(&self, user_id_hash: &HashKey) -> RepoResult<Option<UserHub>> {
        let row = get_hub(self.conn, &USERS, user_id_hash)?;
        Ok(row.map(|(user_id, user_id_hash)| UserHub::new(user_id, user_id_hash)))
    }

    fn find_users_by_id(&self, user_id: i32) -> RepoResult<Vec<UserHub>> {
        let rows = find_hubs_by_id(self.conn, &USERS, user_id)?;
        Ok(rows
            .into_iter()
            .map(|(user_id, user_id_hash)| UserHub::new(user_id, user_id_hash))
            .collect())
    }

    fn list_users(&self, query: &ListQuery) -> RepoResult<Vec<UserHub>> {
        let rows = list_hubs(self.conn, &USERS, query)?;
        Ok(rows
            .into_iter()
            .map(|(user_id, user_id_hash)| UserHub::new(user_id, user_id_hash))
            .collect())
    }

    fn create_letter(&self, hub: &LetterHub) -> RepoResult<()> {
        insert_hub(self.conn, &LETTERS, hub.letter_id, &hub.letter_id_hash)
    }

    fn get_letter(&self, letter_id_hash: &HashKey) -> RepoResult<Option<LetterHub>> {
        let row = get_hub(self.conn, &LETTERS, letter_id_hash)?;
        Ok(row.map(|(letter_id, letter_id_hash)| LetterHub::new(letter_id, letter_id_hash)))
    }

    fn find_letters_by_id(&self, letter_id: i32) -> RepoResult<Vec<LetterHub>> {
        let rows = find_hubs_by_id(self.conn, &LETTERS, letter_id)?;
        Ok(rows
            .into_iter()
            .map(|(letter_id, letter_id_hash)| LetterHub::new(letter_id, letter_id_hash))
            .collect())
    }

    fn list_letters(&self, query: &ListQuery) -> RepoResult<Vec<LetterHub>> {
        let rows = list_hubs(self.conn, &LETTERS, query)?;
        Ok(rows
            .into_iter()
            .map(|(letter_id, letter_id_hash)| LetterHub::new(letter_id, letter_id_hash))
            .collect())
    }
}

fn insert_hub(conn: &Connection, hub: &HubTable, id: i32, hash: &HashKey) -> RepoResult<()> {
    conn.execute(
        &format!(
            "INSERT INTO dds.{} ({}, {}) VALUES (?1, ?2);",
            hub.table, hub.id_column, hub.hash_column
        ),
        params![id, hash.as_str()],
    )?;
    Ok(())
}

fn get_hub(
    conn: &Connection,
    hub: &HubTable,
    hash: &HashKey,
) -> RepoResult<Option<(i32, HashKey)>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE {} = ?1;",
        select_sql(hub),
        hub.hash_column
    ))?;

    let mut rows = stmt.query([hash.as_str()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_hub_row(row, hub)?));
    }

    Ok(None)
}

fn find_hubs_by_id(
    conn: &Connection,
    hub: &HubTable,
    id: i32,
) -> RepoResult<Vec<(i32, HashKey)>> {
    let mut stmt = conn.prepare(&format!(
        "{} WHERE {} = ?1 ORDER BY {} ASC;",
        select_sql(hub),
        hub.id_column,
        hub.hash_column
    ))?;

    let mut rows = stmt.query([id])?;
    let mut hubs = Vec::new();
    while let Some(row) = rows.next()? {
        hubs.push(parse_hub_row(row, hub)?);
    }

    Ok(hubs)
}

fn list_hubs(
    conn: &Connection,
    hub: &HubTable,
    query: &ListQuery,
) -> RepoResult<Vec<(i32, HashKey)>> {
    let mut sql = format!("{} ORDER BY {} ASC", select_sql(hub), hub.hash_column);
    let mut bind_values: Vec<Value> = Vec::new();
    push_pagination(&mut sql, &mut bind_values, query);

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut hubs = Vec::new();
    while let Some(row) = rows.next()? {
        hubs.push(parse_hub_row(row, hub)?);
    }

    Ok(hubs)
}

fn select_sql(hub: &HubTable) -> String {
    format!(
        "SELECT {}, {} FROM dds.{}",
        hub.id_column, hub.hash_column, hub.table
    )
}

fn parse_hub_row(row: &Row<'_>, hub: &HubTable) -> RepoResult<(i32, HashKey)> {
    let id: i32 = row.get(0)?;
    let hash = parse_hash_key(row.get(1)?, hub.hash_path)?;
    Ok((id, hash))
}
