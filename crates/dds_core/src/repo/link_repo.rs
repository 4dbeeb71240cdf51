//! Link repository for "user posted letter" rows in `dds.l_posts`.
//!
//! # Invariants
//! - The `(user_id_hash, letter_id_hash)` pair is unique; a repeat fails with
//!   `ConstraintKind::Unique`.
//! - Either side may repeat with a different partner.
//! - Both sides must exist in their hubs (`ConstraintKind::ForeignKey`).
//! - Results are ordered by user key, then letter key.

use crate::model::key::HashKey;
use crate::model::link::PostLink;
use crate::repo::{
    ensure_vault_ready, parse_hash_key, push_pagination, ListQuery, RepoResult, HUB_LETTERS,
    HUB_USERS, LINK_POSTS,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const LINK_SELECT_SQL: &str = "SELECT user_id_hash, letter_id_hash FROM dds.l_posts";
const LINK_ORDER_SQL: &str = " ORDER BY user_id_hash ASC, letter_id_hash ASC";

/// Repository interface for link rows.
pub trait LinkRepository {
    fn create_post(&self, link: &PostLink) -> RepoResult<()>;
    fn post_exists(&self, link: &PostLink) -> RepoResult<bool>;
    fn list_posts_by_user(
        &self,
        user_id_hash: &HashKey,
        query: &ListQuery,
    ) -> RepoResult<Vec<PostLink>>;
    fn list_posts_by_letter(
        &self,
        letter_id_hash: &HashKey,
        query: &ListQuery,
    ) -> RepoResult<Vec<PostLink>>;
    fn list_posts(&self, query: &ListQuery) -> RepoResult<Vec<PostLink>>;
}

/// SQLite-backed link repository.
pub struct SqliteLinkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLinkRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_vault_ready(conn, &[HUB_USERS, HUB_LETTERS, LINK_POSTS])?;
        Ok(Self { conn })
    }

    fn query_links(
        &self,
        filter: Option<(&str, &HashKey)>,
        query: &ListQuery,
    ) -> RepoResult<Vec<PostLink>> {
        let mut sql = LINK_SELECT_SQL.to_string();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some((column, key)) = filter {
            sql.push_str(&format!(" WHERE {column} = ?"));
            bind_values.push(Value::Text(key.as_str().to_string()));
        }

        sql.push_str(LINK_ORDER_SQL);
        push_pagination(&mut sql, &mut bind_values, query);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut links = Vec::new();
        while let Some(row) = rows.next()? {
            links.push(parse_link_row(row)?);
        }

        Ok(links)
    }
}

impl LinkRepository for SqliteLinkRepository<'_> {
    fn create_post(&self, link: &PostLink) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO dds.l_posts (user_id_hash, letter_id_hash) VALUES (?1, ?2);",
            params![link.user_id_hash.as_str(), link.letter_id_hash.as_str()],
        )?;
        Ok(())
    }

    fn post_exists(&self, link: &PostLink) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM dds.l_posts
                WHERE user_id_hash = ?1 AND letter_id_hash = ?2
            );",
            params![link.user_id_hash.as_str(), link.letter_id_hash.as_str()],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn list_posts_by_user(
        &self,
        user_id_hash: &HashKey,
        query: &ListQuery,
    ) -> RepoResult<Vec<PostLink>> {
        self.query_links(Some(("user_id_hash", user_id_hash)), query)
    }

    fn list_posts_by_letter(
        &self,
        letter_id_hash: &HashKey,
        query: &ListQuery,
    ) -> RepoResult<Vec<PostLink>> {
        self.query_links(Some(("letter_id_hash", letter_id_hash)), query)
    }

    fn list_posts(&self, query: &ListQuery) -> RepoResult<Vec<PostLink>> {
        self.query_links(None, query)
    }
}

fn parse_link_row(row: &Row<'_>) -> RepoResult<PostLink> {
    Ok(PostLink {
        user_id_hash: parse_hash_key(row.get("user_id_hash")?, "l_posts.user_id_hash")?,
        letter_id_hash: parse_hash_key(row.get("letter_id_hash")?, "l_posts.letter_id_hash")?,
    })
}
