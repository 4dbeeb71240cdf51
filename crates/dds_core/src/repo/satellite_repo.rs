//! Satellite repository for letter content in `dds.s_letters`.
//!
//! # Invariants
//! - One content row per letter hub key; a second insert fails with
//!   `ConstraintKind::PrimaryKey`.
//! - Content for a key absent from `dds.h_letters` fails with
//!   `ConstraintKind::ForeignKey`.

use crate::model::key::HashKey;
use crate::model::satellite::LetterSatellite;
use crate::repo::{
    ensure_vault_ready, parse_hash_key, push_pagination, ListQuery, RepoResult, HUB_LETTERS,
    SATELLITE_LETTERS,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const SATELLITE_SELECT_SQL: &str = "SELECT
    letter_id_hash,
    letter_title,
    letter_body
FROM dds.s_letters";

/// Repository interface for letter content rows.
pub trait SatelliteRepository {
    fn create_letter_content(&self, satellite: &LetterSatellite) -> RepoResult<()>;
    fn get_letter_content(&self, letter_id_hash: &HashKey) -> RepoResult<Option<LetterSatellite>>;
    fn list_letter_contents(&self, query: &ListQuery) -> RepoResult<Vec<LetterSatellite>>;
}

/// SQLite-backed satellite repository.
pub struct SqliteSatelliteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSatelliteRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_vault_ready(conn, &[HUB_LETTERS, SATELLITE_LETTERS])?;
        Ok(Self { conn })
    }
}

impl SatelliteRepository for SqliteSatelliteRepository<'_> {
    fn create_letter_content(&self, satellite: &LetterSatellite) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO dds.s_letters (
                letter_id_hash,
                letter_title,
                letter_body
            ) VALUES (?1, ?2, ?3);",
            params![
                satellite.letter_id_hash.as_str(),
                satellite.letter_title.as_str(),
                satellite.letter_body.as_str(),
            ],
        )?;
        Ok(())
    }

    fn get_letter_content(&self, letter_id_hash: &HashKey) -> RepoResult<Option<LetterSatellite>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SATELLITE_SELECT_SQL} WHERE letter_id_hash = ?1;"))?;

        let mut rows = stmt.query([letter_id_hash.as_str()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_satellite_row(row)?));
        }

        Ok(None)
    }

    fn list_letter_contents(&self, query: &ListQuery) -> RepoResult<Vec<LetterSatellite>> {
        let mut sql = format!("{SATELLITE_SELECT_SQL} ORDER BY letter_id_hash ASC");
        let mut bind_values: Vec<Value> = Vec::new();
        push_pagination(&mut sql, &mut bind_values, query);

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut contents = Vec::new();
        while let Some(row) = rows.next()? {
            contents.push(parse_satellite_row(row)?);
        }

        Ok(contents)
    }
}

fn parse_satellite_row(row: &Row<'_>) -> RepoResult<LetterSatellite> {
    Ok(LetterSatellite {
        letter_id_hash: parse_hash_key(row.get("letter_id_hash")?, "s_letters.letter_id_hash")?,
        letter_title: row.get("letter_title")?,
        letter_body: row.get("letter_body")?,
    })
}
