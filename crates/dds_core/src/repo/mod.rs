//! Repository layer over the `dds` vault tables.
//!
//! # Responsibility
//! - Define per-table-family data access contracts (hubs, satellite, link).
//! - Isolate SQLite query details from use-case orchestration.
//! - Classify engine constraint violations without inventing new rules.
//!
//! # Invariants
//! - Repositories are only constructed over a connection whose `dds` schema is
//!   attached, at the current version, and carries the required tables.
//! - Read paths reject persisted keys that fail `HashKey` validation instead of
//!   masking them.

use crate::db::schema::{
    is_schema_attached, schema_version, table_exists, SCHEMA_NAME, SCHEMA_VERSION,
    TABLE_HUB_LETTERS, TABLE_HUB_USERS, TABLE_LINK_POSTS, TABLE_SATELLITE_LETTERS,
};
use crate::db::DbError;
use crate::model::key::HashKey;
use rusqlite::types::Value;
use rusqlite::{ffi, Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod hub_repo;
pub mod link_repo;
pub mod satellite_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Which engine constraint rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    NotNull,
    ForeignKey,
    Check,
    Other,
}

impl Display for ConstraintKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::PrimaryKey => "primary key",
            Self::Unique => "unique",
            Self::NotNull => "not null",
            Self::ForeignKey => "foreign key",
            Self::Check => "check",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// Repository error for vault persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// The engine rejected a write; `err` carries its message.
    Constraint {
        kind: ConstraintKind,
        err: rusqlite::Error,
    },
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl RepoError {
    /// Returns the violated constraint, if this is a constraint failure.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            Self::Constraint { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Constraint { kind, err } => write!(f, "{kind} constraint violated: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema is not ready: expected {SCHEMA_NAME} version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{SCHEMA_NAME}.{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "required column `{SCHEMA_NAME}.{table}.{column}` is missing"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted vault data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Constraint { err, .. } => Some(err),
            Self::UninitializedConnection { .. } => None,
            Self::MissingRequiredTable(_) => None,
            Self::MissingRequiredColumn { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match classify_constraint(&value) {
            Some(kind) => Self::Constraint { kind, err: value },
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Pagination options shared by every list operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

struct RequiredTable {
    name: &'static str,
    columns: &'static [&'static str],
}

const HUB_USERS: RequiredTable = RequiredTable {
    name: TABLE_HUB_USERS,
    columns: &["user_id", "user_id_hash"],
};

const HUB_LETTERS: RequiredTable = RequiredTable {
    name: TABLE_HUB_LETTERS,
    columns: &["letter_id", "letter_id_hash"],
};

const SATELLITE_LETTERS: RequiredTable = RequiredTable {
    name: TABLE_SATELLITE_LETTERS,
    columns: &["letter_id_hash", "letter_title", "letter_body"],
};

const LINK_POSTS: RequiredTable = RequiredTable {
    name: TABLE_LINK_POSTS,
    columns: &["user_id_hash", "letter_id_hash"],
};

fn classify_constraint(err: &rusqlite::Error) -> Option<ConstraintKind> {
    let rusqlite::Error::SqliteFailure(failure, _) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation {
        return None;
    }

    let kind = match failure.extended_code {
        ffi::SQLITE_CONSTRAINT_PRIMARYKEY => ConstraintKind::PrimaryKey,
        ffi::SQLITE_CONSTRAINT_UNIQUE => ConstraintKind::Unique,
        ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
        ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
        ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
        _ => ConstraintKind::Other,
    };
    Some(kind)
}

/// Verifies that `conn` carries an applied `dds` schema with `tables`.
fn ensure_vault_ready(conn: &Connection, tables: &[RequiredTable]) -> RepoResult<()> {
    let actual_version = if is_schema_attached(conn)? {
        schema_version(conn)?
    } else {
        0
    };
    if actual_version > SCHEMA_VERSION {
        return Err(RepoError::Db(DbError::UnsupportedSchemaVersion {
            db_version: actual_version,
            latest_supported: SCHEMA_VERSION,
        }));
    }
    if actual_version < SCHEMA_VERSION {
        return Err(RepoError::UninitializedConnection {
            expected_version: SCHEMA_VERSION,
            actual_version,
        });
    }

    for table in tables {
        if !table_exists(conn, table.name)? {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        for &column in table.columns {
            if !table_has_column(conn, table.name, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: table.name,
                    column,
                });
            }
        }
    }

    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM pragma_table_info(?1, ?2) WHERE name = ?3);",
        [table, SCHEMA_NAME, column],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(exists)
}

fn parse_hash_key(value: String, column: &'static str) -> RepoResult<HashKey> {
    HashKey::parse(value.as_str()).map_err(|err| {
        RepoError::InvalidData(format!("invalid key `{value}` in {SCHEMA_NAME}.{column}: {err}"))
    })
}

/// Appends `LIMIT`/`OFFSET` clauses and their bind values.
fn push_pagination(sql: &mut String, bind_values: &mut Vec<Value>, query: &ListQuery) {
    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }
    } else if query.offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(query.offset)));
    }
}
