//! SQLite storage bootstrap for the `dds` vault schema.
//!
//! # Responsibility
//! - Open and configure SQLite connections with the `dds` schema attached.
//! - Apply the vault DDL idempotently before any caller touches rows.
//!
//! # Invariants
//! - The store file is attached under the schema name `dds`; every vault table
//!   lives there.
//! - Schema version is tracked via `PRAGMA dds.user_version`.
//! - Core code must not read/write vault rows before the schema is applied.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

mod open;
pub mod schema;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// SQLite `ATTACH` takes the store location as text.
    NonUtf8Path(PathBuf),
    /// DDL was requested on a connection without the `dds` schema attached.
    SchemaNotAttached,
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::NonUtf8Path(path) => {
                write!(f, "store path `{}` is not valid UTF-8", path.display())
            }
            Self::SchemaNotAttached => write!(
                f,
                "schema `{}` is not attached to this connection",
                schema::SCHEMA_NAME
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NonUtf8Path(_) => None,
            Self::SchemaNotAttached => None,
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
