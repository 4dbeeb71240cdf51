//! Core persistence for the `dds` data vault.
//! This crate owns the vault schema and every read/write against it.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::schema::{SchemaStatus, TableStatus, SCHEMA_NAME, SCHEMA_VERSION};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, LogSettings, LoggingError};
pub use model::hub::{LetterHub, UserHub};
pub use model::key::{HashKey, ModelValidationError};
pub use model::link::PostLink;
pub use model::satellite::LetterSatellite;
pub use repo::hub_repo::{HubRepository, SqliteHubRepository};
pub use repo::link_repo::{LinkRepository, SqliteLinkRepository};
pub use repo::satellite_repo::{SatelliteRepository, SqliteSatelliteRepository};
pub use repo::{ConstraintKind, ListQuery, RepoError, RepoResult};
pub use service::post_service::{
    PostService, PublishRequest, PublishedPost, ServiceError, ServiceResult,
};
