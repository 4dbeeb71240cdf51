//! Publishing a letter: hubs, content and link in one unit of work.
//!
//! # Responsibility
//! - Write every row a posted letter needs, in dependency order.
//! - Reuse hub rows that already exist for the same key.
//!
//! # Invariants
//! - `publish` is atomic: on any error no row is written.
//! - A hub key already bound to another business id is a conflict, never an
//!   overwrite.
//! - Letter content is never replaced; publishing twice fails.

use crate::db::schema::{TABLE_HUB_LETTERS, TABLE_HUB_USERS};
use crate::model::hub::{LetterHub, UserHub};
use crate::model::key::HashKey;
use crate::model::link::PostLink;
use crate::model::satellite::LetterSatellite;
use crate::repo::hub_repo::{HubRepository, SqliteHubRepository};
use crate::repo::link_repo::{LinkRepository, SqliteLinkRepository};
use crate::repo::satellite_repo::{SatelliteRepository, SqliteSatelliteRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Publish use-case error.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    /// The hub key exists but is bound to a different business id.
    HubConflict {
        table: &'static str,
        key: HashKey,
        existing_id: i32,
        requested_id: i32,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::HubConflict {
                table,
                key,
                existing_id,
                requested_id,
            } => write!(
                f,
                "hub key `{key}` in {table} is bound to id {existing_id}, not {requested_id}"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::HubConflict { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

/// Input for publishing one letter by one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub user: UserHub,
    pub letter: LetterHub,
    pub letter_title: String,
    pub letter_body: String,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPost {
    pub link: PostLink,
    /// `false` when the user hub row already existed.
    pub user_hub_created: bool,
    /// `false` when the letter hub row already existed.
    pub letter_hub_created: bool,
}

/// Use-case service for posting letters into the vault.
pub struct PostService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> PostService<'conn> {
    /// Creates a service over a connection with the vault schema applied.
    ///
    /// Readiness is checked by the repositories on every `publish`.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Publishes a letter: user hub, letter hub, content, then link.
    ///
    /// # Errors
    /// - `HubConflict` when a hub key is already bound to another id.
    /// - `Repo(Constraint { .. })` when content or the link already exists.
    pub fn publish(&mut self, request: &PublishRequest) -> ServiceResult<PublishedPost> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let published = {
            let hubs = SqliteHubRepository::try_new(&tx)?;
            let user_hub_created = ensure_user_hub(&hubs, &request.user)?;
            let letter_hub_created = ensure_letter_hub(&hubs, &request.letter)?;

            SqliteSatelliteRepository::try_new(&tx)?.create_letter_content(
                &LetterSatellite::new(
                    request.letter.letter_id_hash.clone(),
                    request.letter_title.as_str(),
                    request.letter_body.as_str(),
                ),
            )?;

            let link = PostLink::new(
                request.user.user_id_hash.clone(),
                request.letter.letter_id_hash.clone(),
            );
            SqliteLinkRepository::try_new(&tx)?.create_post(&link)?;

            PublishedPost {
                link,
                user_hub_created,
                letter_hub_created,
            }
        };

        tx.commit()?;
        info!(
            "event=post_publish module=service status=ok user_hub_created={} letter_hub_created={}",
            published.user_hub_created, published.letter_hub_created
        );
        Ok(published)
    }
}

fn ensure_user_hub(hubs: &impl HubRepository, user: &UserHub) -> ServiceResult<bool> {
    match hubs.get_user(&user.user_id_hash)? {
        Some(existing) if existing.user_id != user.user_id => {
            warn!("event=post_publish module=service status=conflict table={TABLE_HUB_USERS}");
            Err(ServiceError::HubConflict {
                table: TABLE_HUB_USERS,
                key: existing.user_id_hash,
                existing_id: existing.user_id,
                requested_id: user.user_id,
            })
        }
        Some(_) => Ok(false),
        None => {
            hubs.create_user(user)?;
            Ok(true)
        }
    }
}

fn ensure_letter_hub(hubs: &impl HubRepository, letter: &LetterHub) -> ServiceResult<bool> {
    match hubs.get_letter(&letter.letter_id_hash)? {
        Some(existing) if existing.letter_id != letter.letter_id => {
            warn!("event=post_publish module=service status=conflict table={TABLE_HUB_LETTERS}");
            Err(ServiceError::HubConflict {
                table: TABLE_HUB_LETTERS,
                key: existing.letter_id_hash,
                existing_id: existing.letter_id,
                requested_id: letter.letter_id,
            })
        }
        Some(_) => Ok(false),
        None => {
            hubs.create_letter(letter)?;
            Ok(true)
        }
    }
}
