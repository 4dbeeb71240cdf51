//! Hub rows: stable business ids paired with their surrogate keys.
//!
//! # Invariants
//! - The hash key is the identity of a hub row.
//! - The business id is required but not unique; several hash rows may carry
//!   the same id.

use crate::model::key::HashKey;
use serde::{Deserialize, Serialize};

/// Row of `dds.h_users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserHub {
    pub user_id: i32,
    pub user_id_hash: HashKey,
}

impl UserHub {
    pub fn new(user_id: i32, user_id_hash: HashKey) -> Self {
        Self {
            user_id,
            user_id_hash,
        }
    }
}

/// Row of `dds.h_letters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterHub {
    pub letter_id: i32,
    pub letter_id_hash: HashKey,
}

impl LetterHub {
    pub fn new(letter_id: i32, letter_id_hash: HashKey) -> Self {
        Self {
            letter_id,
            letter_id_hash,
        }
    }
}
