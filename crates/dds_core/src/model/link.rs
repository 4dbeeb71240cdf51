//! Link row: "user posted letter".

use crate::model::key::HashKey;
use serde::{Deserialize, Serialize};

/// Row of `dds.l_posts`.
///
/// The pair is unique; either side may repeat across rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PostLink {
    pub user_id_hash: HashKey,
    pub letter_id_hash: HashKey,
}

impl PostLink {
    pub fn new(user_id_hash: HashKey, letter_id_hash: HashKey) -> Self {
        Self {
            user_id_hash,
            letter_id_hash,
        }
    }
}
