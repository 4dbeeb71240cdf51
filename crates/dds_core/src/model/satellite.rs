//! Satellite row carrying a letter's descriptive content.

use crate::model::key::HashKey;
use serde::{Deserialize, Serialize};

/// Row of `dds.s_letters`, keyed 1:1 by the letter hub key.
///
/// Title and body are mandatory but may be empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterSatellite {
    pub letter_id_hash: HashKey,
    pub letter_title: String,
    pub letter_body: String,
}

impl LetterSatellite {
    pub fn new(
        letter_id_hash: HashKey,
        letter_title: impl Into<String>,
        letter_body: impl Into<String>,
    ) -> Self {
        Self {
            letter_id_hash,
            letter_title: letter_title.into(),
            letter_body: letter_body.into(),
        }
    }
}
