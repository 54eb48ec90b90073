use serde::{Deserialize, Serialize};

use workify_core::{EpochMillis, RecordId};

use crate::document::{Fields, ID_KEY, strip_keys};

/// Append-only feedback entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id")]
    pub id: RecordId,
    pub created: EpochMillis,
    #[serde(flatten)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    #[serde(default)]
    pub created: Option<EpochMillis>,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NewReview {
    pub fn into_review(self, id: RecordId, now: EpochMillis) -> Review {
        Review {
            id,
            created: self.created.unwrap_or(now),
            fields: strip_keys(self.fields, &[ID_KEY]),
        }
    }
}
