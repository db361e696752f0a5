//! Sponsored children and the letters exchanged with them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use donor_portal_core::{ChildId, LetterDirection, LetterId};

/// A child sponsored by the donor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Child {
    pub id: ChildId,
    pub name: String,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub photo_url: Option<String>,
}

/// A letter between the donor and a sponsored child.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Letter {
    pub id: LetterId,
    pub child_id: Option<ChildId>,
    pub date: Option<DateTime<Utc>>,
    pub subject: String,
    pub body: String,
    pub direction: LetterDirection,
}
