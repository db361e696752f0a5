//! Canonical donation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use donor_portal_core::{Amount, DonationId, DonationStatus, DonationType};

/// Where a donation record came from.
///
/// Declared in precedence order: when two sources report the same id, the
/// earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationSource {
    /// Made during the current session and not yet visible upstream.
    Local,
    /// From the order/transaction history endpoint.
    History,
    /// Derived from the products on the donor's profile.
    Server,
}

impl DonationSource {
    /// Prefix for synthetic ids of records without one.
    #[must_use]
    pub const fn id_prefix(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::History => "history",
            Self::Server => "product",
        }
    }
}

/// A donation, whichever source reported it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donation {
    pub id: DonationId,
    /// `None` when the source has no usable date; such records sort last.
    pub date: Option<DateTime<Utc>>,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub kind: DonationType,
    pub status: DonationStatus,
    pub description: String,
    pub source: DonationSource,
}
