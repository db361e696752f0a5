//! Status vocabularies for donors, donations and letters.
//!
//! The DSO backend is not consistent about its vocabulary: the same concept may
//! arrive in English or Portuguese, upper or lower case. Each enum has a
//! `from_loose` constructor that accepts the known spellings, and serializes
//! to one canonical snake-case form.

use serde::{Deserialize, Serialize};

/// Lowercase a backend value and strip accents that matter for matching.
fn fold(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'ô' | 'õ' => 'o',
            'ú' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// How a donor contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DonorType {
    /// Sponsors one or more children.
    Sponsor,
    /// Gives a recurring monthly donation.
    Monthly,
    /// Gave one-off donations only.
    #[default]
    Single,
}

impl DonorType {
    /// Parse the backend's donor type, if recognized.
    #[must_use]
    pub fn from_loose(s: &str) -> Option<Self> {
        let folded = fold(s);
        match folded.as_str() {
            "sponsor" | "padrinho" | "madrinha" | "apadrinhamento" | "sponsorship" => {
                Some(Self::Sponsor)
            }
            "monthly" | "mensal" | "recorrente" | "recurring" | "guardiao" => Some(Self::Monthly),
            "single" | "unica" | "avulsa" | "once" | "one_time" | "pontual" => Some(Self::Single),
            _ => None,
        }
    }
}

impl std::fmt::Display for DonorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sponsor => write!(f, "sponsor"),
            Self::Monthly => write!(f, "monthly"),
            Self::Single => write!(f, "single"),
        }
    }
}

/// Kind of donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DonationType {
    /// Recurring monthly donation.
    Monthly,
    /// One-off donation.
    #[default]
    Once,
    /// Payment tied to a sponsored child.
    Sponsorship,
}

impl DonationType {
    /// Classify a backend product or transaction description.
    ///
    /// Matching is by substring so that values like `"Apadrinhamento Mensal"`
    /// or `"MONTHLY_DONATION"` are recognized. Sponsorship wins over monthly,
    /// since sponsorships are also billed monthly.
    #[must_use]
    pub fn classify(s: &str) -> Self {
        Self::recognize(s).unwrap_or(Self::Once)
    }

    /// Like [`Self::classify`], but `None` unless the text names a kind.
    ///
    /// One-off values must match exactly (`"única"`, `"avulsa"`, `"once"`).
    #[must_use]
    pub fn recognize(s: &str) -> Option<Self> {
        let folded = fold(s);
        let has = |keys: &[&str]| keys.iter().any(|k| folded.contains(k));

        if has(&["sponsor", "apadrinh", "padrinho", "madrinha"]) {
            Some(Self::Sponsorship)
        } else if has(&["month", "mensal", "recorr", "recurr", "guardiao"]) {
            Some(Self::Monthly)
        } else if matches!(
            folded.as_str(),
            "once" | "one_time" | "one-time" | "single" | "unica" | "unico" | "avulsa" | "pontual"
        ) {
            Some(Self::Once)
        } else {
            None
        }
    }
}

impl std::fmt::Display for DonationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Once => write!(f, "once"),
            Self::Sponsorship => write!(f, "sponsorship"),
        }
    }
}

/// Payment status of a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    /// Money received.
    Paid,
    /// Awaiting payment or confirmation.
    Pending,
    /// Cancelled by the donor or the organization.
    Cancelled,
    /// Payment attempt failed.
    Failed,
    /// Status missing or not recognized.
    #[default]
    Unknown,
}

impl DonationStatus {
    /// Parse the backend's status vocabulary; unrecognized values map to `Unknown`.
    #[must_use]
    pub fn from_loose(s: &str) -> Self {
        match fold(s).as_str() {
            "paid" | "pago" | "approved" | "aprovado" | "confirmed" | "confirmado"
            | "completed" | "concluido" | "active" | "ativo" | "success" => Self::Paid,
            "pending" | "pendente" | "processing" | "processando" | "waiting"
            | "aguardando" | "open" | "aberto" => Self::Pending,
            "cancelled" | "canceled" | "cancelado" | "inactive" | "inativo" => Self::Cancelled,
            "failed" | "falhou" | "refused" | "recusado" | "declined" | "error" => Self::Failed,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paid => write!(f, "paid"),
            Self::Pending => write!(f, "pending"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Failed => write!(f, "failed"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Whether a letter was written by the donor or by the sponsored child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LetterDirection {
    /// Written by the donor.
    #[default]
    Sent,
    /// Written by the child.
    Received,
}

impl LetterDirection {
    /// Parse the backend's direction or sender field.
    #[must_use]
    pub fn from_loose(s: &str) -> Self {
        match fold(s).as_str() {
            "received" | "recebida" | "inbound" | "child" | "crianca" => Self::Received,
            _ => Self::Sent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_donor_type_from_loose() {
        assert_eq!(DonorType::from_loose("Padrinho"), Some(DonorType::Sponsor));
        assert_eq!(DonorType::from_loose(" MENSAL "), Some(DonorType::Monthly));
        assert_eq!(DonorType::from_loose("única"), Some(DonorType::Single));
        assert_eq!(DonorType::from_loose("vip"), None);
    }

    #[test]
    fn test_donation_type_classify() {
        assert_eq!(
            DonationType::classify("Apadrinhamento Mensal"),
            DonationType::Sponsorship
        );
        assert_eq!(
            DonationType::classify("MONTHLY_DONATION"),
            DonationType::Monthly
        );
        assert_eq!(
            DonationType::classify("Doação Recorrente"),
            DonationType::Monthly
        );
        assert_eq!(DonationType::classify("Natal 2024"), DonationType::Once);
        assert_eq!(DonationType::recognize("Natal 2024"), None);
        assert_eq!(DonationType::recognize("Única"), Some(DonationType::Once));
        assert_eq!(DonationType::recognize("AVULSA"), Some(DonationType::Once));
    }

    #[test]
    fn test_donation_status_from_loose() {
        assert_eq!(DonationStatus::from_loose("APROVADO"), DonationStatus::Paid);
        assert_eq!(
            DonationStatus::from_loose("Concluído"),
            DonationStatus::Paid
        );
        assert_eq!(
            DonationStatus::from_loose("pendente"),
            DonationStatus::Pending
        );
        assert_eq!(
            DonationStatus::from_loose("canceled"),
            DonationStatus::Cancelled
        );
        assert_eq!(DonationStatus::from_loose("???"), DonationStatus::Unknown);
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&DonationType::Sponsorship).expect("serialize");
        assert_eq!(json, "\"sponsorship\"");
        let back: DonorType = serde_json::from_str("\"monthly\"").expect("deserialize");
        assert_eq!(back, DonorType::Monthly);
    }

    #[test]
    fn test_letter_direction() {
        assert_eq!(
            LetterDirection::from_loose("Recebida"),
            LetterDirection::Received
        );
        assert_eq!(LetterDirection::from_loose("donor"), LetterDirection::Sent);
    }
}
