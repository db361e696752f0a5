//! Canonical donor model.

use serde::{Deserialize, Serialize};

use donor_portal_core::{Document, DonorId, DonorType};

/// A donor's postal address. Every field is optional because the DSO often
/// has only part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Street name (from `street`, `address`, ...).
    pub address: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    /// Two-letter state code, when the backend provides one.
    pub state: Option<String>,
    /// CEP (from `cep`, `zipCode`, ...).
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl Address {
    /// Whether no address field is known.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.number.is_none()
            && self.complement.is_none()
            && self.neighborhood.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip_code.is_none()
            && self.country.is_none()
    }

    /// Format the address as a single line.
    #[must_use]
    pub fn formatted_single_line(&self) -> String {
        let street = match (&self.address, &self.number) {
            (Some(street), Some(number)) => Some(format!("{street}, {number}")),
            (Some(street), None) => Some(street.clone()),
            _ => None,
        };
        let city = match (&self.city, &self.state) {
            (Some(city), Some(state)) => Some(format!("{city}/{state}")),
            (Some(city), None) => Some(city.clone()),
            (None, Some(state)) => Some(state.clone()),
            (None, None) => None,
        };

        [
            street,
            self.complement.clone(),
            self.neighborhood.clone(),
            city,
            self.zip_code.clone(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" - ")
    }
}

/// A donor as the portal sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: DonorId,
    pub name: String,
    pub email: String,
    /// CPF as sent by the backend (digits only when it was valid).
    pub document: String,
    pub donor_type: DonorType,
    pub phone: Option<String>,
    pub address: Address,
    pub birth_date: Option<String>,
    pub gender: Option<String>,
}

impl User {
    /// A minimal user for sessions that never reached the backend.
    #[must_use]
    pub fn from_document(document: &Document) -> Self {
        Self {
            id: DonorId::new(document.as_str()),
            name: String::new(),
            email: String::new(),
            document: document.as_str().to_string(),
            donor_type: DonorType::default(),
            phone: None,
            address: Address::default(),
            birth_date: None,
            gender: None,
        }
    }

    /// First word of the donor's name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_single_line() {
        let address = Address {
            address: Some("Rua das Flores".to_string()),
            number: Some("10".to_string()),
            neighborhood: Some("Centro".to_string()),
            city: Some("Campinas".to_string()),
            state: Some("SP".to_string()),
            zip_code: Some("13010-000".to_string()),
            ..Address::default()
        };
        assert_eq!(
            address.formatted_single_line(),
            "Rua das Flores, 10 - Centro - Campinas/SP - 13010-000"
        );
        assert!(!address.is_empty());
        assert!(Address::default().is_empty());
    }

    #[test]
    fn test_from_document() {
        let document = Document::parse("529.982.247-25").expect("valid cpf");
        let user = User::from_document(&document);
        assert_eq!(user.id.as_str(), "52998224725");
        assert_eq!(user.document, "52998224725");
        assert_eq!(user.first_name(), "");
    }

    #[test]
    fn test_serializes_camel_case() {
        let document = Document::parse("529.982.247-25").expect("valid cpf");
        let mut user = User::from_document(&document);
        user.address.zip_code = Some("01001-000".to_string());
        let json = serde_json::to_value(&user).expect("serialize");
        assert_eq!(json["donorType"], "single");
        assert_eq!(json["address"]["zipCode"], "01001-000");
    }
}
