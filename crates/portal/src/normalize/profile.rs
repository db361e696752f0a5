//! Profile normalization: loose DSO record in, canonical [`User`] out.

use serde_json::{Map, Value};

use donor_portal_core::{Document, DonorId, DonorType};

use super::aliases::FieldAliases;
use super::fields::{first_array, first_text, unwrap_record};
use super::mojibake;
use crate::models::{Address, User};

/// A normalized profile plus the raw product entries that came with it.
///
/// Products stay loosely typed here; the donation aggregator normalizes them.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user: User,
    pub products: Vec<Value>,
}

/// Normalize a `my-profile` payload.
///
/// Returns `None` when the payload is not an object or carries neither an id
/// nor a document, since such a record cannot identify a donor.
#[must_use]
pub fn normalize_profile(raw: &Value, aliases: &FieldAliases) -> Option<Profile> {
    let record = unwrap_record(raw)?;
    let user = normalize_user(record, aliases)?;

    let mut products = first_array(record, &aliases.products)
        .cloned()
        .unwrap_or_default();
    products.iter_mut().for_each(mojibake::repair_json);

    Some(Profile { user, products })
}

/// Map one record onto the canonical user shape.
#[must_use]
pub fn normalize_user(record: &Map<String, Value>, aliases: &FieldAliases) -> Option<User> {
    let raw_document = first_text(record, &aliases.document);
    let document = raw_document.as_deref().map(|doc| {
        Document::parse(doc).map_or_else(|_| doc.to_string(), Document::into_inner)
    });

    let id = first_text(record, &aliases.id).or_else(|| document.clone())?;

    let donor_type = first_text(record, &aliases.donor_type)
        .and_then(|t| DonorType::from_loose(&t))
        .unwrap_or_default();

    Some(User {
        id: DonorId::new(id),
        name: first_text(record, &aliases.name).unwrap_or_default(),
        email: first_text(record, &aliases.email)
            .map(|e| e.to_lowercase())
            .unwrap_or_default(),
        document: document.unwrap_or_default(),
        donor_type,
        phone: first_text(record, &aliases.phone),
        address: normalize_address(record, aliases),
        birth_date: first_text(record, &aliases.birth_date),
        gender: first_text(record, &aliases.gender),
    })
}

/// Address fields: top level first, then the first nested address object.
fn normalize_address(record: &Map<String, Value>, aliases: &FieldAliases) -> Address {
    let nested = aliases
        .address_object
        .iter()
        .find_map(|key| record.get(key).and_then(Value::as_object));

    let pick = |names: &[String]| {
        first_text(record, names).or_else(|| nested.and_then(|obj| first_text(obj, names)))
    };

    Address {
        address: pick(&aliases.address),
        number: pick(&aliases.number),
        complement: pick(&aliases.complement),
        neighborhood: pick(&aliases.neighborhood),
        city: pick(&aliases.city),
        state: pick(&aliases.state).map(|s| s.to_uppercase()),
        zip_code: pick(&aliases.zip_code),
        country: pick(&aliases.country),
    }
}
