//! Donation normalization and merging.
//!
//! Donations reach the portal from three places: products on the donor's
//! profile, the order history endpoint, and payments made during the current
//! session. Each is mapped onto [`Donation`] and the three lists are merged
//! with local > history > server precedence.

use std::collections::HashSet;

use serde_json::{Map, Value};

use donor_portal_core::{Amount, DonationId, DonationStatus, DonationType};

use super::dates::parse_date_value;
use super::fields::{collection, first_text, first_value};
use crate::models::{Donation, DonationSource};

const HISTORY_LIST_KEYS: &[&str] = &["orders", "transactions", "history"];

const ID: &[&str] = &["id", "orderId", "transactionId", "productId", "codigo"];
const DATE: &[&str] = &[
    "date",
    "paymentDate",
    "paidAt",
    "createdAt",
    "startDate",
    "dataPagamento",
    "data",
];
const AMOUNT: &[&str] = &["amount", "value", "valor", "price", "total", "monthlyValue"];
const KIND: &[&str] = &["type", "frequency", "productType", "recurrence", "tipo"];
const STATUS: &[&str] = &["status", "paymentStatus", "situacao"];
const DESCRIPTION: &[&str] = &["description", "name", "productName", "descricao", "nome"];

/// Normalize the raw products from a profile payload.
#[must_use]
pub fn normalize_products(products: &[Value]) -> Vec<Donation> {
    products
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(index, record)| normalize_record(record, DonationSource::Server, index))
        .collect()
}

/// Normalize an order history response in any of its known shapes.
#[must_use]
pub fn normalize_history(raw: &Value) -> Vec<Donation> {
    collection(raw, HISTORY_LIST_KEYS)
        .into_iter()
        .enumerate()
        .map(|(index, record)| normalize_record(record, DonationSource::History, index))
        .collect()
}

/// Map one loose record onto a donation.
///
/// Records without an id get `"{source}-{index}"`.
#[must_use]
pub fn normalize_record(
    record: &Map<String, Value>,
    source: DonationSource,
    index: usize,
) -> Donation {
    let id = first_text(record, ID)
        .unwrap_or_else(|| format!("{}-{index}", source.id_prefix()));

    let description = first_text(record, DESCRIPTION).unwrap_or_default();

    // The type field is often missing; the product name usually says enough
    let kind = first_text(record, KIND)
        .and_then(|k| DonationType::recognize(&k))
        .or_else(|| {
            (record.get("recurring").and_then(Value::as_bool) == Some(true))
                .then_some(DonationType::Monthly)
        })
        .unwrap_or_else(|| DonationType::classify(&description));

    Donation {
        id: DonationId::new(id),
        date: first_value(record, DATE).and_then(parse_date_value),
        amount: first_value(record, AMOUNT)
            .and_then(Amount::from_json)
            .unwrap_or(Amount::ZERO),
        kind,
        status: first_text(record, STATUS)
            .map(|s| DonationStatus::from_loose(&s))
            .unwrap_or_default(),
        description,
        source,
    }
}

/// Merge the three sources into one list.
///
/// Concatenates local > history > server, keeps the first record for each
/// id, then stable-sorts by date descending with undated records last.
#[must_use]
pub fn merge_donations(
    local: Vec<Donation>,
    history: Vec<Donation>,
    server: Vec<Donation>,
) -> Vec<Donation> {
    let mut seen = HashSet::new();
    let mut merged: Vec<Donation> = local
        .into_iter()
        .chain(history)
        .chain(server)
        .filter(|d| seen.insert(d.id.clone()))
        .collect();

    // None < Some, so reversing the comparison puts undated records last
    merged.sort_by(|a, b| b.date.cmp(&a.date));
    merged
}
