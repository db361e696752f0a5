//! Normalization of the children list and letter history.

use serde_json::{Map, Value};

use donor_portal_core::{ChildId, LetterDirection, LetterId};

use super::dates::parse_date_value;
use super::fields::{collection, first_text, first_value};
use crate::models::{Child, Letter};

const CHILD_LIST_KEYS: &[&str] = &["children", "criancas", "items", "list"];
const LETTER_LIST_KEYS: &[&str] = &["letters", "cartas", "items", "list"];

/// Normalize a `list-children` response. Entries without an id are dropped.
#[must_use]
pub fn normalize_children(raw: &Value) -> Vec<Child> {
    collection(raw, CHILD_LIST_KEYS)
        .into_iter()
        .filter_map(normalize_child)
        .collect()
}

fn normalize_child(record: &Map<String, Value>) -> Option<Child> {
    let id = first_text(record, &["id", "childId", "childNumber", "codigo"])?;
    Some(Child {
        id: ChildId::new(id),
        name: first_text(record, &["name", "childName", "nome", "fullName"]).unwrap_or_default(),
        birth_date: first_text(record, &["birthDate", "dateOfBirth", "dataNascimento"]),
        gender: first_text(record, &["gender", "sexo"]),
        country: first_text(record, &["country", "pais", "countryName"]),
        photo_url: first_text(record, &["photoUrl", "photo", "foto", "imageUrl"]),
    })
}

/// Normalize a `list-all-letters` response, newest first.
///
/// Letters without an id get a synthetic `letter-{n}` id.
#[must_use]
pub fn normalize_letters(raw: &Value) -> Vec<Letter> {
    let mut letters: Vec<Letter> = collection(raw, LETTER_LIST_KEYS)
        .into_iter()
        .enumerate()
        .map(|(index, record)| normalize_letter(index, record))
        .collect();
    letters.sort_by(|a, b| b.date.cmp(&a.date));
    letters
}

fn normalize_letter(index: usize, record: &Map<String, Value>) -> Letter {
    let id = first_text(record, &["id", "letterId", "codigo"])
        .unwrap_or_else(|| format!("letter-{index}"));
    Letter {
        id: LetterId::new(id),
        child_id: first_text(record, &["childId", "child", "codigoCrianca"]).map(ChildId::new),
        date: first_value(record, &["date", "sentAt", "createdAt", "data"])
            .and_then(parse_date_value),
        subject: first_text(record, &["subject", "title", "assunto"]).unwrap_or_default(),
        body: first_text(record, &["body", "message", "content", "mensagem", "texto"])
            .unwrap_or_default(),
        direction: first_text(record, &["direction", "from", "origem", "type"])
            .map(|d| LetterDirection::from_loose(&d))
            .unwrap_or_default(),
    }
}
