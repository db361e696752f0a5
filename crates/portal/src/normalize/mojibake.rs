//! Repair of double-encoded (mojibake) Portuguese text.
//!
//! Some DSO records were written as UTF-8, read back as Windows-1252, and
//! written again as UTF-8, so `ç` arrives as `Ã§`. Every such character is a
//! two-character sequence starting with `Ã` or `Â`; the second character
//! identifies the original.

use std::borrow::Cow;

/// Second character after `Ã`, and the character it stands for.
const AFTER_A_TILDE: &[(char, char)] = &[
    ('\u{a0}', 'à'),
    ('¡', 'á'),
    ('¢', 'â'),
    ('£', 'ã'),
    ('¤', 'ä'),
    ('§', 'ç'),
    ('¨', 'è'),
    ('©', 'é'),
    ('ª', 'ê'),
    ('\u{ad}', 'í'),
    ('±', 'ñ'),
    ('²', 'ò'),
    ('³', 'ó'),
    ('´', 'ô'),
    ('µ', 'õ'),
    ('º', 'ú'),
    ('¼', 'ü'),
    ('€', 'À'),
    ('\u{80}', 'À'),
    ('\u{81}', 'Á'),
    ('‚', 'Â'),
    ('ƒ', 'Ã'),
    ('‡', 'Ç'),
    ('‰', 'É'),
    ('Š', 'Ê'),
    ('\u{8d}', 'Í'),
    ('“', 'Ó'),
    ('”', 'Ô'),
    ('•', 'Õ'),
    ('š', 'Ú'),
    ('œ', 'Ü'),
];

fn after_a_tilde(c: char) -> Option<char> {
    AFTER_A_TILDE
        .iter()
        .find(|(from, _)| *from == c)
        .map(|(_, to)| *to)
}

/// `Â` followed by a Latin-1 symbol (`º`, `ª`, `°`, `§`, ...) is that symbol.
fn after_a_circumflex(c: char) -> Option<char> {
    ('\u{a0}'..='\u{bf}').contains(&c).then_some(c)
}

/// Replace every known two-character sequence once, left to right.
fn repair_pass(input: &str) -> Option<String> {
    if !input.contains(['Ã', 'Â']) {
        return None;
    }

    let mut out = String::with_capacity(input.len());
    let mut changed = false;
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        let decode: fn(char) -> Option<char> = match c {
            'Ã' => after_a_tilde,
            'Â' => after_a_circumflex,
            _ => {
                out.push(c);
                continue;
            }
        };

        match chars.peek().and_then(|next| decode(*next)) {
            Some(fixed) => {
                out.push(fixed);
                chars.next();
                changed = true;
            }
            None => out.push(c),
        }
    }

    changed.then_some(out)
}

/// Repair mojibake in `input`.
///
/// Passes repeat until nothing changes, which also undoes text that was
/// double-encoded more than once. Each pass that changes anything makes the
/// string shorter, so this terminates, and `repair(repair(s)) == repair(s)`.
#[must_use]
pub fn repair(input: &str) -> Cow<'_, str> {
    let Some(mut current) = repair_pass(input) else {
        return Cow::Borrowed(input);
    };
    while let Some(next) = repair_pass(&current) {
        current = next;
    }
    Cow::Owned(current)
}

/// Repair every string inside a JSON value, in place.
pub fn repair_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::String(s) => {
            if let Cow::Owned(fixed) = repair(s) {
                *s = fixed;
            }
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(repair_json),
        serde_json::Value::Object(map) => map.values_mut().for_each(repair_json),
        _ => {}
    }
}
