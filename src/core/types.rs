//! Core type definitions and loose-JSON helpers used throughout the codebase

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

/// JSON object as produced by `serde_json` (sorted keys)
pub type JsonMap = serde_json::Map<String, Value>;

/// Identifier of an actor in the host's document store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read a number, accepting numeric strings ("3", " 2.5 ")
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Read a non-empty trimmed string
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// First non-null field among `keys`
pub fn first_present<'a>(map: &'a JsonMap, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

/// Store integral values as JSON integers so patches read naturally
pub fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Serialize an `f64` as an integer when it has no fractional part
pub fn serialize_number<S>(n: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        serializer.serialize_i64(*n as i64)
    } else {
        serializer.serialize_f64(*n)
    }
}

/// Fold a character to its unaccented lowercase base letter
fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'a',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'u',
        'ñ' | 'Ñ' => 'n',
        'ç' | 'Ç' => 'c',
        other => other.to_lowercase().next().unwrap_or(other),
    }
}

/// Lowercase, accent-free form of `s`
pub fn fold_text(s: &str) -> String {
    s.chars().map(fold_char).collect()
}

/// Lowercase ASCII slug: runs of non-alphanumerics collapse to `_`
pub fn slugify(s: &str) -> String {
    let mut slug = String::with_capacity(s.len());
    let mut pending_sep = false;
    for c in fold_text(s).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Locale-aware ordering for display labels
///
/// Case and accents are ignored on the first pass; ties fall back to the raw
/// strings so the order stays total.
pub fn collate(a: &str, b: &str) -> Ordering {
    fold_text(a)
        .cmp(&fold_text(b))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_number_accepts_strings() {
        assert_eq!(as_number(&json!(3)), Some(3.0));
        assert_eq!(as_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(as_number(&json!("abc")), None);
        assert_eq!(as_number(&json!(null)), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Garra Afilada"), "garra_afilada");
        assert_eq!(slugify("  Tail-Spike!! "), "tail_spike");
        assert_eq!(slugify("Mordisco Ñandú"), "mordisco_nandu");
    }

    #[test]
    fn test_collate_ignores_case_and_accents() {
        assert_eq!(collate("águila", "Araña"), Ordering::Less);
        assert_eq!(collate("Zorro", "ábaco"), Ordering::Greater);
        assert_ne!(collate("Lobo", "lobo"), Ordering::Equal);
    }

    #[test]
    fn test_number_value_prefers_integers() {
        assert_eq!(number_value(4.0), json!(4));
        assert_eq!(number_value(2.5), json!(2.5));
    }
}
