//! Body-part inference from attack and ability names
//!
//! When an attack does not say which body part it needs, its name is matched
//! against keyword families. Each family maps to one anatomy part; the first
//! family with a hit wins. No hit means the attack is usable regardless of
//! body-part condition.
//!
//! Keywords are substrings of the accent-folded, lowercased text, so `mord`
//! matches "Mordisco" and `hand` matches "Backhand". Words that merely contain
//! a keyword ("swing", "legend") are listed as exclusions and skipped.

use crate::core::types::{first_present, fold_text, JsonMap};
use serde_json::Value;

/// Strategy for guessing required body parts from free text
pub trait PartInference: Send + Sync {
    /// Parts required by something named `text`; empty when unknown
    fn infer(&self, text: &str) -> Vec<String>;
}

/// Default keyword table, checked in order
///
/// | part    | keywords                                               |
/// |---------|--------------------------------------------------------|
/// | head    | bite, fang, jaw, breath, maw, mord, colmill, mandib, fauce, aliento, cabez |
/// | bracers | claw, hand, wing, talon, garra, zarpa, mano, alas, alet |
/// | chest   | tail, spike, sting, cola, colet, pua, aguij, espina     |
/// | legs    | kick, leg, hoof, stomp, pata, pezun, pisot              |
pub const DEFAULT_KEYWORD_FAMILIES: &[(&str, &[&str])] = &[
    (
        "head",
        &[
            "bite", "fang", "jaw", "breath", "maw", "mord", "colmill", "mandib", "fauce",
            "aliento", "cabez",
        ],
    ),
    (
        "bracers",
        &[
            "claw", "hand", "wing", "talon", "garra", "zarpa", "mano", "alas", "alet",
        ],
    ),
    (
        "chest",
        &["tail", "spike", "sting", "cola", "colet", "pua", "aguij", "espina"],
    ),
    (
        "legs",
        &["kick", "leg", "hoof", "stomp", "pata", "pezun", "pisot"],
    ),
];

/// Word stems that contain a keyword without naming a body part
pub const DEFAULT_EXCLUDED_WORDS: &[&str] = &["swing", "legend", "legion", "paleta"];

/// Keyword substring matcher over an ordered family table
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordPartInference {
    families: Vec<(String, Vec<String>)>,
    excluded: Vec<String>,
}

impl KeywordPartInference {
    pub fn new(families: Vec<(String, Vec<String>)>) -> Self {
        let families = families
            .into_iter()
            .map(|(part, keywords)| {
                let keywords = keywords
                    .iter()
                    .map(|k| fold_text(k.trim()))
                    .filter(|k| !k.is_empty())
                    .collect();
                (part, keywords)
            })
            .collect();
        Self {
            families,
            excluded: Vec::new(),
        }
    }

    /// Skip words starting with any of `stems` before matching
    pub fn with_exclusions<I, S>(mut self, stems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.excluded = stems
            .into_iter()
            .map(|w| fold_text(w.as_ref().trim()))
            .filter(|w| !w.is_empty())
            .collect();
        self
    }

    /// First matching part, if any
    pub fn match_part(&self, text: &str) -> Option<&str> {
        let folded = fold_text(text);
        let words: Vec<&str> = folded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .filter(|w| !self.excluded.iter().any(|x| w.starts_with(x.as_str())))
            .collect();

        self.families
            .iter()
            .find(|(_, keywords)| {
                keywords
                    .iter()
                    .any(|k| words.iter().any(|w| w.contains(k.as_str())))
            })
            .map(|(part, _)| part.as_str())
    }
}

impl Default for KeywordPartInference {
    fn default() -> Self {
        Self::new(
            DEFAULT_KEYWORD_FAMILIES
                .iter()
                .map(|(part, keywords)| {
                    (
                        part.to_string(),
                        keywords.iter().map(|k| k.to_string()).collect(),
                    )
                })
                .collect(),
        )
        .with_exclusions(DEFAULT_EXCLUDED_WORDS.iter().copied())
    }
}

impl PartInference for KeywordPartInference {
    fn infer(&self, text: &str) -> Vec<String> {
        self.match_part(text)
            .map(|part| vec![part.to_string()])
            .unwrap_or_default()
    }
}

/// Never infers anything; for packs that author every requirement explicitly
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInference;

impl PartInference for NoInference {
    fn infer(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Trim, lowercase and dedup part names, keeping first-seen order
pub fn normalize_parts<I, S>(parts: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for part in parts {
        let part = part.as_ref().trim().to_lowercase();
        if !part.is_empty() && !out.contains(&part) {
            out.push(part);
        }
    }
    out
}

/// Explicit requirements from `requiresParts`, `requiresPart` or `requires`
///
/// Accepts an array of names or a single (possibly comma-separated) string.
pub fn explicit_parts(map: &JsonMap) -> Vec<String> {
    let Some(value) = first_present(map, &["requiresParts", "requiresPart", "requires"]) else {
        return Vec::new();
    };

    match value {
        Value::Array(items) => normalize_parts(items.iter().filter_map(Value::as_str)),
        Value::String(s) => normalize_parts(s.split(',')),
        _ => Vec::new(),
    }
}
