//! Patient-name anonymization. Whatever the mode, the raw name never
//! reaches the store.

use sha2::{Digest, Sha256};

use crate::coerce;

/// How patient names are replaced before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anonymizer {
    /// `"João Silva Oliveira"` becomes `"J. O."`; single-token names keep only
    /// the one initial. Never leaks more than first/last initials.
    #[default]
    Initials,
    /// sha256 of the trimmed name, truncated to 12 hex characters.
    Hash,
}

impl Anonymizer {
    pub fn apply(&self, raw_name: &str) -> Option<String> {
        if coerce::is_null_token(raw_name) {
            return None;
        }
        let name = raw_name.trim();
        match self {
            Anonymizer::Initials => Some(initials(name)),
            Anonymizer::Hash => Some(hash_12_hex(name)),
        }
    }
}

fn initials(name: &str) -> String {
    let mut parts = name.split_whitespace();
    let Some(first) = parts.next() else {
        return String::new();
    };
    let first_initial = upper_initial(first);
    match parts.last() {
        Some(last) => format!("{first_initial}. {}.", upper_initial(last)),
        None => format!("{first_initial}."),
    }
}

fn upper_initial(word: &str) -> String {
    word.chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_default()
}

fn hash_12_hex(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    let hex = format!("{digest:x}");
    hex[..12].to_string()
}
