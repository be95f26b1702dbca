//! Deterministic cache keys.
//!
//! Keys are the first 16 hex chars of a sha256 digest over normalized
//! input, so the same url, query or person always lands on the same
//! entry regardless of casing or stray whitespace.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use dossier_common::types::ProfileInput;

fn short_digest(input: &str) -> String {
    let digest = hex::encode(Sha256::digest(input.as_bytes()));
    digest[..16].to_string()
}

fn normalize(value: &str) -> String {
    value.to_lowercase().trim().to_string()
}

/// Key for cached page content.
pub fn url_key(url: &str) -> String {
    short_digest(&normalize(url))
}

/// Key for cached search results. The limit is part of the key so the
/// same query at different limits caches separately.
pub fn search_key(query: &str, limit: usize) -> String {
    short_digest(&format!("{}:{limit}", normalize(query)))
}

/// Identity key for a person. Digests a canonical JSON object of the
/// four identifying fields (sorted keys, normalized values) so field
/// order and casing in the request never change the key.
pub fn identity_key(input: &ProfileInput) -> String {
    let mut fields = BTreeMap::new();
    fields.insert("email", normalize(&input.email));
    fields.insert("firstName", normalize(&input.first_name));
    fields.insert("lastName", normalize(&input.last_name));
    fields.insert("linkedin", normalize(&input.linkedin));
    let canonical = serde_json::to_string(&fields).unwrap_or_default();
    short_digest(&canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_key_normalizes_case_and_whitespace() {
        let a = url_key("https://Example.com/About");
        let b = url_key("  https://example.com/about  ");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_search_key_varies_by_limit() {
        let a = search_key("jane doe", 3);
        let b = search_key("jane doe", 5);
        assert_ne!(a, b);
        assert_eq!(search_key("Jane Doe", 3), a);
    }

    #[test]
    fn test_identity_key_stable_across_casing() {
        let mut input = ProfileInput::default();
        input.first_name = "Jane".into();
        input.last_name = "Doe".into();
        input.email = "Jane@Example.com".into();

        let mut shouty = ProfileInput::default();
        shouty.first_name = "JANE".into();
        shouty.last_name = " doe ".into();
        shouty.email = "jane@example.com".into();

        assert_eq!(identity_key(&input), identity_key(&shouty));
    }

    #[test]
    fn test_identity_key_ignores_non_identity_fields() {
        let mut input = ProfileInput::default();
        input.first_name = "Jane".into();

        let mut with_extras = ProfileInput::default();
        with_extras.first_name = "Jane".into();
        with_extras.portfolio = "https://jane.dev".into();
        with_extras.resume = "https://jane.dev/resume.pdf".into();

        assert_eq!(identity_key(&input), identity_key(&with_extras));
    }

    #[test]
    fn test_identity_key_distinguishes_people() {
        let mut jane = ProfileInput::default();
        jane.first_name = "Jane".into();
        jane.last_name = "Doe".into();

        let mut john = ProfileInput::default();
        john.first_name = "John".into();
        john.last_name = "Doe".into();

        assert_ne!(identity_key(&jane), identity_key(&john));
    }
}
