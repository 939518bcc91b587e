//! Tokenization and keyword matching over free text.

use std::collections::HashSet;

use crate::rules::{CLIENT_ROLE_TOKENS, ROLE_SYNONYMS, STOPWORDS};

/// Minimum keyword length for substring ("weak") matches. Shorter keywords
/// like "man" would otherwise match half the vocabulary.
pub const WEAK_MATCH_MIN_LEN: usize = 4;

/// Lowercase, replace everything non-alphanumeric with whitespace, split and
/// drop stopwords. Digits-only tokens are kept.
pub fn words(text: &str) -> Vec<String> {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Comparable keyword set: [`words`] without pure-digit tokens.
pub fn normalize(text: &str) -> HashSet<String> {
    words(text)
        .into_iter()
        .filter(|w| !w.bytes().all(|b| b.is_ascii_digit()))
        .collect()
}

/// Broaden an actor's display name into matching keywords.
///
/// The first name word that is a key of [`ROLE_SYNONYMS`] selects that key's
/// synonym list; otherwise the name's own words come back unchanged.
pub fn expand_role_keywords(actor_name: &str) -> Vec<String> {
    let name_words = words(actor_name);
    for word in &name_words {
        if let Some((_, synonyms)) = ROLE_SYNONYMS.iter().find(|(key, _)| *key == word.as_str()) {
            return synonyms.iter().map(|s| s.to_string()).collect();
        }
    }
    name_words
}

/// Whether the actor's name marks a client, customer or end user.
pub fn is_client_type(actor_name: &str) -> bool {
    words(actor_name)
        .iter()
        .any(|w| CLIENT_ROLE_TOKENS.contains(&w.as_str()))
}

/// Exact membership of any keyword in `tokens`.
pub fn strong_match(keywords: &[String], tokens: &HashSet<String>) -> bool {
    keywords.iter().any(|k| tokens.contains(k))
}

/// Any keyword of at least [`WEAK_MATCH_MIN_LEN`] characters contained in some token.
pub fn weak_match(keywords: &[String], tokens: &HashSet<String>) -> bool {
    keywords
        .iter()
        .filter(|k| k.len() >= WEAK_MATCH_MIN_LEN)
        .any(|k| tokens.iter().any(|t| t.contains(k.as_str())))
}

/// Whether the two sets share at least one token.
pub fn overlaps(a: &HashSet<String>, b: &HashSet<String>) -> bool {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small.iter().any(|t| large.contains(t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalize_strips_punctuation_stopwords_and_numbers() {
        let tokens = normalize("The portal, for 3 consultants -- to submit invoices (2024)!");
        assert_eq!(tokens, set(&["portal", "consultants", "submit", "invoices"]));
    }

    #[test]
    fn normalize_keeps_mixed_alphanumerics() {
        assert_eq!(normalize("Q4 report"), set(&["q4", "report"]));
    }

    #[test]
    fn words_keep_digits() {
        assert_eq!(words("Tier 2 Support"), vec!["tier", "2", "support"]);
    }

    #[test]
    fn non_ascii_is_a_separator() {
        assert_eq!(normalize("café—owner"), set(&["caf", "owner"]));
    }

    #[test]
    fn known_roles_expand_to_synonyms() {
        let keywords = expand_role_keywords("Business Owner");
        assert!(keywords.contains(&"administrator".to_string()));
        assert!(keywords.contains(&"director".to_string()));
        assert!(!keywords.contains(&"business".to_string()));
    }

    #[test]
    fn unknown_roles_keep_their_words() {
        assert_eq!(
            expand_role_keywords("Office Assistant"),
            vec!["office".to_string(), "assistant".to_string()]
        );
    }

    #[test]
    fn client_detection_uses_name_tokens() {
        assert!(is_client_type("Client (Omnigo)"));
        assert!(is_client_type("End User"));
        assert!(!is_client_type("Clientele Manager"));
        assert!(!is_client_type("Owner"));
    }

    #[test]
    fn weak_match_ignores_short_keywords() {
        let tokens = set(&["management", "invoices"]);
        assert!(!weak_match(&["man".to_string()], &tokens));
        assert!(weak_match(&["invoice".to_string()], &tokens));
        assert!(!strong_match(&["invoice".to_string()], &tokens));
    }
}
