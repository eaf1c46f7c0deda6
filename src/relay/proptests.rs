//! Property-based tests for reply normalization
//!
//! - Plain text without escapes or structure passes through untouched
//! - The highest-priority non-empty answer field always wins
//! - Enclosing quotes are stripped exactly once
//! - Arbitrary input never panics

use super::normalize::{clean_text, normalize_reply, ANSWER_FIELDS};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Text with no quotes, backslashes or JSON openers
fn arb_plain_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.!?,:;()-]{1,100}"
}

/// A subset of answer fields, each either empty or carrying text
fn arb_answer_fields() -> impl Strategy<Value = Vec<(usize, String)>> {
    proptest::collection::btree_map(0..ANSWER_FIELDS.len(), "[a-zA-Z0-9 ]{0,20}", 0..=5)
        .prop_map(|m| m.into_iter().collect())
}

proptest! {
    #[test]
    fn plain_text_is_unchanged(text in arb_plain_text()) {
        prop_assert_eq!(normalize_reply(&text), text);
    }

    #[test]
    fn highest_priority_field_wins(
        fields in arb_answer_fields(),
        extra in "[a-z]{1,8}",
    ) {
        let mut map = Map::new();
        // A decoy key that is never probed
        map.insert(format!("x_{extra}"), Value::String("decoy".to_string()));
        for (idx, text) in &fields {
            map.insert(ANSWER_FIELDS[*idx].to_string(), Value::String(text.clone()));
        }
        let raw = Value::Object(map).to_string();

        let expected = fields
            .iter()
            .find(|(_, text)| !text.is_empty())
            .map_or_else(|| raw.clone(), |(_, text)| text.clone());

        prop_assert_eq!(normalize_reply(&raw), expected);
    }

    #[test]
    fn enclosing_quotes_stripped_once(text in arb_plain_text()) {
        let quoted = format!("\"{text}\"");
        prop_assert_eq!(clean_text(&quoted), text.clone());

        let double = format!("\"\"{text}\"\"");
        prop_assert_eq!(clean_text(&double), format!("\"{text}\""));
    }

    #[test]
    fn arbitrary_input_never_panics(raw in any::<String>()) {
        let _ = normalize_reply(&raw);
    }

    #[test]
    fn normalization_is_deterministic(raw in "[\\x20-\\x7e\\n\\t]{0,200}") {
        prop_assert_eq!(normalize_reply(&raw), normalize_reply(&raw));
    }
}
