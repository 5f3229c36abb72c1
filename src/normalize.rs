//! Display-safe normalization of lineage property values.
//!
//! Every value written to the lineage store passes through [`normalize_value`]:
//! it is rendered to a string, transliterated to ASCII, and embedded double
//! quotes are swapped for single quotes so stored values stay queryable.

use std::collections::BTreeMap;

use deunicode::deunicode;
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::record::CatalogRecord;

/// Property map recorded alongside a lineage event.
pub type Properties = BTreeMap<String, String>;

/// Renders a JSON value as a plain string.
///
/// Strings are taken verbatim; everything else uses compact JSON.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Transliterates `text` to ASCII.
///
/// Decomposed input is composed first so accents and their base letters are
/// romanized together. Scripts without Latin letters are romanized (`Привет`
/// becomes `Privet`); codepoints with no known romanization become `[?]`.
pub fn transliterate(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }

    let composed: String = text.nfc().collect();
    deunicode(&composed)
}

/// Normalizes a single property value for storage.
pub fn normalize_value(value: &Value) -> String {
    transliterate(&render_value(value)).replace('"', "'")
}

/// Normalizes every field of a record.
pub fn normalize_properties(record: &CatalogRecord) -> Properties {
    record
        .iter()
        .map(|(key, value)| (key.clone(), normalize_value(value)))
        .collect()
}

/// Normalizes every field except those named in `excluded`.
pub fn normalize_properties_excluding(record: &CatalogRecord, excluded: &[&str]) -> Properties {
    record
        .iter()
        .filter(|(key, _)| !excluded.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), normalize_value(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accented_letters_lose_their_marks() {
        assert_eq!(transliterate("café"), "cafe");
        assert_eq!(transliterate("Ångström naïve"), "Angstrom naive");
    }

    #[test]
    fn ligatures_are_spelled_out() {
        assert_eq!(transliterate("Straße"), "Strasse");
        assert_eq!(transliterate("Æsir œuvre"), "AEsir oeuvre");
    }

    #[test]
    fn decomposed_input_matches_precomposed() {
        assert_eq!(transliterate("cafe\u{0301}"), "cafe");
    }

    #[test]
    fn cyrillic_and_greek_are_romanized() {
        assert_eq!(transliterate("Привет"), "Privet");
        let athens = transliterate("Αθήνα");
        assert!(athens.is_ascii() && athens.starts_with('A'), "got {athens:?}");
    }

    #[test]
    fn cjk_is_romanized_not_dropped() {
        let model = transliterate("模型");
        assert!(model.is_ascii());
        assert!(model.contains("Mo") && model.contains("Xing"), "got {model:?}");

        let city = normalize_value(&json!("東京"));
        assert!(!city.trim().is_empty());
        assert!(city.is_ascii());
    }

    #[test]
    fn symbols_stay_ascii() {
        assert!(transliterate("emoji 🤗 hub").is_ascii());
        assert!(transliterate("emoji 🤗 hub").starts_with("emoji "));
    }

    #[test]
    fn double_quotes_become_single_quotes() {
        assert_eq!(normalize_value(&json!("say \"hi\"")), "say 'hi'");
        assert_eq!(normalize_value(&json!("\u{201C}smart\u{201D}")), "'smart'");
    }

    #[test]
    fn structured_values_render_as_json() {
        assert_eq!(normalize_value(&json!(100)), "100");
        assert_eq!(normalize_value(&json!(null)), "null");
        assert_eq!(
            normalize_value(&json!({"license": "mit"})),
            "{'license':'mit'}"
        );
        assert_eq!(normalize_value(&json!(["squad", "é"])), "['squad','e']");
    }

    #[test]
    fn excluded_fields_are_dropped() {
        let record = CatalogRecord::from_value(json!({
            "id": "squad",
            "description": "long text",
            "size": 100
        }))
        .expect("object");

        let props = normalize_properties_excluding(&record, &["description"]);
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("id").map(String::as_str), Some("squad"));
        assert_eq!(props.get("size").map(String::as_str), Some("100"));
        assert!(!props.contains_key("description"));
    }
}
