//! Wire format for the shared translation store.
//!
//! Each entry is stored as a single scalar string value,
//! `"{percent(source)}–{percent(output)}"`, joined by U+2013 EN DASH, keyed
//! by the hex SHA-256 of the source text. Percent-encoding covers every
//! non-unreserved byte, so an encoded half can never contain a literal
//! en dash and the split is unambiguous.

use crate::translation::{match_capitalization, LanguagePair, Translation, TranslationInput};
use sha2::{Digest, Sha256};

const FIELD_SEPARATOR: char = '\u{2013}';

#[derive(thiserror::Error, Debug)]
pub enum WireError {
    #[error("stored entry is not a source\u{2013}output pair: {0:?}")]
    MalformedEntry(String),
    #[error("stored entry half is not valid percent-encoded utf-8")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Key a source text resolves to in the store, independent of which provider
/// produced the translation. Any client can recompute it from the text alone.
pub fn storage_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Encode a translation into its store `(key, value)` pair. The output half
/// is capitalization-matched against the source before encoding, so stored
/// entries are always normalized.
pub fn encode(translation: &Translation) -> (String, String) {
    let source = translation.input.value();
    let normalized = match_capitalization(&translation.output, source);
    let value = format!(
        "{}{}{}",
        urlencoding::encode(source),
        FIELD_SEPARATOR,
        urlencoding::encode(&normalized)
    );
    (storage_key(source), value)
}

/// Decode a stored value back into a translation for the given pair.
/// Anything but exactly two encoded halves is a hard decode failure.
pub fn decode(raw: &str, pair: &LanguagePair) -> Result<Translation, WireError> {
    let mut halves = raw.split(FIELD_SEPARATOR);
    let (Some(source), Some(output), None) = (halves.next(), halves.next(), halves.next()) else {
        return Err(WireError::MalformedEntry(raw.to_owned()));
    };
    let source = urlencoding::decode(source)?.into_owned();
    let output = urlencoding::decode(output)?.into_owned();
    Ok(Translation::new(
        TranslationInput::new(source),
        output,
        pair.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> LanguagePair {
        LanguagePair::new("en", "es")
    }

    #[test]
    fn storage_key_is_hex_sha256() {
        let key = storage_key("Hello!");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, storage_key("Hello!"));
        assert_ne!(key, storage_key("Hello"));
    }

    #[test]
    fn encode_percent_encodes_both_halves() {
        let translation = Translation::new(
            TranslationInput::new("Hello!"),
            "Hola!".to_owned(),
            pair(),
        );
        let (key, value) = encode(&translation);
        assert_eq!(key, storage_key("Hello!"));
        assert_eq!(value, "Hello%21\u{2013}Hola%21");
    }

    #[test]
    fn encode_normalizes_output_casing() {
        let translation = Translation::new(
            TranslationInput::new("Hello!"),
            "hola!".to_owned(),
            pair(),
        );
        let (_, value) = encode(&translation);
        assert_eq!(value, "Hello%21\u{2013}Hola%21");
    }

    #[test]
    fn round_trip_survives_en_dash_in_source() {
        let translation = Translation::new(
            TranslationInput::new("pages 3\u{2013}5"),
            "p\u{e1}ginas 3\u{2013}5".to_owned(),
            pair(),
        );
        let (_, value) = encode(&translation);
        let decoded = decode(&value, &pair()).expect("decodes");
        assert_eq!(decoded, translation);
    }

    #[test]
    fn round_trip_survives_reserved_characters() {
        let translation = Translation::new(
            TranslationInput::new("50% off & more?"),
            "50% de descuento y m\u{e1}s?".to_owned(),
            pair(),
        );
        let (_, value) = encode(&translation);
        let decoded = decode(&value, &pair()).expect("decodes");
        assert_eq!(decoded, translation);
    }

    #[test]
    fn round_trip_survives_empty_output() {
        let translation =
            Translation::new(TranslationInput::new("hello"), String::new(), pair());
        let (_, value) = encode(&translation);
        let decoded = decode(&value, &pair()).expect("decodes");
        assert_eq!(decoded.output, "");
    }

    #[test]
    fn decode_rejects_missing_separator() {
        let err = decode("Hello%21", &pair()).expect_err("malformed");
        assert!(matches!(err, WireError::MalformedEntry(_)));
    }

    #[test]
    fn decode_rejects_extra_separator() {
        let err = decode(
            "Hello%21\u{2013}Hola%21\u{2013}extra",
            &pair(),
        )
        .expect_err("malformed");
        assert!(matches!(err, WireError::MalformedEntry(_)));
    }
}
