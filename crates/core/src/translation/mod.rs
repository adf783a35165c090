pub mod wire;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The text a caller wants translated. `original` is the string as the user
/// sees it; `alternate`, when present, is the normalized phrasing actually
/// sent to the resolution pipeline.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TranslationInput {
    pub original: String,
    pub alternate: Option<String>,
}

impl TranslationInput {
    pub fn new<S: Into<String>>(original: S) -> Self {
        Self {
            original: original.into(),
            alternate: None,
        }
    }

    pub fn with_alternate<S: Into<String>, A: Into<String>>(original: S, alternate: A) -> Self {
        Self {
            original: original.into(),
            alternate: Some(alternate.into()),
        }
    }

    /// The effective value: the alternate when one exists, else the original.
    /// Two inputs denote the same request iff their effective values match.
    pub fn value(&self) -> &str {
        self.alternate.as_deref().unwrap_or(&self.original)
    }
}

/// An ordered `(from, to)` pair of language codes identifying a translation
/// direction. Equality and hashing follow the joined `"{from}-{to}"` form,
/// which is also the store namespace key.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LanguagePair {
    pub from: String,
    pub to: String,
}

impl LanguagePair {
    pub fn new<F: Into<String>, T: Into<String>>(from: F, to: T) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn as_string(&self) -> String {
        format!("{}-{}", self.from, self.to)
    }

    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }
}

impl PartialEq for LanguagePair {
    fn eq(&self, other: &Self) -> bool {
        self.as_string() == other.as_string()
    }
}

impl Eq for LanguagePair {}

impl Hash for LanguagePair {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_string().hash(state);
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// A resolved translation. Immutable once created; archived locally and, for
/// store- or provider-sourced results, written through to the shared store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub input: TranslationInput,
    pub output: String,
    pub language_pair: LanguagePair,
}

impl Translation {
    pub fn new(input: TranslationInput, output: String, language_pair: LanguagePair) -> Self {
        Self {
            input,
            output,
            language_pair,
        }
    }
}

/// Force the output's casing to mirror the source text's: an uppercase
/// leading letter carries over, an all-lowercase source lowercases the whole
/// output, anything else passes through untouched.
pub fn match_capitalization(output: &str, source: &str) -> String {
    let Some(first) = source.chars().next() else {
        return output.to_owned();
    };
    if first.is_uppercase() {
        let mut chars = output.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    } else if !source.chars().any(char::is_uppercase) {
        output.to_lowercase()
    } else {
        output.to_owned()
    }
}
