//! The `#[qs("...")]` field tag mini-language.
//!
//! Tag text is a semicolon-separated list of `key:value` pairs. A key without
//! a value maps to itself. Unrecognized keys are carried as no-ops so old
//! generators keep working against newer model files.

use std::collections::HashMap;

use syn::{Attribute, LitStr};

/// Recognized tag keys.
const IGNORE_KEY: &str = "-";
const COLUMN_KEY: &str = "column";
const EMBEDDED_KEY: &str = "embedded";

/// Parsed field tag directives.
#[derive(Debug, Clone, Default)]
pub struct TagSettings {
    settings: HashMap<String, String>,
}

impl TagSettings {
    /// Parses raw tag text. Never fails; malformed pieces are kept as no-ops.
    pub fn parse(raw: &str) -> TagSettings {
        let mut settings = HashMap::new();
        for pair in raw.split(';') {
            let mut parts = pair.splitn(2, ':');
            let key = match parts.next() {
                Some(k) => k.trim().to_ascii_lowercase(),
                None => continue,
            };
            if key.is_empty() {
                continue;
            }
            let value = match parts.next() {
                Some(v) => v.trim().to_string(),
                // a bare key maps to itself, e.g. `-` or `embedded`
                None => key.clone(),
            };
            settings.insert(key, value);
        }
        TagSettings { settings }
    }

    /// True when the field carries the `-` directive and must be excluded.
    pub fn is_ignored(&self) -> bool {
        self.settings.contains_key(IGNORE_KEY)
    }

    /// True when the field's struct type must be flattened in place.
    pub fn is_embedded(&self) -> bool {
        self.settings.contains_key(EMBEDDED_KEY)
    }

    /// Explicit DB column name override, if any.
    pub fn column(&self) -> Option<&str> {
        self.settings.get(COLUMN_KEY).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// Extracts the raw tag text from a field's `#[qs("...")]` attribute.
///
/// Returns an empty string when the attribute is absent or does not hold a
/// single string literal (forward-compatible parsing, never an error).
pub fn qs_tag_text(attrs: &[Attribute]) -> String {
    for attr in attrs {
        if attr.path().is_ident("qs") {
            if let Ok(lit) = attr.parse_args::<LitStr>() {
                return lit.value();
            }
        }
    }
    String::new()
}
