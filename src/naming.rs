//! Stanza naming conventions.
//!
//! A stanza's name is the base name of its directory. The generated custom
//! element is registered as `togostanza-<name>`, so the directory name is also
//! a public identifier: it shows up in the element name, in the output path
//! (`dist/stanza/<name>/`) and in the dev server URL.
//!
//! ## Valid names for new stanzas
//!
//! Existing directories are taken as they are. Names given to `ts new` are
//! checked so that the derived element name is a valid custom element name:
//!
//! - `gene-attributes` → ok, element `togostanza-gene-attributes`
//! - `hello` → ok
//! - `Gene` → rejected (uppercase)
//! - `2col` → rejected (must start with a letter)
//! - `a--b`, `a-` → rejected (empty segment)

/// Prefix of every generated custom element name.
pub const ELEMENT_PREFIX: &str = "togostanza";

/// Custom element name for a stanza directory name.
pub fn element_name(stanza_name: &str) -> String {
    format!("{ELEMENT_PREFIX}-{stanza_name}")
}

/// Check a name for a new stanza. Returns a human-readable reason on failure.
pub fn validate_stanza_name(name: &str) -> Result<(), String> {
    let Some(first) = name.chars().next() else {
        return Err("name must not be empty".into());
    };
    if !first.is_ascii_lowercase() {
        return Err(format!("'{name}' must start with a lowercase letter"));
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(format!("'{name}' contains invalid character '{c}'"));
    }
    if name.split('-').any(str::is_empty) {
        return Err(format!("'{name}' has an empty segment between hyphens"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_name_uses_prefix() {
        assert_eq!(element_name("widget-a"), "togostanza-widget-a");
    }

    #[test]
    fn accepts_hyphenated_lowercase() {
        assert!(validate_stanza_name("gene-attributes").is_ok());
        assert!(validate_stanza_name("hello").is_ok());
        assert!(validate_stanza_name("v2-table").is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_stanza_name("").is_err());
    }

    #[test]
    fn rejects_uppercase() {
        let err = validate_stanza_name("Gene").unwrap_err();
        assert!(err.contains("lowercase"));
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(validate_stanza_name("2col").is_err());
    }

    #[test]
    fn rejects_invalid_characters() {
        let err = validate_stanza_name("gene_attr").unwrap_err();
        assert!(err.contains('_'));
    }

    #[test]
    fn rejects_empty_segments() {
        assert!(validate_stanza_name("a--b").is_err());
        assert!(validate_stanza_name("a-").is_err());
    }
}
