//! Raw manifest parsing and lax structural validation.
//!
//! The manifest is the user project's dependency-declaration document. Only
//! the shape this crate cares about is validated: the document must be a
//! JSON object, and `name`, `version` and `config` must have the expected
//! types when present. Everything else is passed through untouched for the
//! engine to interpret.

use serde_json::{Map, Value};
use thiserror::Error;

/// Key of the configuration section.
pub const CONFIG_KEY: &str = "config";
/// Key of the install-directory setting inside the configuration section.
pub const INSTALL_DIR_KEY: &str = "install-dir";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("manifest {0}")]
    Structure(String),
}

/// A parsed, structurally validated manifest.
///
/// Holds the raw document map so callers can distinguish what the manifest
/// itself declared from what merged defaults later provide.
#[derive(Debug, Clone)]
pub struct Manifest {
    raw: Map<String, Value>,
}

impl Manifest {
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(text)?;
        let raw = match value {
            Value::Object(map) => map,
            _ => {
                return Err(ManifestError::Structure(
                    "must be a JSON object at the top level".to_string(),
                ));
            }
        };

        expect_string(&raw, "name")?;
        expect_string(&raw, "version")?;
        if let Some(config) = raw.get(CONFIG_KEY)
            && !config.is_object()
        {
            return Err(ManifestError::Structure(
                "field \"config\" must be an object".to_string(),
            ));
        }

        Ok(Self { raw })
    }

    pub fn name(&self) -> Option<&str> {
        self.raw.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.raw.get("version").and_then(Value::as_str)
    }

    /// Whether the manifest's own `config` section declares an install
    /// directory. Checked against the raw document, before any merging.
    pub fn declares_install_dir(&self) -> bool {
        self.raw
            .get(CONFIG_KEY)
            .and_then(Value::as_object)
            .is_some_and(|config| config.contains_key(INSTALL_DIR_KEY))
    }

    pub fn raw(&self) -> &Map<String, Value> {
        &self.raw
    }
}

fn expect_string(map: &Map<String, Value>, key: &str) -> Result<(), ManifestError> {
    match map.get(key) {
        None => Ok(()),
        Some(Value::String(_)) => Ok(()),
        Some(_) => Err(ManifestError::Structure(format!(
            "field \"{key}\" must be a string"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = Manifest::parse(r#"{"name": "acme/site", "version": "1.0.0"}"#).unwrap();
        assert_eq!(manifest.name(), Some("acme/site"));
        assert_eq!(manifest.version(), Some("1.0.0"));
        assert!(!manifest.declares_install_dir());
    }

    #[test]
    fn test_parse_empty_object_is_lax() {
        let manifest = Manifest::parse("{}").unwrap();
        assert_eq!(manifest.name(), None);
        assert!(!manifest.declares_install_dir());
    }

    #[test]
    fn test_parse_detects_install_dir_declaration() {
        let manifest =
            Manifest::parse(r#"{"config": {"install-dir": "custom-deps"}}"#).unwrap();
        assert!(manifest.declares_install_dir());
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let err = Manifest::parse("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ManifestError::Structure(_)));
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = Manifest::parse("{not json").unwrap_err();
        assert!(matches!(err, ManifestError::Json(_)));
    }

    #[test]
    fn test_parse_rejects_typed_fields_with_wrong_type() {
        assert!(matches!(
            Manifest::parse(r#"{"name": 42}"#).unwrap_err(),
            ManifestError::Structure(_)
        ));
        assert!(matches!(
            Manifest::parse(r#"{"config": "not an object"}"#).unwrap_err(),
            ManifestError::Structure(_)
        ));
    }
}
