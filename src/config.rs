//! External configuration: engine defaults merged with the user manifest.
//!
//! Manifest problems are recorded, never thrown: downstream consumers that
//! only need the class loader or the repositories keep working on default
//! configuration, and callers that do care check [`LoadedConfig::error`]
//! (surfaced as `EmbeddedComposer::error`) before trusting
//! configuration-derived paths.

use std::path::{Path, PathBuf};

use log::debug;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::engine::{DEFAULT_INSTALL_DIR, DEFAULT_MANIFEST_FILENAME, Engine};
use crate::manifest::{CONFIG_KEY, INSTALL_DIR_KEY, Manifest, ManifestError};
use crate::runtime::Runtime;

/// Merged configuration map. Starts from engine defaults; manifest contents
/// are merged over them, later keys winning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        let mut values = Map::new();
        let mut section = Map::new();
        section.insert(
            INSTALL_DIR_KEY.to_string(),
            Value::String(DEFAULT_INSTALL_DIR.to_string()),
        );
        values.insert(CONFIG_KEY.to_string(), Value::Object(section));
        Self { values }
    }
}

impl Config {
    pub fn new(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The configured install directory, possibly relative to the project
    /// root. Falls back to the engine's conventional default.
    pub fn install_dir(&self) -> PathBuf {
        self.values
            .get(CONFIG_KEY)
            .and_then(|section| section.get(INSTALL_DIR_KEY))
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INSTALL_DIR))
    }

    /// Merge `overlay` over the current values. Objects merge key-wise,
    /// everything else is replaced.
    pub fn merge(&mut self, overlay: &Map<String, Value>) {
        for (key, value) in overlay {
            match self.values.get_mut(key) {
                Some(existing) => merge_value(existing, value),
                None => {
                    self.values.insert(key.clone(), value.clone());
                }
            }
        }
    }
}

fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// A configuration problem recorded during the build.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{message}\n{hint}")]
    ManifestNotFound { message: String, hint: String },
    #[error("could not load manifest {path}: {source}")]
    Manifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
}

/// Result of loading the external configuration.
pub struct LoadedConfig {
    pub config: Config,
    /// True when the raw manifest itself declared an install directory.
    pub install_dir_overridden: bool,
    /// Recorded problem, if any; the config still carries usable defaults.
    pub error: Option<ConfigError>,
}

/// Load and merge the external manifest's configuration over the engine's
/// default configuration.
///
/// `pristine_filename` is the manifest filename as the caller supplied it,
/// used to pick the right remediation hint when the file is missing.
#[tracing::instrument(skip(runtime, engine))]
pub fn load_external_config<R: Runtime>(
    runtime: &R,
    engine: &dyn Engine,
    manifest_path: &Path,
    pristine_filename: &Path,
    external_root: &Path,
) -> LoadedConfig {
    let mut config = engine.default_config();
    let mut install_dir_overridden = false;
    let mut error = None;

    if runtime.exists(manifest_path) {
        let parsed = runtime
            .read_to_string(manifest_path)
            .map_err(|e| ManifestError::Structure(format!("could not be read: {e}")))
            .and_then(|text| Manifest::parse(&text));

        match parsed {
            Ok(manifest) => {
                // Detected from the raw document, before defaults bleed in.
                install_dir_overridden = manifest.declares_install_dir();
                config.merge(manifest.raw());
                debug!("Merged manifest {:?} over default configuration", manifest_path);
            }
            Err(source) => {
                error = Some(ConfigError::Manifest {
                    path: manifest_path.to_path_buf(),
                    source,
                });
            }
        }
    } else {
        let message = if pristine_filename == Path::new(DEFAULT_MANIFEST_FILENAME) {
            format!(
                "Could not find a {} file in {}",
                DEFAULT_MANIFEST_FILENAME,
                external_root.display()
            )
        } else {
            format!("Could not find the manifest file: {}", manifest_path.display())
        };
        let hint = format!(
            "To initialize a project, please create a {} file describing the project's name, version and dependencies",
            pristine_filename.display()
        );
        error = Some(ConfigError::ManifestNotFound { message, hint });
    }

    LoadedConfig {
        config,
        install_dir_overridden,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{stub_engine, test_project_root};
    use mockall::predicate::eq;

    fn loaded_with_manifest(contents: Option<&'static str>) -> LoadedConfig {
        let root = test_project_root();
        let manifest_path = root.join("pkg.json");

        let mut runtime = MockRuntime::new();
        match contents {
            Some(text) => {
                runtime
                    .expect_exists()
                    .with(eq(manifest_path.clone()))
                    .returning(|_| true);
                runtime
                    .expect_read_to_string()
                    .with(eq(manifest_path.clone()))
                    .returning(move |_| Ok(text.to_string()));
            }
            None => {
                runtime
                    .expect_exists()
                    .with(eq(manifest_path.clone()))
                    .returning(|_| false);
            }
        }

        load_external_config(
            &runtime,
            &stub_engine(),
            &manifest_path,
            Path::new("pkg.json"),
            &root,
        )
    }

    #[test]
    fn test_manifest_merged_over_defaults() {
        let loaded = loaded_with_manifest(Some(
            r#"{"name": "acme/site", "config": {"install-dir": "custom-deps"}}"#,
        ));

        assert!(loaded.error.is_none());
        assert!(loaded.install_dir_overridden);
        assert_eq!(loaded.config.install_dir(), PathBuf::from("custom-deps"));
        assert_eq!(
            loaded.config.get("name").and_then(Value::as_str),
            Some("acme/site")
        );
    }

    #[test]
    fn test_manifest_without_install_dir_keeps_default() {
        let loaded = loaded_with_manifest(Some(r#"{"name": "acme/site"}"#));

        assert!(loaded.error.is_none());
        assert!(!loaded.install_dir_overridden);
        assert_eq!(loaded.config.install_dir(), PathBuf::from("packages"));
    }

    #[test]
    fn test_missing_manifest_records_error_and_keeps_defaults() {
        let loaded = loaded_with_manifest(None);

        assert!(!loaded.install_dir_overridden);
        assert_eq!(loaded.config.install_dir(), PathBuf::from("packages"));

        match loaded.error {
            Some(ConfigError::ManifestNotFound { ref message, .. }) => {
                assert!(message.contains("pkg.json"));
            }
            other => panic!("expected ManifestNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_custom_manifest_names_the_custom_file() {
        let root = test_project_root();
        let manifest_path = root.join("site.json");

        let mut runtime = MockRuntime::new();
        runtime
            .expect_exists()
            .with(eq(manifest_path.clone()))
            .returning(|_| false);

        let loaded = load_external_config(
            &runtime,
            &stub_engine(),
            &manifest_path,
            Path::new("site.json"),
            &root,
        );

        match loaded.error {
            Some(ConfigError::ManifestNotFound { ref message, ref hint }) => {
                assert!(message.contains("site.json"));
                assert!(hint.contains("site.json"));
            }
            other => panic!("expected ManifestNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_manifest_records_error_and_keeps_defaults() {
        let loaded = loaded_with_manifest(Some("{not json"));

        assert!(matches!(loaded.error, Some(ConfigError::Manifest { .. })));
        assert!(!loaded.install_dir_overridden);
        assert_eq!(loaded.config.install_dir(), PathBuf::from("packages"));
    }

    #[test]
    fn test_merge_replaces_scalars_and_merges_objects() {
        let mut config = Config::default();
        config.merge(
            serde_json::json!({
                "name": "acme/site",
                "config": { "cache-dir": "/tmp/cache" }
            })
            .as_object()
            .unwrap(),
        );
        config.merge(
            serde_json::json!({ "name": "acme/other" })
                .as_object()
                .unwrap(),
        );

        assert_eq!(config.get("name").and_then(Value::as_str), Some("acme/other"));
        // The untouched section keys survive the second merge.
        assert_eq!(config.install_dir(), PathBuf::from("packages"));
        assert_eq!(
            config
                .get("config")
                .and_then(|section| section.get("cache-dir"))
                .and_then(Value::as_str),
            Some("/tmp/cache")
        );
    }
}
