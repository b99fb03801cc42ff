//! Installed-package records as stored in the engine's metadata files.

use serde::{Deserialize, Serialize};

/// One installed package, as reported by the engine.
///
/// A record is either canonical (an actual resolvable package identity) or
/// an alias: a record whose name resolves to a canonical record carrying
/// the real identity. The alias linkage is by canonical name, matching the
/// `alias_of` field in `installed.json`.
///
/// Records are read-only once loaded; repositories re-index but never
/// mutate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PackageRecord {
    // Alias must come first: untagged deserialization tries variants in
    // order and only alias entries carry `alias_of`.
    Alias {
        name: String,
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pretty_version: Option<String>,
        alias_of: String,
    },
    Canonical {
        name: String,
        version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pretty_version: Option<String>,
    },
}

impl PackageRecord {
    pub fn canonical(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::Canonical {
            name: name.into(),
            version: version.into(),
            pretty_version: None,
        }
    }

    pub fn alias(
        name: impl Into<String>,
        version: impl Into<String>,
        alias_of: impl Into<String>,
    ) -> Self {
        Self::Alias {
            name: name.into(),
            version: version.into(),
            pretty_version: None,
            alias_of: alias_of.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Alias { name, .. } | Self::Canonical { name, .. } => name,
        }
    }

    pub fn version(&self) -> &str {
        match self {
            Self::Alias { version, .. } | Self::Canonical { version, .. } => version,
        }
    }

    /// Human-readable version; falls back to the plain version.
    pub fn pretty_version(&self) -> &str {
        match self {
            Self::Alias {
                pretty_version, version, ..
            }
            | Self::Canonical {
                pretty_version, version, ..
            } => pretty_version.as_deref().unwrap_or(version),
        }
    }

    pub fn is_alias(&self) -> bool {
        matches!(self, Self::Alias { .. })
    }

    /// Name of the canonical record this alias points at.
    pub fn alias_of(&self) -> Option<&str> {
        match self {
            Self::Alias { alias_of, .. } => Some(alias_of),
            Self::Canonical { .. } => None,
        }
    }
}
