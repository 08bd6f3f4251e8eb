use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// Options of the Lattice compiler, usually loaded from `lattice.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LatticeOptions {
    /// When disabled no graph declaration is processed
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Dumps the binding graph of every processed declaration to the debug log
    #[serde(default)]
    pub debug: bool,

    /// Directory which receives per graph reports (binding keys and emission plan)
    #[serde(default)]
    pub reports_destination: Option<PathBuf>,

    /// How provider functions which are not private are reported
    #[serde(default)]
    pub public_provider_severity: Severity,

    #[serde(default)]
    pub interop: InteropOptions,
}

impl Default for LatticeOptions {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            debug: false,
            reports_destination: None,
            public_provider_severity: Severity::default(),
            interop: InteropOptions::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

impl LatticeOptions {
    /// Parses options from a TOML document
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let options: LatticeOptions = toml::from_str(toml)?;
        tracing::debug!(
            "Loaded Lattice options (enabled: {}, debug: {})",
            options.enabled,
            options.debug
        );
        Ok(options)
    }

    /// Loads options from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

/// Wrapper types from other DI frameworks which Lattice should understand.
///
/// Listed class ids are treated exactly like `lattice.Provider` or `kotlin.Lazy` at injection sites.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InteropOptions {
    #[serde(default)]
    pub provider_types: Vec<String>,
    #[serde(default)]
    pub lazy_types: Vec<String>,
}

/// Severity of an optional diagnostic
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    #[default]
    None,
    Warn,
    Error,
}
