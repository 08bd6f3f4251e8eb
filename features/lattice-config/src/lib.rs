//! Lattice Config holds the compiler options that steer the binding graph engine.
//!
//! Options are plain TOML, every key is optional and falls back to a default.
//!
//! # Examples
//!
//! ```rust
//! use lattice_config::options::{LatticeOptions, Severity};
//!
//! let options = LatticeOptions::from_toml_str(
//!     r#"
//!     debug = true
//!     public-provider-severity = "warn"
//!
//!     [interop]
//!     provider-types = ["javax.inject.Provider"]
//!     "#,
//! )
//! .unwrap();
//!
//! assert!(options.enabled);
//! assert!(options.debug);
//! assert_eq!(options.public_provider_severity, Severity::Warn);
//! assert_eq!(options.interop.provider_types, vec!["javax.inject.Provider".to_string()]);
//! ```
//!
//! Lattice Config consists of the following components:
//!
//! 1. Options - the option structs and their loading
//! 2. Errors - for option loading errors

pub mod errors;
pub mod options;

pub use errors::ConfigError;
pub use options::{InteropOptions, LatticeOptions, Severity};
