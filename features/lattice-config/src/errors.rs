use std::path::PathBuf;

/// Errors when trying to load [`crate::options::LatticeOptions`]
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The options file could not be read
    #[error("Failed to read options file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The options are not valid TOML or contain unknown values
    #[error("Invalid Lattice options: {0}")]
    Parse(#[from] toml::de::Error),
}
