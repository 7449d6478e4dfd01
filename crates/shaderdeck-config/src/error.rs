use std::path::PathBuf;

/// Failure to read or parse a configuration file.
///
/// Callers normally recover through `AppConfig::load_or_default`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to read config {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// An integer enum code outside the accepted range.
#[derive(Debug, Copy, Clone, Eq, PartialEq, thiserror::Error)]
#[error("unknown {field} code {code}")]
pub struct UnknownCode {
    pub field: &'static str,
    pub code: i64,
}
