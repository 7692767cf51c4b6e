//! Error types for modbake
//!
//! All modules use `BakeResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for modbake operations
pub type BakeResult<T> = Result<T, BakeError>;

/// All errors that can occur in modbake
#[derive(Error, Debug)]
pub enum BakeError {
    // Bake errors
    #[error("Base game '{base_type}' not found (searched: {searched})")]
    NotFound { base_type: String, searched: String },

    #[error("Unsupported artifact {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("Failed to clean up {path}: {source}")]
    CleanupFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BakeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a cleanup failure (logged by callers, never propagated from a bake)
    pub fn cleanup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CleanupFailure {
            path: path.into(),
            source,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound { .. } => {
                Some("Check paths.data_root / paths.bundled_assets, or pass --data-root")
            }
            Self::Unsupported { .. } => {
                Some("Extract the archive into a .sdd directory and bake from that")
            }
            Self::ConfigInvalid { .. } => Some("Run: modbake config init --force"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_base_type() {
        let err = BakeError::NotFound {
            base_type: "demo".to_string(),
            searched: "/data/games".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'demo' not found"));
        assert!(msg.contains("/data/games"));
    }

    #[test]
    fn io_error_keeps_context() {
        let err = BakeError::io(
            "copying /a/b.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "IO error: copying /a/b.txt");
    }

    #[test]
    fn error_hint() {
        let err = BakeError::Unsupported {
            path: "/games/x.sdz".into(),
            reason: "archive".to_string(),
        };
        assert!(err.hint().unwrap().contains(".sdd"));
        assert!(BakeError::Internal("x".to_string()).hint().is_none());
    }
}
