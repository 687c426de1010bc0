use std::path::PathBuf;
use thiserror::Error;

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Failures raised while declaring schemas or resolving a configuration.
///
/// Every variant carries the dotted path (or file) it concerns so a failed
/// run can be diagnosed from the message alone.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid schema `{schema}`: {reason}")]
    SchemaDefinition { schema: String, reason: String },

    #[error("unknown configuration field `{path}`")]
    UnknownField { path: String },

    #[error("type mismatch at `{path}`: expected {expected}, received {received}")]
    TypeMismatch { path: String, expected: String, received: String },

    #[error("missing required configuration field `{path}`")]
    MissingRequiredField { path: String },

    #[error("cannot interpolate `{path}`: {reason}")]
    Interpolation { path: String, reason: String },

    #[error("invalid override `{arg}`: {reason}")]
    InvalidOverride { arg: String, reason: String },

    #[error("configuration `{name}` not found in {}", .dir.display())]
    ConfigNotFound { name: String, dir: PathBuf },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot decode section `{section}`: {message}")]
    SectionDecode { section: String, message: String },

    #[error("cannot render configuration: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn schema(schema: &str, reason: impl Into<String>) -> Self {
        Self::SchemaDefinition { schema: schema.to_string(), reason: reason.into() }
    }

    pub(crate) fn unknown(path: &str) -> Self {
        Self::UnknownField { path: path.to_string() }
    }

    pub(crate) fn missing(path: &str) -> Self {
        Self::MissingRequiredField { path: path.to_string() }
    }

    pub(crate) fn interpolation(path: &str, reason: impl Into<String>) -> Self {
        Self::Interpolation { path: path.to_string(), reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mismatch_message_names_path_and_types() {
        let err = ConfigError::TypeMismatch {
            path: "trainer.max_epochs".to_string(),
            expected: "integer".to_string(),
            received: "\"ten\" (string)".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("trainer.max_epochs"));
        assert!(msg.contains("integer"));
        assert!(msg.contains("ten"));
    }

    #[test]
    fn test_config_not_found_message() {
        let err = ConfigError::ConfigNotFound { name: "train".to_string(), dir: PathBuf::from("conf") };
        assert_eq!(err.to_string(), "configuration `train` not found in conf");
    }
}
