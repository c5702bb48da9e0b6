//! Configuration errors and document preprocessing.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;

use crate::socket::InvalidSocket;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A socket entry failed validation.
    #[error("invalid socket configuration: {0}")]
    Validation(#[from] InvalidSocket),

    /// The HTTP listen address cannot be parsed.
    #[error("invalid listen address: '{0}'")]
    InvalidListenAddress(String),
}

/// `${NAME}` or `${NAME:-fallback}`.
static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .expect("env reference pattern is valid")
});

/// Substitute environment references in a configuration document.
///
/// Follows shell semantics: the fallback of `${NAME:-fallback}` applies when
/// `NAME` is unset or empty, and `${NAME}` alone expands to the value or to
/// nothing.
pub fn expand_env_vars(document: &str) -> String {
    ENV_REFERENCE
        .replace_all(document, |caps: &Captures| {
            let value = std::env::var(&caps[1]).ok().filter(|v| !v.is_empty());
            match (value, caps.get(2)) {
                (Some(value), _) => value,
                (None, Some(fallback)) => fallback.as_str().to_owned(),
                (None, None) => String::new(),
            }
        })
        .into_owned()
}
