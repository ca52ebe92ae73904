//! Errors raised while loading `folio.toml`.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("invalid folio.toml")]
    Toml(#[from] toml::de::Error),

    #[error("collection `{name}`: {reason}")]
    Collection { name: String, reason: String },

    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::Io(
            PathBuf::from("site/folio.toml"),
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(format!("{err}"), "failed to read `site/folio.toml`");

        let err = ConfigError::Collection {
            name: "blog".into(),
            reason: "limit must be a positive integer".into(),
        };
        assert_eq!(format!("{err}"), "collection `blog`: limit must be a positive integer");
    }
}
