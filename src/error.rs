//! Error types for layered configuration loading.
//!
//! Responsibilities:
//! - Define error variants for every configuration loading failure.
//! - Identify which layer (base or local) a source failure belongs to.
//!
//! Does NOT handle:
//! - Deciding whether a failure is recoverable (callers own retry/fallback).
//!
//! Invariants:
//! - All variants carry enough context to diagnose without internal retries:
//!   source identity, field path, or the original parser message.
//! - I/O causes are attached via `#[source]` so the chain stays inspectable.

use std::fmt;
use std::io;
use thiserror::Error;

/// Identity of a document layer, used in source error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// The required base document.
    Base,
    /// The optional local-override document.
    Local,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Base => f.write_str("base"),
            Layer::Local => f.write_str("local"),
        }
    }
}

/// Errors that can occur while loading layered configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid call-time setup, rejected before any I/O occurs.
    #[error("invalid loader options: {message}")]
    InvalidOptions { message: String },

    /// A configuration source could not be opened.
    #[error("failed to open {layer} configuration source {name}")]
    SourceOpen {
        layer: Layer,
        name: String,
        #[source]
        source: io::Error,
    },

    /// A configuration source was opened but its bytes could not be read.
    #[error("failed to read {layer} configuration source {name}")]
    SourceRead {
        layer: Layer,
        name: String,
        #[source]
        source: io::Error,
    },

    /// A document layer contained malformed YAML.
    #[error("failed to decode {layer} configuration from {name}: {message}")]
    Decode {
        layer: Layer,
        name: String,
        message: String,
    },

    /// The merged document tree did not match the destination type.
    #[error("merged configuration does not match the destination type: {message}")]
    Deserialize { message: String },

    /// An environment variable's value could not be parsed into the
    /// destination field's type.
    #[error("invalid environment override for {path}: {message}")]
    Coerce { path: String, message: String },

    /// An environment variable targeted a field whose type has no
    /// environment parsing rule.
    #[error("field {path} has type {type_name}, which cannot be set from the environment")]
    UnsupportedType {
        path: String,
        type_name: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_display() {
        assert_eq!(Layer::Base.to_string(), "base");
        assert_eq!(Layer::Local.to_string(), "local");
    }

    #[test]
    fn test_source_open_message_names_layer_and_source() {
        let err = ConfigError::SourceOpen {
            layer: Layer::Base,
            name: "config.yaml".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("base"));
        assert!(msg.contains("config.yaml"));
    }

    #[test]
    fn test_io_cause_is_preserved() {
        let err = ConfigError::SourceRead {
            layer: Layer::Local,
            name: "config.local.yaml".to_string(),
            source: io::Error::new(io::ErrorKind::UnexpectedEof, "truncated"),
        };
        let cause = std::error::Error::source(&err).expect("cause should be attached");
        assert!(cause.to_string().contains("truncated"));
    }
}
