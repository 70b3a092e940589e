//! Environment lookup and the override walker.
//!
//! Responsibilities:
//! - Abstract environment variable access behind `EnvSource` so tests can
//!   supply a fake environment without touching process state.
//! - Walk a destination schema depth-first, derive each leaf's dotted path
//!   and environment key, and assign matching values.
//!
//! Does NOT handle:
//! - Document loading or merging (see `loader` and `merge`).
//! - Leaf parsing rules (see `schema`).
//!
//! Invariants:
//! - Key derivation: uppercased prefix, then the uppercased dotted path
//!   with `.` replaced by the delimiter; with dash normalization, `-` in
//!   path segments becomes `_` in the key.
//! - A key absent from the environment leaves the field exactly as the
//!   document layers set it.
//! - Each applied override emits a `tracing::debug!` event with the path
//!   and the key it matched.

use std::collections::HashMap;

use crate::error::ConfigError;
use crate::schema::{ConfigSchema, FieldSlot, FieldVisitor};

/// A key-value lookup over environment variables.
pub trait EnvSource {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An in-memory environment, for deterministic tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl EnvSource for MapEnv {
    fn lookup(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl FromIterator<(String, String)> for MapEnv {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Depth-first walker that overwrites leaf fields from the environment.
pub(crate) struct OverrideWalker<'a> {
    prefix: &'a str,
    delimiter: &'a str,
    normalize_dash: bool,
    env: &'a dyn EnvSource,
    segments: Vec<String>,
}

impl<'a> OverrideWalker<'a> {
    pub(crate) fn new(
        prefix: &'a str,
        delimiter: &'a str,
        normalize_dash: bool,
        env: &'a dyn EnvSource,
    ) -> Self {
        Self {
            prefix,
            delimiter,
            normalize_dash,
            env,
            segments: Vec::new(),
        }
    }

    pub(crate) fn apply(&mut self, target: &mut dyn ConfigSchema) -> Result<(), ConfigError> {
        target.visit_fields(self)
    }

    fn dotted_path(&self, leaf: &str) -> String {
        if self.segments.is_empty() {
            leaf.to_string()
        } else {
            format!("{}.{leaf}", self.segments.join("."))
        }
    }

    fn env_key(&self, path: &str) -> String {
        let mut mapped = path.to_ascii_uppercase();
        if !self.delimiter.is_empty() {
            mapped = mapped.replace('.', self.delimiter);
        }
        if self.normalize_dash {
            mapped = mapped.replace('-', "_");
        }
        format!("{}{mapped}", self.prefix.to_ascii_uppercase())
    }
}

impl FieldVisitor for OverrideWalker<'_> {
    fn leaf(&mut self, name: &str, mut slot: FieldSlot<'_>) -> Result<(), ConfigError> {
        let path = self.dotted_path(name);
        let key = self.env_key(&path);

        let Some(raw) = self.env.lookup(&key) else {
            tracing::trace!(%path, %key, "no environment override");
            return Ok(());
        };

        if !slot.is_supported() {
            return Err(ConfigError::UnsupportedType {
                path,
                type_name: slot.type_name(),
            });
        }

        tracing::debug!(%path, %key, "applying environment override");
        slot.try_assign(&raw)
            .map_err(|message| ConfigError::Coerce { path, message })
    }

    fn nested(&mut self, name: &str, child: &mut dyn ConfigSchema) -> Result<(), ConfigError> {
        self.segments.push(name.to_string());
        let result = child.visit_fields(self);
        self.segments.pop();
        result
    }
}
