//! Layered configuration loading for YAML documents and the environment.
//!
//! A single synchronous pipeline merges three ordered layers into one typed
//! result, with precedence **environment > local override > base**:
//!
//! 1. The required base document and the optional local-override document
//!    are decoded and deep-merged with sparse-overwrite semantics: a layer
//!    only replaces the keys it defines.
//! 2. The destination type's declared field schema is walked depth-first;
//!    each leaf's dotted path (e.g. `app.port`) maps to an environment key
//!    (`MYAPP_APP__PORT` with prefix `MYAPP_` and delimiter `__`), and a
//!    present key's value is parsed into the field's type.
//!
//! Destination types implement [`ConfigSchema`] to enumerate their fields
//! and should carry `#[serde(default)]` so fields absent from every layer
//! resolve to their defaults. See [`Loader`] for a complete example.
//!
//! Nothing is cached across calls; every byte stream a load opens is
//! drained and dropped before the call returns.

pub mod env;
pub mod error;
pub mod loader;
mod merge;
pub mod schema;
pub mod source;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use error::{ConfigError, Layer};
pub use loader::{DEFAULT_DELIMITER, Loader};
pub use schema::{
    ConfigSchema, FieldSlot, FieldVisitor, FromEnvStr, duration_literal, format_duration,
    parse_duration,
};
pub use source::{BytesSource, FileSource, Source};
