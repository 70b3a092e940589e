//! The layered configuration loader.
//!
//! Responsibilities:
//! - Provide the builder-pattern `Loader` for hierarchical configuration
//!   merging: base document, optional local override, environment.
//! - Validate options before any I/O, load and merge document layers,
//!   deserialize the merged tree, then run the environment override walker.
//!
//! Does NOT handle:
//! - Leaf parsing rules or schema traversal mechanics (see `schema`, `env`).
//! - Persisting configuration back to disk.
//!
//! Invariants / Assumptions:
//! - Precedence: environment > local override > base document.
//! - A non-empty env prefix requires a non-empty delimiter; violating this
//!   is rejected before any source is opened.
//! - The local layer is optional twice over: omit it entirely, or point it
//!   at a resource that does not exist (open-time not-found is skipped).
//!   Base not-found is always an error.
//! - One call leaves no state behind: sources are opened, drained, and
//!   dropped inside the call; nothing is cached across calls.

use serde::de::DeserializeOwned;
use serde_yaml::Value;

use crate::env::{EnvSource, OverrideWalker, ProcessEnv};
use crate::error::{ConfigError, Layer};
use crate::merge::{lowercase_keys, merge_values};
use crate::schema::ConfigSchema;
use crate::source::{Source, read_all};

/// Default nesting delimiter in environment keys, e.g. `APP_DB__PORT`.
pub const DEFAULT_DELIMITER: &str = "__";

/// Builder for one layered load.
///
/// ```
/// use layercfg::{BytesSource, ConfigError, ConfigSchema, FieldSlot, FieldVisitor, Loader, MapEnv};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize)]
/// #[serde(default)]
/// struct App {
///     name: String,
///     port: u16,
/// }
///
/// impl ConfigSchema for App {
///     fn visit_fields(&mut self, v: &mut dyn FieldVisitor) -> Result<(), ConfigError> {
///         v.leaf("name", FieldSlot::new(&mut self.name))?;
///         v.leaf("port", FieldSlot::new(&mut self.port))
///     }
/// }
///
/// let base = BytesSource::new("base.yaml", "name: demo\nport: 8080\n");
/// let app: App = Loader::new(base)
///     .with_env_prefix("DEMO_")
///     .with_env_source(MapEnv::new().set("DEMO_PORT", "9090"))
///     .load()?;
///
/// assert_eq!(app.name, "demo");
/// assert_eq!(app.port, 9090);
/// # Ok::<(), ConfigError>(())
/// ```
pub struct Loader {
    base: Box<dyn Source>,
    local: Option<Box<dyn Source>>,
    env_prefix: String,
    delimiter: String,
    normalize_dash: bool,
    lowercase_keys: bool,
    env: Box<dyn EnvSource>,
}

impl Loader {
    /// Create a loader over the required base source.
    pub fn new(base: impl Source + 'static) -> Self {
        Self {
            base: Box::new(base),
            local: None,
            env_prefix: String::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            normalize_dash: false,
            lowercase_keys: false,
            env: Box::new(ProcessEnv),
        }
    }

    /// Set the optional local-override source.
    ///
    /// If the underlying resource does not exist when opened, the layer is
    /// skipped without error; any other failure is surfaced.
    pub fn with_local(mut self, local: impl Source + 'static) -> Self {
        self.local = Some(Box::new(local));
        self
    }

    /// Set the environment key prefix, e.g. `"MYAPP_"`. Empty disables
    /// prefixing but overrides still apply under the bare derived keys.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Set the nesting delimiter used in environment keys.
    ///
    /// Must be non-empty whenever the prefix is non-empty; an empty
    /// delimiter cannot distinguish nesting levels.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Treat `-` in document key segments as `_` in environment keys, so
    /// kebab-case keys like `app-name` stay reachable from the environment.
    pub fn with_normalize_dash(mut self, enabled: bool) -> Self {
        self.normalize_dash = enabled;
        self
    }

    /// Lowercase document mapping keys before merging, so mixed-case
    /// documents line up with lowercase schema names.
    pub fn with_lowercase_keys(mut self, enabled: bool) -> Self {
        self.lowercase_keys = enabled;
        self
    }

    /// Replace the environment lookup (defaults to the process environment).
    pub fn with_env_source(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// Run the full pipeline and return the resolved configuration.
    ///
    /// Destination types should carry `#[serde(default)]` so that fields
    /// absent from every document resolve to their `Default` values.
    /// On error the destination was never returned, so no caller can
    /// observe a partially resolved value.
    pub fn load<T>(&self) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default + ConfigSchema,
    {
        self.validate()?;

        let mut merged = self.decode_layer(self.base.as_ref(), Layer::Base)?;

        if let Some(local) = self.local.as_deref() {
            match self.decode_layer(local, Layer::Local) {
                Ok(overlay) => merge_values(&mut merged, overlay),
                Err(ConfigError::SourceOpen { ref source, ref name, .. })
                    if source.kind() == std::io::ErrorKind::NotFound =>
                {
                    tracing::debug!(source = %name, "local configuration absent, skipping");
                }
                Err(err) => return Err(err),
            }
        }

        let mut target: T = if merged.is_null() {
            // Both documents empty: start from defaults.
            T::default()
        } else {
            serde_yaml::from_value(merged).map_err(|e| ConfigError::Deserialize {
                message: e.to_string(),
            })?
        };

        let mut walker = OverrideWalker::new(
            &self.env_prefix,
            &self.delimiter,
            self.normalize_dash,
            self.env.as_ref(),
        );
        walker.apply(&mut target)?;

        Ok(target)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.env_prefix.is_empty() && self.delimiter.is_empty() {
            return Err(ConfigError::InvalidOptions {
                message: "delimiter must be non-empty when an env prefix is set; \
                          use a delimiter like \"__\" to encode nesting"
                    .to_string(),
            });
        }
        Ok(())
    }

    /// Read and decode one document layer into an untyped value tree.
    ///
    /// An empty document decodes to null, which merges as "nothing to say".
    fn decode_layer(&self, source: &dyn Source, layer: Layer) -> Result<Value, ConfigError> {
        let bytes = read_all(source, layer)?;
        tracing::debug!(%layer, source = %source.describe(), len = bytes.len(), "loaded configuration layer");

        let value: Value =
            serde_yaml::from_slice(&bytes).map_err(|e| ConfigError::Decode {
                layer,
                name: source.describe(),
                message: e.to_string(),
            })?;

        Ok(if self.lowercase_keys {
            lowercase_keys(value)
        } else {
            value
        })
    }
}
