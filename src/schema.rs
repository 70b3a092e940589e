//! Declarative field schemas for environment overrides.
//!
//! Responsibilities:
//! - Define `ConfigSchema`, the trait destination types implement to
//!   enumerate their fields to a visitor.
//! - Define `FieldSlot`, a type-erased mutable handle over one leaf field,
//!   and `FromEnvStr`, the parsing rule for each supported leaf type.
//! - Parse human-readable duration literals (`30s`, `1h30m`, `250ms`).
//!
//! Does NOT handle:
//! - Environment lookup or key derivation (see `env`).
//! - Document decoding or merging (see `loader` and `merge`).
//!
//! Invariants:
//! - Visiting a schema never changes its shape: fields are assigned in
//!   place, never added, removed, or reordered.
//! - A field not enumerated by `visit_fields` is invisible to overrides;
//!   omission is the "skip" mechanism.
//! - `FieldSlot::unsupported` marks a field that exists but has no
//!   environment parsing rule; targeting it from the environment is an
//!   error naming the field's path and type.

use std::time::Duration;

use crate::error::ConfigError;

/// A destination type that exposes its fields for environment overrides.
///
/// Implementations enumerate leaves and nested sub-structures in
/// declaration order. Field names should match the names used in the
/// YAML documents (typically lowercase).
pub trait ConfigSchema {
    fn visit_fields(&mut self, visitor: &mut dyn FieldVisitor) -> Result<(), ConfigError>;
}

/// Receiver for a schema traversal.
pub trait FieldVisitor {
    /// Visit a leaf field under `name`.
    fn leaf(&mut self, name: &str, slot: FieldSlot<'_>) -> Result<(), ConfigError>;

    /// Visit a nested sub-structure under `name`, recursing into its fields.
    fn nested(&mut self, name: &str, child: &mut dyn ConfigSchema) -> Result<(), ConfigError>;
}

/// A leaf type that can be parsed from an environment variable string.
pub trait FromEnvStr: Sized {
    /// Short type name used in diagnostics.
    const TYPE_NAME: &'static str;

    fn from_env_str(raw: &str) -> Result<Self, String>;
}

impl FromEnvStr for String {
    const TYPE_NAME: &'static str = "string";

    /// Assigned verbatim; no trimming or unquoting.
    fn from_env_str(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromEnvStr for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_env_str(raw: &str) -> Result<Self, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(format!(
                "cannot parse {raw:?} as bool: expected true, false, 1, or 0"
            )),
        }
    }
}

macro_rules! from_env_str_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromEnvStr for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_env_str(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| {
                        format!("cannot parse {raw:?} as {}: {e}", Self::TYPE_NAME)
                    })
                }
            }
        )*
    };
}

from_env_str_via_parse!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl FromEnvStr for Duration {
    const TYPE_NAME: &'static str = "duration";

    fn from_env_str(raw: &str) -> Result<Self, String> {
        parse_duration(raw)
    }
}

enum Assign<'a> {
    Parse(Box<dyn FnMut(&str) -> Result<(), String> + 'a>),
    Unsupported,
}

/// A type-erased mutable handle over one leaf field.
///
/// Built from a mutable reference to the field; assigning parses the raw
/// environment string with the field type's `FromEnvStr` rule and writes
/// the result through the reference.
pub struct FieldSlot<'a> {
    type_name: &'static str,
    assign: Assign<'a>,
}

impl<'a> FieldSlot<'a> {
    /// A slot over a field whose type has an environment parsing rule.
    pub fn new<T: FromEnvStr>(dest: &'a mut T) -> Self {
        Self {
            type_name: T::TYPE_NAME,
            assign: Assign::Parse(Box::new(move |raw| {
                *dest = T::from_env_str(raw)?;
                Ok(())
            })),
        }
    }

    /// A slot over a field that documents may set but the environment may
    /// not. An environment key targeting it fails with `UnsupportedType`.
    pub fn unsupported<T>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            assign: Assign::Unsupported,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn is_supported(&self) -> bool {
        matches!(self.assign, Assign::Parse(_))
    }

    pub(crate) fn try_assign(&mut self, raw: &str) -> Result<(), String> {
        match &mut self.assign {
            Assign::Parse(assign) => assign(raw),
            Assign::Unsupported => Err(format!("type {} has no parsing rule", self.type_name)),
        }
    }
}

/// Parse a human-readable duration literal such as `30s`, `1h30m`, `250ms`.
///
/// A literal is one or more `<number><unit>` terms; the bare literal `0`
/// is also accepted. Supported units: `ns`, `us`, `ms`, `s`, `m`, `h`.
/// Numbers may carry a fractional part (`1.5h`).
pub fn parse_duration(raw: &str) -> Result<Duration, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("cannot parse empty string as duration".to_string());
    }
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }

    let chars: Vec<char> = trimmed.chars().collect();
    let mut total = Duration::ZERO;
    let mut i = 0;

    while i < chars.len() {
        let number_start = i;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
            i += 1;
        }
        if i == number_start {
            return Err(format!(
                "cannot parse {raw:?} as duration: expected a number at {:?}",
                chars[i]
            ));
        }
        let number: f64 = chars[number_start..i]
            .iter()
            .collect::<String>()
            .parse()
            .map_err(|_| format!("cannot parse {raw:?} as duration: malformed number"))?;

        let unit_start = i;
        while i < chars.len() && !chars[i].is_ascii_digit() && chars[i] != '.' {
            i += 1;
        }
        let unit: String = chars[unit_start..i].iter().collect();
        let unit_secs = match unit.as_str() {
            "ns" => 1e-9,
            "us" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "" => {
                return Err(format!("cannot parse {raw:?} as duration: missing unit"));
            }
            other => {
                return Err(format!(
                    "cannot parse {raw:?} as duration: unknown unit {other:?}"
                ));
            }
        };

        let term = Duration::try_from_secs_f64(number * unit_secs)
            .map_err(|_| format!("cannot parse {raw:?} as duration: out of range"))?;
        total = total
            .checked_add(term)
            .ok_or_else(|| format!("cannot parse {raw:?} as duration: out of range"))?;
    }

    Ok(total)
}

/// Format a duration as a literal `parse_duration` accepts.
pub fn format_duration(duration: Duration) -> String {
    if duration == Duration::ZERO {
        return "0s".to_string();
    }

    let secs = duration.as_secs();
    let nanos = duration.subsec_nanos();
    let mut out = String::new();

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if seconds > 0 {
        out.push_str(&format!("{seconds}s"));
    }
    if nanos > 0 {
        if nanos % 1_000_000 == 0 {
            out.push_str(&format!("{}ms", nanos / 1_000_000));
        } else if nanos % 1_000 == 0 {
            out.push_str(&format!("{}us", nanos / 1_000));
        } else {
            out.push_str(&format!("{nanos}ns"));
        }
    }

    out
}

/// Serde helper for `Duration` fields carried as literals in documents.
///
/// Use with `#[serde(with = "layercfg::duration_literal")]` so that a
/// document can say `timeout: 30s` and the same literal grammar applies
/// to both document values and environment overrides.
pub mod duration_literal {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_duration, parse_duration};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_simple_units() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("750us").unwrap(), Duration::from_micros(750));
        assert_eq!(parse_duration("100ns").unwrap(), Duration::from_nanos(100));
    }

    #[test]
    fn test_parse_duration_compound_and_fractional() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(
            parse_duration("1h30m10s").unwrap(),
            Duration::from_secs(5410)
        );
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1s500ms").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn test_parse_duration_bare_zero() {
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_malformed_input() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("1..5s").is_err());
    }

    #[test]
    fn test_format_duration_round_trips() {
        for d in [
            Duration::ZERO,
            Duration::from_secs(30),
            Duration::from_secs(5400),
            Duration::from_secs(5410),
            Duration::from_millis(1500),
            Duration::from_micros(750),
            Duration::from_nanos(100),
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
    }

    #[test]
    fn test_bool_parsing_accepts_truthy_and_falsy_tokens() {
        assert_eq!(bool::from_env_str("true").unwrap(), true);
        assert_eq!(bool::from_env_str("TRUE").unwrap(), true);
        assert_eq!(bool::from_env_str("1").unwrap(), true);
        assert_eq!(bool::from_env_str("false").unwrap(), false);
        assert_eq!(bool::from_env_str("False").unwrap(), false);
        assert_eq!(bool::from_env_str("0").unwrap(), false);
        assert!(bool::from_env_str("yes").is_err());
    }

    #[test]
    fn test_string_assigned_verbatim() {
        assert_eq!(String::from_env_str("  spaced  ").unwrap(), "  spaced  ");
    }

    #[test]
    fn test_integer_overflow_is_a_parse_error() {
        assert!(u8::from_env_str("300").is_err());
        assert!(i16::from_env_str("40000").is_err());
        assert!(u32::from_env_str("-1").is_err());
        assert_eq!(u16::from_env_str("8080").unwrap(), 8080);
    }

    #[test]
    fn test_field_slot_assigns_through_reference() {
        let mut port: u16 = 8080;
        let mut slot = FieldSlot::new(&mut port);
        slot.try_assign("9090").unwrap();
        drop(slot);
        assert_eq!(port, 9090);
    }

    #[test]
    fn test_field_slot_reports_parse_failure() {
        let mut port: u16 = 8080;
        let mut slot = FieldSlot::new(&mut port);
        assert!(slot.try_assign("not-a-port").is_err());
        drop(slot);
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_unsupported_slot_carries_type_name() {
        let slot = FieldSlot::unsupported::<Vec<String>>();
        assert!(!slot.is_supported());
        assert!(slot.type_name().contains("Vec"));
    }
}
