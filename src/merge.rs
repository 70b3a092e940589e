//! Sparse-overwrite merging of decoded document trees.
//!
//! Responsibilities:
//! - Deep-merge one YAML value tree over another: mappings merge key by
//!   key, everything else (scalars, sequences, nulls) replaces wholesale.
//! - Optionally lowercase mapping keys so mixed-case documents line up
//!   with lowercase schema names.
//!
//! Does NOT handle:
//! - YAML parsing (see `loader`).
//! - Typed deserialization of the merged tree (see `loader`).
//!
//! Invariants:
//! - A key absent from the overlay leaves the base value untouched; this
//!   is what makes layering additive rather than a full replace.
//! - An explicit `null` in the overlay is a value and replaces the base.
//! - Sequences never merge element-wise; the overlay's sequence wins.

use serde_yaml::Value;
use serde_yaml::mapping::Entry;

/// Merge `overlay` onto `base` in place.
pub(crate) fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.entry(key) {
                    Entry::Occupied(mut slot) => merge_values(slot.get_mut(), value),
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Lowercase every string mapping key in the tree, recursively.
///
/// Applied per layer before merging so that `App:` and `app:` collapse to
/// the same key and later layers override as expected.
pub(crate) fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut lowered = serde_yaml::Mapping::with_capacity(map.len());
            for (key, value) in map {
                let key = match key {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                lowered.insert(key, lowercase_keys(value));
            }
            Value::Mapping(lowered)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}
