// src/values/condition.rs

//! Boolean condition lookup over a values tree
//!
//! Conditions are dotted paths like `metrics.enabled`. Evaluation is
//! forgiving: a missing segment or an unexpected shape keeps the result
//! computed so far instead of failing.

use super::ConfigValue;

/// Evaluate a dotted condition path against `values`
///
/// String leaves count as true only when equal to `"true"`, bool leaves
/// yield their value, and mappings are descended into. The walk starts
/// from `false`.
pub fn condition_met(condition: &str, values: &ConfigValue) -> bool {
    let Some(mut pos) = values.as_mapping() else {
        return false;
    };

    let mut enabled = false;
    for segment in condition.split('.') {
        match pos.get(segment) {
            Some(ConfigValue::String(s)) => enabled = s == "true",
            Some(ConfigValue::Bool(b)) => enabled = *b,
            Some(ConfigValue::Mapping(next)) => pos = next,
            Some(ConfigValue::Other(_)) | None => {}
        }
    }
    enabled
}
