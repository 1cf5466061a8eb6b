/*
 * format.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Small formatting helpers shared by the renderer and the tag table.

use crate::error::{MarkupError, MarkupResult};
use serde_json::Value;

/// Format an integer with an explicit sign: `+3`, `+0`, `-1`.
pub fn format_signed(n: i64) -> String {
    format!("{:+}", n)
}

/// Parse an integer payload such as `"3"`, `"+3"` or `" -1 "`.
pub fn parse_integer(text: &str) -> MarkupResult<i64> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| MarkupError::InvalidInteger {
            value: text.to_string(),
        })
}

/// Read an integer out of a JSON value.
///
/// Accepts integers, integral floats, and numeric strings.
pub fn integer_value(value: &Value) -> MarkupResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| is_integral_in_range(*f)).map(|f| f as i64))
            .ok_or_else(|| MarkupError::InvalidInteger {
                value: n.to_string(),
            }),
        Value::String(s) => parse_integer(s),
        other => Err(MarkupError::InvalidInteger {
            value: other.to_string(),
        }),
    }
}

// i64::MAX as f64 rounds up to 2^63, which is out of range
fn is_integral_in_range(f: f64) -> bool {
    f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64
}

/// Plain string form of a scalar JSON value.
///
/// Strings are returned without quotes, numbers and booleans in their JSON
/// spelling, and null as the empty string.
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Full name of an ability score code (`dex` -> `Dexterity`).
pub fn ability_name(code: &str) -> Option<&'static str> {
    match code {
        "str" => Some("Strength"),
        "dex" => Some("Dexterity"),
        "con" => Some("Constitution"),
        "int" => Some("Intelligence"),
        "wis" => Some("Wisdom"),
        "cha" => Some("Charisma"),
        _ => None,
    }
}

/// Full name of a single-letter attack type code (`M` -> `Melee`).
pub fn attack_type_name(code: &str) -> Option<&'static str> {
    match code {
        "M" => Some("Melee"),
        "R" => Some("Ranged"),
        "W" => Some("Weapon"),
        "S" => Some("Spell"),
        _ => None,
    }
}

/// Phrase for an `{@atk}` code, without the trailing `Attack:`.
pub fn attack_phrase(code: &str) -> Option<&'static str> {
    match code.trim() {
        "mw" => Some("Melee Weapon"),
        "rw" => Some("Ranged Weapon"),
        "mw,rw" => Some("Melee or Ranged Weapon"),
        "ms" => Some("Melee Spell"),
        "rs" => Some("Ranged Spell"),
        "ms,rs" => Some("Melee or Ranged Spell"),
        _ => None,
    }
}
