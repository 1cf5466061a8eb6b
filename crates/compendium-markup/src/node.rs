/*
 * node.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Typed views over markup nodes.
//!
//! Reference data mixes plain strings, lists, and objects discriminated by a
//! `type` field (or, for older data, by the presence of `title` or
//! `istable`). [`MarkupNode::classify`] turns one JSON object into a
//! borrowed [`MarkupNode`] so the renderer can match on it exhaustively.
//! Nothing is copied out of the document; every variant borrows from the
//! `serde_json::Value` owned by the caller.

use serde_json::{Map, Value};

/// Which ability formula an `abilityAttackMod` / `abilityDc` node describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbilityFormula {
    /// `{name} Attack Bonus = ... modifier + Proficiency Bonus`
    AttackModifier,
    /// `{name} Save DC = 8 + ... modifier + Proficiency Bonus`
    SaveDc,
}

/// A table, from either the typed (`colLabels`/`rows`) or the untyped
/// (`istable`, `thead`/`tbody`) layout.
#[derive(Debug, Clone, PartialEq)]
pub struct TableNode<'a> {
    pub caption: Option<&'a Value>,
    pub header: &'a [Value],
    pub rows: &'a [Value],
}

/// One classified object node.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupNode<'a> {
    /// Untyped `{title, text}` paragraph.
    Titled { title: &'a Value, text: &'a Value },

    /// Typed or untyped table.
    Table(TableNode<'a>),

    /// `entries` and `actions`: optional bold name followed by children.
    Entries {
        name: Option<&'a Value>,
        entries: &'a Value,
    },

    /// `options` and `invocation`: rendered elsewhere, contributes nothing.
    Ignored { kind: &'a str },

    /// Bulleted list.
    List { items: &'a [Value] },

    /// Ability formula with the ability codes to spell out.
    Ability {
        formula: AbilityFormula,
        name: &'a Value,
        attributes: Vec<&'a str>,
    },

    /// Signed numeric bonus.
    Bonus { value: &'a Value },

    /// `{number}d{faces}`.
    Dice {
        number: &'a Value,
        faces: &'a Value,
    },

    /// `{value} feet`.
    BonusSpeed { value: &'a Value },

    /// Attack block with attack type codes and nested entries.
    Attack {
        attack_types: Vec<&'a str>,
        attack_entries: &'a Value,
        hit_entries: &'a Value,
    },

    /// Named list item.
    Item {
        name: Option<&'a Value>,
        entry: &'a Value,
    },

    /// Table cell wrapper.
    Cell { entry: &'a Value },

    /// Known type missing a field it needs.
    Malformed { kind: String, field: &'static str },

    /// Anything outside the table above.
    Unrecognized { kind: String },
}

impl<'a> MarkupNode<'a> {
    /// Classify a JSON object.
    ///
    /// The `type` field wins when present. Without it, `title` marks a
    /// titled paragraph and `istable` an untyped table.
    pub fn classify(obj: &'a Map<String, Value>) -> MarkupNode<'a> {
        match obj.get("type") {
            Some(Value::String(kind)) => Self::classify_typed(kind, obj),
            Some(other) => MarkupNode::Unrecognized {
                kind: other.to_string(),
            },
            None if obj.contains_key("title") => match obj.get("text") {
                Some(text) => MarkupNode::Titled {
                    title: &obj["title"],
                    text,
                },
                None => MarkupNode::Malformed {
                    kind: "title".to_string(),
                    field: "text",
                },
            },
            None if obj.contains_key("istable") => match obj.get("tbody") {
                Some(Value::Array(rows)) => MarkupNode::Table(TableNode {
                    caption: obj.get("caption"),
                    header: array_field(obj, "thead"),
                    rows,
                }),
                _ => MarkupNode::Malformed {
                    kind: "istable".to_string(),
                    field: "tbody",
                },
            },
            None => MarkupNode::Unrecognized {
                kind: "<untyped object>".to_string(),
            },
        }
    }

    fn classify_typed(kind: &'a str, obj: &'a Map<String, Value>) -> MarkupNode<'a> {
        let missing = |field: &'static str| MarkupNode::Malformed {
            kind: kind.to_string(),
            field,
        };

        match kind {
            "entries" | "actions" => match obj.get("entries") {
                Some(entries) => MarkupNode::Entries {
                    name: obj.get("name"),
                    entries,
                },
                None => missing("entries"),
            },

            "options" | "invocation" => MarkupNode::Ignored { kind },

            "list" => match obj.get("items") {
                Some(Value::Array(items)) => MarkupNode::List { items },
                _ => missing("items"),
            },

            "table" => match obj.get("rows") {
                Some(Value::Array(rows)) => MarkupNode::Table(TableNode {
                    caption: obj.get("caption"),
                    header: array_field(obj, "colLabels"),
                    rows,
                }),
                _ => missing("rows"),
            },

            "abilityAttackMod" | "abilityDc" => {
                let formula = if kind == "abilityDc" {
                    AbilityFormula::SaveDc
                } else {
                    AbilityFormula::AttackModifier
                };
                match (obj.get("name"), obj.get("attributes")) {
                    (Some(name), Some(Value::Array(attributes))) => MarkupNode::Ability {
                        formula,
                        name,
                        attributes: attributes.iter().filter_map(Value::as_str).collect(),
                    },
                    (None, _) => missing("name"),
                    (Some(_), _) => missing("attributes"),
                }
            }

            "bonus" => match obj.get("value") {
                Some(value) => MarkupNode::Bonus { value },
                None => missing("value"),
            },

            "bonusSpeed" => match obj.get("value") {
                Some(value) => MarkupNode::BonusSpeed { value },
                None => missing("value"),
            },

            "dice" => match (obj.get("number"), obj.get("faces")) {
                (Some(number), Some(faces)) => MarkupNode::Dice { number, faces },
                (None, _) => missing("number"),
                (Some(_), None) => missing("faces"),
            },

            "attack" => match (obj.get("attackEntries"), obj.get("hitEntries")) {
                (Some(attack_entries), Some(hit_entries)) => MarkupNode::Attack {
                    attack_types: array_field(obj, "attackType")
                        .iter()
                        .filter_map(Value::as_str)
                        .collect(),
                    attack_entries,
                    hit_entries,
                },
                (None, _) => missing("attackEntries"),
                (Some(_), None) => missing("hitEntries"),
            },

            "item" => match obj.get("entry").or_else(|| obj.get("entries")) {
                Some(entry) => MarkupNode::Item {
                    name: obj.get("name"),
                    entry,
                },
                None => missing("entry"),
            },

            "cell" => match obj.get("entry") {
                Some(entry) => MarkupNode::Cell { entry },
                None => missing("entry"),
            },

            other => MarkupNode::Unrecognized {
                kind: other.to_string(),
            },
        }
    }
}

/// Borrow an array field, treating a missing or non-array field as empty.
fn array_field<'a>(obj: &'a Map<String, Value>, field: &str) -> &'a [Value] {
    obj.get(field)
        .and_then(Value::as_array)
        .map_or(&[][..], |items| items.as_slice())
}
