/*
 * renderer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Block renderer for markup node trees.
//!
//! Produces Markdown-flavored text from the nested entry structures used by
//! reference data (paragraphs, entry groups, lists, tables, ability
//! formulas, attack blocks).
//!
//! # Design decisions
//!
//! - Sequences render each child and join with the configured separator;
//!   hard-break contexts put two spaces before it
//! - Children that contribute nothing (ignored, unknown, malformed) are
//!   skipped entirely, so they never leave blank lines behind
//! - The joined text of each sequence is tag-substituted once; scalars,
//!   table cells, and list items are substituted as they are rendered
//! - Unknown node types and missing fields are reported to the observer
//!   and rendered as nothing
//! - An object where a sequence is expected is treated as a one-element
//!   sequence
//! - A nested sequence is joined with the same separator as its parent

use crate::format::{ability_name, attack_type_name, format_signed, integer_value, scalar_text};
use crate::node::{AbilityFormula, MarkupNode, TableNode};
use crate::observer::{RenderDiagnostic, RenderObserver, TracingObserver};
use crate::tags::TagSubstitutor;
use serde_json::Value;
use std::sync::Arc;

/// Separator and line-break style for one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Put two spaces before each separator (Markdown hard line break).
    pub hard_break: bool,
    /// String placed between rendered children.
    pub join: String,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_join(mut self, join: impl Into<String>) -> Self {
        self.join = join.into();
        self
    }

    pub fn with_hard_break(mut self, hard_break: bool) -> Self {
        self.hard_break = hard_break;
        self
    }

    /// The separator actually placed between children.
    pub fn separator(&self) -> String {
        if self.hard_break {
            format!("  {}", self.join)
        } else {
            self.join.clone()
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hard_break: false,
            join: "\n".to_string(),
        }
    }
}

/// Renders markup node trees to text.
#[derive(Debug, Clone)]
pub struct BlockRenderer {
    substitutor: TagSubstitutor,
}

impl BlockRenderer {
    /// Create a renderer whose substitutor reports to the same observer.
    pub fn new(observer: Arc<dyn RenderObserver>) -> Self {
        Self {
            substitutor: TagSubstitutor::new(observer),
        }
    }

    /// Create a renderer around an existing substitutor.
    pub fn with_substitutor(substitutor: TagSubstitutor) -> Self {
        Self { substitutor }
    }

    pub fn substitutor(&self) -> &TagSubstitutor {
        &self.substitutor
    }

    fn report(&self, diagnostic: RenderDiagnostic) {
        self.substitutor.observer().on_diagnostic(&diagnostic);
    }

    /// Render a node with the default options (newline separator).
    pub fn render(&self, node: &Value) -> String {
        self.render_with(node, &RenderOptions::default())
    }

    /// Render a node with explicit options.
    pub fn render_with(&self, node: &Value, options: &RenderOptions) -> String {
        match node {
            Value::Array(items) => self.render_sequence(items, options),
            Value::Object(_) => self.render_sequence(std::slice::from_ref(node), options),
            scalar => self.substitutor.substitute(&scalar_text(scalar)),
        }
    }

    /// Render each child, join, and substitute the joined text.
    fn render_sequence(&self, items: &[Value], options: &RenderOptions) -> String {
        let parts: Vec<String> = items
            .iter()
            .filter_map(|item| match item {
                Value::Object(obj) => self.render_node(MarkupNode::classify(obj)),
                Value::Array(nested) => Some(self.render_sequence(nested, options)),
                scalar => Some(scalar_text(scalar)),
            })
            .collect();
        self.substitutor.substitute(&parts.join(&options.separator()))
    }

    /// Render one classified object node; `None` contributes nothing.
    fn render_node(&self, node: MarkupNode<'_>) -> Option<String> {
        match node {
            MarkupNode::Titled { title, text } => Some(format!(
                "**{}**: {}",
                scalar_text(title),
                self.render(text)
            )),

            MarkupNode::Table(table) => Some(self.render_table(&table)),

            MarkupNode::Entries { name, entries } => {
                Some(format!("{}{}", bold_prefix(name), self.render(entries)))
            }

            MarkupNode::Ignored { .. } => None,

            MarkupNode::List { items } => Some(
                items
                    .iter()
                    .map(|item| format!("- {}", self.render(item)))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),

            MarkupNode::Ability {
                formula,
                name,
                attributes,
            } => {
                let abilities = attributes
                    .iter()
                    .map(|code| ability_name(code).unwrap_or(code))
                    .collect::<Vec<_>>()
                    .join(" or ");
                let name = scalar_text(name);
                Some(match formula {
                    AbilityFormula::AttackModifier => format!(
                        "`{} Attack Bonus = {} modifier + Proficiency Bonus`",
                        name, abilities
                    ),
                    AbilityFormula::SaveDc => format!(
                        "`{} Save DC = 8 + {} modifier + Proficiency Bonus`",
                        name, abilities
                    ),
                })
            }

            MarkupNode::Bonus { value } => match integer_value(value) {
                Ok(n) => Some(format_signed(n)),
                Err(e) => {
                    let raw = scalar_text(value);
                    self.report(RenderDiagnostic::MalformedPayload {
                        tag: "bonus".to_string(),
                        payload: raw.clone(),
                        reason: e.to_string(),
                    });
                    Some(raw)
                }
            },

            MarkupNode::Dice { number, faces } => Some(format!(
                "{}d{}",
                scalar_text(number),
                scalar_text(faces)
            )),

            MarkupNode::BonusSpeed { value } => Some(format!("{} feet", scalar_text(value))),

            MarkupNode::Attack {
                attack_types,
                attack_entries,
                hit_entries,
            } => {
                let types = attack_types
                    .iter()
                    .map(|code| attack_type_name(code).unwrap_or(code))
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(format!(
                    "{} Attack: {} Hit: {}",
                    types,
                    self.render(attack_entries),
                    self.render(hit_entries)
                ))
            }

            MarkupNode::Item { name, entry } => Some(match name {
                Some(name) => format!("*{}* {}", scalar_text(name), self.render(entry)),
                None => self.render(entry),
            }),

            MarkupNode::Cell { entry } => Some(self.render(entry)),

            MarkupNode::Malformed { kind, field } => {
                self.report(RenderDiagnostic::MissingField {
                    kind,
                    field: field.to_string(),
                });
                None
            }

            MarkupNode::Unrecognized { kind } => {
                self.report(RenderDiagnostic::UnknownNodeType { kind });
                None
            }
        }
    }

    /// Caption line, bold header row, then one line per body row.
    fn render_table(&self, table: &TableNode<'_>) -> String {
        let mut lines = Vec::with_capacity(table.rows.len() + 2);

        if let Some(caption) = table.caption {
            lines.push(format!("**{}**", self.render(caption)));
        }

        if !table.header.is_empty() {
            lines.push(
                table
                    .header
                    .iter()
                    .map(|label| format!("**{}**", self.render(label)))
                    .collect::<Vec<_>>()
                    .join(" - "),
            );
        }

        for row in table.rows {
            lines.push(
                row_cells(row)
                    .iter()
                    .map(|cell| self.render(cell))
                    .collect::<Vec<_>>()
                    .join(" - "),
            );
        }

        lines.join("\n").trim().to_string()
    }
}

impl Default for BlockRenderer {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver::new()))
    }
}

fn bold_prefix(name: Option<&Value>) -> String {
    match name {
        Some(name) => format!("**{}**: ", scalar_text(name)),
        None => String::new(),
    }
}

/// Cells of a table row: a plain array, or a `{"type": "row", "row": [...]}`
/// wrapper. Anything else is a single cell.
fn row_cells(row: &Value) -> &[Value] {
    match row {
        Value::Array(cells) => cells,
        Value::Object(obj) => match obj.get("row") {
            Some(Value::Array(cells)) => cells,
            _ => std::slice::from_ref(row),
        },
        _ => std::slice::from_ref(row),
    }
}
