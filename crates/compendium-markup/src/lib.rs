/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Markup-to-text engine for tabletop reference data.
//!
//! Reference data describes rules text as nested JSON: plain strings, lists
//! of strings, and objects discriminated by a `type` field. Strings carry
//! inline tags of the form `{@name payload}`. This crate turns those trees
//! into Markdown-flavored text:
//!
//! - [`BlockRenderer`] walks node trees (entries, lists, tables, ability
//!   formulas, attack blocks) and joins the rendered children
//! - [`TagSubstitutor`] resolves inline tags repeatedly until none remain,
//!   with a configurable pass limit
//! - [`RenderObserver`] receives every diagnostic (unknown node types,
//!   unknown tags, malformed payloads); rendering itself never fails
//!
//! # Example
//!
//! ```ignore
//! use compendium_markup::{BlockRenderer, NoopObserver};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let renderer = BlockRenderer::new(Arc::new(NoopObserver::new()));
//! let text = renderer.render(&json!([{"type": "list", "items": ["a", "{@b b}"]}]));
//! assert_eq!(text, "- a\n- **b**");
//! ```

pub mod error;
pub mod format;
pub mod node;
pub mod observer;
pub mod renderer;
pub mod tags;

pub use error::{MarkupError, MarkupResult};
pub use node::{AbilityFormula, MarkupNode, TableNode};
pub use observer::{
    CollectingObserver, EventLevel, NoopObserver, RenderDiagnostic, RenderObserver, TeeObserver,
    TracingObserver,
};
pub use renderer::{BlockRenderer, RenderOptions};
pub use tags::{DEFAULT_MAX_PASSES, TagSubstitutor, TagTable, TagTransform, contains_tags};
