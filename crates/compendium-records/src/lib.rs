/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Record pipelines for tabletop reference data.
//!
//! Each record kind (monsters, items, races, feats) is loaded from a
//! [`DocumentSource`], run through a [`TransformPipeline`], and returned as
//! a list of JSON objects ready to be written out. Rule text inside records
//! is rendered with `compendium-markup`.
//!
//! # Example
//!
//! ```ignore
//! use compendium_records::{CachedSource, HttpSource, PipelineContext, RecordKind};
//!
//! let source = CachedSource::new(HttpSource::new("https://5etools.com/data/")?, "cache");
//! let ctx = PipelineContext::new(Arc::new(source), BlockRenderer::default());
//! let feats = RecordKind::Feats.run(&ctx)?;
//! ```

pub mod batch;
pub mod bestiary;
pub mod context;
pub mod error;
pub mod feats;
pub mod items;
pub mod output;
pub mod races;
pub mod source;
pub mod srd;
pub mod transform;

pub use context::PipelineContext;
pub use error::{RecordsError, Result};
pub use output::write_records;
pub use source::{CachedSource, DocumentSource, HttpSource, MemorySource};
pub use transform::{RecordTransform, TransformPipeline};

/// One record: a JSON object.
pub type Record = serde_json::Map<String, serde_json::Value>;

/// The record kinds this crate can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Bestiary,
    Items,
    Races,
    Feats,
}

impl RecordKind {
    /// Every kind, in the order `all` runs them.
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Bestiary,
        RecordKind::Items,
        RecordKind::Races,
        RecordKind::Feats,
    ];

    /// Name used for logging and for the output file stem.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Bestiary => "bestiary",
            RecordKind::Items => "items",
            RecordKind::Races => "races",
            RecordKind::Feats => "feats",
        }
    }

    /// Load and process every record of this kind.
    pub fn run(&self, ctx: &PipelineContext) -> Result<Vec<Record>> {
        let _span = tracing::info_span!("pipeline", kind = self.as_str()).entered();
        match self {
            RecordKind::Bestiary => bestiary::run(ctx),
            RecordKind::Items => items::run(ctx),
            RecordKind::Races => races::run(ctx),
            RecordKind::Feats => feats::run(ctx),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
