/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Shared state for one pipeline run.

use crate::source::DocumentSource;
use compendium_markup::BlockRenderer;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a pipeline needs besides its records.
///
/// The context is shared (read-only) by every transform and, in parallel
/// mode, by every worker thread.
#[derive(Clone)]
pub struct PipelineContext {
    source: Arc<dyn DocumentSource>,
    renderer: BlockRenderer,
    srd_dir: PathBuf,
    parallel: bool,
    include_third_party: bool,
}

impl PipelineContext {
    pub fn new(source: Arc<dyn DocumentSource>, renderer: BlockRenderer) -> Self {
        Self {
            source,
            renderer,
            srd_dir: PathBuf::from("srd"),
            parallel: false,
            include_third_party: false,
        }
    }

    /// Directory holding the `srd-*.txt` name lists.
    pub fn with_srd_dir(mut self, srd_dir: impl Into<PathBuf>) -> Self {
        self.srd_dir = srd_dir.into();
        self
    }

    /// Render per-record fields on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load bestiary sources marked as third-party.
    pub fn with_third_party(mut self, include: bool) -> Self {
        self.include_third_party = include;
        self
    }

    pub fn source(&self) -> &dyn DocumentSource {
        self.source.as_ref()
    }

    pub fn renderer(&self) -> &BlockRenderer {
        &self.renderer
    }

    pub fn srd_dir(&self) -> &Path {
        &self.srd_dir
    }

    pub fn parallel(&self) -> bool {
        self.parallel
    }

    pub fn include_third_party(&self) -> bool {
        self.include_third_party
    }
}

impl std::fmt::Debug for PipelineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineContext")
            .field("renderer", &self.renderer)
            .field("srd_dir", &self.srd_dir)
            .field("parallel", &self.parallel)
            .field("include_third_party", &self.include_third_party)
            .finish_non_exhaustive()
    }
}
