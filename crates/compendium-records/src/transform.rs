/*
 * transform.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Record transformation pipeline.
 */

//! Record transformation pipeline.
//!
//! Each record kind is processed by a loader followed by an ordered list of
//! [`RecordTransform`]s (SRD marking, armor class parsing, rendering, ...).
//! A [`TransformPipeline`] runs them in insertion order over the whole
//! record list and stops at the first error.

use crate::Record;
use crate::context::PipelineContext;
use crate::error::Result;

/// One step of a record pipeline.
///
/// Transforms must be `Send + Sync` so a pipeline can be shared across the
/// worker threads that render records in parallel.
pub trait RecordTransform: Send + Sync {
    /// Human-readable name for this transform.
    ///
    /// Used for logging and debugging.
    fn name(&self) -> &str;

    /// Apply the transformation to every record.
    ///
    /// Transforms may reorder, drop, or add records.
    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()>;
}

/// An ordered list of record transforms.
pub struct TransformPipeline {
    transforms: Vec<Box<dyn RecordTransform>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self {
            transforms: Vec::new(),
        }
    }

    /// Add a transform; transforms run in the order they are added.
    pub fn push(&mut self, transform: Box<dyn RecordTransform>) {
        self.transforms.push(transform);
    }

    /// Builder form of [`TransformPipeline::push`].
    pub fn with(mut self, transform: impl RecordTransform + 'static) -> Self {
        self.push(Box::new(transform));
        self
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Execute all transforms in insertion order.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered. Execution stops on error.
    pub fn execute(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        for transform in &self.transforms {
            tracing::debug!(
                transform = transform.name(),
                records = records.len(),
                "Running transform"
            );
            transform.transform(records, ctx)?;
        }
        Ok(())
    }

    /// Names of all transforms in execution order.
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }
}

impl Default for TransformPipeline {
    fn default() -> Self {
        Self::new()
    }
}
