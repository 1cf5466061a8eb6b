/*
 * feats.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Feat records.

use crate::Record;
use crate::batch::{RenderEntries, record_name};
use crate::context::PipelineContext;
use crate::error::{RecordsError, Result};
use crate::source::fetch_array;
use crate::transform::{RecordTransform, TransformPipeline};
use serde_json::Value;

pub const FEATS_PATH: &str = "feats.json";

/// The only SRD feat.
pub const SRD_FEAT: &str = "grappler";

/// Load `feats.json`.
pub fn load(ctx: &PipelineContext) -> Result<Vec<Record>> {
    fetch_array(ctx.source(), FEATS_PATH, "feat")?
        .into_iter()
        .map(|feat| match feat {
            Value::Object(record) => Ok(record),
            other => Err(RecordsError::invalid(
                FEATS_PATH,
                "feat",
                format!("expected an object, found {}", other),
            )),
        })
        .collect()
}

pub fn pipeline() -> TransformPipeline {
    TransformPipeline::new().with(MarkSrd).with(RenderEntries)
}

/// Load and process every feat.
pub fn run(ctx: &PipelineContext) -> Result<Vec<Record>> {
    let mut feats = load(ctx)?;
    pipeline().execute(&mut feats, ctx)?;
    Ok(feats)
}

pub struct MarkSrd;

impl RecordTransform for MarkSrd {
    fn name(&self) -> &str {
        "feats-srd"
    }

    fn transform(&self, records: &mut Vec<Record>, _ctx: &PipelineContext) -> Result<()> {
        for feat in records.iter_mut() {
            let flag = record_name(feat).eq_ignore_ascii_case(SRD_FEAT);
            feat.insert("srd".to_string(), Value::Bool(flag));
        }
        Ok(())
    }
}
