/*
 * items.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Item records.
//!
//! Items come from three documents: magic and mundane items, basic items,
//! and generic magic variants. Currency entries are dropped, the `srd` flag
//! is set, generic variants are merged with what they inherit, and
//! `entries` is rendered.

use crate::Record;
use crate::batch::{RenderEntries, record_name};
use crate::context::PipelineContext;
use crate::error::{RecordsError, Result};
use crate::source::fetch_array;
use crate::srd::{ITEMS_FILE, SrdList};
use crate::transform::{RecordTransform, TransformPipeline};
use serde_json::Value;

/// `(document, field)` pairs loaded in order.
pub const ITEM_DOCUMENTS: [(&str, &str); 3] = [
    ("items.json", "item"),
    ("basicitems.json", "basicitem"),
    ("magicvariants.json", "variant"),
];

/// Name fragments that always count as SRD.
pub const SRD_NAME_OVERRIDES: [&str; 20] = [
    "+1",
    "+2",
    "+3",
    "giant strength",
    "ioun stone",
    "horn of valhalla",
    "vorpal",
    "of sharpness",
    "of answering",
    "instrument of the bard",
    "nine lives",
    "frost brand",
    "carpet of flying",
    "vicious",
    "of wounding",
    "of life stealing",
    "of protection",
    "adamantine",
    "of wondrous power",
    "luck blade",
];

/// Item type codes that need an explicit SRD listing. Items of any other
/// type are SRD.
pub const SRD_LISTED_TYPES: [&str; 6] = ["W", "P", "ST", "RD", "RG", "WD"];

/// Type code of currency entries.
const MONEY_TYPE: &str = "$";

/// Type code of generic magic variants.
const GENERIC_VARIANT_TYPE: &str = "GV";

fn item_type(item: &Record) -> &str {
    item.get("type").and_then(Value::as_str).unwrap_or_default()
}

/// Load all three item documents, in order.
pub fn load(ctx: &PipelineContext) -> Result<Vec<Record>> {
    let mut items = Vec::new();
    for (path, field) in ITEM_DOCUMENTS {
        for item in fetch_array(ctx.source(), path, field)? {
            match item {
                Value::Object(record) => items.push(record),
                other => {
                    return Err(RecordsError::invalid(
                        path,
                        field,
                        format!("expected an object, found {}", other),
                    ));
                }
            }
        }
    }
    tracing::info!("Loaded {} items", items.len());
    Ok(items)
}

/// The full item pipeline.
pub fn pipeline() -> TransformPipeline {
    TransformPipeline::new()
        .with(DropMoney)
        .with(MarkSrd)
        .with(VariantInheritance)
        .with(RenderEntries)
}

/// Load and process every item.
pub fn run(ctx: &PipelineContext) -> Result<Vec<Record>> {
    let mut items = load(ctx)?;
    pipeline().execute(&mut items, ctx)?;
    Ok(items)
}

/// Remove currency entries.
pub struct DropMoney;

impl RecordTransform for DropMoney {
    fn name(&self) -> &str {
        "items-drop-money"
    }

    fn transform(&self, records: &mut Vec<Record>, _ctx: &PipelineContext) -> Result<()> {
        records.retain(|item| item_type(item) != MONEY_TYPE);
        Ok(())
    }
}

/// Set `srd` from the item list, the name overrides, and the type codes.
pub struct MarkSrd;

impl MarkSrd {
    pub fn is_srd(item: &Record, listed: &SrdList) -> bool {
        let name = record_name(item).to_lowercase();
        listed.contains(&name)
            || SRD_NAME_OVERRIDES
                .iter()
                .any(|fragment| name.contains(fragment))
            || !item_type(item)
                .split(',')
                .any(|code| SRD_LISTED_TYPES.contains(&code))
    }
}

impl RecordTransform for MarkSrd {
    fn name(&self) -> &str {
        "items-srd"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        let listed = SrdList::load(ctx.srd_dir(), ITEMS_FILE)?;
        for item in records.iter_mut() {
            let flag = Self::is_srd(item, &listed);
            item.insert("srd".to_string(), Value::Bool(flag));
        }
        Ok(())
    }
}

/// Merge each generic variant's `inherits` into the variant itself.
///
/// Inherited fields overwrite the variant's own, except `entries`: a
/// variant that has entries keeps them.
pub struct VariantInheritance;

impl VariantInheritance {
    pub fn apply(item: &mut Record) {
        let Some(Value::Object(inherits)) = item.get("inherits").cloned() else {
            return;
        };
        let own_entries = item.get("entries").cloned();
        item.extend(inherits);
        if let Some(entries) = own_entries {
            item.insert("entries".to_string(), entries);
        }
    }
}

impl RecordTransform for VariantInheritance {
    fn name(&self) -> &str {
        "items-variant-inheritance"
    }

    fn transform(&self, records: &mut Vec<Record>, _ctx: &PipelineContext) -> Result<()> {
        for item in records
            .iter_mut()
            .filter(|item| item_type(item) == GENERIC_VARIANT_TYPE)
        {
            Self::apply(item);
        }
        Ok(())
    }
}
