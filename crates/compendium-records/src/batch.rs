/*
 * batch.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-record helpers and the transforms shared by several pipelines.

use crate::Record;
use crate::context::PipelineContext;
use crate::error::Result;
use crate::transform::RecordTransform;
use compendium_markup::TagSubstitutor;
use rayon::prelude::*;
use serde_json::Value;

/// Display name of a record, for logs and errors.
pub fn record_name(record: &Record) -> &str {
    record
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("<unnamed>")
}

/// Apply `f` to every record, on the rayon pool when `parallel` is set.
///
/// Records are mutated in place, so the output order always equals the
/// input order. The first error stops the run.
pub fn for_each_record<F>(records: &mut [Record], parallel: bool, f: F) -> Result<()>
where
    F: Fn(&mut Record) -> Result<()> + Send + Sync,
{
    if parallel {
        records.par_iter_mut().try_for_each(|record| f(record))
    } else {
        records.iter_mut().try_for_each(f)
    }
}

/// Tag-substitute every string reachable from `value`, in place.
pub fn substitute_strings(value: &mut Value, substitutor: &TagSubstitutor) {
    match value {
        Value::String(s) => {
            let substituted = substitutor.substitute(s);
            *s = substituted;
        }
        Value::Array(items) => {
            for item in items {
                substitute_strings(item, substitutor);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                substitute_strings(item, substitutor);
            }
        }
        _ => {}
    }
}

/// Replace a record's `entries` with their rendered text.
pub struct RenderEntries;

impl RecordTransform for RenderEntries {
    fn name(&self) -> &str {
        "render-entries"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        let renderer = ctx.renderer();
        for_each_record(records, ctx.parallel(), |record| {
            if let Some(entries) = record.get("entries") {
                tracing::info!("Rendering {}", record_name(record));
                let text = renderer.render(entries);
                record.insert("entries".to_string(), Value::String(text));
            }
            Ok(())
        })
    }
}

/// Tag-substitute every string left anywhere in each record.
pub struct TagPass;

impl RecordTransform for TagPass {
    fn name(&self) -> &str {
        "tag-pass"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        let substitutor = ctx.renderer().substitutor();
        for_each_record(records, ctx.parallel(), |record| {
            for value in record.values_mut() {
                substitute_strings(value, substitutor);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RecordsError;
    use crate::source::MemorySource;
    use compendium_markup::{BlockRenderer, NoopObserver};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn context(parallel: bool) -> PipelineContext {
        PipelineContext::new(
            Arc::new(MemorySource::new()),
            BlockRenderer::new(Arc::new(NoopObserver::new())),
        )
        .with_parallel(parallel)
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    #[test]
    fn test_record_name() {
        assert_eq!(record_name(&record(json!({"name": "Wolf"}))), "Wolf");
        assert_eq!(record_name(&record(json!({}))), "<unnamed>");
    }

    #[test]
    fn test_substitute_strings_reaches_nested_values() {
        let substitutor = TagSubstitutor::new(Arc::new(NoopObserver::new()));
        let mut value = json!({
            "a": "{@b x}",
            "b": ["{@i y}", 3, {"c": "{@hit 2}"}],
            "d": null
        });
        substitute_strings(&mut value, &substitutor);
        assert_eq!(
            value,
            json!({"a": "**x**", "b": ["*y*", 3, {"c": "+2"}], "d": null})
        );
    }

    #[test]
    fn test_render_entries_preserves_order_in_parallel() {
        let mut records: Vec<Record> = (0..64)
            .map(|i| record(json!({"name": format!("r{}", i), "entries": [format!("{{@b {}}}", i)]})))
            .collect();
        RenderEntries.transform(&mut records, &context(true)).unwrap();
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r["name"], json!(format!("r{}", i)));
            assert_eq!(r["entries"], json!(format!("**{}**", i)));
        }
    }

    #[test]
    fn test_render_entries_skips_records_without_entries() {
        let mut records = vec![record(json!({"name": "bare"}))];
        RenderEntries.transform(&mut records, &context(false)).unwrap();
        assert_eq!(records[0], record(json!({"name": "bare"})));
    }

    #[test]
    fn test_for_each_record_propagates_errors() {
        let mut records = vec![record(json!({"name": "a"})), record(json!({"name": "b"}))];
        let result = for_each_record(&mut records, true, |r| {
            if record_name(r) == "b" {
                Err(RecordsError::missing("b", "entries"))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_tag_pass() {
        let mut records = vec![record(json!({"name": "{@b Wolf}", "trait": [{"text": "{@dc 12}"}]}))];
        TagPass.transform(&mut records, &context(false)).unwrap();
        assert_eq!(
            records[0],
            record(json!({"name": "**Wolf**", "trait": [{"text": "DC 12"}]}))
        );
    }
}
