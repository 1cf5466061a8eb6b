/*
 * pipeline.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Record pipeline commands
 */

//! The `bestiary`, `items`, `races`, `feats` and `all` commands.
//!
//! Documents are fetched from the configured data URL through an on-disk
//! cache. Each record kind is written to `{out_dir}/{kind}.json`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{error, info};

use compendium_markup::{BlockRenderer, RenderObserver, TagSubstitutor};
use compendium_records::{
    CachedSource, DocumentSource, HttpSource, PipelineContext, RecordKind, write_records,
};

use crate::config::Settings;

/// Run `kinds` against the configured remote source.
pub fn execute(
    kinds: &[RecordKind],
    settings: &Settings,
    observer: Arc<dyn RenderObserver>,
) -> Result<()> {
    let remote = HttpSource::new(settings.data_url.clone())
        .with_context(|| format!("Failed to set up HTTP client for {}", settings.data_url))?;
    let source = CachedSource::new(remote, settings.cache_dir.clone());
    let ctx = build_context(settings, Arc::new(source), observer);
    run_kinds(kinds, &ctx, &settings.out_dir)
}

/// Assemble a pipeline context from settings and a document source.
pub fn build_context(
    settings: &Settings,
    source: Arc<dyn DocumentSource>,
    observer: Arc<dyn RenderObserver>,
) -> PipelineContext {
    let substitutor = TagSubstitutor::new(observer).with_max_passes(settings.max_passes);
    PipelineContext::new(source, BlockRenderer::with_substitutor(substitutor))
        .with_srd_dir(settings.srd_dir.clone())
        .with_parallel(settings.parallel)
        .with_third_party(settings.include_third_party)
}

/// Run each kind and write its output.
///
/// A single kind fails with its own error. With several kinds a failure is
/// logged and the remaining kinds still run; the command then fails once
/// at the end.
pub fn run_kinds(kinds: &[RecordKind], ctx: &PipelineContext, out_dir: &Path) -> Result<()> {
    if let [kind] = kinds {
        return run_one(*kind, ctx, out_dir);
    }

    let mut failed = Vec::new();
    for kind in kinds {
        if let Err(e) = run_one(*kind, ctx, out_dir) {
            error!("{:#}", e);
            failed.push(kind.as_str());
        }
    }

    if !failed.is_empty() {
        bail!("Failed to build: {}", failed.join(", "));
    }
    Ok(())
}

fn run_one(kind: RecordKind, ctx: &PipelineContext, out_dir: &Path) -> Result<()> {
    info!("Building {}", kind);
    let records = kind
        .run(ctx)
        .with_context(|| format!("Failed to build {}", kind))?;
    write_records(out_dir, kind.as_str(), &records)
        .with_context(|| format!("Failed to write {}", kind))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use compendium_markup::NoopObserver;
    use compendium_records::MemorySource;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::fs;
    use std::path::PathBuf;

    fn settings(srd_dir: PathBuf, out_dir: PathBuf) -> Settings {
        Settings {
            data_url: "http://localhost/data/".to_string(),
            cache_dir: out_dir.join("cache"),
            out_dir,
            srd_dir,
            max_passes: 50,
            parallel: false,
            include_third_party: false,
        }
    }

    fn feats_only() -> Arc<dyn DocumentSource> {
        Arc::new(MemorySource::with_documents([(
            "feats.json",
            json!({"feat": [{"name": "Grappler", "entries": ["{@b Grab} things."]}]}),
        )]))
    }

    #[test]
    fn test_single_kind_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path().join("srd"), dir.path().join("out"));
        let ctx = build_context(&settings, feats_only(), Arc::new(NoopObserver::new()));

        run_kinds(&[RecordKind::Feats], &ctx, &settings.out_dir).unwrap();

        let text = fs::read_to_string(settings.out_dir.join("feats.json")).unwrap();
        let written: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            written,
            json!([{"name": "Grappler", "entries": "**Grab** things.", "srd": true}])
        );
    }

    #[test]
    fn test_single_kind_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path().join("srd"), dir.path().join("out"));
        let ctx = build_context(&settings, feats_only(), Arc::new(NoopObserver::new()));

        let err = run_kinds(&[RecordKind::Races], &ctx, &settings.out_dir).unwrap_err();
        assert!(format!("{:#}", err).starts_with("Failed to build races"));
    }

    #[test]
    fn test_all_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path().join("srd"), dir.path().join("out"));
        let ctx = build_context(&settings, feats_only(), Arc::new(NoopObserver::new()));

        let err = run_kinds(&RecordKind::ALL, &ctx, &settings.out_dir).unwrap_err();
        assert_eq!(err.to_string(), "Failed to build: bestiary, items, races");
        assert!(settings.out_dir.join("feats.json").exists());
    }
}
