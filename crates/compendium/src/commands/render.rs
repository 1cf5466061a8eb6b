/*
 * render.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Render command implementation
 */

//! Render a markup node from a local JSON file.
//!
//! Useful for checking how a single entry list, table or stat block will
//! come out without running a whole pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use compendium_markup::{BlockRenderer, RenderObserver, RenderOptions, TagSubstitutor};

use crate::config::Settings;

/// Arguments for the render command
#[derive(Debug)]
pub struct RenderArgs {
    pub file: PathBuf,
    pub join: Option<String>,
    pub hard_break: bool,
    pub pointer: Option<String>,
}

/// Execute the render command, printing the result to stdout.
pub fn execute(
    args: RenderArgs,
    settings: &Settings,
    observer: Arc<dyn RenderObserver>,
) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let substitutor = TagSubstitutor::new(observer).with_max_passes(settings.max_passes);
    let renderer = BlockRenderer::with_substitutor(substitutor);
    println!("{}", render_document(&document, &args, &renderer)?);
    Ok(())
}

fn render_document(document: &Value, args: &RenderArgs, renderer: &BlockRenderer) -> Result<String> {
    let node = match &args.pointer {
        Some(pointer) => document
            .pointer(pointer)
            .ok_or_else(|| anyhow!("No value at {} in {}", pointer, args.file.display()))?,
        None => document,
    };

    let mut options = RenderOptions::new().with_hard_break(args.hard_break);
    if let Some(join) = &args.join {
        options = options.with_join(join.as_str());
    }
    Ok(renderer.render_with(node, &options))
}
