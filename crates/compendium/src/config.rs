/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Project configuration discovery and merging.
 */

//! Project configuration.
//!
//! Settings come from three layers, highest priority first:
//!
//! 1. command-line flags
//! 2. a `compendium.yml` (or `compendium.yaml`) found in the working
//!    directory or one of its parents, or given with `--config`
//! 3. built-in defaults
//!
//! Relative paths in a config file are resolved against the directory that
//! contains it.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATA_URL: &str = "https://5etools.com/data/";
pub const DEFAULT_CACHE_DIR: &str = "cache";
pub const DEFAULT_OUT_DIR: &str = "out";
pub const DEFAULT_SRD_DIR: &str = "srd";

const CONFIG_NAMES: [&str; 2] = ["compendium.yml", "compendium.yaml"];

/// Contents of a config file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    pub data_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub srd_dir: Option<PathBuf>,
    pub max_passes: Option<usize>,
    pub parallel: Option<bool>,
    pub include_third_party: Option<bool>,
}

impl ConfigFile {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        // An empty file is an empty config
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        if let Some(base) = path.parent() {
            for dir in [
                &mut config.cache_dir,
                &mut config.out_dir,
                &mut config.srd_dir,
            ]
            .into_iter()
            .flatten()
            {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok(config)
    }
}

/// Search for a config file in `start_dir` and its parents.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    let mut current = Some(start_dir);
    while let Some(dir) = current {
        for name in CONFIG_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        current = dir.parent();
    }
    None
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_url: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub srd_dir: Option<PathBuf>,
    pub max_passes: Option<usize>,
    pub parallel: bool,
    pub include_third_party: bool,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_url: String,
    pub cache_dir: PathBuf,
    pub out_dir: PathBuf,
    pub srd_dir: PathBuf,
    pub max_passes: usize,
    pub parallel: bool,
    pub include_third_party: bool,
}

impl Settings {
    /// Merge flags over a config file over defaults.
    pub fn merge(overrides: Overrides, config: ConfigFile) -> Self {
        Self {
            data_url: overrides
                .data_url
                .or(config.data_url)
                .unwrap_or_else(|| DEFAULT_DATA_URL.to_string()),
            cache_dir: overrides
                .cache_dir
                .or(config.cache_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
            out_dir: overrides
                .out_dir
                .or(config.out_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR)),
            srd_dir: overrides
                .srd_dir
                .or(config.srd_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SRD_DIR)),
            max_passes: overrides
                .max_passes
                .or(config.max_passes)
                .unwrap_or(compendium_markup::DEFAULT_MAX_PASSES),
            parallel: overrides.parallel || config.parallel.unwrap_or(false),
            include_third_party: overrides.include_third_party
                || config.include_third_party.unwrap_or(false),
        }
    }

    /// Resolve settings from the command line, an explicit or discovered
    /// config file, and defaults.
    pub fn resolve(overrides: Overrides, explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config(cwd),
        };
        let config = match &path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Using config file");
                ConfigFile::load(path)?
            }
            None => ConfigFile::default(),
        };
        Ok(Self::merge(overrides, config))
    }
}
