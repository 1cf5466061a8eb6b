/*
 * source.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Document sources.
//!
//! Pipelines read their input as JSON documents addressed by a relative
//! path (`bestiary/index.json`, `items.json`). A [`DocumentSource`] turns
//! such a path into a parsed document:
//!
//! - [`HttpSource`] fetches `{base_url}{path}` over HTTP
//! - [`CachedSource`] memoizes another source on disk
//! - [`MemorySource`] serves fixed documents (tests)

use crate::error::{RecordsError, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Default timeout for remote requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// User agent sent with remote requests.
pub const USER_AGENT: &str = concat!("compendium/", env!("CARGO_PKG_VERSION"));

/// Something that can produce a JSON document for a relative path.
///
/// Sources are shared by every pipeline in a run, so they must be
/// `Send + Sync`.
pub trait DocumentSource: Send + Sync {
    /// Fetch and parse the document at `path`.
    fn fetch(&self, path: &str) -> Result<Value>;
}

/// Fetch `path` and take the array stored under `field`.
pub fn fetch_array(source: &dyn DocumentSource, path: &str, field: &str) -> Result<Vec<Value>> {
    match source.fetch(path)? {
        Value::Object(mut doc) => match doc.remove(field) {
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(RecordsError::invalid(path, field, "expected an array")),
            None => Err(RecordsError::missing(path, field)),
        },
        _ => Err(RecordsError::invalid(path, field, "document is not an object")),
    }
}

/// Blocking HTTP source rooted at a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: Client,
}

impl HttpSource {
    /// Create a source with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a source with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|source| RecordsError::Http {
                path: base_url.clone(),
                source,
            })?;
        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DocumentSource for HttpSource {
    fn fetch(&self, path: &str) -> Result<Value> {
        tracing::info!("Getting {}...", path);
        let url = format!("{}{}", self.base_url, path);
        let http_err = |source| RecordsError::Http {
            path: path.to_string(),
            source,
        };
        self.client
            .get(&url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(http_err)?
            .json::<Value>()
            .map_err(http_err)
    }
}

/// On-disk memoization of another source.
///
/// A document fetched once is written to `cache_dir/path` as pretty JSON
/// and read back from there on every later fetch.
#[derive(Debug)]
pub struct CachedSource<S> {
    inner: S,
    cache_dir: PathBuf,
}

impl<S: DocumentSource> CachedSource<S> {
    pub fn new(inner: S, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Location of `path` inside the cache directory.
    ///
    /// Only plain relative paths are accepted: no `..`, no root, no prefix.
    fn cache_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !plain || path.is_empty() {
            return Err(RecordsError::UnsafePath {
                path: path.to_string(),
            });
        }
        Ok(self.cache_dir.join(relative))
    }

    fn store(&self, cached: &Path, path: &str, doc: &Value) -> Result<()> {
        if let Some(parent) = cached.parent() {
            fs::create_dir_all(parent).map_err(|e| RecordsError::io(parent, e))?;
        }
        let text = serde_json::to_string_pretty(doc).map_err(|source| RecordsError::Json {
            path: path.to_string(),
            source,
        })?;
        fs::write(cached, text).map_err(|e| RecordsError::io(cached, e))
    }
}

impl<S: DocumentSource> DocumentSource for CachedSource<S> {
    fn fetch(&self, path: &str) -> Result<Value> {
        let cached = self.cache_path(path)?;
        match fs::read_to_string(&cached) {
            Ok(text) => {
                let doc = serde_json::from_str(&text).map_err(|source| RecordsError::Json {
                    path: cached.display().to_string(),
                    source,
                })?;
                tracing::info!("Loaded {} from cache", path);
                Ok(doc)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let doc = self.inner.fetch(path)?;
                self.store(&cached, path, &doc)?;
                Ok(doc)
            }
            Err(e) => Err(RecordsError::io(cached, e)),
        }
    }
}

/// Fixed in-memory documents.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: HashMap<String, Value>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document.
    pub fn insert(&mut self, path: impl Into<String>, doc: Value) -> &mut Self {
        self.documents.insert(path.into(), doc);
        self
    }

    /// Create a source from `(path, document)` pairs.
    pub fn with_documents(documents: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|(path, doc)| (path.into(), doc))
                .collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of fetches served so far, including misses.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

impl DocumentSource for MemorySource {
    fn fetch(&self, path: &str) -> Result<Value> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| RecordsError::NotFound {
                path: path.to_string(),
            })
    }
}
