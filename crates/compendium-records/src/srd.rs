/*
 * srd.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! SRD name lists.
//!
//! Each list is a text file with one name per line. Names are compared
//! case-insensitively, so they are stored trimmed and lowercased.

use crate::error::{RecordsError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Monster names (`srd-monsters.txt`).
pub const MONSTERS_FILE: &str = "srd-monsters.txt";

/// Item names (`srd-items.txt`).
pub const ITEMS_FILE: &str = "srd-items.txt";

/// A set of lowercased names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SrdList {
    names: HashSet<String>,
}

impl SrdList {
    /// Read `dir/file`.
    pub fn load(dir: &Path, file: &str) -> Result<Self> {
        let path = dir.join(file);
        let text = fs::read_to_string(&path).map_err(|source| RecordsError::Srd {
            path: path.clone(),
            source,
        })?;
        let list = Self::parse(&text);
        tracing::debug!(path = %path.display(), names = list.len(), "Loaded SRD list");
        Ok(list)
    }

    /// Parse one name per line; blank lines are ignored.
    pub fn parse(text: &str) -> Self {
        Self::from_names(text.lines())
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            names: names
                .into_iter()
                .map(|name| name.trim().to_lowercase())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_names() {
        let list = SrdList::parse("Aboleth\n  Adult Black Dragon \n\nwolf\r\n");
        assert_eq!(list.len(), 3);
        assert!(list.contains("aboleth"));
        assert!(list.contains("ADULT BLACK DRAGON"));
        assert!(list.contains("Wolf"));
        assert!(!list.contains(""));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(MONSTERS_FILE), "Goblin\nOrc\n").unwrap();
        let list = SrdList::load(dir.path(), MONSTERS_FILE).unwrap();
        assert!(list.contains("orc"));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SrdList::load(dir.path(), ITEMS_FILE),
            Err(RecordsError::Srd { .. })
        ));
    }
}
