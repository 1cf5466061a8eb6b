/*
 * output.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Writing finished records.

use crate::Record;
use crate::error::{RecordsError, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

/// Write `records` to `out_dir/{name}.json` as JSON indented by four spaces.
///
/// The directory is created if needed. Returns the written path.
pub fn write_records(out_dir: &Path, name: &str, records: &[Record]) -> Result<PathBuf> {
    fs::create_dir_all(out_dir).map_err(|e| RecordsError::io(out_dir, e))?;
    let path = out_dir.join(format!("{}.json", name));

    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    records
        .serialize(&mut serializer)
        .map_err(|source| RecordsError::Json {
            path: path.display().to_string(),
            source,
        })?;

    fs::write(&path, buffer).map_err(|e| RecordsError::io(&path, e))?;
    tracing::info!(path = %path.display(), records = records.len(), "Wrote records");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_write_records() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let records = vec![json!({"name": "Alert", "srd": false}).as_object().cloned().unwrap()];

        let path = write_records(&out, "feats", &records).unwrap();
        assert_eq!(path, out.join("feats.json"));

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n        \"name\": \"Alert\""));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!([{"name": "Alert", "srd": false}]));
    }
}
