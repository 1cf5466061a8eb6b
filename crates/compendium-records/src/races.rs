/*
 * races.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Race records.
//!
//! Subraces are split into standalone records named `Race (Subrace)`, and
//! names are made unique: some sources are always suffixed, and remaining
//! duplicates are resolved by source priority.

use crate::Record;
use crate::batch::{RenderEntries, record_name};
use crate::context::PipelineContext;
use crate::error::{RecordsError, Result};
use crate::source::fetch_array;
use crate::transform::{RecordTransform, TransformPipeline};
use serde_json::Value;

pub const RACES_PATH: &str = "races.json";

/// Races marked as SRD, by final name.
pub const SRD_RACES: [&str; 10] = [
    "Dragonborn",
    "Half-Elf",
    "Half-Orc",
    "Elf (High)",
    "Dwarf (Hill)",
    "Human",
    "Human (Variant)",
    "Halfling (Lightfoot)",
    "Gnome (Rock)",
    "Tiefling",
];

/// Source priority for duplicate names, best first. A source matches the
/// first entry it contains; sources matching none rank as `nil`.
pub const SOURCE_HIERARCHY: [&str; 7] = ["MTF", "VGM", "PHB", "DMG", "UAWGtE", "UA", "nil"];

/// Sources whose races are always renamed `Name (SOURCE)`.
pub const EXPLICIT_SOURCES: [&str; 2] = ["UAEberron", "DMG"];

fn source_of(race: &Record) -> &str {
    race.get("source").and_then(Value::as_str).unwrap_or_default()
}

fn rename_with_source(race: &mut Record) -> String {
    let new_name = format!("{} ({})", record_name(race), source_of(race));
    race.insert("name".to_string(), Value::String(new_name.clone()));
    new_name
}

/// Position of a source in [`SOURCE_HIERARCHY`].
pub fn source_rank(source: &str) -> usize {
    SOURCE_HIERARCHY
        .iter()
        .position(|s| source.contains(s))
        .unwrap_or(SOURCE_HIERARCHY.len() - 1)
}

/// Load `races.json`.
pub fn load(ctx: &PipelineContext) -> Result<Vec<Record>> {
    fetch_array(ctx.source(), RACES_PATH, "race")?
        .into_iter()
        .map(|race| match race {
            Value::Object(record) => Ok(record),
            other => Err(RecordsError::invalid(
                RACES_PATH,
                "race",
                format!("expected an object, found {}", other),
            )),
        })
        .collect()
}

/// The full race pipeline.
pub fn pipeline() -> TransformPipeline {
    TransformPipeline::new()
        .with(SplitSubraces)
        .with(ExplicitSources)
        .with(ResolveDuplicates)
        .with(MarkSrd)
        .with(RenderEntries)
}

/// Load and process every race.
pub fn run(ctx: &PipelineContext) -> Result<Vec<Record>> {
    let mut races = load(ctx)?;
    pipeline().execute(&mut races, ctx)?;
    Ok(races)
}

/// Replace each race that has `subraces` with one record per subrace.
pub struct SplitSubraces;

impl SplitSubraces {
    /// Combine a parent race (without `subraces`) and one subrace.
    pub fn merge(parent: &Record, subrace: &Record) -> Record {
        let mut race = parent.clone();

        if let Some(name) = subrace.get("name").and_then(Value::as_str) {
            let full = format!("{} ({})", record_name(parent), name);
            race.insert("name".to_string(), Value::String(full));
        }

        if let Some(Value::Array(extra)) = subrace.get("entries") {
            match race.get_mut("entries") {
                Some(Value::Array(entries)) => entries.extend(extra.iter().cloned()),
                _ => {
                    race.insert("entries".to_string(), Value::Array(extra.clone()));
                }
            }
        }

        if let Some(ability) = subrace.get("ability") {
            match (race.get_mut("ability"), ability) {
                (Some(Value::Object(own)), Value::Object(extra)) => {
                    own.extend(extra.clone());
                }
                _ => {
                    race.insert("ability".to_string(), ability.clone());
                }
            }
        }

        for field in ["speed", "source"] {
            if let Some(value) = subrace.get(field) {
                race.insert(field.to_string(), value.clone());
            }
        }

        race
    }
}

impl RecordTransform for SplitSubraces {
    fn name(&self) -> &str {
        "races-split-subraces"
    }

    fn transform(&self, records: &mut Vec<Record>, _ctx: &PipelineContext) -> Result<()> {
        let mut out = Vec::with_capacity(records.len());
        for mut race in records.drain(..) {
            tracing::info!("Processing race {}", record_name(&race));
            let Some(Value::Array(subraces)) = race.shift_remove("subraces") else {
                out.push(race);
                continue;
            };
            for subrace in subraces.iter().filter_map(Value::as_object) {
                let subrace_name = subrace.get("name").and_then(Value::as_str);
                tracing::info!("Processing subrace {}", subrace_name.unwrap_or("<unnamed>"));
                out.push(Self::merge(&race, subrace));
            }
        }
        *records = out;
        Ok(())
    }
}

/// Suffix races from [`EXPLICIT_SOURCES`] with their source.
pub struct ExplicitSources;

impl RecordTransform for ExplicitSources {
    fn name(&self) -> &str {
        "races-explicit-sources"
    }

    fn transform(&self, records: &mut Vec<Record>, _ctx: &PipelineContext) -> Result<()> {
        for race in records
            .iter_mut()
            .filter(|race| EXPLICIT_SOURCES.contains(&source_of(race)))
        {
            let old = record_name(race).to_string();
            let new_name = rename_with_source(race);
            tracing::info!("Renaming {} to {} (explicit override)", old, new_name);
        }
        Ok(())
    }
}

/// Keep the name on the best-ranked duplicate and suffix the others.
pub struct ResolveDuplicates;

impl RecordTransform for ResolveDuplicates {
    fn name(&self) -> &str {
        "races-resolve-duplicates"
    }

    fn transform(&self, records: &mut Vec<Record>, _ctx: &PipelineContext) -> Result<()> {
        for i in 0..records.len() {
            let name = record_name(&records[i]).to_string();
            let mut same: Vec<usize> = (0..records.len())
                .filter(|&j| record_name(&records[j]) == name)
                .collect();
            if same.len() < 2 {
                continue;
            }
            tracing::warn!("Found duplicate: {}", name);
            // Stable sort: equal ranks keep their input order
            same.sort_by_key(|&j| source_rank(source_of(&records[j])));
            for &j in &same[1..] {
                let new_name = rename_with_source(&mut records[j]);
                tracing::info!("Renaming {} to {}", name, new_name);
            }
        }
        Ok(())
    }
}

/// Set `srd` from [`SRD_RACES`].
pub struct MarkSrd;

impl RecordTransform for MarkSrd {
    fn name(&self) -> &str {
        "races-srd"
    }

    fn transform(&self, records: &mut Vec<Record>, _ctx: &PipelineContext) -> Result<()> {
        for race in records.iter_mut() {
            let flag = SRD_RACES.contains(&record_name(race));
            race.insert("srd".to_string(), Value::Bool(flag));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use compendium_markup::{BlockRenderer, NoopObserver};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> PipelineContext {
        PipelineContext::new(
            Arc::new(MemorySource::new()),
            BlockRenderer::new(Arc::new(NoopObserver::new())),
        )
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().map(record_name).collect()
    }

    #[test]
    fn test_source_rank() {
        assert_eq!(source_rank("MTF"), 0);
        assert_eq!(source_rank("PHB"), 2);
        assert_eq!(source_rank("UAWGtE"), 4);
        assert_eq!(source_rank("UARacesOfEberron"), 5);
        assert_eq!(source_rank("EEPC"), 6);
    }

    #[test]
    fn test_split_subraces() {
        let mut records = vec![
            record(json!({
                "name": "Dwarf",
                "source": "PHB",
                "speed": 25,
                "ability": {"con": 2},
                "entries": ["Stout."],
                "subraces": [
                    {"name": "Hill", "ability": {"wis": 1}, "entries": ["Tough."]},
                    {"name": "Duergar", "source": "MTF", "speed": 30}
                ]
            })),
            record(json!({"name": "Human", "source": "PHB", "entries": []})),
        ];
        SplitSubraces.transform(&mut records, &context()).unwrap();

        assert_eq!(names(&records), vec!["Dwarf (Hill)", "Dwarf (Duergar)", "Human"]);
        assert_eq!(records[0]["ability"], json!({"con": 2, "wis": 1}));
        assert_eq!(records[0]["entries"], json!(["Stout.", "Tough."]));
        assert_eq!(records[0]["source"], json!("PHB"));
        assert!(!records[0].contains_key("subraces"));
        assert_eq!(records[1]["source"], json!("MTF"));
        assert_eq!(records[1]["speed"], json!(30));
        assert_eq!(records[1]["entries"], json!(["Stout."]));
    }

    #[test]
    fn test_unnamed_subrace_keeps_parent_name() {
        let parent = record(json!({"name": "Human", "source": "PHB"}));
        let subrace = record(json!({"ability": {"str": 1}}));
        let merged = SplitSubraces::merge(&parent, &subrace);
        assert_eq!(record_name(&merged), "Human");
        assert_eq!(merged["ability"], json!({"str": 1}));
    }

    #[test]
    fn test_split_subraces_transform_with_unnamed_subrace() {
        let mut records = vec![record(json!({
            "name": "Human",
            "source": "PHB",
            "subraces": [{"ability": {"str": 1}}, {"name": "Variant"}]
        }))];
        SplitSubraces.transform(&mut records, &context()).unwrap();
        assert_eq!(names(&records), vec!["Human", "Human (Variant)"]);
        assert!(records.iter().all(|race| !race.contains_key("subraces")));
    }

    #[test]
    fn test_explicit_sources() {
        let mut records = vec![
            record(json!({"name": "Aasimar", "source": "DMG"})),
            record(json!({"name": "Changeling", "source": "UAEberron"})),
            record(json!({"name": "Elf", "source": "PHB"})),
        ];
        ExplicitSources.transform(&mut records, &context()).unwrap();
        assert_eq!(
            names(&records),
            vec!["Aasimar (DMG)", "Changeling (UAEberron)", "Elf"]
        );
    }

    #[test]
    fn test_resolve_duplicates_by_hierarchy() {
        let mut records = vec![
            record(json!({"name": "Tiefling", "source": "UA"})),
            record(json!({"name": "Tiefling", "source": "PHB"})),
            record(json!({"name": "Tiefling", "source": "MTF"})),
            record(json!({"name": "Gnome", "source": "PHB"})),
        ];
        ResolveDuplicates.transform(&mut records, &context()).unwrap();
        assert_eq!(
            names(&records),
            vec!["Tiefling (UA)", "Tiefling (PHB)", "Tiefling", "Gnome"]
        );
    }

    #[test]
    fn test_mark_srd() {
        let mut records = vec![
            record(json!({"name": "Elf (High)"})),
            record(json!({"name": "Elf (Wood)"})),
        ];
        MarkSrd.transform(&mut records, &context()).unwrap();
        assert_eq!(records[0]["srd"], json!(true));
        assert_eq!(records[1]["srd"], json!(false));
    }
}
