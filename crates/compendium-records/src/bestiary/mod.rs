/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Monster records.
//!
//! The bestiary pipeline loads every monster file listed in
//! `bestiary/index.json`, then runs:
//!
//! 1. [`MarkSrd`] - `srd` flag from `srd-monsters.txt`
//! 2. [`ParseArmorClass`] - `ac` array to `{ac, armortype}`
//! 3. [`RenderBlocks`] - traits, actions, reactions and legendary actions
//!    to `{name, text}`
//! 4. [`ParseSpellcasting`] - casting blocks to traits plus a summary
//! 5. [`TagPass`] - substitute tags in every remaining string
//! 6. [`ParseAttacks`] - `attacks` list read from the rendered text

pub mod attacks;
pub mod spellcasting;

use crate::Record;
use crate::batch::{TagPass, for_each_record, record_name};
use crate::context::PipelineContext;
use crate::error::{RecordsError, Result};
use crate::source::fetch_array;
use crate::srd::{MONSTERS_FILE, SrdList};
use crate::transform::{RecordTransform, TransformPipeline};
use compendium_markup::RenderOptions;
use compendium_markup::format::{integer_value, scalar_text};
use serde_json::{Value, json};

pub use attacks::{Attack, parse_attacks};
pub use spellcasting::{CastingBlock, SpellcastingSummary, summarize};

/// Index document mapping source abbreviations to monster files.
pub const INDEX_PATH: &str = "bestiary/index.json";

/// Record fields holding `{name, entries}` blocks.
pub const BLOCK_KINDS: [&str; 4] = ["trait", "action", "reaction", "legendary"];

/// Load every monster listed in the bestiary index.
///
/// Sources whose key contains `3pp` are skipped unless third-party data is
/// enabled on the context.
pub fn load(ctx: &PipelineContext) -> Result<Vec<Record>> {
    let index = ctx.source().fetch(INDEX_PATH)?;
    let Value::Object(index) = index else {
        return Err(RecordsError::invalid(INDEX_PATH, "", "index is not an object"));
    };

    let mut monsters = Vec::new();
    for (source, file) in &index {
        if source.contains("3pp") && !ctx.include_third_party() {
            tracing::debug!(source = %source, "Skipping third-party source");
            continue;
        }
        let file = file
            .as_str()
            .ok_or_else(|| RecordsError::invalid(INDEX_PATH, source.as_str(), "expected a file name"))?;
        let path = format!("bestiary/{}", file);
        let data = fetch_array(ctx.source(), &path, "monster")?;
        tracing::info!("  Processed {}: {} monsters", file, data.len());
        for monster in data {
            match monster {
                Value::Object(record) => monsters.push(record),
                other => {
                    return Err(RecordsError::invalid(
                        path,
                        "monster",
                        format!("expected an object, found {}", other),
                    ));
                }
            }
        }
    }
    Ok(monsters)
}

/// The full bestiary pipeline.
pub fn pipeline() -> TransformPipeline {
    TransformPipeline::new()
        .with(MarkSrd)
        .with(ParseArmorClass)
        .with(RenderBlocks)
        .with(ParseSpellcasting)
        .with(TagPass)
        .with(ParseAttacks)
}

/// Load and process every monster.
pub fn run(ctx: &PipelineContext) -> Result<Vec<Record>> {
    let mut monsters = load(ctx)?;
    pipeline().execute(&mut monsters, ctx)?;
    Ok(monsters)
}

/// Set `srd` from the monster name list.
pub struct MarkSrd;

impl RecordTransform for MarkSrd {
    fn name(&self) -> &str {
        "bestiary-srd"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        let srd = SrdList::load(ctx.srd_dir(), MONSTERS_FILE)?;
        for monster in records.iter_mut() {
            let flag = srd.contains(record_name(monster));
            monster.insert("srd".to_string(), Value::Bool(flag));
        }
        Ok(())
    }
}

/// Replace the `ac` array with `{ac}` or `{ac, armortype}`.
///
/// Only the first entry is used. Anything that is neither a number nor an
/// object with a numeric `ac` is logged and left as it was.
pub struct ParseArmorClass;

impl ParseArmorClass {
    /// The parsed armor class, or `None` when the shape is not understood.
    pub fn parse(ac: &Value, ctx: &PipelineContext) -> Option<Value> {
        let first = ac.as_array().and_then(|items| items.first())?;
        match first {
            Value::Number(_) => integer_value(first).ok().map(|n| json!({"ac": n})),
            Value::Object(obj) => {
                let n = obj.get("ac").and_then(|v| integer_value(v).ok())?;
                let from = obj.get("from").cloned().unwrap_or(Value::Array(Vec::new()));
                let armor = ctx
                    .renderer()
                    .render_with(&from, &RenderOptions::new().with_join(", "));
                Some(json!({"ac": n, "armortype": armor}))
            }
            _ => None,
        }
    }
}

impl RecordTransform for ParseArmorClass {
    fn name(&self) -> &str {
        "bestiary-armor-class"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        for_each_record(records, ctx.parallel(), |monster| {
            let Some(ac) = monster.get("ac") else {
                tracing::warn!(monster = record_name(monster), "Monster has no AC");
                return Ok(());
            };
            match Self::parse(ac, ctx) {
                Some(parsed) => {
                    monster.insert("ac".to_string(), parsed);
                }
                None => {
                    tracing::warn!(monster = record_name(monster), "Unknown AC type: {}", ac);
                }
            }
            Ok(())
        })
    }
}

/// Render every `{name, entries}` block to `{name, text}`.
pub struct RenderBlocks;

impl RenderBlocks {
    fn render_block(entry: &Value, ctx: &PipelineContext) -> Value {
        match entry {
            Value::Object(obj) => {
                let name = obj.get("name").map(scalar_text).unwrap_or_default();
                let text = obj
                    .get("entries")
                    .map(|entries| ctx.renderer().render(entries))
                    .unwrap_or_default();
                json!({"name": name, "text": text})
            }
            other => json!({"name": "", "text": ctx.renderer().render(other)}),
        }
    }
}

impl RecordTransform for RenderBlocks {
    fn name(&self) -> &str {
        "bestiary-render"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        for_each_record(records, ctx.parallel(), |monster| {
            tracing::info!("Rendering {}", record_name(monster));
            for kind in BLOCK_KINDS {
                if let Some(Value::Array(blocks)) = monster.get_mut(kind) {
                    tracing::debug!("  Rendering {}s", kind);
                    for block in blocks.iter_mut() {
                        *block = Self::render_block(block, ctx);
                    }
                }
            }
            Ok(())
        })
    }
}

/// Turn each spellcasting block into a trait and summarize the spells.
pub struct ParseSpellcasting;

impl RecordTransform for ParseSpellcasting {
    fn name(&self) -> &str {
        "bestiary-spellcasting"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        for_each_record(records, ctx.parallel(), |monster| {
            let Some(Value::Array(casting)) = monster.get("spellcasting") else {
                return Ok(());
            };
            let blocks: Vec<CastingBlock> = casting
                .iter()
                .filter_map(Value::as_object)
                .map(|block| CastingBlock::render(block, ctx.renderer()))
                .collect();
            let summary = summarize(&blocks);
            tracing::info!(
                "Lvl {}; DC: {}; SAB: {}; Spells: {:?}",
                summary.caster_level,
                summary.dc,
                summary.attack_bonus,
                summary.spells
            );

            let name = record_name(monster).to_string();
            let summary = serde_json::to_value(&summary)
                .map_err(|e| RecordsError::invalid(&name, "spellcasting", e.to_string()))?;

            let traits = monster
                .entry("trait")
                .or_insert_with(|| Value::Array(Vec::new()));
            match traits {
                Value::Array(traits) => traits.extend(blocks.iter().map(CastingBlock::to_trait)),
                _ => return Err(RecordsError::invalid(name, "trait", "expected an array")),
            }
            monster.insert("spellcasting".to_string(), summary);
            Ok(())
        })
    }
}

/// Collect the attacks described in every rendered block.
pub struct ParseAttacks;

impl RecordTransform for ParseAttacks {
    fn name(&self) -> &str {
        "bestiary-attacks"
    }

    fn transform(&self, records: &mut Vec<Record>, ctx: &PipelineContext) -> Result<()> {
        for_each_record(records, ctx.parallel(), |monster| {
            let mut attacks = Vec::new();
            for kind in BLOCK_KINDS {
                let Some(Value::Array(blocks)) = monster.get(kind) else {
                    continue;
                };
                for block in blocks {
                    let name = block.get("name").and_then(Value::as_str).unwrap_or_default();
                    let text = block.get("text").and_then(Value::as_str).unwrap_or_default();
                    attacks.extend(parse_attacks(name, text));
                }
            }
            tracing::debug!(
                monster = record_name(monster),
                attacks = attacks.len(),
                "Parsed attacks"
            );
            let attacks = serde_json::to_value(&attacks).map_err(|e| {
                RecordsError::invalid(record_name(monster), "attacks", e.to_string())
            })?;
            monster.insert("attacks".to_string(), attacks);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;
    use compendium_markup::{BlockRenderer, CollectingObserver};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn context(source: MemorySource) -> PipelineContext {
        PipelineContext::new(
            Arc::new(source),
            BlockRenderer::new(Arc::new(CollectingObserver::new())),
        )
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn index_source() -> MemorySource {
        MemorySource::with_documents([
            (
                INDEX_PATH,
                json!({"MM": "bestiary-mm.json", "3pp-TOB": "bestiary-3pp-tob.json"}),
            ),
            (
                "bestiary/bestiary-mm.json",
                json!({"monster": [{"name": "Wolf"}, {"name": "Goblin"}]}),
            ),
            (
                "bestiary/bestiary-3pp-tob.json",
                json!({"monster": [{"name": "Clockwork Hound"}]}),
            ),
        ])
    }

    #[test]
    fn test_load_skips_third_party() {
        let monsters = load(&context(index_source())).unwrap();
        let names: Vec<_> = monsters.iter().map(record_name).collect();
        assert_eq!(names, vec!["Wolf", "Goblin"]);
    }

    #[test]
    fn test_load_includes_third_party_when_enabled() {
        let ctx = context(index_source()).with_third_party(true);
        assert_eq!(load(&ctx).unwrap().len(), 3);
    }

    #[test]
    fn test_load_missing_monster_file() {
        let source = MemorySource::with_documents([(INDEX_PATH, json!({"MM": "bestiary-mm.json"}))]);
        assert!(matches!(
            load(&context(source)),
            Err(RecordsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_armor_class_shapes() {
        let ctx = context(MemorySource::new());
        let mut records = vec![
            record(json!({"name": "Wolf", "ac": [13]})),
            record(json!({"name": "Goblin", "ac": [{"ac": 15, "from": ["{@item leather armor|phb}", "{@item shield|phb}"]}]})),
            record(json!({"name": "Ghost", "ac": [{"ac": 11}]})),
            record(json!({"name": "Oddity", "ac": ["eleven"]})),
        ];
        ParseArmorClass.transform(&mut records, &ctx).unwrap();

        assert_eq!(records[0]["ac"], json!({"ac": 13}));
        assert_eq!(
            records[1]["ac"],
            json!({"ac": 15, "armortype": "leather armor, shield"})
        );
        assert_eq!(records[2]["ac"], json!({"ac": 11, "armortype": ""}));
        assert_eq!(records[3]["ac"], json!(["eleven"]));
    }

    #[test]
    fn test_render_blocks() {
        let ctx = context(MemorySource::new());
        let mut records = vec![record(json!({
            "name": "Wolf",
            "trait": [{"name": "Keen Hearing and Smell", "entries": ["The wolf has advantage on Wisdom ({@skill Perception}) checks."]}],
            "action": [{"name": "Bite", "entries": ["{@atk mw} {@hit 4} to hit, reach 5 ft., one target. {@h}7 ({@damage 2d4 + 2}) piercing damage."]}]
        }))];
        RenderBlocks.transform(&mut records, &ctx).unwrap();

        assert_eq!(
            records[0]["trait"],
            json!([{"name": "Keen Hearing and Smell", "text": "The wolf has advantage on Wisdom (Perception) checks."}])
        );
        assert_eq!(
            records[0]["action"][0]["text"],
            json!("Melee Weapon Attack: +4 to hit, reach 5 ft., one target. Hit: 7 (2d4 + 2) piercing damage.")
        );
    }

    #[test]
    fn test_spellcasting_adds_trait_and_summary() {
        let ctx = context(MemorySource::new());
        let mut records = vec![record(json!({
            "name": "Acolyte",
            "spellcasting": [{
                "name": "Spellcasting",
                "headerEntries": ["The acolyte is a 1st-level spellcaster. Its spellcasting ability is Wisdom (spell save DC 12, {@hit 4} to hit with spell attacks)."],
                "spells": {
                    "0": {"spells": ["{@spell light}", "{@spell sacred flame}"]},
                    "1": {"slots": 3, "spells": ["{@spell bless}"]}
                }
            }]
        }))];
        ParseSpellcasting.transform(&mut records, &ctx).unwrap();

        assert_eq!(
            records[0]["spellcasting"],
            json!({"spells": ["light", "sacred flame", "bless"], "dc": 12, "attackBonus": 4, "casterLevel": 1})
        );
        assert_eq!(records[0]["trait"][0]["name"], json!("Spellcasting"));
        assert!(
            records[0]["trait"][0]["text"]
                .as_str()
                .unwrap()
                .ends_with("1st level (3 slots): bless")
        );
    }

    #[test]
    fn test_parse_attacks_over_blocks() {
        let ctx = context(MemorySource::new());
        let bite = "Melee Weapon Attack: +4 to hit, reach 5 ft., one target. Hit: 7 (2d4 + 2) piercing damage.";
        let mut records = vec![record(json!({
            "name": "Wolf",
            "trait": [{"name": "Pack Tactics", "text": "Advantage."}],
            "action": [{"name": "Bite", "text": bite}]
        }))];
        ParseAttacks.transform(&mut records, &ctx).unwrap();
        assert_eq!(
            records[0]["attacks"],
            json!([{"name": "Bite", "attackBonus": "4", "damage": "2d4 + 2[piercing]", "details": bite}])
        );
    }

    #[test]
    fn test_pipeline_names() {
        assert_eq!(
            pipeline().transform_names(),
            vec![
                "bestiary-srd",
                "bestiary-armor-class",
                "bestiary-render",
                "bestiary-spellcasting",
                "tag-pass",
                "bestiary-attacks"
            ]
        );
    }
}
