/*
 * spellcasting.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Spellcasting blocks.
//!
//! A monster's `spellcasting` array holds one block per casting style
//! (innate, prepared, ...). Each block becomes a trait whose text lists the
//! spells by frequency or level, and the whole array is replaced by a
//! [`SpellcastingSummary`].

use compendium_markup::BlockRenderer;
use compendium_markup::format::scalar_text;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::sync::LazyLock;

static SAVE_DC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(spell save DC (\d+)").expect("Invalid regex pattern for spell save DC")
});

static SPELL_ATTACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{@hit (\d+)\}").expect("Invalid regex pattern for spell attack bonus")
});

static CASTER_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)[stndrh]{2}-level").expect("Invalid regex pattern for caster level")
});

/// `{@spell name}` or `{@spell name|source}`; the name is group 1.
static SPELL_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{@spell ([^}|]*)").expect("Invalid regex pattern for spell tags")
});

/// What replaces a monster's `spellcasting` array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellcastingSummary {
    pub spells: Vec<String>,
    pub dc: i64,
    pub attack_bonus: i64,
    pub caster_level: i64,
}

/// Heading for a spell level key: `Cantrips`, `1st level`, ..., `9th level`.
pub fn spell_level_name(level: &str) -> String {
    match level {
        "0" => "Cantrips".to_string(),
        "1" => "1st level".to_string(),
        "2" => "2nd level".to_string(),
        "3" => "3rd level".to_string(),
        n => format!("{}th level", n),
    }
}

/// Spell name referenced by one spell list entry, if it has a spell tag.
pub fn extract_spell(text: &str) -> Option<String> {
    SPELL_TAG
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn first_number(pattern: &Regex, text: &str) -> Option<i64> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Spell entries are usually strings; some are `{"entry": "..."}` objects.
fn spell_entries(value: Option<&Value>) -> Vec<&str> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.as_str()),
            Value::Object(obj) => obj.get("entry").and_then(Value::as_str),
            _ => None,
        })
        .collect()
}

/// One rendered block plus the numbers read from its header.
#[derive(Debug, Clone, PartialEq)]
pub struct CastingBlock {
    pub name: String,
    pub text: String,
    pub spells: Vec<String>,
    pub dc: Option<i64>,
    pub attack_bonus: Option<i64>,
    pub caster_level: Option<i64>,
}

impl CastingBlock {
    /// Render one spellcasting block.
    pub fn render(block: &Map<String, Value>, renderer: &BlockRenderer) -> Self {
        let name = block.get("name").map(scalar_text).unwrap_or_default();
        let header = block
            .get("headerEntries")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        let header_text = match &header {
            Value::Array(entries) => entries
                .iter()
                .map(scalar_text)
                .collect::<Vec<_>>()
                .join("\n"),
            other => scalar_text(other),
        };

        let mut text = renderer.render(&header);
        let mut spells = Vec::new();
        let list = |entries: Vec<&str>, spells: &mut Vec<String>| -> String {
            for entry in &entries {
                match extract_spell(entry) {
                    Some(spell) => spells.push(spell),
                    None => tracing::debug!(block = %name, entry = %entry, "No spell tag in entry"),
                }
            }
            renderer.render(&Value::String(entries.join(", ")))
        };

        if block.contains_key("will") {
            let rendered = list(spell_entries(block.get("will")), &mut spells);
            text.push_str(&format!("\nAt will: {}", rendered));
        }

        if let Some(Value::Object(daily)) = block.get("daily") {
            for (times, entries) in daily {
                let (times, each) = match times.strip_suffix('e') {
                    Some(times) => (times, " each"),
                    None => (times.as_str(), ""),
                };
                let rendered = list(spell_entries(Some(entries)), &mut spells);
                text.push_str(&format!("\n{}/day{}: {}", times, each, rendered));
            }
        }

        if let Some(Value::Object(levels)) = block.get("spells") {
            for (level, data) in levels {
                let slots = if level == "0" {
                    "at will".to_string()
                } else {
                    match data.get("slots") {
                        Some(slots) => format!("{} slots", scalar_text(slots)),
                        None => "unknown slots".to_string(),
                    }
                };
                let rendered = list(spell_entries(data.get("spells")), &mut spells);
                text.push_str(&format!(
                    "\n{} ({}): {}",
                    spell_level_name(level),
                    slots,
                    rendered
                ));
            }
        }

        CastingBlock {
            text: renderer.render(&Value::String(text)),
            spells,
            dc: first_number(&SAVE_DC, &header_text),
            attack_bonus: first_number(&SPELL_ATTACK, &header_text),
            caster_level: first_number(&CASTER_LEVEL, &header_text),
            name,
        }
    }

    /// The `{name, text}` trait added to the monster.
    pub fn to_trait(&self) -> Value {
        json!({"name": self.name, "text": self.text})
    }
}

/// Combine the spells and numbers of every rendered block.
///
/// The DC and attack bonus come from the block with the most spells that
/// states them; the caster level comes from the last block that states one
/// (default 1).
pub fn summarize(blocks: &[CastingBlock]) -> SpellcastingSummary {
    let mut summary = SpellcastingSummary {
        caster_level: 1,
        ..Default::default()
    };
    let mut dc_weight = 0;
    let mut attack_weight = 0;

    for block in blocks {
        let weight = block.spells.len();
        summary.spells.extend(block.spells.iter().cloned());
        if let Some(dc) = block.dc.filter(|_| weight > dc_weight) {
            summary.dc = dc;
            dc_weight = weight;
        }
        if let Some(bonus) = block.attack_bonus.filter(|_| weight > attack_weight) {
            summary.attack_bonus = bonus;
            attack_weight = weight;
        }
        if let Some(level) = block.caster_level {
            summary.caster_level = level;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use compendium_markup::NoopObserver;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn renderer() -> BlockRenderer {
        BlockRenderer::new(Arc::new(NoopObserver::new()))
    }

    fn block(value: Value) -> CastingBlock {
        CastingBlock::render(value.as_object().unwrap(), &renderer())
    }

    #[test]
    fn test_spell_level_name() {
        assert_eq!(spell_level_name("0"), "Cantrips");
        assert_eq!(spell_level_name("1"), "1st level");
        assert_eq!(spell_level_name("2"), "2nd level");
        assert_eq!(spell_level_name("3"), "3rd level");
        assert_eq!(spell_level_name("7"), "7th level");
    }

    #[test]
    fn test_extract_spell() {
        assert_eq!(extract_spell("{@spell fireball}"), Some("fireball".to_string()));
        assert_eq!(extract_spell("{@spell mage armor|phb} (self only)"), Some("mage armor".to_string()));
        assert_eq!(extract_spell("a plain entry"), None);
    }

    #[test]
    fn test_prepared_caster() {
        let mage = block(json!({
            "name": "Spellcasting",
            "headerEntries": [
                "The mage is a 9th-level spellcaster. Its spellcasting ability is Intelligence (spell save DC 14, {@hit 6} to hit with spell attacks)."
            ],
            "spells": {
                "0": {"spells": ["{@spell fire bolt}", "{@spell light}"]},
                "1": {"slots": 4, "spells": ["{@spell shield}"]},
                "5": {"spells": ["{@spell cone of cold}"]}
            }
        }));

        assert_eq!(mage.name, "Spellcasting");
        assert_eq!(mage.dc, Some(14));
        assert_eq!(mage.attack_bonus, Some(6));
        assert_eq!(mage.caster_level, Some(9));
        assert_eq!(mage.spells, vec!["fire bolt", "light", "shield", "cone of cold"]);
        assert_eq!(
            mage.text,
            "The mage is a 9th-level spellcaster. Its spellcasting ability is Intelligence (spell save DC 14, +6 to hit with spell attacks).\n\
             Cantrips (at will): fire bolt, light\n\
             1st level (4 slots): shield\n\
             5th level (unknown slots): cone of cold"
        );
    }

    #[test]
    fn test_innate_caster() {
        let innate = block(json!({
            "name": "Innate Spellcasting",
            "headerEntries": ["The drow's innate spellcasting ability is Charisma (spell save DC 11)."],
            "will": ["{@spell dancing lights}"],
            "daily": {
                "1e": ["{@spell darkness}", "{@spell faerie fire}"],
                "2": ["{@spell levitate}"]
            }
        }));

        assert_eq!(
            innate.text,
            "The drow's innate spellcasting ability is Charisma (spell save DC 11).\n\
             At will: dancing lights\n\
             1/day each: darkness, faerie fire\n\
             2/day: levitate"
        );
        assert_eq!(innate.dc, Some(11));
        assert_eq!(innate.attack_bonus, None);
        assert_eq!(innate.caster_level, None);
        assert_eq!(innate.to_trait(), json!({"name": "Innate Spellcasting", "text": innate.text}));
    }

    #[test]
    fn test_summary_prefers_block_with_most_spells() {
        let small = CastingBlock {
            name: "a".to_string(),
            text: String::new(),
            spells: vec!["x".to_string()],
            dc: Some(12),
            attack_bonus: Some(4),
            caster_level: Some(5),
        };
        let large = CastingBlock {
            name: "b".to_string(),
            text: String::new(),
            spells: vec!["y".to_string(), "z".to_string()],
            dc: Some(15),
            attack_bonus: None,
            caster_level: None,
        };

        assert_eq!(
            summarize(&[small.clone(), large.clone()]),
            SpellcastingSummary {
                spells: vec!["x".to_string(), "y".to_string(), "z".to_string()],
                dc: 15,
                attack_bonus: 4,
                caster_level: 5,
            }
        );
    }

    #[test]
    fn test_summary_defaults() {
        assert_eq!(
            summarize(&[]),
            SpellcastingSummary {
                spells: vec![],
                dc: 0,
                attack_bonus: 0,
                caster_level: 1,
            }
        );
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = SpellcastingSummary {
            spells: vec!["light".to_string()],
            dc: 13,
            attack_bonus: 5,
            caster_level: 3,
        };
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"spells": ["light"], "dc": 13, "attackBonus": 5, "casterLevel": 3})
        );
    }
}
