/*
 * attacks.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attack extraction from rendered trait and action text.
//!
//! Works on text that has already been through tag substitution, e.g.
//! `Melee Weapon Attack: +4 to hit, reach 5 ft., one target. Hit: 7 (2d4 +
//! 2) piercing damage.`

use regex::{Captures, Regex};
use serde::Serialize;
use std::sync::LazyLock;

/// One attack clause with optional ranged, versatile, and bonus damage.
///
/// Capture groups:
/// 1. attack bonus
/// 2. damage dice (or 3. flat damage) and 4. damage type
/// 5. / 6. ranged dice and type (`... in melee, or N (dice) type damage at range`)
/// 7. / 8. versatile dice and type (`..., or N (dice) type damage if used with two hands`)
/// 9. / 10. bonus dice and type (`... plus N (dice) type damage`)
static ATTACK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)(?:<i>)?(?:\w+ ){1,4}Attack:(?:</i>)? ([+-]?\d+) to hit, .*?(?:<i>)?",
        r"Hit:(?:</i>)? (?:(?:[+-]?\d+ \((.+?)\))|(?:([+-]?\d+))) (\w+) damage[., ]?",
        r"(?:in melee, or [+-]?\d+ \((.+?)\) (\w+) damage at range[,.]?)?",
        r"(?: ?or [+-]?\d+ \((.+?)\) (\w+) damage (?:\w+ ?)+[.,]?)?",
        r"(?: ?plus [+-]?\d+ \((.+?)\) (\w+) damage)?",
    ))
    .expect("Invalid regex pattern for attacks")
});

/// A plain `N (dice) type damage` clause.
static DAMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[+-]?\d+ \((.+?)\) (\w+) damage").expect("Invalid regex pattern for damage")
});

/// One extracted attack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Attack {
    pub name: String,
    /// Attack bonus without a leading `+`; `None` for damage-only entries.
    pub attack_bonus: Option<String>,
    /// `dice[type]`, optionally followed by `+dice[type]` bonus damage.
    pub damage: String,
    /// The full text the attack was read from.
    pub details: String,
}

fn group<'t>(caps: &Captures<'t>, index: usize) -> Option<&'t str> {
    caps.get(index).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

fn pair(caps: &Captures<'_>, dice: usize, kind: usize) -> Option<String> {
    Some(format!("{}[{}]", group(caps, dice)?, group(caps, kind)?))
}

/// Extract the attacks described by one named block of text.
///
/// Each attack clause yields a versatile variant (`2 Handed {name}`) and a
/// ranged variant (`Ranged {name}`) when present, followed by the base
/// attack. Text without an attack clause yields one damage-only attack per
/// damage clause, numbered from the second one on.
pub fn parse_attacks(name: &str, text: &str) -> Vec<Attack> {
    let mut attacks = Vec::new();

    for caps in ATTACK.captures_iter(text) {
        let bonus = caps
            .get(1)
            .map(|m| m.as_str().trim_start_matches('+').to_string());
        let extra = pair(&caps, 9, 10)
            .map(|d| format!("+{}", d))
            .unwrap_or_default();
        let mut push = |name: String, damage: String| {
            attacks.push(Attack {
                name,
                attack_bonus: bonus.clone(),
                damage: format!("{}{}", damage, extra),
                details: text.to_string(),
            });
        };

        if let Some(versatile) = pair(&caps, 7, 8) {
            push(format!("2 Handed {}", name), versatile);
        }
        if let Some(ranged) = pair(&caps, 5, 6) {
            push(format!("Ranged {}", name), ranged);
        }
        let base = group(&caps, 2).or_else(|| group(&caps, 3)).unwrap_or_default();
        let kind = group(&caps, 4).unwrap_or_default();
        push(name.to_string(), format!("{}[{}]", base, kind));
    }

    if attacks.is_empty() {
        for (index, caps) in DAMAGE.captures_iter(text).enumerate() {
            let Some(damage) = pair(&caps, 1, 2) else {
                continue;
            };
            let name = if index == 0 {
                name.to_string()
            } else {
                format!("{} {}", name, index + 1)
            };
            attacks.push(Attack {
                name,
                attack_bonus: None,
                damage,
                details: text.to_string(),
            });
        }
    }

    attacks
}
