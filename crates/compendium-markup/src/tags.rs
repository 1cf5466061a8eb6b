/*
 * tags.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Inline `{@tag payload}` substitution.
 */

//! Inline tag substitution.
//!
//! Reference data embeds a small inline markup of the form `{@name payload}`
//! (or `{@name}` with no payload):
//!
//! ```text
//! Before: {@atk mw} {@hit 4} to hit. {@h}5 ({@damage 1d6 + 2}) piercing damage.
//! After:  Melee Weapon Attack: +4 to hit. Hit: 5 (1d6 + 2) piercing damage.
//! ```
//!
//! Each occurrence is resolved through a [`TagTable`] that maps the tag name
//! to a pure transform of its payload. Payloads cannot contain braces, so
//! in `{@bold {@hit 3} damage}` only the inner tag matches on the first
//! pass; the outer tag is matched on the next pass once the inner one is
//! gone. [`TagSubstitutor::substitute`] repeats passes until nothing
//! matches or the pass limit is reached.

use crate::error::MarkupResult;
use crate::format::{attack_phrase, format_signed, parse_integer};
use crate::observer::{RenderDiagnostic, RenderObserver, TracingObserver};
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

/// Default number of substitution passes before giving up.
pub const DEFAULT_MAX_PASSES: usize = 50;

/// Pattern for one tag occurrence: `{@name}` or `{@name payload}`.
///
/// - `\{@`        - opening brace and at-sign
/// - `(\w+)`      - the tag name (group 1)
/// - `(?: ...)?`  - optional single space and payload (group 2)
/// - `[^{}]*`     - payload runs to the next closing brace and never spans
///                  another brace, so inner tags are matched first
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{@(\w+)(?: ([^{}]*))?\}").expect("Invalid regex pattern for inline tags")
});

/// A pure transform from a tag payload (possibly empty) to output text.
///
/// Returning an error marks the payload as malformed: the substitutor
/// reports it and keeps the raw payload.
pub type TagTransform = fn(&str) -> MarkupResult<String>;

/// Tags whose payload is a pipe-delimited reference (`name|source|display`).
const REFERENCE_TAGS: &[&str] = &[
    "action",
    "adventure",
    "background",
    "book",
    "class",
    "condition",
    "creature",
    "damage",
    "deity",
    "dice",
    "disease",
    "feat",
    "filter",
    "hazard",
    "item",
    "language",
    "object",
    "quickref",
    "race",
    "scaledamage",
    "scaledice",
    "sense",
    "skill",
    "spell",
    "status",
    "table",
    "variantrule",
];

/// Immutable mapping from tag name to transform.
#[derive(Clone)]
pub struct TagTable {
    transforms: HashMap<String, TagTransform>,
}

impl TagTable {
    /// Create a table with no entries.
    pub fn empty() -> Self {
        Self {
            transforms: HashMap::new(),
        }
    }

    /// The standard table used for reference data.
    pub fn standard() -> Self {
        let mut table = Self::empty()
            .with("bold", bold)
            .with("b", bold)
            .with("italic", italic)
            .with("i", italic)
            .with("hit", hit)
            .with("h", hit_marker)
            .with("dc", difficulty_class)
            .with("link", link)
            .with("recharge", recharge)
            .with("chance", chance)
            .with("atk", attack);
        for name in REFERENCE_TAGS {
            table = table.with(*name, reference_display);
        }
        table
    }

    /// Add or replace a transform.
    pub fn with(mut self, name: impl Into<String>, transform: TagTransform) -> Self {
        self.transforms.insert(name.into(), transform);
        self
    }

    /// Look up the transform for a tag name.
    pub fn get(&self, name: &str) -> Option<TagTransform> {
        self.transforms.get(name).copied()
    }

    /// Check if a tag name is known.
    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    /// Number of known tag names.
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Check if the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl Default for TagTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for TagTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TagTable").field("names", &names).finish()
    }
}

/// Check whether a string still contains at least one tag occurrence.
pub fn contains_tags(text: &str) -> bool {
    TAG_PATTERN.is_match(text)
}

/// Resolves `{@name payload}` occurrences to text.
#[derive(Clone)]
pub struct TagSubstitutor {
    table: TagTable,
    observer: Arc<dyn RenderObserver>,
    max_passes: usize,
}

impl TagSubstitutor {
    /// Create a substitutor with the standard table.
    pub fn new(observer: Arc<dyn RenderObserver>) -> Self {
        Self {
            table: TagTable::standard(),
            observer,
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Replace the tag table.
    pub fn with_table(mut self, table: TagTable) -> Self {
        self.table = table;
        self
    }

    /// Set the maximum number of substitution passes.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn observer(&self) -> &Arc<dyn RenderObserver> {
        &self.observer
    }

    /// Resolve every tag occurrence in `text`.
    ///
    /// Passes are repeated until a pass finds no occurrence. If occurrences
    /// remain after `max_passes` passes, a
    /// [`RenderDiagnostic::SubstitutionLimit`] is reported and the partially
    /// substituted text is returned.
    pub fn substitute(&self, text: &str) -> String {
        let mut current = text.to_string();
        for _ in 0..self.max_passes {
            if !TAG_PATTERN.is_match(&current) {
                return current;
            }
            current = self.substitute_pass(&current);
        }

        if TAG_PATTERN.is_match(&current) {
            self.observer
                .on_diagnostic(&RenderDiagnostic::SubstitutionLimit {
                    passes: self.max_passes,
                    text: current.clone(),
                });
        }
        current
    }

    /// Run a single left-to-right pass over `text`.
    pub fn substitute_pass(&self, text: &str) -> String {
        TAG_PATTERN
            .replace_all(text, |caps: &Captures| {
                let name = caps.get(1).map_or("", |m| m.as_str());
                let payload = caps.get(2).map_or("", |m| m.as_str());
                self.resolve(name, payload)
            })
            .into_owned()
    }

    /// Resolve one occurrence.
    fn resolve(&self, name: &str, payload: &str) -> String {
        match self.table.get(name) {
            Some(transform) => match transform(payload) {
                Ok(text) => text,
                Err(e) => {
                    self.observer
                        .on_diagnostic(&RenderDiagnostic::MalformedPayload {
                            tag: name.to_string(),
                            payload: payload.to_string(),
                            reason: e.to_string(),
                        });
                    payload.to_string()
                }
            },
            None => {
                self.observer.on_diagnostic(&RenderDiagnostic::UnknownTag {
                    name: name.to_string(),
                    payload: payload.to_string(),
                });
                payload.to_string()
            }
        }
    }
}

impl Default for TagSubstitutor {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver::new()))
    }
}

impl std::fmt::Debug for TagSubstitutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagSubstitutor")
            .field("table", &self.table)
            .field("max_passes", &self.max_passes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Standard transforms
// ============================================================================

fn bold(payload: &str) -> MarkupResult<String> {
    Ok(format!("**{}**", payload))
}

fn italic(payload: &str) -> MarkupResult<String> {
    Ok(format!("*{}*", payload))
}

fn hit(payload: &str) -> MarkupResult<String> {
    parse_integer(payload).map(format_signed)
}

fn hit_marker(_payload: &str) -> MarkupResult<String> {
    Ok("Hit: ".to_string())
}

fn difficulty_class(payload: &str) -> MarkupResult<String> {
    Ok(format!("DC {}", payload))
}

/// `name`, `name|source` -> name; `name|source|display` -> display.
///
/// With three or more segments the last one is shown even when empty.
fn reference_display(payload: &str) -> MarkupResult<String> {
    let segments: Vec<&str> = payload.split('|').collect();
    let shown = if segments.len() >= 3 {
        segments[segments.len() - 1]
    } else {
        segments[0]
    };
    Ok(shown.to_string())
}

fn link(payload: &str) -> MarkupResult<String> {
    match payload.split_once('|') {
        Some((label, url)) => Ok(format!("[{}]({})", label, url)),
        None => Ok(payload.to_string()),
    }
}

fn recharge(payload: &str) -> MarkupResult<String> {
    let threshold = payload.trim();
    if threshold.is_empty() {
        Ok("(Recharge 6)".to_string())
    } else {
        Ok(format!("(Recharge {}-6)", threshold))
    }
}

fn chance(payload: &str) -> MarkupResult<String> {
    let mut segments = payload.split('|');
    let first = segments.next().unwrap_or("");
    Ok(segments.next().unwrap_or(first).to_string())
}

fn attack(payload: &str) -> MarkupResult<String> {
    let phrase = attack_phrase(payload).unwrap_or("Unknown");
    Ok(format!("{} Attack:", phrase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::CollectingObserver;
    use pretty_assertions::assert_eq;

    fn substitutor() -> (TagSubstitutor, Arc<CollectingObserver>) {
        let observer = Arc::new(CollectingObserver::new());
        (TagSubstitutor::new(observer.clone()), observer)
    }

    fn substitute(text: &str) -> String {
        substitutor().0.substitute(text)
    }

    #[test]
    fn test_plain_text_unchanged() {
        let (subst, observer) = substitutor();
        let text = "The goblin hides. {not a tag} @bold";
        assert_eq!(subst.substitute(text), text);
        assert!(observer.is_empty());
    }

    #[test]
    fn test_idempotent_on_substituted_output() {
        let once = substitute("{@bold Bite.} {@atk mw} {@hit 4} to hit");
        assert_eq!(substitute(&once), once);
    }

    #[test]
    fn test_styling_tags() {
        assert_eq!(substitute("{@bold Bite}"), "**Bite**");
        assert_eq!(substitute("{@b Bite}"), "**Bite**");
        assert_eq!(substitute("{@italic Bite}"), "*Bite*");
        assert_eq!(substitute("{@i Bite}"), "*Bite*");
    }

    #[test]
    fn test_reference_tags() {
        assert_eq!(substitute("{@spell fireball}"), "fireball");
        assert_eq!(substitute("{@spell fireball|PHB}"), "fireball");
        assert_eq!(substitute("{@creature goblin|MM|goblins}"), "goblins");
        assert_eq!(substitute("{@item longsword|phb|}"), "");
        assert_eq!(substitute("{@creature goblin|MM|}"), "");
        assert_eq!(substitute("{@condition prone}"), "prone");
        assert_eq!(substitute("{@damage 2d6 + 3}"), "2d6 + 3");
        assert_eq!(substitute("{@dice 1d20}"), "1d20");
        assert_eq!(
            substitute("{@filter simple weapons|items|type=simple weapon}"),
            "type=simple weapon"
        );
    }

    #[test]
    fn test_extended_reference_tags_are_known() {
        let (subst, observer) = substitutor();
        for name in REFERENCE_TAGS {
            let text = format!("{{@{} thing|SRC|shown}}", name);
            assert_eq!(subst.substitute(&text), "shown", "tag {}", name);
        }
        assert_eq!(subst.substitute("{@scaledamage 2d6|3-9|1d6}"), "1d6");
        assert_eq!(subst.substitute("{@variantrule Flanking|DMG}"), "Flanking");
        assert!(observer.is_empty());
    }

    #[test]
    fn test_hit_tag() {
        assert_eq!(substitute("{@hit 3}"), "+3");
        assert_eq!(substitute("{@hit 0}"), "+0");
        assert_eq!(substitute("{@hit -1}"), "-1");
    }

    #[test]
    fn test_hit_tag_malformed_payload() {
        let (subst, observer) = substitutor();
        assert_eq!(subst.substitute("{@hit lots} to hit"), "lots to hit");
        let diagnostics = observer.diagnostics();
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            &diagnostics[0],
            RenderDiagnostic::MalformedPayload { tag, payload, .. } if tag == "hit" && payload == "lots"
        ));
    }

    #[test]
    fn test_link_tag() {
        assert_eq!(
            substitute("{@link the SRD|https://example.com/srd}"),
            "[the SRD](https://example.com/srd)"
        );
        assert_eq!(substitute("{@link bare}"), "bare");
    }

    #[test]
    fn test_recharge_tag() {
        assert_eq!(substitute("{@recharge}"), "(Recharge 6)");
        assert_eq!(substitute("{@recharge 5}"), "(Recharge 5-6)");
        assert_eq!(substitute("Fire Breath {@recharge 4}"), "Fire Breath (Recharge 4-6)");
    }

    #[test]
    fn test_chance_tag() {
        assert_eq!(substitute("{@chance 50|half the time}"), "half the time");
        assert_eq!(substitute("{@chance 25}"), "25");
    }

    #[test]
    fn test_atk_tag() {
        assert_eq!(substitute("{@atk mw,rw}"), "Melee or Ranged Weapon Attack:");
        assert_eq!(substitute("{@atk mw}"), "Melee Weapon Attack:");
        assert_eq!(substitute("{@atk rs}"), "Ranged Spell Attack:");
        assert_eq!(substitute("{@atk zz}"), "Unknown Attack:");
    }

    #[test]
    fn test_hit_marker_and_dc() {
        assert_eq!(substitute("{@h}5 (1d6 + 2)"), "Hit: 5 (1d6 + 2)");
        assert_eq!(substitute("a {@dc 13} save"), "a DC 13 save");
    }

    #[test]
    fn test_unknown_tag_passes_payload_through() {
        let (subst, observer) = substitutor();
        assert_eq!(subst.substitute("{@frobnicate xyz}"), "xyz");
        assert_eq!(
            observer.diagnostics(),
            vec![RenderDiagnostic::UnknownTag {
                name: "frobnicate".to_string(),
                payload: "xyz".to_string(),
            }]
        );
    }

    #[test]
    fn test_tag_names_are_case_sensitive() {
        let (subst, observer) = substitutor();
        assert_eq!(subst.substitute("{@Bold loud}"), "loud");
        assert_eq!(observer.len(), 1);
    }

    #[test]
    fn test_nested_tags_resolve_inside_out() {
        let (subst, _) = substitutor();
        assert_eq!(subst.substitute_pass("{@bold {@hit 3} damage}"), "{@bold +3 damage}");
        assert_eq!(subst.substitute("{@bold {@hit 3} damage}"), "**+3 damage**");
    }

    #[test]
    fn test_multiple_tags_in_one_pass() {
        assert_eq!(
            substitute("{@atk mw} {@hit 4} to hit, {@h}5 ({@damage 1d6 + 2}) piercing damage."),
            "Melee Weapon Attack: +4 to hit, Hit: 5 (1d6 + 2) piercing damage."
        );
    }

    fn echo_self(payload: &str) -> MarkupResult<String> {
        Ok(format!("{{@loop {}}}", payload))
    }

    #[test]
    fn test_self_referential_tag_terminates() {
        let observer = Arc::new(CollectingObserver::new());
        let subst = TagSubstitutor::new(observer.clone())
            .with_table(TagTable::standard().with("loop", echo_self));

        let result = subst.substitute("{@loop forever}");
        assert_eq!(result, "{@loop forever}");
        assert!(observer.has_errors());
        assert!(matches!(
            observer.diagnostics().last(),
            Some(RenderDiagnostic::SubstitutionLimit { passes: DEFAULT_MAX_PASSES, .. })
        ));
    }

    #[test]
    fn test_max_passes_is_configurable() {
        let observer = Arc::new(CollectingObserver::new());
        let subst = TagSubstitutor::new(observer.clone()).with_max_passes(1);

        // Two nesting levels need two passes.
        assert_eq!(subst.substitute("{@bold {@i x}}"), "{@bold *x*}");
        assert!(observer.has_errors());
    }

    #[test]
    fn test_tag_table() {
        let table = TagTable::standard();
        assert!(table.contains("bold"));
        assert!(table.contains("creature"));
        assert!(!table.contains("frobnicate"));
        assert!(TagTable::empty().is_empty());

        let extended = TagTable::empty().with("shout", bold);
        assert_eq!(extended.len(), 1);
        assert!(extended.get("shout").is_some());
    }

    #[test]
    fn test_contains_tags() {
        assert!(contains_tags("a {@b x} b"));
        assert!(contains_tags("{@recharge}"));
        assert!(!contains_tags("a {b x} b"));
        assert!(!contains_tags("{@}"));
    }
}
