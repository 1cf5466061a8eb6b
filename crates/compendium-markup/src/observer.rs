/*
 * observer.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Observer for rendering diagnostics.
 */

//! Observer abstraction for rendering diagnostics.
//!
//! The renderer and the substitutor never fail. Everything that goes wrong
//! while turning a node tree into text (an unknown node type, an unknown
//! tag, a payload that should have been a number) is reported as a
//! [`RenderDiagnostic`] to a [`RenderObserver`] injected at construction.
//!
//! - [`TracingObserver`] forwards diagnostics to `tracing` (CLI default)
//! - [`CollectingObserver`] keeps them for inspection (tests, summaries)
//! - [`NoopObserver`] drops them

use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// Severity of a rendering diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    /// Recoverable: output is still complete for everything else
    Warn,
    /// Output was cut short (e.g. substitution did not converge)
    Error,
}

impl EventLevel {
    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Warn => "warn",
            EventLevel::Error => "error",
        }
    }
}

/// A single problem found while rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDiagnostic {
    /// An object node whose type is not in the renderer's table.
    UnknownNodeType { kind: String },

    /// A known node type missing a field it needs.
    MissingField { kind: String, field: String },

    /// A tag name that is not in the substitutor's table.
    UnknownTag { name: String, payload: String },

    /// A tag or node payload that could not be interpreted.
    MalformedPayload {
        tag: String,
        payload: String,
        reason: String,
    },

    /// Substitution was still finding tags after the pass limit.
    SubstitutionLimit { passes: usize, text: String },
}

impl RenderDiagnostic {
    /// Severity of this diagnostic.
    pub fn level(&self) -> EventLevel {
        match self {
            RenderDiagnostic::SubstitutionLimit { .. } => EventLevel::Error,
            _ => EventLevel::Warn,
        }
    }

    /// Short machine-friendly name of the diagnostic kind.
    pub fn code(&self) -> &'static str {
        match self {
            RenderDiagnostic::UnknownNodeType { .. } => "unknown-node-type",
            RenderDiagnostic::MissingField { .. } => "missing-field",
            RenderDiagnostic::UnknownTag { .. } => "unknown-tag",
            RenderDiagnostic::MalformedPayload { .. } => "malformed-payload",
            RenderDiagnostic::SubstitutionLimit { .. } => "substitution-limit",
        }
    }
}

impl fmt::Display for RenderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderDiagnostic::UnknownNodeType { kind } => {
                write!(f, "Unhandled entry type: {}", kind)
            }
            RenderDiagnostic::MissingField { kind, field } => {
                write!(f, "Entry of type '{}' is missing '{}'", kind, field)
            }
            RenderDiagnostic::UnknownTag { name, .. } => write!(f, "Unknown tag: {}", name),
            RenderDiagnostic::MalformedPayload {
                tag,
                payload,
                reason,
            } => write!(f, "Malformed payload for '{}' ({}): {}", tag, payload, reason),
            RenderDiagnostic::SubstitutionLimit { passes, .. } => {
                write!(f, "Tag substitution did not settle after {} passes", passes)
            }
        }
    }
}

/// Receiver for rendering diagnostics.
///
/// Implementations must be `Send + Sync`: one observer is shared by every
/// record when a batch is rendered in parallel.
pub trait RenderObserver: Send + Sync {
    /// Called once per diagnostic, in the order they are found.
    fn on_diagnostic(&self, _diagnostic: &RenderDiagnostic) {}
}

/// No-op observer implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl NoopObserver {
    /// Create a new no-op observer.
    pub fn new() -> Self {
        Self
    }
}

impl RenderObserver for NoopObserver {}

/// Observer that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new tracing observer.
    pub fn new() -> Self {
        Self
    }
}

impl RenderObserver for TracingObserver {
    fn on_diagnostic(&self, diagnostic: &RenderDiagnostic) {
        match diagnostic {
            RenderDiagnostic::UnknownNodeType { kind } => {
                tracing::warn!(code = diagnostic.code(), kind = %kind, "{}", diagnostic);
            }
            RenderDiagnostic::MissingField { kind, field } => {
                tracing::warn!(code = diagnostic.code(), kind = %kind, field = %field, "{}", diagnostic);
            }
            RenderDiagnostic::UnknownTag { name, payload } => {
                tracing::warn!(code = diagnostic.code(), tag = %name, payload = %payload, "{}", diagnostic);
            }
            RenderDiagnostic::MalformedPayload { tag, payload, .. } => {
                tracing::warn!(code = diagnostic.code(), tag = %tag, payload = %payload, "{}", diagnostic);
            }
            RenderDiagnostic::SubstitutionLimit { text, .. } => {
                tracing::error!(code = diagnostic.code(), text = %text, "{}", diagnostic);
            }
        }
    }
}

/// Observer that stores every diagnostic it receives.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    diagnostics: Mutex<Vec<RenderDiagnostic>>,
}

impl CollectingObserver {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RenderDiagnostic>> {
        // A panic while holding the lock leaves a valid Vec behind.
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the collected diagnostics.
    pub fn diagnostics(&self) -> Vec<RenderDiagnostic> {
        self.lock().clone()
    }

    /// Number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if the collector is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Check if any error-level diagnostic was collected.
    pub fn has_errors(&self) -> bool {
        self.lock().iter().any(|d| d.level() == EventLevel::Error)
    }

    /// Remove and return everything collected so far.
    pub fn take(&self) -> Vec<RenderDiagnostic> {
        std::mem::take(&mut *self.lock())
    }
}

impl RenderObserver for CollectingObserver {
    fn on_diagnostic(&self, diagnostic: &RenderDiagnostic) {
        self.lock().push(diagnostic.clone());
    }
}

/// Observer that forwards every diagnostic to two observers.
///
/// The CLI uses this to log through `tracing` and count at the same time.
pub struct TeeObserver<A, B> {
    first: A,
    second: B,
}

impl<A: RenderObserver, B: RenderObserver> TeeObserver<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<A: RenderObserver, B: RenderObserver> RenderObserver for TeeObserver<A, B> {
    fn on_diagnostic(&self, diagnostic: &RenderDiagnostic) {
        self.first.on_diagnostic(diagnostic);
        self.second.on_diagnostic(diagnostic);
    }
}
