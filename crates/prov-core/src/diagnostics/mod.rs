//! Diagnostics for prov-core.
//!
//! Diagnostics are structured messages emitted during document load and
//! search. The engine this crate generalizes printed these conditions
//! (unconfirmed revisions, postponed branches, unreachable cross-document
//! references, cycles skipped during search) to stdout without changing the
//! return value. Here they are collected and returned alongside the three
//! result lists so callers can inspect them programmatically instead of
//! scraping logs.
//!
//! Principles:
//! - structured: codes + fields for tooling and filtering
//! - non-fatal: a diagnostic never changes the valid/low/invalid
//!   classification, it only explains it
//! - ordered: diagnostics are appended in discovery order, not sorted

use std::collections::BTreeMap;

pub mod warnings;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagLevel {
    Info,
    Warning,
}

impl DiagLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagLevel::Info => "info",
            DiagLevel::Warning => "warning",
        }
    }
}

/// A structured diagnostic message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: DiagLevel,
    pub code: String,
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl Diagnostic {
    pub fn new(level: DiagLevel, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            code: code.into(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.level, DiagLevel::Warning)
    }
}

/// An ordered diagnostics collection.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn push(&mut self, d: Diagnostic) {
        self.items.push(d);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn has_warnings(&self) -> bool {
        self.items.iter().any(|d| d.is_warning())
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_basic() {
        let mut d = Diagnostics::default();
        d.push(Diagnostic::new(DiagLevel::Info, "x", "hello"));
        d.push(Diagnostic::new(DiagLevel::Warning, "y", "warn"));
        assert!(d.has_warnings());
        assert_eq!(d.count(), 2);
    }
}
