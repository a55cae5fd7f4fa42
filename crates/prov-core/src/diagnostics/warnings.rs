//! Warning catalog for prov-core diagnostics.
//!
//! These are the conditions the document view and search engine can run
//! into that are worth surfacing but never change a result: an unconfirmed
//! revision edge, a branch that stayed unclassified until flush, a
//! cross-document reference that could not be loaded, a cycle skipped
//! during traversal, an untrustworthy origin, or a bundle with newer
//! versions the search never visited.

use std::collections::BTreeMap;

use crate::diagnostics::{DiagLevel, Diagnostic};

/// A typed warning code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningCode(pub &'static str);

impl WarningCode {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// Standard warning codes. Keep this list stable to avoid breaking downstream tooling.
pub mod codes {
    use super::WarningCode;

    pub const REVISION_NOT_CONFIRMED: WarningCode = WarningCode("warn.revision_not_confirmed");
    pub const POSTPONED_LOW_CREDIBILITY: WarningCode =
        WarningCode("warn.postponed_low_credibility");
    pub const CROSS_DOC_REFERENCE_UNREACHABLE: WarningCode =
        WarningCode("warn.cross_doc_reference_unreachable");
    pub const DOCUMENT_CYCLE_SKIPPED: WarningCode = WarningCode("warn.document_cycle_skipped");
    pub const ORIGIN_NOT_TRUSTWORTHY: WarningCode = WarningCode("warn.origin_not_trustworthy");
    pub const NEWER_VERSIONS_UNVISITED: WarningCode = WarningCode("warn.newer_versions_unvisited");
}

/// Build a warning diagnostic with a code and message.
pub fn warning(code: WarningCode, message: impl Into<String>) -> Diagnostic {
    Diagnostic {
        level: DiagLevel::Warning,
        code: code.as_str().to_string(),
        message: message.into(),
        fields: BTreeMap::new(),
    }
}

/// Warning: a `wasRevisionOf` edge in the meta-bundle had no matching record
/// inside the newer bundle. The edge is dropped from the revision graph.
pub fn revision_not_confirmed(older_id: &str, newer_id: &str) -> Diagnostic {
    warning(
        codes::REVISION_NOT_CONFIRMED,
        "revision edge not confirmed by newer bundle; edge dropped",
    )
    .with_field("olderBundle", older_id)
    .with_field("newerBundle", newer_id)
}

/// Warning: a postponed branch was never classified valid or invalid and was
/// flushed into the low-credibility output at the end of the search.
pub fn postponed_low_credibility(doc_path: &str, bundle_id: &str, entity: &str) -> Diagnostic {
    warning(
        codes::POSTPONED_LOW_CREDIBILITY,
        "branch stayed unclassified; reported as low credibility",
    )
    .with_field("docPath", doc_path)
    .with_field("bundle", bundle_id)
    .with_field("entity", entity)
}

/// Warning: a `has_provenance` reference pointed at a document or bundle that
/// could not be loaded.
pub fn cross_doc_reference_unreachable(doc_path: &str, bundle_id: &str) -> Diagnostic {
    warning(
        codes::CROSS_DOC_REFERENCE_UNREACHABLE,
        "cross-document reference could not be resolved",
    )
    .with_field("docPath", doc_path)
    .with_field("bundle", bundle_id)
}

/// Warning: loading a cross-referenced document found a cycle in its
/// revision graph; the reference was skipped rather than failing the search.
pub fn document_cycle_skipped(doc_path: &str) -> Diagnostic {
    warning(
        codes::DOCUMENT_CYCLE_SKIPPED,
        "document has a cycle in its revision graph; skipped during search",
    )
    .with_field("docPath", doc_path)
}

/// Warning: a valid entity's chain passes through an origin that was itself
/// found untrustworthy once older bundles were re-checked.
pub fn origin_not_trustworthy(doc_path: &str, bundle_id: &str, entity: &str) -> Diagnostic {
    warning(
        codes::ORIGIN_NOT_TRUSTWORTHY,
        "origin of this chain is not trustworthy",
    )
    .with_field("docPath", doc_path)
    .with_field("bundle", bundle_id)
    .with_field("entity", entity)
}

/// Warning: a bundle has newer versions that were never visited by the
/// search and so may or may not still carry the target entity.
pub fn newer_versions_unvisited(doc_path: &str, bundle_id: &str) -> Diagnostic {
    warning(
        codes::NEWER_VERSIONS_UNVISITED,
        "bundle has newer versions not reflected in search output",
    )
    .with_field("docPath", doc_path)
    .with_field("bundle", bundle_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warning_has_level_and_code() {
        let d = revision_not_confirmed("bundle1", "bundle2");
        assert_eq!(d.level, DiagLevel::Warning);
        assert_eq!(d.code, "warn.revision_not_confirmed");
        assert!(d.fields.contains_key("olderBundle"));
    }
}
