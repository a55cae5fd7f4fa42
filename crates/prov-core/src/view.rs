//! Document View.
//!
//! Loads a document, indexes its bundles, computes the per-document
//! revision graph from the meta-bundle's `wasRevisionOf` records (dropping
//! any edge the newer bundle does not itself mirror), checks the graph is
//! acyclic, and caches per-bundle validity.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use crate::diagnostics::{warnings, Diagnostics};
use crate::errors::{ProvError, ProvResult};
use crate::model::record::RecordKind;
use crate::model::{Bundle, Document};
use crate::token;

/// Supplies documents for cross-document `has_provenance` references.
/// Document (de)serialization itself is an external concern; implementors
/// plug in whatever XML/JSON/PROV-N reader backs the real document store.
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Option<Document>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// older/newer revision neighbors for every bundle id that appears in a
/// confirmed `wasRevisionOf` edge.
pub type RevisionMap = HashMap<String, (Vec<String>, Vec<String>)>;

/// A loaded, validated document plus its revision graph and validity cache.
#[derive(Clone)]
pub struct DocumentView {
    pub document: Document,
    pub path: PathBuf,
    pub updates: RevisionMap,
    validity_cache: RefCell<HashMap<String, bool>>,
}

impl DocumentView {
    /// Load and validate a document's revision graph. A cycle in the
    /// revision DAG is fatal per document (see `Non-goals`/§4.7).
    pub fn load(document: Document, path: PathBuf) -> ProvResult<(Self, Diagnostics)> {
        let mut diagnostics = Diagnostics::default();
        let updates = Self::compute_updates(&document, &mut diagnostics);
        check_acyclic(&updates)?;
        Ok((
            Self { document, path, updates, validity_cache: RefCell::new(HashMap::new()) },
            diagnostics,
        ))
    }

    fn compute_updates(document: &Document, diagnostics: &mut Diagnostics) -> RevisionMap {
        let mut map: RevisionMap = HashMap::new();
        let Some(meta) = document.meta() else { return map };

        for record in meta.get_records(RecordKind::Revision) {
            let (Some(new), Some(old)) = (record.generated_entity(), record.used_entity()) else { continue };

            let confirmed = document
                .bundle(&new.local)
                .map(|b| {
                    b.get_records(RecordKind::Revision)
                        .any(|r| r.generated_entity() == Some(new) && r.used_entity() == Some(old))
                })
                .unwrap_or(false);

            if !confirmed {
                diagnostics.push(warnings::revision_not_confirmed(&old.local, &new.local));
                continue;
            }

            map.entry(old.local.clone()).or_default().1.push(new.local.clone());
            map.entry(new.local.clone()).or_default().0.push(old.local.clone());
        }
        map
    }

    pub fn older_ids(&self, bundle_id: &str) -> &[String] {
        self.updates.get(bundle_id).map(|(o, _)| o.as_slice()).unwrap_or(&[])
    }

    pub fn newer_ids(&self, bundle_id: &str) -> &[String] {
        self.updates.get(bundle_id).map(|(_, n)| n.as_slice()).unwrap_or(&[])
    }

    pub fn bundle(&self, id: &str) -> Option<&Bundle> {
        self.document.bundle(id)
    }

    pub fn meta(&self) -> Option<&Bundle> {
        self.document.meta()
    }

    /// Memoized `valid_bundle` check for this document.
    pub fn validity(&self, bundle_id: &str, prefix: &str, now: OffsetDateTime) -> bool {
        if let Some(v) = self.validity_cache.borrow().get(bundle_id) {
            return *v;
        }
        let valid = match (self.meta(), self.bundle(bundle_id)) {
            (Some(meta), Some(bundle)) => token::valid_bundle(meta, bundle, prefix, now),
            _ => false,
        };
        self.validity_cache.borrow_mut().insert(bundle_id.to_string(), valid);
        valid
    }
}

fn check_acyclic(updates: &RevisionMap) -> ProvResult<()> {
    let mut nodes: std::collections::HashSet<String> = std::collections::HashSet::new();
    for (k, (older, newer)) in updates {
        nodes.insert(k.clone());
        nodes.extend(older.iter().cloned());
        nodes.extend(newer.iter().cloned());
    }

    let mut colors: HashMap<String, Color> = nodes.iter().map(|n| (n.clone(), Color::White)).collect();

    fn visit(node: &str, updates: &RevisionMap, colors: &mut HashMap<String, Color>) -> ProvResult<()> {
        match colors.get(node) {
            Some(Color::Black) => return Ok(()),
            Some(Color::Gray) => {
                return Err(ProvError::document_cycle(format!("cycle in revision graph at {node}")))
            }
            _ => {}
        }
        colors.insert(node.to_string(), Color::Gray);
        if let Some((_, newer)) = updates.get(node) {
            for n in newer {
                visit(n, updates, colors)?;
            }
        }
        colors.insert(node.to_string(), Color::Black);
        Ok(())
    }

    for node in &nodes {
        visit(node, updates, &mut colors)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QName, Record};

    fn doc_with_chain() -> Document {
        let mut doc = Document::new();
        doc.bundles.push(Bundle::new(QName::new("bundle1")));
        doc.bundles.push(Bundle::new(QName::new("bundle2")));
        let edge = Record::revision(QName::new("up#bundle1-2"), QName::new("bundle2"), QName::new("bundle1"));
        doc.bundles[1].push(edge.clone());
        doc.ensure_meta().push(edge);
        doc
    }

    #[test]
    fn confirmed_revision_is_indexed_both_ways() {
        let (view, diag) = DocumentView::load(doc_with_chain(), PathBuf::from("/doc.xml")).unwrap();
        assert_eq!(view.newer_ids("bundle1"), ["bundle2"]);
        assert_eq!(view.older_ids("bundle2"), ["bundle1"]);
        assert!(!diag.has_warnings());
    }

    #[test]
    fn unconfirmed_revision_is_dropped_with_warning() {
        let mut doc = Document::new();
        doc.bundles.push(Bundle::new(QName::new("bundle1")));
        doc.bundles.push(Bundle::new(QName::new("bundle2")));
        doc.ensure_meta().push(Record::revision(
            QName::new("up#bundle1-2"),
            QName::new("bundle2"),
            QName::new("bundle1"),
        ));
        let (view, diag) = DocumentView::load(doc, PathBuf::from("/doc.xml")).unwrap();
        assert!(view.newer_ids("bundle1").is_empty());
        assert!(diag.has_warnings());
    }

    #[test]
    fn cycle_is_fatal() {
        let mut doc = Document::new();
        doc.bundles.push(Bundle::new(QName::new("bundle1")));
        doc.bundles.push(Bundle::new(QName::new("bundle2")));
        let forward = Record::revision(QName::new("up#bundle1-2"), QName::new("bundle2"), QName::new("bundle1"));
        let backward = Record::revision(QName::new("up#bundle2-1"), QName::new("bundle1"), QName::new("bundle2"));
        doc.bundles[1].push(forward.clone());
        doc.bundles[0].push(backward.clone());
        let meta = doc.ensure_meta();
        meta.push(forward);
        meta.push(backward);

        assert!(DocumentView::load(doc, PathBuf::from("/doc.xml")).is_err());
    }
}
