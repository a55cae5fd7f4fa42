//! Documents: an ordered set of bundles plus namespaces.
//!
//! Document (de)serialization to XML/JSON/PROV-N is an external concern;
//! this crate consumes documents purely through this in-memory shape and
//! through the `DocumentLoader` trait (see `view`) for cross-document
//! `has_provenance` references.

use std::collections::BTreeMap;

use crate::model::bundle::Bundle;
use crate::model::qname::QName;

pub const META_BUNDLE_ID: &str = "meta";

/// A loaded provenance document: bundles plus namespace prefixes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub bundles: Vec<Bundle>,
    pub namespaces: BTreeMap<String, String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bundle(&self, id: &str) -> Option<&Bundle> {
        self.bundles.iter().find(|b| b.id.local == id)
    }

    pub fn bundle_mut(&mut self, id: &str) -> Option<&mut Bundle> {
        self.bundles.iter_mut().find(|b| b.id.local == id)
    }

    pub fn meta(&self) -> Option<&Bundle> {
        self.bundle(META_BUNDLE_ID)
    }

    pub fn meta_mut(&mut self) -> Option<&mut Bundle> {
        self.bundle_mut(META_BUNDLE_ID)
    }

    pub fn ensure_meta(&mut self) -> &mut Bundle {
        if self.bundle(META_BUNDLE_ID).is_none() {
            self.bundles.push(Bundle::new(QName::new(META_BUNDLE_ID)));
        }
        self.bundle_mut(META_BUNDLE_ID).expect("just inserted")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_meta_is_idempotent() {
        let mut doc = Document::new();
        doc.ensure_meta();
        doc.ensure_meta();
        assert_eq!(doc.bundles.len(), 1);
        assert_eq!(doc.meta().unwrap().id.local, "meta");
    }
}
