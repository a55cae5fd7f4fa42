//! Bundles: named sets of provenance records.

use crate::model::qname::QName;
use crate::model::record::{Record, RecordKind};

/// A bundle: an identifier and its records. Both content bundles
/// (`bundle<N>`) and the document-unique meta-bundle (`meta`) are
/// represented by this type; callers distinguish them by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub id: QName,
    pub records: Vec<Record>,
}

impl Bundle {
    pub fn new(id: QName) -> Self {
        Self { id, records: Vec::new() }
    }

    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn get_record(&self, id: &QName) -> Option<&Record> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn get_records(&self, kind: RecordKind) -> impl Iterator<Item = &Record> {
        self.records.iter().filter(move |r| r.kind == kind)
    }

    /// True if the bundle has an `Entity` record with this identifier.
    pub fn contains_entity(&self, entity: &QName) -> bool {
        self.records
            .iter()
            .any(|r| r.kind == RecordKind::Entity && &r.id == entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::record::AttrValue;

    #[test]
    fn finds_records_by_kind() {
        let mut b = Bundle::new(QName::new("bundle1"));
        b.push(Record::entity(QName::new("entity1"), vec![]));
        b.push(Record::derivation(
            QName::new("der1-2"),
            QName::new("entity1"),
            QName::new("entity2"),
            None,
        ));
        assert_eq!(b.get_records(RecordKind::Entity).count(), 1);
        assert_eq!(b.get_records(RecordKind::Derivation).count(), 1);
        assert!(b.contains_entity(&QName::new("entity1")));
    }

    #[test]
    fn attrs_round_trip() {
        let e = Record::entity(
            QName::new("entity1"),
            vec![(QName::new("label"), AttrValue::from("hello"))],
        );
        assert_eq!(e.get_attribute("label").unwrap().as_str(), Some("hello"));
    }
}
