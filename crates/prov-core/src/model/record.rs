//! Provenance records and attribute values.
//!
//! A record is either an entity or a relation (derivation, revision,
//! specialization). All of them carry an identifier and an attribute list;
//! relations additionally expose the two endpoints they connect through
//! well-known `prov:` attributes, mirroring how the adapted model exposes
//! `generatedEntity` / `usedEntity` and `wasRevisionOf` endpoints as plain
//! attributes rather than as a distinct relation type.

use num_bigint::BigUint;

use crate::model::qname::QName;

/// The kind of a record, used for `Bundle::get_records`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Entity,
    Derivation,
    Revision,
    Specialization,
}

/// An attribute value. Token attributes need big, unbounded integers (hash,
/// signature, public key); everything else is a string, qualified name, or
/// small integer.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    QName(QName),
    Int(i64),
    BigUint(BigUint),
}

impl AttrValue {
    /// The value's `localpart` if it is a qualified name, else its string form.
    pub fn localpart_or_string(&self) -> String {
        match self {
            AttrValue::Str(s) => s.clone(),
            AttrValue::QName(q) => q.local.clone(),
            AttrValue::Int(i) => i.to_string(),
            AttrValue::BigUint(b) => b.to_string(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_qname(&self) -> Option<&QName> {
        match self {
            AttrValue::QName(q) => Some(q),
            _ => None,
        }
    }

    pub fn as_biguint(&self) -> Option<&BigUint> {
        match self {
            AttrValue::BigUint(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<QName> for AttrValue {
    fn from(q: QName) -> Self {
        AttrValue::QName(q)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<BigUint> for AttrValue {
    fn from(b: BigUint) -> Self {
        AttrValue::BigUint(b)
    }
}

/// A single provenance record: an entity or a relation.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: QName,
    pub kind: RecordKind,
    pub attrs: Vec<(QName, AttrValue)>,
}

impl Record {
    pub fn entity(id: QName, attrs: Vec<(QName, AttrValue)>) -> Self {
        Self { id, kind: RecordKind::Entity, attrs }
    }

    pub fn derivation(id: QName, generated: QName, used: QName, prov_type: Option<&str>) -> Self {
        let mut attrs = vec![
            (QName::prefixed("prov", "generatedEntity"), AttrValue::QName(generated)),
            (QName::prefixed("prov", "usedEntity"), AttrValue::QName(used)),
        ];
        if let Some(t) = prov_type {
            attrs.push((QName::prefixed("prov", "type"), AttrValue::Str(t.to_string())));
        }
        Self { id, kind: RecordKind::Derivation, attrs }
    }

    pub fn revision(id: QName, new: QName, old: QName) -> Self {
        let attrs = vec![
            (QName::prefixed("prov", "generatedEntity"), AttrValue::QName(new)),
            (QName::prefixed("prov", "usedEntity"), AttrValue::QName(old)),
        ];
        Self { id, kind: RecordKind::Revision, attrs }
    }

    pub fn specialization(id: QName, specific: QName, general: QName) -> Self {
        let attrs = vec![
            (QName::prefixed("prov", "specificEntity"), AttrValue::QName(specific)),
            (QName::prefixed("prov", "generalEntity"), AttrValue::QName(general)),
        ];
        Self { id, kind: RecordKind::Specialization, attrs }
    }

    pub fn get_attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(k, _)| k.local == name).map(|(_, v)| v)
    }

    pub fn attribute_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AttrValue> {
        self.attrs.iter().filter(move |(k, _)| k.local == name).map(|(_, v)| v)
    }

    pub fn generated_entity(&self) -> Option<&QName> {
        self.get_attribute("generatedEntity").and_then(AttrValue::as_qname)
    }

    pub fn used_entity(&self) -> Option<&QName> {
        self.get_attribute("usedEntity").and_then(AttrValue::as_qname)
    }

    pub fn has_type(&self, t: &str) -> bool {
        self.get_attribute("type").and_then(AttrValue::as_str) == Some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_exposes_endpoints() {
        let r = Record::derivation(
            QName::new("der1-2"),
            QName::new("entity1"),
            QName::new("entity2"),
            Some("Token"),
        );
        assert_eq!(r.generated_entity().unwrap().local, "entity1");
        assert_eq!(r.used_entity().unwrap().local, "entity2");
        assert!(r.has_type("Token"));
    }
}
