//! JSON (de)serialization for provenance documents.
//!
//! `prov-core` treats document (de)serialization as an external concern — it
//! only ever touches a document through `prov_core::model` and the
//! `DocumentLoader` trait. This module is that external piece for the CLI:
//! a small JSON shape good enough to round-trip a document between `prov
//! generate` and `prov search` without pulling an XML/PROV-N writer into the
//! binary.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use prov_core::model::{AttrValue, Bundle, Document, QName, Record, RecordKind};
use prov_core::view::DocumentLoader;

#[derive(Debug, Serialize, Deserialize)]
struct DocDto {
    #[serde(default)]
    namespaces: BTreeMap<String, String>,
    bundles: Vec<BundleDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BundleDto {
    id: String,
    records: Vec<RecordDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordDto {
    id: String,
    kind: String,
    #[serde(default)]
    attrs: Vec<(String, AttrDto)>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
enum AttrDto {
    Str(String),
    Qname(String),
    Int(i64),
    Biguint(String),
}

fn kind_to_str(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Entity => "entity",
        RecordKind::Derivation => "derivation",
        RecordKind::Revision => "revision",
        RecordKind::Specialization => "specialization",
    }
}

fn kind_from_str(s: &str) -> Result<RecordKind> {
    match s {
        "entity" => Ok(RecordKind::Entity),
        "derivation" => Ok(RecordKind::Derivation),
        "revision" => Ok(RecordKind::Revision),
        "specialization" => Ok(RecordKind::Specialization),
        other => Err(anyhow!("unknown record kind: {other}")),
    }
}

fn attr_to_dto(value: &AttrValue) -> AttrDto {
    match value {
        AttrValue::Str(s) => AttrDto::Str(s.clone()),
        AttrValue::QName(q) => AttrDto::Qname(q.to_string()),
        AttrValue::Int(i) => AttrDto::Int(*i),
        AttrValue::BigUint(b) => AttrDto::Biguint(b.to_string()),
    }
}

fn attr_from_dto(dto: AttrDto) -> Result<AttrValue> {
    Ok(match dto {
        AttrDto::Str(s) => AttrValue::Str(s),
        AttrDto::Qname(s) => AttrValue::QName(QName::parse(&s)),
        AttrDto::Int(i) => AttrValue::Int(i),
        AttrDto::Biguint(s) => {
            AttrValue::BigUint(s.parse::<BigUint>().map_err(|e| anyhow!("bad biguint attribute: {e}"))?)
        }
    })
}

fn document_to_dto(doc: &Document) -> DocDto {
    DocDto {
        namespaces: doc.namespaces.clone(),
        bundles: doc
            .bundles
            .iter()
            .map(|b| BundleDto {
                id: b.id.to_string(),
                records: b
                    .records
                    .iter()
                    .map(|r| RecordDto {
                        id: r.id.to_string(),
                        kind: kind_to_str(r.kind).to_string(),
                        attrs: r.attrs.iter().map(|(k, v)| (k.to_string(), attr_to_dto(v))).collect(),
                    })
                    .collect(),
            })
            .collect(),
    }
}

fn document_from_dto(dto: DocDto) -> Result<Document> {
    let mut doc = Document::new();
    doc.namespaces = dto.namespaces;
    for bundle_dto in dto.bundles {
        let mut bundle = Bundle::new(QName::parse(&bundle_dto.id));
        for record_dto in bundle_dto.records {
            let kind = kind_from_str(&record_dto.kind)?;
            let mut attrs = Vec::with_capacity(record_dto.attrs.len());
            for (name, value) in record_dto.attrs {
                attrs.push((QName::parse(&name), attr_from_dto(value)?));
            }
            bundle.push(Record { id: QName::parse(&record_dto.id), kind, attrs });
        }
        doc.bundles.push(bundle);
    }
    Ok(doc)
}

pub fn load(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let dto: DocDto = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    document_from_dto(dto)
}

pub fn save(path: &Path, doc: &Document) -> Result<()> {
    let dto = document_to_dto(doc);
    let raw = serde_json::to_string_pretty(&dto)?;
    fs::write(path, raw).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Loads documents from the filesystem for cross-document `has_provenance`
/// traversal during search.
pub struct FsDocumentLoader;

impl DocumentLoader for FsDocumentLoader {
    fn load(&self, path: &Path) -> Option<Document> {
        load(path).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_document_through_a_real_file() {
        let mut doc = Document::new();
        doc.namespaces.insert("ex".to_string(), "https://example.org/ns#".to_string());
        let mut bundle = Bundle::new(QName::new("bundle1"));
        bundle.push(Record {
            id: QName::new("e1"),
            kind: RecordKind::Entity,
            attrs: vec![
                (QName::prefixed("prov", "type"), AttrValue::Str("token".to_string())),
                (QName::prefixed("ex", "count"), AttrValue::Int(3)),
            ],
        });
        doc.bundles.push(bundle);

        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("doc.json");
        save(&path, &doc).expect("save document");

        let reloaded = load(&path).expect("reload document");
        assert_eq!(reloaded.namespaces, doc.namespaces);
        assert_eq!(reloaded.bundles.len(), doc.bundles.len());
        assert_eq!(reloaded.bundles[0].id, doc.bundles[0].id);
        assert_eq!(reloaded.bundles[0].records.len(), doc.bundles[0].records.len());

        let loader = FsDocumentLoader;
        let via_loader = loader.load(&path).expect("FsDocumentLoader loads saved file");
        assert_eq!(via_loader.bundles[0].records[0].id, QName::new("e1"));
    }
}
