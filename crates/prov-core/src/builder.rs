//! Document Builder.
//!
//! Turns a sequence of bundle specs and update specs into a populated
//! document: fresh content bundles with their base/specialization
//! bookkeeping, revision edges between old and new bundles, fork and merge
//! handling, deletions during update, and delegated token emission. Input
//! shape is enforced by the Rust type system (callers build `EntitySpec`/
//! `UpdateSpec` values directly rather than handing over untyped tuples);
//! what remains to validate here are the cross-references between ids that
//! only make sense once the whole update sequence is known.

use std::collections::{HashMap, HashSet};

use crate::crypto::{HashFunc, KeyPair};
use crate::diagnostics::Diagnostics;
use crate::errors::{ProvError, ProvResult};
use crate::model::document::META_BUNDLE_ID;
use crate::model::record::RecordKind;
use crate::model::{AttrValue, Bundle, Document, QName, Record};
use crate::token;

/// An entity to add to a bundle: its chosen id, the `has_provenance`
/// references it carries, and the ids of entities it was derived from.
#[derive(Debug, Clone, Default)]
pub struct EntitySpec {
    pub id: i64,
    pub has_provenance: Vec<String>,
    pub derivations: Vec<i64>,
}

impl EntitySpec {
    pub fn new(id: i64) -> Self {
        Self { id, has_provenance: Vec::new(), derivations: Vec::new() }
    }
}

/// A bundle spec: one fresh content bundle, populated with these entities.
#[derive(Debug, Clone, Default)]
pub struct BundleSpec {
    pub entities: Vec<EntitySpec>,
}

impl BundleSpec {
    pub fn new(entities: Vec<EntitySpec>) -> Self {
        Self { entities }
    }
}

/// What an update revises: either a plain predecessor id, or a merge of a
/// source bundle into an already-existing target bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSource {
    Id(i64),
    Merge { source: i64, into: i64 },
}

/// An update spec: revise a bundle, dropping `deletions` and adding
/// `new_entities`.
#[derive(Debug, Clone, Default)]
pub struct UpdateSpec {
    pub deletions: Vec<i64>,
    pub new_entities: Vec<EntitySpec>,
}

impl UpdateSpec {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One item of the update sequence: its source/target shape plus payload.
pub struct Update {
    pub source: UpdateSource,
    pub spec: UpdateSpec,
}

/// Parameters for `generate`.
pub struct GenerateParams<'a> {
    pub bundles: &'a [BundleSpec],
    pub updates: &'a [Update],
    pub invalidate_bundles: &'a [i64],
    pub start_id: i64,
    pub keypair: &'a KeyPair,
    pub hash_func: HashFunc,
    pub encoding: &'a str,
    pub prefix: &'a str,
    pub expire_in_days: i64,
}

fn bundle_name(id: i64) -> String {
    format!("bundle{id}")
}

fn base_name(id: i64) -> String {
    format!("base{id}")
}

/// Build the document described by `params`, returning diagnostics
/// collected along the way (none of the conditions this component surfaces
/// are fatal; fatal conditions are returned as `Err`).
pub fn generate(doc: &mut Document, params: GenerateParams<'_>) -> ProvResult<Diagnostics> {
    let diagnostics = Diagnostics::default();
    doc.ensure_meta();
    let meta_id = QName::new(META_BUNDLE_ID);

    let (merge_sources, fork_sources) = detect_merges_and_forks(params.updates);

    let mut next_id = params.start_id;
    let mut next_base = 1i64;
    let mut base_of: HashMap<i64, i64> = HashMap::new();

    // Step 1: bundle specs.
    for spec in params.bundles {
        let id = next_id;
        next_id += 1;
        create_content_bundle(doc, &meta_id, id, &spec.entities, &mut next_base, &mut base_of)?;
        if !merge_sources.contains(&id) {
            sign_and_record(doc, &meta_id, id, &params)?;
        }
    }

    // Step 2: update specs.
    for update in params.updates {
        match update.source {
            UpdateSource::Id(old_id) => {
                let new_id = next_id;
                next_id += 1;
                let old_name = bundle_name(old_id);
                if doc.bundle(&old_name).is_none() {
                    return Err(ProvError::missing_bundle(format!("update source bundle {old_name} not found")));
                }

                create_revision_bundle(doc, &meta_id, old_id, new_id, &update.spec, fork_sources.contains(&old_id), &mut next_base, &mut base_of)?;

                if !merge_sources.contains(&new_id) {
                    sign_and_record(doc, &meta_id, new_id, &params)?;
                }
            }
            UpdateSource::Merge { source, into } => {
                let source_name = bundle_name(source);
                let into_name = bundle_name(into);
                if doc.bundle(&source_name).is_none() {
                    return Err(ProvError::missing_bundle(format!("merge source bundle {source_name} not found")));
                }
                if doc.bundle(&into_name).is_none() {
                    return Err(ProvError::missing_bundle(format!("merge target bundle {into_name} not found")));
                }

                merge_into(doc, &meta_id, source, into, &update.spec, &mut next_base, &mut base_of)?;
                remove_token(doc, &meta_id, into);
                sign_and_record(doc, &meta_id, into, &params)?;
            }
        }
    }

    // Invalidation.
    for &id in params.invalidate_bundles {
        let name = bundle_name(id);
        let Some(bundle) = doc.bundle_mut(&name) else {
            return Err(ProvError::missing_bundle(format!("cannot invalidate unknown bundle {name}")));
        };
        bundle.push(Record::entity(QName::new("-1"), Vec::new()));
    }

    Ok(diagnostics)
}

fn detect_merges_and_forks(updates: &[Update]) -> (HashSet<i64>, HashSet<i64>) {
    let mut merge_sources = HashSet::new();
    let mut source_counts: HashMap<i64, u32> = HashMap::new();

    for update in updates {
        match update.source {
            UpdateSource::Id(s) => {
                *source_counts.entry(s).or_insert(0) += 1;
            }
            UpdateSource::Merge { source, .. } => {
                merge_sources.insert(source);
            }
        }
    }

    let fork_sources = source_counts.into_iter().filter(|(_, c)| *c > 1).map(|(s, _)| s).collect();
    (merge_sources, fork_sources)
}

fn create_content_bundle(
    doc: &mut Document,
    meta_id: &QName,
    id: i64,
    entities: &[EntitySpec],
    next_base: &mut i64,
    base_of: &mut HashMap<i64, i64>,
) -> ProvResult<()> {
    let mut bundle = Bundle::new(QName::new(bundle_name(id)));
    populate_entities(&mut bundle, entities)?;
    doc.bundles.push(bundle);

    let base_id = *next_base;
    *next_base += 1;
    base_of.insert(id, base_id);

    let meta = doc.meta_mut().expect("ensure_meta called by generate");
    meta.push(Record::specialization(
        QName::new(format!("spec{id}")),
        QName::new(bundle_name(id)),
        QName::new(base_name(base_id)),
    ));
    let _ = meta_id;
    Ok(())
}

fn populate_entities(bundle: &mut Bundle, entities: &[EntitySpec]) -> ProvResult<()> {
    for entity in entities {
        let mut attrs = Vec::new();
        for hp in &entity.has_provenance {
            attrs.push((QName::new("has_provenance"), AttrValue::Str(hp.clone())));
        }
        bundle.push(Record::entity(QName::new(entity.id.to_string()), attrs));
        for used in &entity.derivations {
            bundle.push(Record::derivation(
                QName::new(format!("der{}-{}", entity.id, used)),
                QName::new(entity.id.to_string()),
                QName::new(used.to_string()),
                None,
            ));
        }
    }
    Ok(())
}

fn create_revision_bundle(
    doc: &mut Document,
    meta_id: &QName,
    old_id: i64,
    new_id: i64,
    spec: &UpdateSpec,
    old_is_fork_source: bool,
    next_base: &mut i64,
    base_of: &mut HashMap<i64, i64>,
) -> ProvResult<()> {
    let old_name = bundle_name(old_id);
    let new_name = bundle_name(new_id);

    let source_snapshot = doc.bundle(&old_name).expect("checked by caller").clone();
    let mut new_bundle = Bundle::new(QName::new(new_name.clone()));
    copy_filtered(&mut new_bundle, &source_snapshot, &spec.deletions);
    populate_entities(&mut new_bundle, &spec.new_entities)?;
    doc.bundles.push(new_bundle);

    let base_id = if old_is_fork_source {
        let fresh = *next_base;
        *next_base += 1;
        let old_base = *base_of.get(&old_id).unwrap_or(&0);
        let meta = doc.meta_mut().expect("meta exists");
        meta.push(Record::derivation(
            QName::new(format!("baselink{old_id}-{new_id}")),
            QName::new(base_name(fresh)),
            QName::new(base_name(old_base)),
            None,
        ));
        fresh
    } else {
        *base_of.get(&old_id).unwrap_or(&1)
    };
    base_of.insert(new_id, base_id);

    let meta = doc.meta_mut().expect("meta exists");
    meta.push(Record::specialization(
        QName::new(format!("spec{new_id}")),
        QName::new(new_name.clone()),
        QName::new(base_name(base_id)),
    ));

    push_revision_edge(doc, meta_id, &old_name, &new_name);
    Ok(())
}

fn merge_into(
    doc: &mut Document,
    meta_id: &QName,
    source: i64,
    into: i64,
    spec: &UpdateSpec,
    next_base: &mut i64,
    base_of: &mut HashMap<i64, i64>,
) -> ProvResult<()> {
    let source_name = bundle_name(source);
    let into_name = bundle_name(into);

    let source_snapshot = doc.bundle(&source_name).expect("checked by caller").clone();
    let target = doc.bundle_mut(&into_name).expect("checked by caller");
    copy_filtered(target, &source_snapshot, &spec.deletions);
    populate_entities(target, &spec.new_entities)?;

    mint_merge_base(doc, into, &into_name, next_base, base_of);
    push_revision_edge(doc, meta_id, &source_name, &into_name);
    Ok(())
}

/// A merge target always gets a fresh base, linked back to its prior base
/// via `wasDerivedFrom`, since its lineage now also carries the merge
/// source's history.
fn mint_merge_base(doc: &mut Document, into: i64, into_name: &str, next_base: &mut i64, base_of: &mut HashMap<i64, i64>) {
    let fresh = *next_base;
    *next_base += 1;
    let old_base = *base_of.get(&into).unwrap_or(&1);

    let meta = doc.meta_mut().expect("meta exists");
    meta.push(Record::derivation(
        QName::new(format!("baselink{into}-merge{fresh}")),
        QName::new(base_name(fresh)),
        QName::new(base_name(old_base)),
        None,
    ));

    if let Some(record) = meta.records.iter_mut().find(|r| {
        r.kind == RecordKind::Specialization
            && r.get_attribute("specificEntity").and_then(AttrValue::as_qname).map(|q| q.local.as_str()) == Some(into_name)
    }) {
        record.attrs = vec![
            (QName::prefixed("prov", "specificEntity"), AttrValue::QName(QName::new(into_name.to_string()))),
            (QName::prefixed("prov", "generalEntity"), AttrValue::QName(QName::new(base_name(fresh)))),
        ];
    }

    base_of.insert(into, fresh);
}

fn push_revision_edge(doc: &mut Document, meta_id: &QName, old_name: &str, new_name: &str) {
    let edge_id = QName::new(format!("up#{old_name}-{}", new_name.trim_start_matches("bundle")));
    let record = Record::revision(edge_id.clone(), QName::new(new_name), QName::new(old_name));

    let meta = doc.meta_mut().expect("meta exists");
    meta.push(record.clone());
    let _ = meta_id;

    if let Some(target) = doc.bundle_mut(new_name) {
        target.push(record);
    }
}

/// Copy every record from `source` into `target` except records typed
/// `Revision` and any record whose identifier (or, for derivations, whose
/// `generatedEntity`) matches a deletion id.
fn copy_filtered(target: &mut Bundle, source: &Bundle, deletions: &[i64]) {
    let deletion_strs: HashSet<String> = deletions.iter().map(|d| d.to_string()).collect();
    for record in &source.records {
        if record.kind == RecordKind::Revision {
            continue;
        }
        let is_deleted = deletion_strs.contains(&record.id.local)
            || record
                .generated_entity()
                .is_some_and(|g| deletion_strs.contains(&g.local));
        if is_deleted {
            continue;
        }
        target.push(record.clone());
    }
}

fn remove_token(doc: &mut Document, meta_id: &QName, bundle_id: i64) {
    let bundle_qname = QName::new(bundle_name(bundle_id));
    let Some(meta) = doc.meta_mut() else { return };

    let stale_token_ids: Vec<QName> = meta
        .get_records(RecordKind::Derivation)
        .filter(|r| r.has_type("Token") && r.used_entity() == Some(&bundle_qname))
        .filter_map(|r| r.generated_entity().cloned())
        .collect();

    meta.records.retain(|r| {
        if r.kind == RecordKind::Derivation && r.has_type("Token") && r.used_entity() == Some(&bundle_qname) {
            return false;
        }
        !stale_token_ids.contains(&r.id)
    });
    let _ = meta_id;
}

fn sign_and_record(doc: &mut Document, meta_id: &QName, bundle_id: i64, params: &GenerateParams<'_>) -> ProvResult<()> {
    let bundle_name = bundle_name(bundle_id);
    let snapshot = doc.bundle(&bundle_name).expect("just created").clone();

    let token = token::sign_bundle(
        meta_id,
        &snapshot,
        params.keypair,
        params.hash_func,
        params.encoding,
        params.prefix,
        params.expire_in_days,
    )?;

    let Some(token) = token else { return Ok(()) };
    let token_id = token.id.clone();

    let meta = doc.meta_mut().expect("meta exists");
    meta.push(token);
    meta.push(Record::derivation(
        QName::new(format!("dertoken{bundle_id}")),
        token_id,
        snapshot.id.clone(),
        Some("Token"),
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signspec::SignSpec;

    fn engine_params<'a>(keypair: &'a KeyPair) -> GenerateParams<'a> {
        GenerateParams {
            bundles: &[],
            updates: &[],
            invalidate_bundles: &[],
            start_id: 1,
            keypair,
            hash_func: HashFunc::Sha3_256,
            encoding: "UTF-8",
            prefix: "ex",
            expire_in_days: 1,
        }
    }

    #[test]
    fn builds_initial_bundles_with_one_token_each() {
        let keypair = KeyPair::generate(SignSpec::parse("NIST256").unwrap()).unwrap();
        let mut doc = Document::new();
        let bundles = vec![
            BundleSpec::new(vec![EntitySpec::new(1)]),
            BundleSpec::new(vec![EntitySpec::new(2)]),
        ];
        let mut params = engine_params(&keypair);
        params.bundles = &bundles;

        generate(&mut doc, params).unwrap();

        assert!(doc.bundle("bundle1").is_some());
        assert!(doc.bundle("bundle2").is_some());
        let meta = doc.meta().unwrap();
        let tokens: Vec<_> = meta
            .get_records(RecordKind::Derivation)
            .filter(|r| r.has_type("Token"))
            .collect();
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn update_creates_revision_mirrored_in_both_bundles() {
        let keypair = KeyPair::generate(SignSpec::parse("NIST256").unwrap()).unwrap();
        let mut doc = Document::new();
        let bundles = vec![BundleSpec::new(vec![EntitySpec::new(1)])];
        let updates = vec![Update { source: UpdateSource::Id(1), spec: UpdateSpec::new() }];
        let mut params = engine_params(&keypair);
        params.bundles = &bundles;
        params.updates = &updates;

        generate(&mut doc, params).unwrap();

        let meta = doc.meta().unwrap();
        let new_bundle = doc.bundle("bundle2").unwrap();
        let meta_has_edge = meta.get_records(RecordKind::Revision).count() == 1;
        let bundle_has_edge = new_bundle.get_records(RecordKind::Revision).count() == 1;
        assert!(meta_has_edge && bundle_has_edge);
    }

    #[test]
    fn merge_source_has_no_token() {
        let keypair = KeyPair::generate(SignSpec::parse("NIST256").unwrap()).unwrap();
        let mut doc = Document::new();
        let bundles = vec![
            BundleSpec::new(vec![EntitySpec::new(1)]),
            BundleSpec::new(vec![EntitySpec::new(2)]),
        ];
        let updates = vec![Update {
            source: UpdateSource::Merge { source: 2, into: 1 },
            spec: UpdateSpec::new(),
        }];
        let mut params = engine_params(&keypair);
        params.bundles = &bundles;
        params.updates = &updates;

        generate(&mut doc, params).unwrap();

        let meta = doc.meta().unwrap();
        let bundle2 = QName::new("bundle2");
        let tokens_for_source = meta
            .get_records(RecordKind::Derivation)
            .filter(|r| r.has_type("Token") && r.used_entity() == Some(&bundle2))
            .count();
        assert_eq!(tokens_for_source, 0);
    }

    #[test]
    fn merge_mints_fresh_base_linked_to_target_base() {
        let keypair = KeyPair::generate(SignSpec::parse("NIST256").unwrap()).unwrap();
        let mut doc = Document::new();
        let bundles = vec![
            BundleSpec::new(vec![EntitySpec::new(1)]),
            BundleSpec::new(vec![EntitySpec::new(2)]),
        ];
        let updates = vec![Update {
            source: UpdateSource::Merge { source: 2, into: 1 },
            spec: UpdateSpec::new(),
        }];
        let mut params = engine_params(&keypair);
        params.bundles = &bundles;
        params.updates = &updates;

        generate(&mut doc, params).unwrap();

        let meta = doc.meta().unwrap();
        let base1 = QName::new("base1");
        let base_links: Vec<_> = meta
            .get_records(RecordKind::Derivation)
            .filter(|r| !r.has_type("Token") && r.used_entity() == Some(&base1))
            .collect();
        assert_eq!(base_links.len(), 1, "merge target's old base should gain exactly one successor link");

        let new_base = base_links[0].generated_entity().unwrap().clone();
        let bundle1 = QName::new("bundle1");
        let spec_record = meta
            .get_records(RecordKind::Specialization)
            .find(|r| r.get_attribute("specificEntity").and_then(AttrValue::as_qname) == Some(&bundle1))
            .unwrap();
        assert_eq!(spec_record.get_attribute("generalEntity").and_then(AttrValue::as_qname), Some(&new_base));
    }

    #[test]
    fn invalidate_appends_sentinel_entity() {
        let keypair = KeyPair::generate(SignSpec::parse("NIST256").unwrap()).unwrap();
        let mut doc = Document::new();
        let bundles = vec![BundleSpec::new(vec![EntitySpec::new(1)])];
        let invalidate = vec![1i64];
        let mut params = engine_params(&keypair);
        params.bundles = &bundles;
        params.invalidate_bundles = &invalidate;

        generate(&mut doc, params).unwrap();

        let bundle = doc.bundle("bundle1").unwrap();
        assert!(bundle.get_record(&QName::new("-1")).is_some());
    }

    #[test]
    fn invalidating_unknown_bundle_is_fatal() {
        let keypair = KeyPair::generate(SignSpec::parse("NIST256").unwrap()).unwrap();
        let mut doc = Document::new();
        let invalidate = vec![99i64];
        let mut params = engine_params(&keypair);
        params.invalidate_bundles = &invalidate;

        assert!(generate(&mut doc, params).is_err());
    }
}
