//! Trust-Aware Provenance Search.
//!
//! BFS over a document's revision DAG and its `has_provenance`
//! cross-document references, classifying each reachable
//! `(document, bundle, entity)` triple as valid, low-credibility, or
//! invalid based on the cryptographic validity of every bundle on the path
//! from the entry bundle. See the module-level algorithm in §4.8: three
//! frontiers (`valid_q`, `invalid_q`, `postpone_q`), a `searched` memo
//! keyed by `(doc_path, bundle_id, entity)`, and three drain phases.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use time::OffsetDateTime;

use crate::config::EngineConfig;
use crate::diagnostics::{warnings, Diagnostics};
use crate::errors::ProvResult;
use crate::model::record::RecordKind;
use crate::model::QName;
use crate::path;
use crate::view::{DocumentLoader, DocumentView};

/// A classified search result: a document path, a bundle id, and the
/// entity's local part.
pub type Triple = (PathBuf, String, String);

/// Outcome of a search: the three classification lists plus diagnostics.
pub struct SearchOutcome {
    pub valid: Vec<Triple>,
    pub low: Vec<Triple>,
    pub invalid: Vec<Triple>,
    pub diagnostics: Diagnostics,
}

type SearchKey = (PathBuf, String, String);

struct SearchData<'a> {
    loader: &'a dyn DocumentLoader,
    cfg: &'a EngineConfig,
    strict: bool,
    now: OffsetDateTime,

    doc_cache: RefCell<HashMap<PathBuf, Rc<DocumentView>>>,
    searched: RefCell<HashMap<SearchKey, (bool, bool)>>,

    valid_q: RefCell<VecDeque<Triple>>,
    invalid_q: RefCell<VecDeque<Triple>>,
    postpone_q: RefCell<HashSet<SearchKey>>,

    out_valid: RefCell<Vec<Triple>>,
    out_low: RefCell<Vec<Triple>>,
    out_invalid: RefCell<Vec<Triple>>,

    diagnostics: RefCell<Diagnostics>,
}

impl<'a> SearchData<'a> {
    fn new(loader: &'a dyn DocumentLoader, cfg: &'a EngineConfig, strict: bool, now: OffsetDateTime) -> Self {
        Self {
            loader,
            cfg,
            strict,
            now,
            doc_cache: RefCell::new(HashMap::new()),
            searched: RefCell::new(HashMap::new()),
            valid_q: RefCell::new(VecDeque::new()),
            invalid_q: RefCell::new(VecDeque::new()),
            postpone_q: RefCell::new(HashSet::new()),
            out_valid: RefCell::new(Vec::new()),
            out_low: RefCell::new(Vec::new()),
            out_invalid: RefCell::new(Vec::new()),
            diagnostics: RefCell::new(Diagnostics::default()),
        }
    }

    fn get_or_load_view(&self, path: &Path) -> Option<Rc<DocumentView>> {
        if let Some(v) = self.doc_cache.borrow().get(path) {
            return Some(v.clone());
        }
        let document = self.loader.load(path)?;
        match DocumentView::load(document, path.to_path_buf()) {
            Ok((view, diag)) => {
                self.diagnostics.borrow_mut().extend(diag);
                let view = Rc::new(view);
                self.doc_cache.borrow_mut().insert(path.to_path_buf(), view.clone());
                Some(view)
            }
            Err(_) => {
                self.diagnostics
                    .borrow_mut()
                    .push(warnings::document_cycle_skipped(&path.to_string_lossy()));
                None
            }
        }
    }

    fn key(doc: &DocumentView, bundle_id: &str, entity: &str) -> SearchKey {
        (doc.path.clone(), bundle_id.to_string(), entity.to_string())
    }

    fn mark_processed(&self, key: SearchKey, contains: bool) {
        self.searched.borrow_mut().insert(key, (true, contains));
    }

    fn processed_contains(&self, key: &SearchKey) -> Option<bool> {
        self.searched.borrow().get(key).filter(|(p, _)| *p).map(|(_, c)| *c)
    }

    /// The core recursive routine: §4.8 `entity_check`.
    fn entity_check(
        &self,
        doc: &Rc<DocumentView>,
        bundle_id: &str,
        entity: &str,
        still_valid: bool,
        postpone: bool,
        prev: Option<&str>,
        initial: bool,
    ) -> bool {
        let key = Self::key(doc, bundle_id, entity);
        if let Some(contains) = self.processed_contains(&key) {
            return contains;
        }

        let bundle_valid = doc.validity(bundle_id, &self.cfg.prefix, self.now);
        let newer_ids = doc.newer_ids(bundle_id).to_vec();
        let mut found = false;
        for newer in &newer_ids {
            let next_postpone = postpone || (!bundle_valid && prev.is_some() && !initial);
            if self.entity_check(doc, newer, entity, still_valid, next_postpone, Some(bundle_id), initial) {
                found = true;
            }
        }
        if found {
            return true;
        }

        let contains_entity = doc
            .bundle(bundle_id)
            .map(|b| b.contains_entity(&QName::new(entity)))
            .unwrap_or(false);
        if !contains_entity {
            self.mark_processed(key, false);
            return false;
        }

        if !bundle_valid {
            if self.strict {
                self.mark_processed(key, false);
                return false;
            }
            let triple = key.clone();
            self.invalid_q.borrow_mut().push_back(triple.clone());
            self.out_invalid.borrow_mut().push(triple);
        } else if still_valid && !postpone {
            let triple = key.clone();
            self.valid_q.borrow_mut().push_back(triple.clone());
            self.out_valid.borrow_mut().push(triple);
            self.mark_processed(key, true);
            self.check_prev_validity(doc, bundle_id, entity);
            self.warn_unvisited_newer(doc, bundle_id, &newer_ids);
            return true;
        } else if still_valid {
            // Postponed: wait until the valid frontier drains before deciding
            // whether this branch was ever reached some other way.
            self.postpone_q.borrow_mut().insert(key);
            return true;
        } else {
            let triple = key.clone();
            self.invalid_q.borrow_mut().push_back(triple.clone());
            self.out_low.borrow_mut().push(triple);
        }

        self.mark_processed(key, true);
        self.check_prev_validity(doc, bundle_id, entity);
        self.warn_unvisited_newer(doc, bundle_id, &newer_ids);
        true
    }

    fn warn_unvisited_newer(&self, doc: &Rc<DocumentView>, bundle_id: &str, newer_ids: &[String]) {
        if !newer_ids.is_empty() {
            self.diagnostics
                .borrow_mut()
                .push(warnings::newer_versions_unvisited(&doc.path.to_string_lossy(), bundle_id));
        }
    }

    /// Walks every older version of `bundle_id`, unconditionally checking its
    /// validity and recursing into its own ancestors — a sibling bundle not
    /// yet having examined all of *its* newer versions only withholds the
    /// "fully processed" mark on the shared ancestor, it never skips
    /// diagnosing or walking past that ancestor.
    fn check_prev_validity(&self, doc: &Rc<DocumentView>, bundle_id: &str, entity: &str) {
        let older_ids = doc.older_ids(bundle_id).to_vec();
        for older in &older_ids {
            let key = Self::key(doc, older, entity);
            if self.processed_contains(&key).is_some() {
                continue;
            }
            let newer_of_older = doc.newer_ids(older).to_vec();
            let all_processed = newer_of_older
                .iter()
                .all(|n| self.processed_contains(&Self::key(doc, n, entity)).is_some());

            let valid = doc.validity(older, &self.cfg.prefix, self.now);
            if all_processed {
                self.mark_processed(key, false);
            }
            if !valid {
                self.diagnostics
                    .borrow_mut()
                    .push(warnings::origin_not_trustworthy(&doc.path.to_string_lossy(), older, entity));
            }
            self.check_prev_validity(doc, older, entity);
        }
    }

    /// §4.8 `search_traverse`: follow same-bundle derivations, then
    /// cross-document `has_provenance` references.
    fn search_traverse(&self, doc: &Rc<DocumentView>, bundle_id: &str, entity: &str, still_valid: bool) {
        let Some(bundle) = doc.bundle(bundle_id) else { return };

        let used_entities: Vec<String> = bundle
            .get_records(RecordKind::Derivation)
            .filter(|r| r.generated_entity().map(|g| g.local.as_str()) == Some(entity))
            .filter_map(|r| r.used_entity())
            .map(|q| q.local.clone())
            .collect();
        for used in used_entities {
            self.entity_check(doc, bundle_id, &used, still_valid, false, None, false);
        }

        let Some(entity_record) = bundle.get_record(&QName::new(entity)) else { return };
        let refs: Vec<String> = entity_record
            .attribute_values("has_provenance")
            .filter_map(|v| v.as_str())
            .map(|s| s.to_string())
            .collect();

        for raw in refs {
            let Ok(resolved) = path::resolve(&raw) else { continue };
            let Some(next_doc) = self.get_or_load_view(&resolved.document_path) else {
                self.diagnostics.borrow_mut().push(warnings::cross_doc_reference_unreachable(
                    &resolved.document_path.to_string_lossy(),
                    &resolved.bundle_id,
                ));
                continue;
            };
            if next_doc.bundle(&resolved.bundle_id).is_none() {
                self.diagnostics.borrow_mut().push(warnings::cross_doc_reference_unreachable(
                    &resolved.document_path.to_string_lossy(),
                    &resolved.bundle_id,
                ));
                continue;
            }
            let ok = self.entity_check(&next_doc, &resolved.bundle_id, entity, still_valid, false, None, false);
            if !ok {
                self.diagnostics.borrow_mut().push(warnings::cross_doc_reference_unreachable(
                    &resolved.document_path.to_string_lossy(),
                    &resolved.bundle_id,
                ));
            }
        }
    }

    fn run(&self, entry_path: &Path, entity: &str) -> ProvResult<()> {
        let Some(entry_doc) = self.get_or_load_view(entry_path) else {
            return Ok(());
        };

        let seed_bundles: Vec<String> = entry_doc
            .document
            .bundles
            .iter()
            .map(|b| b.id.local.clone())
            .filter(|id| id != crate::model::document::META_BUNDLE_ID)
            .filter(|id| entry_doc.older_ids(id).is_empty())
            .filter(|id| entry_doc.bundle(id).map(|b| b.contains_entity(&QName::new(entity))).unwrap_or(false))
            .collect();

        for bundle_id in seed_bundles {
            self.entity_check(&entry_doc, &bundle_id, entity, true, false, None, true);
        }

        // Phase 1: drain valid_q.
        while let Some((path, bundle_id, entity)) = self.valid_q.borrow_mut().pop_front() {
            if let Some(doc) = self.doc_cache.borrow().get(&path).cloned() {
                self.search_traverse(&doc, &bundle_id, &entity, true);
            }
        }

        // Phase 2: flush unclassified postpone_q into low-credibility output.
        let postponed: Vec<SearchKey> = self.postpone_q.borrow().iter().cloned().collect();
        for key in postponed {
            if self.processed_contains(&key) == Some(true) {
                continue;
            }
            self.diagnostics.borrow_mut().push(warnings::postponed_low_credibility(
                &key.0.to_string_lossy(),
                &key.1,
                &key.2,
            ));
            self.out_low.borrow_mut().push(key.clone());
            self.mark_processed(key, true);
        }

        // Phase 3: drain invalid_q.
        while let Some((path, bundle_id, entity)) = self.invalid_q.borrow_mut().pop_front() {
            if let Some(doc) = self.doc_cache.borrow().get(&path).cloned() {
                self.search_traverse(&doc, &bundle_id, &entity, false);
            }
        }

        Ok(())
    }
}

fn sort_key(triple: &Triple) -> (String, i64, i64) {
    let bundle_num = triple.1.trim_start_matches("bundle").parse().unwrap_or(i64::MAX);
    let entity_num = triple.2.parse().unwrap_or(i64::MAX);
    (triple.0.to_string_lossy().to_string(), bundle_num, entity_num)
}

/// Search for `entity_local_part` starting at `entry_path`. `strict` mode
/// suppresses invalid bundles from the output and prunes traversal through
/// them; non-strict mode reports them in `invalid`.
pub fn search(
    loader: &dyn DocumentLoader,
    cfg: &EngineConfig,
    entry_path: &Path,
    entity_local_part: &str,
    strict: bool,
    now: OffsetDateTime,
) -> ProvResult<SearchOutcome> {
    let data = SearchData::new(loader, cfg, strict, now);
    data.run(entry_path, entity_local_part)?;

    let mut valid = data.out_valid.into_inner();
    let mut low = data.out_low.into_inner();
    let mut invalid = data.out_invalid.into_inner();
    valid.sort_by_key(sort_key);
    low.sort_by_key(sort_key);
    invalid.sort_by_key(sort_key);

    Ok(SearchOutcome { valid, low, invalid, diagnostics: data.diagnostics.into_inner() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{self, BundleSpec, EntitySpec, GenerateParams, Update, UpdateSource, UpdateSpec};
    use crate::crypto::{HashFunc, KeyPair};
    use crate::model::Document;
    use crate::signspec::SignSpec;
    use std::collections::HashMap as StdHashMap;

    struct MapLoader(StdHashMap<PathBuf, Document>);

    impl DocumentLoader for MapLoader {
        fn load(&self, path: &Path) -> Option<Document> {
            self.0.get(path).cloned()
        }
    }

    #[test]
    fn linear_chain_surfaces_final_bundle_as_valid() {
        let keypair = KeyPair::generate(SignSpec::parse("NIST256").unwrap()).unwrap();
        let mut doc = Document::new();
        let bundles = vec![BundleSpec::new(vec![EntitySpec::new(1)])];
        let updates = vec![Update { source: UpdateSource::Id(1), spec: UpdateSpec::new() }];
        builder::generate(
            &mut doc,
            GenerateParams {
                bundles: &bundles,
                updates: &updates,
                invalidate_bundles: &[],
                start_id: 1,
                keypair: &keypair,
                hash_func: HashFunc::Sha3_256,
                encoding: "UTF-8",
                prefix: "ex",
                expire_in_days: 1,
            },
        )
        .unwrap();

        let path = PathBuf::from("/doc.xml");
        let mut map = StdHashMap::new();
        map.insert(path.clone(), doc);
        let loader = MapLoader(map);
        let cfg = EngineConfig::default();

        let outcome = search(&loader, &cfg, &path, "1", true, OffsetDateTime::now_utc()).unwrap();
        assert_eq!(outcome.valid.len(), 1);
        assert_eq!(outcome.valid[0].1, "bundle2");
        assert!(outcome.low.is_empty());
        assert!(outcome.invalid.is_empty());
    }
}
