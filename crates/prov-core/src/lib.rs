//! Tamper-evident provenance bundles.
//!
//! This crate has two halves. The signing half (`determinism`, `signspec`,
//! `crypto`, `token`, `builder`) canonicalizes bundle content, signs it with
//! a configurable NIST-curve or RSA key over a configurable SHA3 digest, and
//! maintains the token bookkeeping across a bundle's create/update/fork/
//! merge/invalidate lifecycle. The search half (`view`, `search`) walks a
//! document's revision graph plus its cross-document `has_provenance`
//! references, classifying every reachable `(document, bundle, entity)`
//! triple as valid, low-credibility, or invalid based on the cryptographic
//! validity of every bundle the entity's chain passes through.
//!
//! Document (de)serialization, the PROV data model's own wire format, and
//! filesystem path expansion beyond the `has_provenance` grammar are outside
//! this crate; callers supply a `view::DocumentLoader` to bridge to whatever
//! XML/JSON/PROV-N store they use.

pub mod builder;
pub mod config;
pub mod crypto;
pub mod determinism;
pub mod diagnostics;
pub mod errors;
pub mod model;
pub mod path;
pub mod search;
pub mod signspec;
pub mod token;
pub mod view;

use time::OffsetDateTime;

use crate::builder::GenerateParams;
use crate::config::EngineConfig;
use crate::crypto::{HashFunc, KeyPair};
use crate::diagnostics::Diagnostics;
use crate::errors::ProvResult;
use crate::model::Document;
use crate::signspec::SignSpec;
use crate::view::DocumentLoader;

pub use builder::{BundleSpec, EntitySpec, Update, UpdateSource, UpdateSpec};
pub use search::{search as search_document, SearchOutcome, Triple};

/// Build (or extend) `doc` from `bundles` and `updates`, signing every
/// freshly created content bundle except merge sources, then invalidating
/// `invalidate_bundles`. `start_id` is the numeric id of the first bundle
/// this call creates.
pub fn generate(
    doc: &mut Document,
    cfg: &EngineConfig,
    bundles: &[BundleSpec],
    updates: &[Update],
    invalidate_bundles: &[i64],
    start_id: i64,
) -> ProvResult<Diagnostics> {
    cfg.validate()?;
    let hash_func = HashFunc::parse(&cfg.hash_func)?;
    let sign_spec = SignSpec::parse(&cfg.sign_func)?;
    let keypair = KeyPair::generate(sign_spec)?;

    builder::generate(
        doc,
        GenerateParams {
            bundles,
            updates,
            invalidate_bundles,
            start_id,
            keypair: &keypair,
            hash_func,
            encoding: &cfg.encoding,
            prefix: &cfg.prefix,
            expire_in_days: cfg.expire_in_days,
        },
    )
}

/// Search for `entity_local_part` starting at the document loaded from
/// `entry_path`, returning the three classification lists plus diagnostics.
/// `strict` mode prunes traversal through invalid bundles instead of
/// reporting them.
pub fn search(
    loader: &dyn DocumentLoader,
    cfg: &EngineConfig,
    entry_path: &std::path::Path,
    entity_local_part: &str,
    strict: bool,
) -> ProvResult<SearchOutcome> {
    cfg.validate()?;
    search::search(loader, cfg, entry_path, entity_local_part, strict, OffsetDateTime::now_utc())
}
