//! Provenance model adapter.
//!
//! Abstract accessors over a PROV document: bundles, records, attributes,
//! qualified names. Everything else in this crate (canonicalizer, token
//! builder, document builder, search engine) addresses a document only
//! through these types, never through a concrete XML/JSON/PROV-N
//! representation.

pub mod bundle;
pub mod document;
pub mod qname;
pub mod record;

pub use bundle::Bundle;
pub use document::{Document, META_BUNDLE_ID};
pub use qname::QName;
pub use record::{AttrValue, Record, RecordKind};
