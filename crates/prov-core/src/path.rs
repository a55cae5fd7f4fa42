//! `has_provenance` path grammar.
//!
//! A `has_provenance` attribute value has the form `<root><segments>/bundle<N>`.
//! `~/X` resolves under the user's home directory, `@/X` resolves under
//! `<cwd>/Cases/X`, anything else is used as-is (absolute or relative to the
//! current directory, left to the caller's document loader to resolve).
//! The value is split at its last `/` to yield `(document_path, bundle_id)`.

use std::path::PathBuf;

use crate::errors::{ProvError, ProvResult};

/// A resolved cross-document reference: a document path plus the bundle id
/// within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceRef {
    pub document_path: PathBuf,
    pub bundle_id: String,
}

/// Resolve a `has_provenance` attribute value into a document path and
/// bundle id.
pub fn resolve(value: &str) -> ProvResult<ProvenanceRef> {
    let (path_part, bundle_id) = value
        .rsplit_once('/')
        .ok_or_else(|| ProvError::input_shape(format!("has_provenance value missing a bundle segment: {value}")))?;

    if bundle_id.is_empty() {
        return Err(ProvError::input_shape(format!("has_provenance value has an empty bundle id: {value}")));
    }

    let document_path = if let Some(rest) = path_part.strip_prefix("~/") {
        home_dir()?.join(rest)
    } else if let Some(rest) = path_part.strip_prefix("@/") {
        std::env::current_dir()
            .map_err(|e| ProvError::io(format!("failed to read current directory: {e}")))?
            .join("Cases")
            .join(rest)
    } else {
        PathBuf::from(path_part)
    };

    Ok(ProvenanceRef { document_path, bundle_id: bundle_id.to_string() })
}

fn home_dir() -> ProvResult<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| ProvError::configuration("HOME is not set; cannot resolve ~/ path"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_at_last_slash() {
        let r = resolve("/abs/path/bundle3").unwrap();
        assert_eq!(r.document_path, PathBuf::from("/abs/path"));
        assert_eq!(r.bundle_id, "bundle3");
    }

    #[test]
    fn resolves_home_root() {
        std::env::set_var("HOME", "/home/tester");
        let r = resolve("~/cases/doc.xml/bundle1").unwrap();
        assert_eq!(r.document_path, PathBuf::from("/home/tester/cases/doc.xml"));
        assert_eq!(r.bundle_id, "bundle1");
    }

    #[test]
    fn resolves_case_root() {
        let r = resolve("@/12/2.txt/bundle6").unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(r.document_path, cwd.join("Cases").join("12").join("2.txt"));
        assert_eq!(r.bundle_id, "bundle6");
    }

    #[test]
    fn rejects_missing_bundle_segment() {
        assert!(resolve("no-slash-here").is_err());
    }
}
