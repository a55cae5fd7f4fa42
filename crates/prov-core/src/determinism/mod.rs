//! Determinism primitives for prov-core.
//!
//! The canonicalizer, the token builder, and the search engine all depend on
//! the same guarantee: given the same bundle content, two runs on two
//! machines produce byte-identical output. This module collects the small
//! helpers that guarantee exists outside of the canonical byte-string
//! algorithm itself (see `canonical`).
//!
//! Scope:
//! - canonical ordering rules
//! - the bundle canonical byte-string algorithm
//! - deterministic string normalization
//!
//! Non-scope:
//! - the cryptographic hash/sign primitives themselves (see `crypto`)

use std::collections::{BTreeMap, BTreeSet};

use crate::errors::{ProvError, ProvResult};

pub mod canonical;

/// Deterministic ordering helpers.
pub mod ordering {
    use super::*;

    /// Return a sorted vector of keys from a map.
    pub fn sorted_keys<V>(map: &BTreeMap<String, V>) -> Vec<String> {
        map.keys().cloned().collect()
    }

    /// Return a sorted vector of unique strings.
    pub fn sorted_set(set: &BTreeSet<String>) -> Vec<String> {
        set.iter().cloned().collect()
    }
}

/// Deterministic string helpers.
pub mod strings {
    /// Normalize line endings to LF.
    pub fn normalize_newlines(s: &str) -> String {
        s.replace("\r\n", "\n").replace('\r', "\n")
    }
}

/// Deterministic checks for structures.
pub mod checks {
    use super::*;

    /// Ensure a localpart is non-empty and does not collide with the
    /// canonical framing bytes (`% + ~ #`).
    pub fn ensure_safe_localpart(s: &str, field: &str) -> ProvResult<()> {
        if s.is_empty() {
            return Err(ProvError::input_shape(format!("{field} is empty")));
        }
        if s.contains(['%', '+', '~', '#']) {
            return Err(ProvError::input_shape(format!(
                "{field} contains a reserved canonicalization byte (% + ~ #)"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strings() {
        let s = "a\r\nb\r\n";
        let n = strings::normalize_newlines(s);
        assert_eq!(n, "a\nb\n");
    }

    #[test]
    fn rejects_reserved_bytes() {
        assert!(checks::ensure_safe_localpart("bundle1", "id").is_ok());
        assert!(checks::ensure_safe_localpart("bun#dle1", "id").is_err());
    }
}
