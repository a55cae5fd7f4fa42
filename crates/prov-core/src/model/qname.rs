//! Qualified names.
//!
//! The provenance model adapter exposes identifiers and attribute names as
//! qualified names (`prefix:localpart`). Canonicalization and lookups only
//! ever care about the localpart; the prefix is carried for round-tripping
//! through the external document format.

use std::fmt;

/// A qualified name, e.g. `ex:bundle1` or `prov:wasDerivedFrom`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self { prefix: None, local: local.into() }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()), local: local.into() }
    }

    pub fn localpart(&self) -> &str {
        &self.local
    }

    /// Parse `prefix:local` or a bare `local`.
    pub fn parse(s: &str) -> Self {
        match s.split_once(':') {
            Some((prefix, local)) => Self::prefixed(prefix, local),
            None => Self::new(s),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{p}:{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

impl From<&str> for QName {
    fn from(s: &str) -> Self {
        QName::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefixed_and_bare() {
        assert_eq!(QName::parse("ex:bundle1").local, "bundle1");
        assert_eq!(QName::parse("ex:bundle1").prefix.as_deref(), Some("ex"));
        assert_eq!(QName::parse("bundle1").prefix, None);
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(QName::prefixed("ex", "bundle1").to_string(), "ex:bundle1");
        assert_eq!(QName::new("bundle1").to_string(), "bundle1");
    }
}
