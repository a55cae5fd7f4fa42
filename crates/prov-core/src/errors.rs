//! Error types for prov-core.
//!
//! Errors are structured, explicit, and stable. Messages are intended to be
//! human-readable while preserving machine-level categorization. Only
//! input-shape and configuration failures are fatal (`Err`); cryptographic
//! verification outcomes flow through the three-way search classification
//! instead (see `search`).

use std::fmt::{self, Display};

/// Result type used throughout prov-core.
pub type ProvResult<T> = Result<T, ProvError>;

/// Top-level error type for prov-core.
#[derive(Debug)]
pub enum ProvError {
    /// A builder input (bundle spec, update spec, deletion list, ...) had an
    /// invalid shape. Fatal before any side effect.
    InputShape { message: String },

    /// An unknown signature family/bit-width, hash function, or document
    /// format was requested.
    Configuration { message: String },

    /// A record lacked an identifier during canonicalization.
    Canonicalization { message: String },

    /// An integer (hash, signature, public key) overflowed the byte width of
    /// the configured signature algorithm.
    Overflow { message: String },

    /// A cycle was found in a document's revision DAG at load time.
    DocumentCycle { message: String },

    /// A referenced bundle id could not be found during build or update.
    MissingBundle { message: String },

    /// Document I/O (open, parse, serialize) failed.
    Io { message: String },
}

impl ProvError {
    pub fn input_shape<M: Into<String>>(message: M) -> Self {
        Self::InputShape { message: message.into() }
    }

    pub fn configuration<M: Into<String>>(message: M) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn canonicalization<M: Into<String>>(message: M) -> Self {
        Self::Canonicalization { message: message.into() }
    }

    pub fn overflow<M: Into<String>>(message: M) -> Self {
        Self::Overflow { message: message.into() }
    }

    pub fn document_cycle<M: Into<String>>(message: M) -> Self {
        Self::DocumentCycle { message: message.into() }
    }

    pub fn missing_bundle<M: Into<String>>(message: M) -> Self {
        Self::MissingBundle { message: message.into() }
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io { message: message.into() }
    }
}

impl Display for ProvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputShape { message } => write!(f, "invalid input shape: {message}"),
            Self::Configuration { message } => write!(f, "configuration error: {message}"),
            Self::Canonicalization { message } => write!(f, "canonicalization error: {message}"),
            Self::Overflow { message } => write!(f, "overflow: {message}"),
            Self::DocumentCycle { message } => write!(f, "document cycle: {message}"),
            Self::MissingBundle { message } => write!(f, "missing bundle: {message}"),
            Self::Io { message } => write!(f, "i/o error: {message}"),
        }
    }
}

impl std::error::Error for ProvError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_input_shape() {
        let e = ProvError::input_shape("bundles is not iterable");
        assert_eq!(format!("{e}"), "invalid input shape: bundles is not iterable");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProvError>();
    }
}
