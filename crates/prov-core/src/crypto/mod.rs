//! Crypto Provider.
//!
//! Generates keypairs, signs, and verifies across the two supported
//! signature families. Modeled as a tagged variant over `{Nist, Rsa}` with a
//! uniform capability set (`generate`, `sign`, `verify`, `import_pk`); the
//! sign-spec parser is the only place a string turns into one of these
//! variants.

pub mod nist;
pub mod rsa_provider;

use num_bigint::BigUint;
use sha3::{Digest, Sha3_256, Sha3_384, Sha3_512};

use crate::errors::{ProvError, ProvResult};
use crate::signspec::{SignFamily, SignSpec};

/// The three configured hash functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunc {
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl HashFunc {
    pub fn parse(name: &str) -> ProvResult<Self> {
        match name {
            "SHA3-256" => Ok(HashFunc::Sha3_256),
            "SHA3-384" => Ok(HashFunc::Sha3_384),
            "SHA3-512" => Ok(HashFunc::Sha3_512),
            other => Err(ProvError::configuration(format!("unknown hash function: {other}"))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HashFunc::Sha3_256 => "SHA3-256",
            HashFunc::Sha3_384 => "SHA3-384",
            HashFunc::Sha3_512 => "SHA3-512",
        }
    }

    /// Digest byte width, derived from the name's numeric suffix (matches
    /// the original's `int(hash_func.split("-",2)[1]) // 8`).
    pub fn digest_bytes(&self) -> usize {
        match self {
            HashFunc::Sha3_256 => 32,
            HashFunc::Sha3_384 => 48,
            HashFunc::Sha3_512 => 64,
        }
    }

    pub fn hash(&self, bytes: &[u8]) -> Vec<u8> {
        match self {
            HashFunc::Sha3_256 => Sha3_256::digest(bytes).to_vec(),
            HashFunc::Sha3_384 => Sha3_384::digest(bytes).to_vec(),
            HashFunc::Sha3_512 => Sha3_512::digest(bytes).to_vec(),
        }
    }
}

/// A generated signing keypair, still bound to its algorithm spec.
pub enum KeyPair {
    Nist { spec: SignSpec, key: nist::NistSigningKey },
    Rsa { spec: SignSpec, key: rsa_provider::RsaKeyPair },
}

impl KeyPair {
    pub fn generate(spec: SignSpec) -> ProvResult<Self> {
        match spec.family {
            SignFamily::Nist => {
                let curve = spec.curve.expect("NIST spec always carries a curve");
                Ok(KeyPair::Nist { spec, key: nist::NistSigningKey::generate(curve) })
            }
            SignFamily::Rsa => Ok(KeyPair::Rsa { spec, key: rsa_provider::RsaKeyPair::generate(spec.bits)? }),
        }
    }

    pub fn spec(&self) -> SignSpec {
        match self {
            KeyPair::Nist { spec, .. } => *spec,
            KeyPair::Rsa { spec, .. } => *spec,
        }
    }

    /// Public key as a big-endian unsigned integer, ready to store in a token.
    pub fn public_key_biguint(&self) -> ProvResult<BigUint> {
        match self {
            KeyPair::Nist { key, .. } => Ok(BigUint::from_bytes_be(&key.public_key_bytes())),
            KeyPair::Rsa { key, .. } => key.public_key_biguint(),
        }
    }

    /// Sign a pre-hashed digest, returning the signature as a big-endian integer.
    pub fn sign_digest(&self, hash_func: HashFunc, digest: &[u8]) -> ProvResult<BigUint> {
        let bytes = match self {
            KeyPair::Nist { key, .. } => key.sign_prehash(digest)?,
            KeyPair::Rsa { key, .. } => key.sign(hash_func, digest)?,
        };
        Ok(BigUint::from_bytes_be(&bytes))
    }
}

/// Verify a signature produced over a pre-hashed digest. Never fails with an
/// error; any malformed input classifies as an unsuccessful verification.
pub fn verify_digest(
    spec: SignSpec,
    hash_func: HashFunc,
    public_key: &BigUint,
    digest: &[u8],
    signature: &BigUint,
) -> bool {
    let width = spec.byte_width();
    let sig_bytes = to_fixed_width_be(signature, width);
    let pk_bytes = to_fixed_width_be(public_key, width);

    match spec.family {
        SignFamily::Nist => {
            let curve = match spec.curve {
                Some(c) => c,
                None => return false,
            };
            nist::verify_prehash(curve, &pk_bytes, digest, &sig_bytes)
        }
        SignFamily::Rsa => {
            let Some(pk) = rsa_provider::decode_public_key(public_key, width) else { return false };
            rsa_provider::verify_prehash(&pk, hash_func, digest, &sig_bytes)
        }
    }
}

/// Render `value` as big-endian bytes padded or truncated to exactly `width`
/// bytes, matching Python's `int.to_bytes(width, "big")` semantics for
/// values that already fit.
fn to_fixed_width_be(value: &BigUint, width: usize) -> Vec<u8> {
    let raw = value.to_bytes_be();
    if raw.len() >= width {
        return raw[raw.len() - width..].to_vec();
    }
    let mut out = vec![0u8; width - raw.len()];
    out.extend_from_slice(&raw);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_digest_bytes_match_name() {
        assert_eq!(HashFunc::Sha3_256.digest_bytes(), HashFunc::Sha3_256.hash(b"x").len());
        assert_eq!(HashFunc::Sha3_512.digest_bytes(), HashFunc::Sha3_512.hash(b"x").len());
    }

    #[test]
    fn nist_keypair_sign_verify_round_trip() {
        let spec = SignSpec::parse("NIST256").unwrap();
        let kp = KeyPair::generate(spec).unwrap();
        let digest = HashFunc::Sha3_256.hash(b"payload");
        let sig = kp.sign_digest(HashFunc::Sha3_256, &digest).unwrap();
        let pk = kp.public_key_biguint().unwrap();
        assert!(verify_digest(spec, HashFunc::Sha3_256, &pk, &digest, &sig));
    }

    #[test]
    fn rsa_keypair_sign_verify_round_trip() {
        let spec = SignSpec::parse("RSA1024").unwrap();
        let kp = KeyPair::generate(spec).unwrap();
        let digest = HashFunc::Sha3_256.hash(b"payload");
        let sig = kp.sign_digest(HashFunc::Sha3_256, &digest).unwrap();
        let pk = kp.public_key_biguint().unwrap();
        assert!(verify_digest(spec, HashFunc::Sha3_256, &pk, &digest, &sig));
    }
}
