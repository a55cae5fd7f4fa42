//! ECDSA over the four supported NIST curves.
//!
//! Signing is done over a pre-hashed digest so the hash function (SHA3-256,
//! SHA3-384, or SHA3-512, per process configuration) is decoupled from the
//! curve, via `ecdsa`'s hazmat `PrehashSigner`/`PrehashVerifier` traits.
//! Signatures are the raw `r||s` concatenation; public keys are the
//! uncompressed point with its leading `0x04` tag stripped, matching the
//! byte widths computed by `signspec::SignSpec::byte_width`.

use ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use ecdsa::signature::Signer as _;
use elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;

use crate::errors::{ProvError, ProvResult};
use crate::signspec::NistCurve;

pub enum NistSigningKey {
    P192(p192::ecdsa::SigningKey),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
}

impl NistSigningKey {
    pub fn generate(curve: NistCurve) -> Self {
        match curve {
            NistCurve::P192 => NistSigningKey::P192(p192::ecdsa::SigningKey::random(&mut OsRng)),
            NistCurve::P256 => NistSigningKey::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            NistCurve::P384 => NistSigningKey::P384(p384::ecdsa::SigningKey::random(&mut OsRng)),
            NistCurve::P521 => NistSigningKey::P521(p521::ecdsa::SigningKey::random(&mut OsRng)),
        }
    }

    pub fn curve(&self) -> NistCurve {
        match self {
            NistSigningKey::P192(_) => NistCurve::P192,
            NistSigningKey::P256(_) => NistCurve::P256,
            NistSigningKey::P384(_) => NistCurve::P384,
            NistSigningKey::P521(_) => NistCurve::P521,
        }
    }

    /// Uncompressed public key point, `x||y`, tag byte stripped.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            NistSigningKey::P192(sk) => {
                strip_tag(sk.verifying_key().to_encoded_point(false).as_bytes())
            }
            NistSigningKey::P256(sk) => {
                strip_tag(sk.verifying_key().to_encoded_point(false).as_bytes())
            }
            NistSigningKey::P384(sk) => {
                strip_tag(sk.verifying_key().to_encoded_point(false).as_bytes())
            }
            NistSigningKey::P521(sk) => {
                strip_tag(sk.verifying_key().to_encoded_point(false).as_bytes())
            }
        }
    }

    /// Sign a pre-computed digest, returning the raw `r||s` bytes.
    pub fn sign_prehash(&self, digest: &[u8]) -> ProvResult<Vec<u8>> {
        let map_err = |e: ecdsa::Error| ProvError::configuration(format!("ecdsa signing failed: {e}"));
        match self {
            NistSigningKey::P192(sk) => {
                let sig: p192::ecdsa::Signature = sk.sign_prehash(digest).map_err(map_err)?;
                Ok(sig.to_bytes().to_vec())
            }
            NistSigningKey::P256(sk) => {
                let sig: p256::ecdsa::Signature = sk.sign_prehash(digest).map_err(map_err)?;
                Ok(sig.to_bytes().to_vec())
            }
            NistSigningKey::P384(sk) => {
                let sig: p384::ecdsa::Signature = sk.sign_prehash(digest).map_err(map_err)?;
                Ok(sig.to_bytes().to_vec())
            }
            NistSigningKey::P521(sk) => {
                let sig: p521::ecdsa::Signature = sk.sign_prehash(digest).map_err(map_err)?;
                Ok(sig.to_bytes().to_vec())
            }
        }
    }

    /// Sign an arbitrary message, letting the curve's own default digest
    /// (not the configured SHA3 family) apply. Used only for the rare case
    /// where a caller needs a non-prehashed signature; the token builder
    /// always goes through `sign_prehash`.
    #[allow(dead_code)]
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        match self {
            NistSigningKey::P192(sk) => sk.sign(message).to_bytes().to_vec(),
            NistSigningKey::P256(sk) => sk.sign(message).to_bytes().to_vec(),
            NistSigningKey::P384(sk) => sk.sign(message).to_bytes().to_vec(),
            NistSigningKey::P521(sk) => sk.sign(message).to_bytes().to_vec(),
        }
    }
}

fn strip_tag(encoded_point_bytes: &[u8]) -> Vec<u8> {
    encoded_point_bytes[1..].to_vec()
}

fn with_tag(xy: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(xy.len() + 1);
    buf.push(0x04);
    buf.extend_from_slice(xy);
    buf
}

/// Verify a pre-hashed digest's signature under a raw `x||y` public key.
/// Never panics; any malformed input (bad point, bad signature length)
/// yields `false` rather than propagating an error, matching the
/// non-fatal verification contract of the token validator.
pub fn verify_prehash(curve: NistCurve, public_key_xy: &[u8], digest: &[u8], signature: &[u8]) -> bool {
    match curve {
        NistCurve::P192 => {
            let Ok(point) = p192::EncodedPoint::from_bytes(with_tag(public_key_xy)) else { return false };
            let Ok(vk) = p192::ecdsa::VerifyingKey::from_encoded_point(&point) else { return false };
            let Ok(sig) = p192::ecdsa::Signature::try_from(signature) else { return false };
            vk.verify_prehash(digest, &sig).is_ok()
        }
        NistCurve::P256 => {
            let Ok(point) = p256::EncodedPoint::from_bytes(with_tag(public_key_xy)) else { return false };
            let Ok(vk) = p256::ecdsa::VerifyingKey::from_encoded_point(&point) else { return false };
            let Ok(sig) = p256::ecdsa::Signature::try_from(signature) else { return false };
            vk.verify_prehash(digest, &sig).is_ok()
        }
        NistCurve::P384 => {
            let Ok(point) = p384::EncodedPoint::from_bytes(with_tag(public_key_xy)) else { return false };
            let Ok(vk) = p384::ecdsa::VerifyingKey::from_encoded_point(&point) else { return false };
            let Ok(sig) = p384::ecdsa::Signature::try_from(signature) else { return false };
            vk.verify_prehash(digest, &sig).is_ok()
        }
        NistCurve::P521 => {
            let Ok(point) = p521::EncodedPoint::from_bytes(with_tag(public_key_xy)) else { return false };
            let Ok(vk) = p521::ecdsa::VerifyingKey::from_encoded_point(&point) else { return false };
            let Ok(sig) = p521::ecdsa::Signature::try_from(signature) else { return false };
            vk.verify_prehash(digest, &sig).is_ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::HashFunc;

    #[test]
    fn sign_then_verify_round_trips() {
        for curve in [NistCurve::P192, NistCurve::P256, NistCurve::P384, NistCurve::P521] {
            let sk = NistSigningKey::generate(curve);
            let digest = HashFunc::Sha3_256.hash(b"hello bundle");
            let sig = sk.sign_prehash(&digest).unwrap();
            let pk = sk.public_key_bytes();
            assert!(verify_prehash(curve, &pk, &digest, &sig));

            let mut tampered = digest.clone();
            tampered[0] ^= 0xFF;
            assert!(!verify_prehash(curve, &pk, &tampered, &sig));
        }
    }
}
