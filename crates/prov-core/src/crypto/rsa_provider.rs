//! RSA PKCS#1 v1.5 signing.
//!
//! Public keys cross the storage boundary as a big-endian unsigned integer
//! (see the Open Question in the spec about RSA public-key encoding): the
//! key is encoded as a DER SubjectPublicKeyInfo blob, then that blob's bytes
//! are interpreted as one big-endian integer. This is lossless and
//! self-describing (the DER carries the modulus and exponent), unlike
//! packing the raw modulus alone, which would lose the exponent.

use num_bigint::BigUint;
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use rsa::signature::SignatureEncoding;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha3::{Sha3_256, Sha3_384, Sha3_512};

use crate::crypto::HashFunc;
use crate::errors::{ProvError, ProvResult};

pub struct RsaKeyPair {
    private: RsaPrivateKey,
    public: RsaPublicKey,
}

impl RsaKeyPair {
    pub fn generate(bits: u32) -> ProvResult<Self> {
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits as usize)
            .map_err(|e| ProvError::configuration(format!("rsa key generation failed: {e}")))?;
        let public = RsaPublicKey::from(&private);
        Ok(Self { private, public })
    }

    /// Public key encoded as DER SPKI, read back as one big-endian integer.
    pub fn public_key_biguint(&self) -> ProvResult<BigUint> {
        let der = self
            .public
            .to_public_key_der()
            .map_err(|e| ProvError::configuration(format!("rsa public key encoding failed: {e}")))?;
        Ok(BigUint::from_bytes_be(der.as_bytes()))
    }

    pub fn sign(&self, hash_func: HashFunc, digest: &[u8]) -> ProvResult<Vec<u8>> {
        let sig = match hash_func {
            HashFunc::Sha3_256 => {
                let key = SigningKey::<Sha3_256>::new(self.private.clone());
                key.sign_prehash(digest)
                    .map_err(|e| ProvError::configuration(format!("rsa signing failed: {e}")))?
                    .to_vec()
            }
            HashFunc::Sha3_384 => {
                let key = SigningKey::<Sha3_384>::new(self.private.clone());
                key.sign_prehash(digest)
                    .map_err(|e| ProvError::configuration(format!("rsa signing failed: {e}")))?
                    .to_vec()
            }
            HashFunc::Sha3_512 => {
                let key = SigningKey::<Sha3_512>::new(self.private.clone());
                key.sign_prehash(digest)
                    .map_err(|e| ProvError::configuration(format!("rsa signing failed: {e}")))?
                    .to_vec()
            }
        };
        Ok(sig)
    }
}

/// Decode a DER-SPKI-as-big-endian-integer public key back into an `RsaPublicKey`.
pub fn decode_public_key(public_key: &BigUint, byte_width: usize) -> Option<RsaPublicKey> {
    let der = public_key.to_bytes_be();
    let mut padded = vec![0u8; byte_width.saturating_sub(der.len())];
    padded.extend_from_slice(&der);
    RsaPublicKey::from_public_key_der(&padded).ok()
}

/// Verify a pre-hashed digest's signature. Never panics; malformed input
/// (bad DER, wrong signature length) yields `false`.
pub fn verify_prehash(public_key: &RsaPublicKey, hash_func: HashFunc, digest: &[u8], signature: &[u8]) -> bool {
    let Ok(sig) = Signature::try_from(signature) else { return false };
    match hash_func {
        HashFunc::Sha3_256 => VerifyingKey::<Sha3_256>::new(public_key.clone())
            .verify_prehash(digest, &sig)
            .is_ok(),
        HashFunc::Sha3_384 => VerifyingKey::<Sha3_384>::new(public_key.clone())
            .verify_prehash(digest, &sig)
            .is_ok(),
        HashFunc::Sha3_512 => VerifyingKey::<Sha3_512>::new(public_key.clone())
            .verify_prehash(digest, &sig)
            .is_ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let kp = RsaKeyPair::generate(1024).unwrap();
        let digest = HashFunc::Sha3_256.hash(b"hello bundle");
        let sig = kp.sign(HashFunc::Sha3_256, &digest).unwrap();
        assert!(verify_prehash(&kp.public, HashFunc::Sha3_256, &digest, &sig));

        let mut tampered = digest.clone();
        tampered[0] ^= 0xFF;
        assert!(!verify_prehash(&kp.public, HashFunc::Sha3_256, &tampered, &sig));
    }

    #[test]
    fn public_key_round_trips_through_biguint() {
        let kp = RsaKeyPair::generate(1024).unwrap();
        let encoded = kp.public_key_biguint().unwrap();
        let width = encoded.to_bytes_be().len();
        let decoded = decode_public_key(&encoded, width).unwrap();
        assert_eq!(decoded, kp.public);
    }
}
