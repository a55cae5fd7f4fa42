//! Token Builder / Validator.
//!
//! Emits and checks token entities stored in a document's meta-bundle. A
//! token binds a bundle's canonical bytes to a signature, a timestamp, a
//! signature over that timestamp, and the signer's public key. Verification
//! never throws: every failure mode collapses to `false`, which the search
//! engine turns into a low-credibility or invalid classification rather
//! than an aborted run.

use num_bigint::BigUint;
use time::format_description::well_known::Iso8601;
use time::OffsetDateTime;

use crate::crypto::{self, HashFunc, KeyPair};
use crate::determinism::canonical;
use crate::errors::{ProvError, ProvResult};
use crate::model::{AttrValue, Bundle, QName, Record};
use crate::signspec::SignSpec;

/// Attribute localparts stored on a token entity, unprefixed.
pub mod attrs {
    pub const HASH_FUNC: &str = "hash_func";
    pub const HASH: &str = "hash";
    pub const SIGN_FUNC: &str = "sign_func";
    pub const SIGN: &str = "sign";
    pub const TIMESTAMP: &str = "timestamp";
    pub const SIGN_TIME: &str = "sign_time";
    pub const PUBLIC_KEY: &str = "public_key";
    pub const ENCODING: &str = "encoding";
    pub const EXPIRE_IN_DAYS: &str = "expire_in_days";
}

/// Emit a token entity for `bundle` into `meta`, returning the token record.
///
/// Returns `Ok(None)` when `bundle` is null or shares the meta-bundle's id
/// (nothing to sign), matching the original's silent skip.
pub fn sign_bundle(
    meta_id: &QName,
    bundle: &Bundle,
    keypair: &KeyPair,
    hash_func: HashFunc,
    encoding: &str,
    prefix: &str,
    expire_in_days: i64,
) -> ProvResult<Option<Record>> {
    if &bundle.id == meta_id {
        return Ok(None);
    }

    let now = OffsetDateTime::now_utc();
    let timestamp = now
        .format(&Iso8601::DEFAULT)
        .map_err(|e| ProvError::configuration(format!("failed to format timestamp: {e}")))?;

    let canonical_bytes = canonical::canonical_bytes(Some(bundle), encoding)?;
    let hash = hash_func.hash(&canonical_bytes);
    let hash_int = BigUint::from_bytes_be(&hash);

    let spec = keypair.spec();
    let signature = keypair.sign_digest(hash_func, &hash)?;
    let sign_time = keypair.sign_digest(hash_func, &hash_func.hash(timestamp.as_bytes()))?;
    let public_key = keypair.public_key_biguint()?;

    check_fits(&hash_int, hash_func.digest_bytes())?;
    check_fits(&signature, spec.byte_width())?;
    check_fits(&sign_time, spec.byte_width())?;

    let id = QName::new(format!("{}token", bundle.id.local));
    let attrs = vec![
        (QName::prefixed(prefix, attrs::HASH_FUNC), AttrValue::Str(hash_func.name().to_string())),
        (QName::prefixed(prefix, attrs::HASH), AttrValue::BigUint(hash_int)),
        (QName::prefixed(prefix, attrs::SIGN_FUNC), AttrValue::Str(sign_func_name(spec))),
        (QName::prefixed(prefix, attrs::SIGN), AttrValue::BigUint(signature)),
        (QName::prefixed(prefix, attrs::TIMESTAMP), AttrValue::Str(timestamp)),
        (QName::prefixed(prefix, attrs::SIGN_TIME), AttrValue::BigUint(sign_time)),
        (QName::prefixed(prefix, attrs::PUBLIC_KEY), AttrValue::BigUint(public_key)),
        (QName::prefixed(prefix, attrs::ENCODING), AttrValue::Str(encoding.to_string())),
        (QName::prefixed(prefix, attrs::EXPIRE_IN_DAYS), AttrValue::Int(expire_in_days)),
    ];

    Ok(Some(Record::entity(id, attrs)))
}

fn check_fits(value: &BigUint, width_bytes: usize) -> ProvResult<()> {
    if value.to_bytes_be().len() > width_bytes {
        return Err(ProvError::overflow(
            "hash or signature integer is too big for the configured signature width; \
             lower the hash size or increase the key size",
        ));
    }
    Ok(())
}

fn sign_func_name(spec: SignSpec) -> String {
    match spec.family {
        crate::signspec::SignFamily::Nist => format!("NIST{}", spec.bits),
        crate::signspec::SignFamily::Rsa => format!("RSA{}", spec.bits),
    }
}

/// Validate a token record against the bundle it claims to attest.
///
/// Every failure mode (missing/malformed attribute, bad public key, bad
/// signature, hash mismatch, expiry) returns `false`; nothing here throws.
pub fn validate_record(bundle: &Bundle, token: &Record, prefix: &str, now: OffsetDateTime) -> bool {
    let Some(fields) = extract_fields(token, prefix) else { return false };

    let Ok(spec) = SignSpec::parse(&fields.sign_func) else { return false };
    let Ok(hash_func) = HashFunc::parse(&fields.hash_func) else { return false };

    let Ok(canonical_bytes) = canonical::canonical_bytes(Some(bundle), &fields.encoding) else {
        return false;
    };
    let actual_hash = hash_func.hash(&canonical_bytes);
    if actual_hash != fields.hash.to_bytes_be() {
        return false;
    }

    if !crypto::verify_digest(spec, hash_func, &fields.public_key, &actual_hash, &fields.sign) {
        return false;
    }
    let time_digest = hash_func.hash(fields.timestamp.as_bytes());
    if !crypto::verify_digest(spec, hash_func, &fields.public_key, &time_digest, &fields.sign_time) {
        return false;
    }

    let Ok(issued) = OffsetDateTime::parse(&fields.timestamp, &Iso8601::DEFAULT) else { return false };
    let expiry = issued + time::Duration::days(fields.expire_in_days);
    if expiry <= now {
        return false;
    }

    true
}

struct TokenFields {
    hash_func: String,
    hash: BigUint,
    sign_func: String,
    sign: BigUint,
    timestamp: String,
    sign_time: BigUint,
    public_key: BigUint,
    encoding: String,
    expire_in_days: i64,
}

fn extract_fields(token: &Record, prefix: &str) -> Option<TokenFields> {
    let _ = prefix; // attribute lookup is by localpart; prefix is informational only
    Some(TokenFields {
        hash_func: token.get_attribute(attrs::HASH_FUNC)?.as_str()?.to_string(),
        hash: token.get_attribute(attrs::HASH)?.as_biguint()?.clone(),
        sign_func: token.get_attribute(attrs::SIGN_FUNC)?.as_str()?.to_string(),
        sign: token.get_attribute(attrs::SIGN)?.as_biguint()?.clone(),
        timestamp: token.get_attribute(attrs::TIMESTAMP)?.as_str()?.to_string(),
        sign_time: token.get_attribute(attrs::SIGN_TIME)?.as_biguint()?.clone(),
        public_key: token.get_attribute(attrs::PUBLIC_KEY)?.as_biguint()?.clone(),
        encoding: token.get_attribute(attrs::ENCODING)?.as_str()?.to_string(),
        expire_in_days: token.get_attribute(attrs::EXPIRE_IN_DAYS)?.as_i64()?,
    })
}

/// Find the single token in `meta` that claims to attest `bundle`, and
/// report whether it verifies. Returns `false` if there is zero or more
/// than one matching token, matching the "exactly one" invariant.
pub fn valid_bundle(meta: &Bundle, bundle: &Bundle, prefix: &str, now: OffsetDateTime) -> bool {
    let candidates: Vec<&Record> = meta
        .get_records(crate::model::RecordKind::Derivation)
        .filter(|r| r.has_type("Token") && r.used_entity() == Some(&bundle.id))
        .filter_map(|r| r.generated_entity())
        .filter_map(|id| meta.get_record(id))
        .collect();

    match candidates.as_slice() {
        [token] => validate_record(bundle, token, prefix, now),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::META_BUNDLE_ID;

    fn sample_bundle() -> Bundle {
        let mut b = Bundle::new(QName::new("bundle1"));
        b.push(Record::entity(QName::new("entity1"), vec![(QName::new("label"), "v1".into())]));
        b
    }

    #[test]
    fn sign_then_validate_round_trips() {
        let spec = SignSpec::parse("NIST256").unwrap();
        let kp = KeyPair::generate(spec).unwrap();
        let bundle = sample_bundle();
        let meta_id = QName::new(META_BUNDLE_ID);

        let token = sign_bundle(&meta_id, &bundle, &kp, HashFunc::Sha3_256, "UTF-8", "ex", 1)
            .unwrap()
            .unwrap();

        assert!(validate_record(&bundle, &token, "ex", OffsetDateTime::now_utc()));
    }

    #[test]
    fn tampering_with_bundle_invalidates_token() {
        let spec = SignSpec::parse("NIST256").unwrap();
        let kp = KeyPair::generate(spec).unwrap();
        let bundle = sample_bundle();
        let meta_id = QName::new(META_BUNDLE_ID);
        let token = sign_bundle(&meta_id, &bundle, &kp, HashFunc::Sha3_256, "UTF-8", "ex", 1)
            .unwrap()
            .unwrap();

        let mut tampered = bundle.clone();
        tampered.records[0].attrs[0].1 = "v2".into();
        assert!(!validate_record(&tampered, &token, "ex", OffsetDateTime::now_utc()));
    }

    #[test]
    fn expired_token_is_invalid() {
        let spec = SignSpec::parse("NIST256").unwrap();
        let kp = KeyPair::generate(spec).unwrap();
        let bundle = sample_bundle();
        let meta_id = QName::new(META_BUNDLE_ID);
        let token = sign_bundle(&meta_id, &bundle, &kp, HashFunc::Sha3_256, "UTF-8", "ex", 1)
            .unwrap()
            .unwrap();

        let far_future = OffsetDateTime::now_utc() + time::Duration::days(30);
        assert!(!validate_record(&bundle, &token, "ex", far_future));
    }

    #[test]
    fn meta_bundle_is_skipped() {
        let meta_id = QName::new(META_BUNDLE_ID);
        let meta_bundle = Bundle::new(meta_id.clone());
        let spec = SignSpec::parse("NIST256").unwrap();
        let kp = KeyPair::generate(spec).unwrap();
        let result = sign_bundle(&meta_id, &meta_bundle, &kp, HashFunc::Sha3_256, "UTF-8", "ex", 1).unwrap();
        assert!(result.is_none());
    }
}
