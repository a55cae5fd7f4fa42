//! Sign-Spec Parser.
//!
//! Parses strings of the form `<letters><digits>` — `NIST256`, `RSA2048` —
//! into a signature family, bit width, and (for NIST) curve. The resulting
//! byte width is the exact length used to encode and decode signature blobs
//! and public keys as big-endian integers everywhere else in this crate.

use crate::errors::{ProvError, ProvResult};

/// The two supported signature families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignFamily {
    Nist,
    Rsa,
}

/// The NIST curves this engine supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NistCurve {
    P192,
    P256,
    P384,
    P521,
}

impl NistCurve {
    /// Bit size of the curve's field (not the doubled signature width).
    pub fn curve_bits(&self) -> u32 {
        match self {
            NistCurve::P192 => 192,
            NistCurve::P256 => 256,
            NistCurve::P384 => 384,
            NistCurve::P521 => 521,
        }
    }
}

/// A parsed signing algorithm specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignSpec {
    pub family: SignFamily,
    /// For RSA, the modulus bit size. For NIST, `curve_bits` (kept for
    /// display/round-trip of the original spec string).
    pub bits: u32,
    pub curve: Option<NistCurve>,
}

impl SignSpec {
    /// Parse a spec string like `NIST256` or `RSA2048`.
    pub fn parse(spec: &str) -> ProvResult<Self> {
        let split_at = spec.find(|c: char| c.is_ascii_digit());
        let Some(split_at) = split_at else {
            return Err(ProvError::configuration(format!("invalid sign algorithm: {spec}")));
        };
        if split_at == 0 {
            return Err(ProvError::configuration(format!("invalid sign algorithm: {spec}")));
        }
        let family_str = &spec[..split_at];
        let bits_str = &spec[split_at..];
        if !bits_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProvError::configuration(format!("invalid sign algorithm: {spec}")));
        }
        let bits: u32 = bits_str
            .parse()
            .map_err(|_| ProvError::configuration(format!("invalid sign algorithm: {spec}")))?;

        match family_str {
            "NIST" => {
                let curve = match bits {
                    192 => NistCurve::P192,
                    256 => NistCurve::P256,
                    384 => NistCurve::P384,
                    521 => NistCurve::P521,
                    other => {
                        return Err(ProvError::configuration(format!(
                            "unsupported NIST curve bit size: {other}"
                        )))
                    }
                };
                Ok(Self { family: SignFamily::Nist, bits: curve.curve_bits(), curve: Some(curve) })
            }
            "RSA" => Ok(Self { family: SignFamily::Rsa, bits, curve: None }),
            other => Err(ProvError::configuration(format!("unknown sign family: {other}"))),
        }
    }

    /// Exact byte width used to encode/decode signatures and public keys.
    ///
    /// NIST: `2 * ceil(curve_bits / 8)` (the concatenated `r||s` signature
    /// width, also used for the uncompressed point encoding of the public
    /// key). RSA: `bits / 8` (the modulus width).
    pub fn byte_width(&self) -> usize {
        match self.family {
            SignFamily::Nist => {
                let curve_bits = self.curve.expect("NIST spec always carries a curve").curve_bits();
                2 * ((curve_bits as usize + 7) / 8)
            }
            SignFamily::Rsa => self.bits as usize / 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nist256() {
        let s = SignSpec::parse("NIST256").unwrap();
        assert_eq!(s.family, SignFamily::Nist);
        assert_eq!(s.curve, Some(NistCurve::P256));
        assert_eq!(s.byte_width(), 64);
    }

    #[test]
    fn parses_nist521_rounds_up() {
        let s = SignSpec::parse("NIST521").unwrap();
        assert_eq!(s.byte_width(), 2 * 66);
    }

    #[test]
    fn parses_rsa2048() {
        let s = SignSpec::parse("RSA2048").unwrap();
        assert_eq!(s.family, SignFamily::Rsa);
        assert_eq!(s.byte_width(), 256);
    }

    #[test]
    fn rejects_unknown_curve_size() {
        assert!(SignSpec::parse("NIST128").is_err());
    }

    #[test]
    fn rejects_malformed_spec() {
        assert!(SignSpec::parse("256").is_err());
        assert!(SignSpec::parse("NIST").is_err());
        assert!(SignSpec::parse("").is_err());
    }
}
