//! BN254 scalar field elements.
//!
//! Every witness scalar must satisfy `0 <= x < p`. [`FieldElement`] enforces
//! this at construction time by reducing rather than rejecting: negative
//! intermediates are clamped to zero upstream, and oversized values are
//! reduced modulo `p`.
//! Serialization emits a decimal string so round-tripping through JSON
//! never loses precision the way a bare `u64`/`f64` would for 256-bit
//! values.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use num_traits::Zero;
use once_cell::sync::Lazy;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::BN254_PRIME_DECIMAL;
use crate::error::ScoreError;

/// The BN254 scalar field modulus.
pub static BN254_PRIME: Lazy<BigUint> =
    Lazy::new(|| BigUint::from_str(BN254_PRIME_DECIMAL).expect("valid prime literal"));

/// A value known to be `< p`, the BN254 scalar field modulus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldElement(BigUint);

impl FieldElement {
    /// Construct from an already-nonnegative integer, reducing modulo `p`
    /// if it does not fit. Matches the source's `safe_int`: never errors,
    /// always produces an in-range element.
    pub fn from_nonnegative(value: BigUint) -> Self {
        let prime = BN254_PRIME.clone();
        if value >= prime {
            FieldElement(value % prime)
        } else {
            FieldElement(value)
        }
    }

    /// Construct from an `i64`, clamping negative values to zero before
    /// encoding, per the witness field-bounds discipline.
    pub fn from_i64_clamped(value: i64) -> Self {
        let nonneg = if value < 0 { 0u64 } else { value as u64 };
        Self::from_nonnegative(BigUint::from(nonneg))
    }

    /// Construct from a value already believed to be in range, returning an
    /// `OutOfRange` error instead of silently reducing. Used at validation
    /// boundaries (e.g. nonces) where silent reduction would hide a
    /// programmer error rather than an expected large value.
    pub fn try_from_strict(value: BigUint) -> Result<Self, ScoreError> {
        if value >= *BN254_PRIME {
            Err(ScoreError::OutOfRange {
                value: value.to_string(),
                bound: BN254_PRIME.to_string(),
            })
        } else {
            Ok(FieldElement(value))
        }
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let value = BigUint::from_str(&s).map_err(D::Error::custom)?;
        if value >= *BN254_PRIME {
            return Err(D::Error::custom(format!(
                "field element {value} exceeds BN254 modulus"
            )));
        }
        Ok(FieldElement(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_oversized_values() {
        let huge = BN254_PRIME.clone() + BigUint::from(5u32);
        let reduced = FieldElement::from_nonnegative(huge);
        assert_eq!(reduced.as_biguint(), &BigUint::from(5u32));
    }

    #[test]
    fn clamps_negative_to_zero() {
        let fe = FieldElement::from_i64_clamped(-42);
        assert!(fe.is_zero());
    }

    #[test]
    fn strict_rejects_out_of_range() {
        let huge = BN254_PRIME.clone();
        assert!(FieldElement::try_from_strict(huge).is_err());
    }

    #[test]
    fn serializes_as_decimal_string() {
        let fe = FieldElement::from_i64_clamped(12345);
        let json = serde_json::to_string(&fe).unwrap();
        assert_eq!(json, "\"12345\"");
    }
}
