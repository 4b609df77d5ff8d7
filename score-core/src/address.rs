//! Wallet addresses.

use ethereum_types::H160;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::field::FieldElement;

/// A 20-byte wallet address. Thin wrapper over [`H160`] so the rest of the
/// crate has one canonical address type instead of raw byte arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletAddress(pub H160);

impl WalletAddress {
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 20 {
            return None;
        }
        Some(WalletAddress(H160::from_slice(bytes)))
    }

    /// Interpret the 160-bit address as an unsigned integer field element,
    /// as the circuit's `userAddress` public input expects it.
    pub fn to_field_element(&self) -> FieldElement {
        let value = BigUint::from_bytes_be(self.0.as_bytes());
        FieldElement::from_nonnegative(value)
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(WalletAddress::from_bytes(&[0u8; 19]).is_none());
        assert!(WalletAddress::from_bytes(&[0u8; 21]).is_none());
    }

    #[test]
    fn converts_to_field_element() {
        let addr = WalletAddress::from_bytes(&[1u8; 20]).unwrap();
        let fe = addr.to_field_element();
        assert!(!fe.is_zero());
    }
}
