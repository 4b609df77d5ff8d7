//! Circuit-fixed constants.
//!
//! Every value in this module is an artifact of the downstream arithmetic
//! circuit: the piecewise-linear logarithm table, the BN254 scalar field
//! prime, and the fixed-point scale. None of these are tunable from this
//! crate. Changing any of them without rebuilding the circuit breaks proof
//! generation; a change here requires bumping [`VERSION_ID`].

/// Implicit fixed-point denominator used throughout the engine and witness.
pub const SCALE: i64 = 1000;

/// Base score before any component contribution, already scaled by [`SCALE`].
pub const BASE_SCORE_SCALED: i64 = 300 * SCALE;

/// Maximum scaled score (900 * SCALE).
pub const MAX_SCORE_SCALED: i64 = 900 * SCALE;

/// Circuit witness / nullifier format version. Bump when the logarithm
/// table, field layout, or scaling discipline changes.
pub const VERSION_ID: u64 = 1;

/// Piecewise-linear log breakpoints, shared between the scoring engine and
/// the witness validator (Design Notes: "encode them as named constants in
/// one module shared by the engine and the witness validator").
pub const LOG_BREAKPOINTS: [i64; 3] = [10, 100, 1000];

/// `log_base` constants for the three circuit bases: balance (11), age
/// (731), transaction count (1001).
pub const LOG_BASE_11: i64 = 2398;
pub const LOG_BASE_731: i64 = 6594;
pub const LOG_BASE_1001: i64 = 6909;

/// Piecewise-linear slope numerators for each of the four segments.
pub const LOG_SLOPE_NUMERATORS: [i64; 4] = [693, 223, 246, 231];
/// Corresponding slope denominators for each of the four segments.
pub const LOG_SLOPE_DENOMINATORS: [i64; 4] = [1000, 10_000, 100_000, 1_000_000];
/// Accumulated offsets at each breakpoint (segment 0 starts at 0).
pub const LOG_OFFSETS: [i64; 4] = [0, 2398, 4615, 6908];

/// BN254 (alt_bn128) scalar field modulus. Every witness scalar must satisfy
/// `0 <= x < BN254_PRIME_DECIMAL`.
pub const BN254_PRIME_DECIMAL: &str =
    "21888242871839275222246405745257275088548364400416034343698204186575808495617";

/// The three circuit "base" parameters accepted by [`crate::logscale::logscale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogBase {
    /// Balance scaling (log base 11).
    Balance,
    /// Wallet-age scaling (log base 731).
    Age,
    /// Transaction-count scaling (log base 1001).
    TransactionCount,
}

impl LogBase {
    pub const fn raw(self) -> i64 {
        match self {
            LogBase::Balance => 11,
            LogBase::Age => 731,
            LogBase::TransactionCount => 1001,
        }
    }

    pub const fn log_base_scaled(self) -> i64 {
        match self {
            LogBase::Balance => LOG_BASE_11,
            LogBase::Age => LOG_BASE_731,
            LogBase::TransactionCount => LOG_BASE_1001,
        }
    }
}
