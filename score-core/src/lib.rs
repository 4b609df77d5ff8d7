//! Shared primitives for the zero-knowledge credit-score pipeline:
//! circuit-fixed constants, the piecewise-linear logarithm table, scaled
//! integer helpers, BN254 field elements, and the typed error surface.
//!
//! Every numeric operation exposed here is required to be bit-exact with
//! the arithmetic circuit that ultimately consumes a witness built from it.
//! See [`logscale`] and [`constants`] before touching either module.

#![forbid(unsafe_code)]

pub mod address;
pub mod constants;
pub mod error;
pub mod field;
pub mod logscale;
pub mod scaled;

pub use error::{Result, ScoreError};
