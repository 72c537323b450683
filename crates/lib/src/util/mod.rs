//! Shared utilities.
//!
//! Hashing helpers used to fingerprint emitted record streams.

pub mod hash;
