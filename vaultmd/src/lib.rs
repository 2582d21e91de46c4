//! Expose vaultmd's internal API for use in integration testing. The binary is
//! the supported interface; this API may change between releases.
pub mod build;
pub mod cli;
pub mod error;
pub mod vault;
