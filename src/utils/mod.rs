//! Utilities Module
//!
//! Digest helpers and the structured logger.

pub mod crypto;
pub mod logging;

pub use crypto::*;
