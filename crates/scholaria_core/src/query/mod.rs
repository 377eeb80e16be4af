//! Search option normalization and field projection.
//!
//! # Responsibility
//! - Turn raw, possibly-missing search parameters into bounded options.
//! - Shape result documents to the requested field list.

pub mod options;
pub mod projection;
