//! Typed rows of the `dds` vault.
//!
//! # Responsibility
//! - Define one record per vault table (hubs, satellite, link).
//! - Validate surrogate keys before they reach SQL.
//!
//! # Invariants
//! - Every `*_hash` value is a `HashKey`; raw strings never cross the
//!   repository boundary.

pub mod hub;
pub mod key;
pub mod link;
pub mod satellite;
