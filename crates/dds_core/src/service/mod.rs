//! Vault use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls that span several vault tables.
//! - Keep CLI callers decoupled from SQL and transaction details.

pub mod post_service;
