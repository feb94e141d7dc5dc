// crates/loadgate-config/src/lib.rs
// ============================================================================
// Module: Load Gate Config Library
// Description: Canonical config model, validation, and credential store.
// Purpose: Single source of truth for loadgate.toml semantics.
// Dependencies: loadgate-core, loadgate-client, serde, toml
// ============================================================================

//! ## Overview
//! `loadgate-config` defines the configuration model for Load Gate. It
//! provides strict, fail-closed loading and validation, and materializes the
//! configured API keys into credentials for the resolver.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
