// crates/loadgate-client/src/lib.rs
// ============================================================================
// Module: Load Gate Client
// Description: HTTP implementation of the remote metrics client.
// Purpose: Reach the load-testing service for the Load Gate runtime.
// Dependencies: loadgate-core, reqwest, serde
// ============================================================================

//! ## Overview
//! This crate ships [`HttpMetricsClient`], a blocking HTTP client for the
//! remote load-testing service. It implements
//! [`loadgate_core::MetricsClient`] and enforces scheme restrictions,
//! disabled redirects, and response size limits so malformed or oversized
//! responses fail closed.
//!
//! Invariants:
//! - The API key is sent only in the configured request header.
//! - Response bodies above `max_response_bytes` are rejected unread.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod http;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use http::ClientConfigError;
pub use http::HttpClientConfig;
pub use http::HttpMetricsClient;
