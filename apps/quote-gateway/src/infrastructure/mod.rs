//! Infrastructure layer - Adapters and external integrations.

/// Chart response cache.
pub mod cache;
/// Configuration loading.
pub mod config;
/// HTTP/SSE API server.
pub mod http;
/// Per-subscriber quote streaming.
pub mod stream;
/// Yahoo Finance upstream adapter.
pub mod yahoo;
