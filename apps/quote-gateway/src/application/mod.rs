//! Application layer - Port definitions and composing services.

/// Market data provider port and error taxonomy.
pub mod ports;
/// Services composing ports with caching.
pub mod services;
