//! Gateway configuration.
//!
//! Settings structs with environment-variable loading.

mod settings;

pub use settings::{
    CacheSettings, GatewayConfig, ProviderSettings, ServerSettings, StreamSettings,
};
