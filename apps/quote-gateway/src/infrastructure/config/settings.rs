//! Gateway configuration settings, loaded from environment variables.

use std::time::Duration;

/// Upstream provider settings.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Upstream API base URL.
    pub base_url: String,
    /// Hard per-request deadline.
    pub request_timeout: Duration,
    /// Minimum spacing between outbound requests.
    pub min_request_spacing: Duration,
    /// Chart fetch attempts before surfacing the last error.
    pub chart_retry_attempts: u32,
    /// Base delay for the linear chart retry backoff.
    pub chart_retry_base_delay: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            request_timeout: Duration::from_secs(30),
            min_request_spacing: Duration::from_secs(5),
            chart_retry_attempts: 3,
            chart_retry_base_delay: Duration::from_secs(3),
        }
    }
}

/// Chart cache settings.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// Entry time-to-live.
    pub ttl: Duration,
    /// Maximum resident entries (0 = unbounded).
    pub capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 0,
        }
    }
}

/// Per-subscriber stream cadence settings.
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Data tick period while the market is open.
    pub open_interval: Duration,
    /// Data tick period while the market is closed.
    pub closed_interval: Duration,
    /// Keep-alive frame period, independent of market status.
    pub heartbeat_interval: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            open_interval: Duration::from_secs(10),
            closed_interval: Duration::from_secs(60),
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// Listen port.
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { port: 8025 }
    }
}

/// Complete gateway configuration.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Upstream provider settings.
    pub provider: ProviderSettings,
    /// Chart cache settings.
    pub cache: CacheSettings,
    /// Stream cadence settings.
    pub stream: StreamSettings,
}

impl GatewayConfig {
    /// Build configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            server: ServerSettings {
                port: parse_env_u16("QUOTE_GATEWAY_PORT", defaults.server.port),
            },
            provider: ProviderSettings {
                base_url: std::env::var("QUOTE_GATEWAY_UPSTREAM_URL")
                    .unwrap_or(defaults.provider.base_url),
                request_timeout: parse_env_duration_secs(
                    "QUOTE_GATEWAY_UPSTREAM_TIMEOUT_SECS",
                    defaults.provider.request_timeout,
                ),
                min_request_spacing: parse_env_duration_millis(
                    "QUOTE_GATEWAY_REQUEST_SPACING_MS",
                    defaults.provider.min_request_spacing,
                ),
                chart_retry_attempts: parse_env_u32(
                    "QUOTE_GATEWAY_CHART_RETRY_ATTEMPTS",
                    defaults.provider.chart_retry_attempts,
                ),
                chart_retry_base_delay: parse_env_duration_millis(
                    "QUOTE_GATEWAY_CHART_RETRY_BASE_MS",
                    defaults.provider.chart_retry_base_delay,
                ),
            },
            cache: CacheSettings {
                ttl: parse_env_duration_secs("QUOTE_GATEWAY_CACHE_TTL_SECS", defaults.cache.ttl),
                capacity: parse_env_usize("QUOTE_GATEWAY_CACHE_CAPACITY", defaults.cache.capacity),
            },
            stream: StreamSettings {
                open_interval: parse_env_duration_secs(
                    "QUOTE_GATEWAY_OPEN_INTERVAL_SECS",
                    defaults.stream.open_interval,
                ),
                closed_interval: parse_env_duration_secs(
                    "QUOTE_GATEWAY_CLOSED_INTERVAL_SECS",
                    defaults.stream.closed_interval,
                ),
                heartbeat_interval: parse_env_duration_secs(
                    "QUOTE_GATEWAY_HEARTBEAT_SECS",
                    defaults.stream.heartbeat_interval,
                ),
            },
        }
    }
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_defaults() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.request_timeout, Duration::from_secs(30));
        assert_eq!(settings.min_request_spacing, Duration::from_secs(5));
        assert_eq!(settings.chart_retry_attempts, 3);
        assert_eq!(settings.chart_retry_base_delay, Duration::from_secs(3));
    }

    #[test]
    fn cache_defaults() {
        let settings = CacheSettings::default();
        assert_eq!(settings.ttl, Duration::from_secs(300));
        assert_eq!(settings.capacity, 0);
    }

    #[test]
    fn stream_defaults() {
        let settings = StreamSettings::default();
        assert_eq!(settings.open_interval, Duration::from_secs(10));
        assert_eq!(settings.closed_interval, Duration::from_secs(60));
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(30));
    }
}
