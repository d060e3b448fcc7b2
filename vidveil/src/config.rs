//! Application configuration from environment variables.

use std::time::Duration;

use engines_parser::{BrowserProfile, DEFAULT_USER_AGENT, TransportConfig};

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8087,
            enable_cors: true,
        }
    }
}

/// Search pipeline settings.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Per-engine total request timeout.
    pub engine_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: u64,
    pub user_agent: String,
    /// `None` disables TLS spoofing and uses the plain rustls client.
    pub browser_profile: Option<BrowserProfile>,
    /// Thumbnail proxy fetch timeout.
    pub thumbnail_timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            engine_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
            cache_capacity: 1_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            browser_profile: Some(BrowserProfile::Chrome),
            thumbnail_timeout: Duration::from_secs(10),
        }
    }
}

impl SearchConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            user_agent: self.user_agent.clone(),
            profile: self.browser_profile,
            timeout: self.engine_timeout,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    ///
    /// Supported env vars:
    /// - `VIDVEIL_BIND_ADDRESS`, `VIDVEIL_PORT`
    /// - `VIDVEIL_USER_AGENT`, `VIDVEIL_BROWSER_PROFILE` (chrome/firefox/edge/safari/randomized/none)
    /// - `VIDVEIL_ENGINE_TIMEOUT_SECS`, `VIDVEIL_CACHE_TTL_SECS`, `VIDVEIL_CACHE_CAPACITY`
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(bind_address) = std::env::var("VIDVEIL_BIND_ADDRESS")
            && !bind_address.trim().is_empty()
        {
            config.server.bind_address = bind_address;
        }
        if let Ok(port) = std::env::var("VIDVEIL_PORT")
            && let Ok(parsed) = port.parse::<u16>()
        {
            config.server.port = parsed;
        }
        if let Ok(ua) = std::env::var("VIDVEIL_USER_AGENT")
            && !ua.trim().is_empty()
        {
            config.search.user_agent = ua;
        }
        if let Ok(profile) = std::env::var("VIDVEIL_BROWSER_PROFILE") {
            config.search.browser_profile = if profile.eq_ignore_ascii_case("none") {
                None
            } else {
                BrowserProfile::parse(&profile).or(config.search.browser_profile)
            };
        }
        if let Ok(secs) = std::env::var("VIDVEIL_ENGINE_TIMEOUT_SECS")
            && let Ok(parsed) = secs.parse::<u64>()
            && parsed > 0
        {
            config.search.engine_timeout = Duration::from_secs(parsed);
        }
        if let Ok(secs) = std::env::var("VIDVEIL_CACHE_TTL_SECS")
            && let Ok(parsed) = secs.parse::<u64>()
            && parsed > 0
        {
            config.search.cache_ttl = Duration::from_secs(parsed);
        }
        if let Ok(capacity) = std::env::var("VIDVEIL_CACHE_CAPACITY")
            && let Ok(parsed) = capacity.parse::<u64>()
            && parsed > 0
        {
            config.search.cache_capacity = parsed;
        }

        config
    }
}
