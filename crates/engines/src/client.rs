//! HTTP client construction for engine transports.
//!
//! Engines get two client flavors built here: a standard rustls client and a
//! browser-profile client whose TLS ClientHello is shaped to match a real
//! browser (cipher-suite ordering + ALPN), since several upstreams block
//! clients with obviously non-browser fingerprints. Both share the same
//! redirect, cookie and timeout discipline.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, redirect};
use rustls::crypto::aws_lc_rs;
use rustls_platform_verifier::BuilderVerifierExt;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

const REDIRECT_LIMIT: usize = 10;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Browser whose TLS fingerprint the spoofed client reproduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserProfile {
    Chrome,
    Firefox,
    Edge,
    Safari,
    /// Pick one of the concrete profiles at client construction time.
    Randomized,
}

impl BrowserProfile {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" => Some(Self::Chrome),
            "firefox" => Some(Self::Firefox),
            "edge" => Some(Self::Edge),
            "safari" => Some(Self::Safari),
            "randomized" | "random" => Some(Self::Randomized),
            _ => None,
        }
    }

    /// Resolve `Randomized` to a concrete profile.
    fn resolve(self) -> Self {
        match self {
            Self::Randomized => {
                let concrete = [Self::Chrome, Self::Firefox, Self::Edge, Self::Safari];
                *concrete
                    .choose(&mut rand::rng())
                    .unwrap_or(&Self::Chrome)
            }
            other => other,
        }
    }
}

/// Per-engine transport settings.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub user_agent: String,
    /// `Some` selects the spoofed-TLS client flavor.
    pub profile: Option<BrowserProfile>,
    /// Total per-request deadline.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            profile: Some(BrowserProfile::Chrome),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Cipher-suite ordering for a concrete browser profile.
///
/// Reproduces the ordering each browser family advertises; the suites all
/// come from the aws-lc-rs default set, only the order (and for Safari the
/// TLS 1.3 preference) differs.
fn cipher_suites_for(profile: BrowserProfile) -> Vec<rustls::SupportedCipherSuite> {
    use rustls::crypto::aws_lc_rs::cipher_suite as cs;

    match profile {
        BrowserProfile::Chrome | BrowserProfile::Edge => vec![
            cs::TLS13_AES_128_GCM_SHA256,
            cs::TLS13_AES_256_GCM_SHA384,
            cs::TLS13_CHACHA20_POLY1305_SHA256,
            cs::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            cs::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            cs::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            cs::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            cs::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
            cs::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        ],
        BrowserProfile::Firefox => vec![
            cs::TLS13_AES_128_GCM_SHA256,
            cs::TLS13_CHACHA20_POLY1305_SHA256,
            cs::TLS13_AES_256_GCM_SHA384,
            cs::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            cs::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            cs::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
            cs::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
            cs::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            cs::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        ],
        BrowserProfile::Safari => vec![
            cs::TLS13_AES_256_GCM_SHA384,
            cs::TLS13_CHACHA20_POLY1305_SHA256,
            cs::TLS13_AES_128_GCM_SHA256,
            cs::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            cs::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            cs::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
            cs::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            cs::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
            cs::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        ],
        // Resolved before this point.
        BrowserProfile::Randomized => aws_lc_rs::default_provider().cipher_suites,
    }
}

fn tls_config(profile: Option<BrowserProfile>) -> Result<rustls::ClientConfig, EngineError> {
    let mut provider = aws_lc_rs::default_provider();
    if let Some(profile) = profile {
        provider.cipher_suites = cipher_suites_for(profile.resolve());
    }

    let mut config = rustls::ClientConfig::builder_with_provider(Arc::new(provider))
        .with_safe_default_protocol_versions()
        .map_err(|e| EngineError::Other(format!("TLS protocol setup failed: {e}")))?
        .with_platform_verifier()
        .map_err(|e| EngineError::Other(format!("TLS verifier setup failed: {e}")))?
        .with_no_client_auth();

    // Browsers offer h2 then http/1.1 over ALPN.
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(config)
}

/// The two client flavors an engine holds. Both share one cookie jar, so a
/// session negotiated through either is visible to the other.
pub struct ClientPair {
    pub standard: Client,
    pub spoofed: Client,
}

fn build_client(
    config: &TransportConfig,
    profile: Option<BrowserProfile>,
    jar: Arc<Jar>,
) -> Result<Client, EngineError> {
    Client::builder()
        .use_preconfigured_tls(tls_config(profile)?)
        .user_agent(config.user_agent.clone())
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(config.timeout)
        .redirect(redirect::Policy::limited(REDIRECT_LIMIT))
        .cookie_provider(jar)
        .build()
        .map_err(|e| EngineError::Other(format!("Failed to build HTTP client: {e}")))
}

/// Client builder for callers outside the engine pipeline (the thumbnail
/// proxy, health probes): standard TLS, no browser profile, no cookie jar.
pub fn create_client_builder(user_agent: &str) -> Result<reqwest::ClientBuilder, EngineError> {
    Ok(Client::builder()
        .use_preconfigured_tls(tls_config(None)?)
        .user_agent(user_agent.to_string()))
}

/// Build an engine's client pair. The spoofed flavor falls back to the
/// Chrome profile when none is configured, so it always presents a browser
/// fingerprint.
pub fn create_clients(config: &TransportConfig) -> Result<ClientPair, EngineError> {
    let jar = Arc::new(Jar::default());
    Ok(ClientPair {
        standard: build_client(config, None, jar.clone())?,
        spoofed: build_client(
            config,
            Some(config.profile.unwrap_or(BrowserProfile::Chrome)),
            jar,
        )?,
    })
}

fn is_chromium_ua(user_agent: &str) -> bool {
    user_agent.contains("Chrome/") || user_agent.contains("Edg/")
}

/// The realistic header block sent with every outbound engine request.
/// `Sec-Ch-Ua*` client hints are only sent when the UA claims a Chromium
/// engine; other browsers never send them.
pub fn browser_headers(user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        reqwest::header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        reqwest::header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(
        reqwest::header::CONNECTION,
        HeaderValue::from_static("keep-alive"),
    );
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    headers.insert(
        "Upgrade-Insecure-Requests",
        HeaderValue::from_static("1"),
    );

    if is_chromium_ua(user_agent) {
        headers.insert(
            "Sec-Ch-Ua",
            HeaderValue::from_static(
                "\"Not/A)Brand\";v=\"8\", \"Chromium\";v=\"126\", \"Google Chrome\";v=\"126\"",
            ),
        );
        headers.insert("Sec-Ch-Ua-Mobile", HeaderValue::from_static("?0"));
        headers.insert("Sec-Ch-Ua-Platform", HeaderValue::from_static("\"Windows\""));
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_parsing() {
        assert_eq!(BrowserProfile::parse("Chrome"), Some(BrowserProfile::Chrome));
        assert_eq!(BrowserProfile::parse("FIREFOX"), Some(BrowserProfile::Firefox));
        assert_eq!(
            BrowserProfile::parse("random"),
            Some(BrowserProfile::Randomized)
        );
        assert_eq!(BrowserProfile::parse("netscape"), None);
    }

    #[test]
    fn randomized_resolves_to_concrete() {
        for _ in 0..16 {
            let resolved = BrowserProfile::Randomized.resolve();
            assert_ne!(resolved, BrowserProfile::Randomized);
        }
    }

    #[test]
    fn chromium_ua_gets_client_hints() {
        let headers = browser_headers(DEFAULT_USER_AGENT);
        assert!(headers.contains_key("Sec-Ch-Ua"));
        assert!(headers.contains_key("Sec-Fetch-Mode"));
    }

    #[test]
    fn firefox_ua_omits_client_hints() {
        let headers = browser_headers(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
        );
        assert!(!headers.contains_key("Sec-Ch-Ua"));
        assert!(headers.contains_key("Sec-Fetch-Dest"));
    }

    #[test]
    fn profiles_order_suites_differently() {
        let chrome = cipher_suites_for(BrowserProfile::Chrome);
        let safari = cipher_suites_for(BrowserProfile::Safari);
        assert_eq!(chrome.len(), safari.len());
        assert_ne!(
            format!("{:?}", chrome.first()),
            format!("{:?}", safari.first())
        );
    }
}
