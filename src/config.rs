use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

pub const DEFAULT_GATEWAY_URL: &str = "https://www.coursera.org/graphql-gateway";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const SITE_ORIGIN: &str = "https://www.coursera.org";
const SITE_REFERER: &str = "https://www.coursera.org/search";

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        gateway_url: get_env_or_default("SCOUT_GATEWAY_URL", DEFAULT_GATEWAY_URL),
        timeout_secs: parse_env_or_default("SCOUT_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        user_agent: get_env_or_default("SCOUT_USER_AGENT", DEFAULT_USER_AGENT),
        cookie: env::var("SCOUT_COOKIE").ok().filter(|c| !c.is_empty()),
    }
});

pub struct Config {
    pub gateway_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub cookie: Option<String>,
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or_default(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("ignoring {key}={raw:?}, not a number; using {default}");
            default
        }),
        Err(_) => default,
    }
}

/// Everything a [`crate::SearchClient`] needs to reach the gateway.
///
/// `headers` and `cookie` are the hook for whatever session scheme the
/// gateway turns out to want; nothing is assumed about it here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
    pub cookie: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoint: DEFAULT_GATEWAY_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: browser_headers(),
            cookie: None,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        ClientConfig {
            endpoint: CONFIG.gateway_url.clone(),
            timeout: Duration::from_secs(CONFIG.timeout_secs),
            user_agent: CONFIG.user_agent.clone(),
            headers: browser_headers(),
            cookie: CONFIG.cookie.clone(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header, replacing an earlier one with the same name.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }
}

// the gateway answers differently without these
fn browser_headers() -> Vec<(String, String)> {
    [
        ("Accept", "application/json"),
        ("X-Requested-With", "XMLHttpRequest"),
        ("Origin", SITE_ORIGIN),
        ("Referer", SITE_REFERER),
    ]
    .into_iter()
    .map(|(n, v)| (n.to_string(), v.to_string()))
    .collect()
}
