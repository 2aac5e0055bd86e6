use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
const DEFAULT_STORAGE_PATH: &str = "./portal-storage.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub local_storage_path: PathBuf,
    pub poll_interval_secs: u64,
    pub bind_addr: SocketAddr,
    pub patient_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("API_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("API_BASE_URL not set, using empty value");
                    String::new()
                }),
            api_timeout_secs: parse_or_default("API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            local_storage_path: env::var("LOCAL_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("LOCAL_STORAGE_PATH not set, using default");
                    PathBuf::from(DEFAULT_STORAGE_PATH)
                }),
            poll_interval_secs: parse_or_default("POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS),
            bind_addr: env::var("PORTAL_BIND_ADDR")
                .ok()
                .and_then(|addr| match addr.parse() {
                    Ok(parsed) => Some(parsed),
                    Err(_) => {
                        warn!("PORTAL_BIND_ADDR '{}' is not a socket address, using default", addr);
                        None
                    }
                })
                .unwrap_or_else(default_bind_addr),
            patient_email: env::var("PORTAL_PATIENT_EMAIL").ok().filter(|email| !email.is_empty()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    /// Config pointing at `api_base_url`, everything else defaulted.
    pub fn with_base_url(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            api_timeout_secs: DEFAULT_TIMEOUT_SECS,
            local_storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            bind_addr: default_bind_addr(),
            patient_email: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn parse_or_default(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} '{}' is not a number, using {}", key, raw, default);
            default
        }),
        Err(_) => {
            warn!("{} not set, using {}", key, default);
            default
        }
    }
}
