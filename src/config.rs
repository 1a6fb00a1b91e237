//! Environment configuration.
//!
//! [`RelayConfig::from_env`] reads the process environment;
//! [`RelayConfig::from_lookup`] takes any lookup function so tests never touch
//! real variables.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::callback::CallbackTargets;
use crate::credential::PasswordGrantConfig;
use crate::relay::{DEFAULT_CONCURRENCY, ProfileLinkMode};
use crate::search::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_DELAY, PollPolicy, SearchApiConfig};

/// Default record callback path under `CALLBACK_BASE`.
pub const DEFAULT_RECORD_CALLBACK_PATH: &str = "/services/apexrest/creditapp/sos/callback";

/// Default file callback path under `CALLBACK_BASE`.
pub const DEFAULT_FILE_CALLBACK_PATH: &str = "/services/apexrest/creditapp/sos/file";

/// Default listen host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

const MAX_POLL_ATTEMPTS_RANGE: (u32, u32) = (1, 10);
const POLL_DELAY_SECS_RANGE: (u64, u64) = (0, 300);
const CONCURRENCY_RANGE: (usize, usize) = (1, 32);

/// Errors raised while loading configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("{key} environment variable is required")]
    Missing {
        /// Variable name.
        key: &'static str,
    },

    /// A variable could not be parsed.
    #[error("{key} is invalid: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A numeric variable is outside its allowed range.
    #[error("{key}={value} is out of range ({min}..={max})")]
    OutOfRange {
        /// Variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
        /// Lower bound.
        min: String,
        /// Upper bound.
        max: String,
    },

    /// Neither credential source is fully configured.
    #[error(
        "no callback credential configured: set TOKEN_URL, CLIENT_ID, CLIENT_SECRET, CRM_USERNAME and CRM_PASSWORD, or CALLBACK_BEARER_TOKEN"
    )]
    NoCredentialSource,
}

/// How callback credentials are obtained.
#[derive(Clone)]
pub enum CredentialSettings {
    /// Password-grant exchange.
    PasswordGrant(PasswordGrantConfig),
    /// Pre-issued bearer token.
    Static(String),
}

impl fmt::Debug for CredentialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PasswordGrant(config) => f.debug_tuple("PasswordGrant").field(config).finish(),
            Self::Static(_) => f.write_str("Static(<redacted>)"),
        }
    }
}

/// Everything the relay needs to start.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Search API endpoint and key.
    pub search: SearchApiConfig,
    /// Re-poll budget and delay.
    pub poll: PollPolicy,
    /// Record and file callback addresses.
    pub callbacks: CallbackTargets,
    /// Callback credential source.
    pub credentials: CredentialSettings,
    /// Worker pool size.
    pub concurrency: usize,
    /// How profile links are relayed.
    pub profile_link_mode: ProfileLinkMode,
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
}

impl RelayConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing, malformed or out-of-range values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing, malformed or out-of-range values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(&lookup);

        let mut search = SearchApiConfig::new(
            env.url("SEARCH_API_ENDPOINT")?,
            env.required("SEARCH_API_KEY")?,
        );
        if let Some(live) = env.optional("SEARCH_LIVE_DATA") {
            search.live_data = parse_bool("SEARCH_LIVE_DATA", &live)?;
        }

        let max_attempts =
            env.ranged("POLL_MAX_ATTEMPTS", DEFAULT_MAX_POLL_ATTEMPTS, MAX_POLL_ATTEMPTS_RANGE)?;
        let delay_secs =
            env.ranged("POLL_DELAY_SECS", DEFAULT_POLL_DELAY.as_secs(), POLL_DELAY_SECS_RANGE)?;
        let poll = PollPolicy::new(max_attempts, Duration::from_secs(delay_secs));

        let base = env.url("CALLBACK_BASE")?;
        let callbacks = CallbackTargets {
            record: join_path(
                &base,
                "RECORD_CALLBACK_PATH",
                &env.or_default("RECORD_CALLBACK_PATH", DEFAULT_RECORD_CALLBACK_PATH),
            )?,
            file: join_path(
                &base,
                "FILE_CALLBACK_PATH",
                &env.or_default("FILE_CALLBACK_PATH", DEFAULT_FILE_CALLBACK_PATH),
            )?,
        };

        let profile_link_mode = match env.optional("PROFILE_LINK_MODE") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                key: "PROFILE_LINK_MODE",
                reason,
            })?,
            None => ProfileLinkMode::default(),
        };

        Ok(Self {
            search,
            poll,
            callbacks,
            credentials: credential_settings(&env)?,
            concurrency: env.ranged("RELAY_CONCURRENCY", DEFAULT_CONCURRENCY, CONCURRENCY_RANGE)?,
            profile_link_mode,
            host: env.or_default("HOST", DEFAULT_HOST),
            port: env.parsed("PORT", DEFAULT_PORT)?,
        })
    }

    /// Socket address to listen on.
    ///
    /// `host` may be an IPv4 or IPv6 literal (brackets optional) or a
    /// hostname, which is resolved and its first address used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `host` does not resolve.
    pub async fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self.host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.port));
        }
        tokio::net::lookup_host((host, self.port))
            .await
            .map_err(|e| ConfigError::Invalid {
                key: "HOST",
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| ConfigError::Invalid {
                key: "HOST",
                reason: format!("`{host}` resolved to no addresses"),
            })
    }
}

/// Password grant wins when all five of its variables are set.
fn credential_settings<F>(env: &Lookup<'_, F>) -> Result<CredentialSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const GRANT_KEYS: [&str; 5] = [
        "TOKEN_URL",
        "CLIENT_ID",
        "CLIENT_SECRET",
        "CRM_USERNAME",
        "CRM_PASSWORD",
    ];

    let present = GRANT_KEYS
        .iter()
        .filter(|key| env.optional(key).is_some())
        .count();
    if present == GRANT_KEYS.len() {
        return Ok(CredentialSettings::PasswordGrant(PasswordGrantConfig {
            token_url: env.url("TOKEN_URL")?,
            client_id: env.required("CLIENT_ID")?,
            client_secret: env.required("CLIENT_SECRET")?,
            username: env.required("CRM_USERNAME")?,
            password: env.required("CRM_PASSWORD")?,
        }));
    }
    if let Some(token) = env.optional("CALLBACK_BEARER_TOKEN") {
        return Ok(CredentialSettings::Static(token));
    }
    if present > 0 {
        // Partially configured grant: name the first gap.
        for key in GRANT_KEYS {
            env.required(key)?;
        }
    }
    Err(ConfigError::NoCredentialSource)
}

struct Lookup<'a, F>(&'a F);

impl<F> Lookup<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing { key })
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn url(&self, key: &'static str) -> Result<Url, ConfigError> {
        let raw = self.required(key)?;
        Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        })
    }

    fn parsed<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        match self.optional(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }),
            None => Ok(default),
        }
    }

    fn ranged<T>(&self, key: &'static str, default: T, (min, max): (T, T)) -> Result<T, ConfigError>
    where
        T: std::str::FromStr + PartialOrd + fmt::Display + Copy,
        T::Err: fmt::Display,
    {
        let value = self.parsed(key, default)?;
        if value < min || value > max {
            return Err(ConfigError::OutOfRange {
                key,
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(value)
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            reason: format!("expected a boolean, got `{raw}`"),
        }),
    }
}

/// Appends `path` to `base`, keeping any path prefix `base` already has.
fn join_path(base: &Url, key: &'static str, path: &str) -> Result<Url, ConfigError> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
