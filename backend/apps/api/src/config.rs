//! Process configuration
//!
//! Everything is read from the environment once at startup. `.env` is
//! loaded by `main` before [`AppConfig::from_env`] runs. Secrets are never
//! logged.

use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use auth::AuthConfig;
use catalog::CatalogConfig;
use commerce::{CommerceConfig, DownloadConfig};
use kernel::AppEnv;
use platform::client::TrustedProxies;
use platform::crypto::random_bytes;
use platform::mailer::{DEFAULT_EMAIL_API_URL, MailerConfig};
use platform::password::PasswordCost;
use platform::paystack::PaystackConfig;
use platform::rate_limit::RateLimitConfig;
use platform::storage::StorageConfig;
use thiserror::Error;

const MAX_ACCESS_TTL_SECS: u64 = 30 * 24 * 3600;
const MAX_REFRESH_TTL_SECS: u64 = 365 * 24 * 3600;
const MAX_RATE_LIMIT_WINDOW_SECS: u64 = 24 * 3600;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must be set outside development")]
    RequiredOutsideDevelopment(&'static str),

    #[error("{var} has an invalid value `{value}`")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: AppEnv,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub auth: AuthConfig,
    pub paystack: PaystackConfig,
    pub mailer: MailerConfig,
    /// `None` leaves uploads disabled.
    pub storage: Option<StorageConfig>,
    pub catalog: CatalogConfig,
    pub commerce: CommerceConfig,
    pub downloads: DownloadConfig,
    pub cors_origins: Vec<String>,
    /// Peers whose forwarding headers name the client
    pub trusted_proxies: TrustedProxies,
    /// Global limit keyed by client IP
    pub rate_limit: RateLimitConfig,
    pub log_level: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let env = match get("APP_ENV") {
            Some(raw) => raw.parse::<AppEnv>().map_err(|_| ConfigError::Invalid {
                var: "APP_ENV",
                value: raw,
            })?,
            None => AppEnv::Development,
        };

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret.into_bytes(),
            None if env.is_development() => random_bytes(32),
            None => return Err(ConfigError::RequiredOutsideDevelopment("JWT_SECRET")),
        };

        let paystack_secret = get("PAYSTACK_SECRET_KEY");
        if paystack_secret.is_none() && !env.is_development() {
            return Err(ConfigError::RequiredOutsideDevelopment("PAYSTACK_SECRET_KEY"));
        }

        let cost: u32 = parse(&get, "PASSWORD_HASH_COST", PasswordCost::default().iterations())?;
        let password_cost = PasswordCost::new(cost).map_err(|_| ConfigError::Invalid {
            var: "PASSWORD_HASH_COST",
            value: cost.to_string(),
        })?;

        let client_url = get("CLIENT_URL").unwrap_or_else(|| "http://localhost:3000".to_string());

        let auth = AuthConfig {
            jwt_secret,
            access_ttl: parse_secs(&get, "JWT_EXPIRES_IN_SECS", 900, MAX_ACCESS_TTL_SECS)?,
            refresh_ttl: parse_secs(&get, "JWT_REFRESH_EXPIRES_IN_SECS", 604_800, MAX_REFRESH_TTL_SECS)?,
            password_cost,
            client_url: client_url.clone(),
            ..AuthConfig::default()
        };

        let paystack = PaystackConfig {
            secret_key: paystack_secret,
            public_key: get("PAYSTACK_PUBLIC_KEY"),
            callback_url: get("PAYSTACK_CALLBACK_URL"),
            ..PaystackConfig::default()
        };

        let mailer = MailerConfig {
            api_key: get("EMAIL_API_KEY"),
            api_url: get("EMAIL_API_URL").unwrap_or_else(|| DEFAULT_EMAIL_API_URL.to_string()),
            from: get("EMAIL_FROM").unwrap_or_else(|| MailerConfig::default().from),
        };

        let storage = match (
            get("CLOUDINARY_CLOUD_NAME"),
            get("CLOUDINARY_API_KEY"),
            get("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(StorageConfig {
                cloud_name,
                api_key,
                api_secret,
                folder: get("CLOUDINARY_FOLDER").unwrap_or_else(|| "marketplace".to_string()),
            }),
            _ => None,
        };

        let defaults = CatalogConfig::default();
        let catalog = CatalogConfig {
            max_file_size: parse(&get, "MAX_FILE_SIZE", defaults.max_file_size)?,
            allowed_file_types: get("ALLOWED_FILE_TYPES")
                .map(|raw| split_list(&raw, true))
                .unwrap_or(defaults.allowed_file_types),
            ..defaults
        };

        let fee: u8 = parse(&get, "PLATFORM_FEE_PERCENT", 10)?;
        if fee > 100 {
            return Err(ConfigError::Invalid {
                var: "PLATFORM_FEE_PERCENT",
                value: fee.to_string(),
            });
        }
        let commerce = CommerceConfig {
            platform_fee_percent: fee,
            ..CommerceConfig::default()
        };

        let rate_limit = RateLimitConfig::new(
            parse(&get, "RATE_LIMIT_MAX", 100)?,
            parse_secs(&get, "RATE_LIMIT_WINDOW_SECS", 900, MAX_RATE_LIMIT_WINDOW_SECS)?,
        );

        let trusted_proxies = match get("TRUSTED_PROXIES") {
            Some(raw) => TrustedProxies::new(
                split_list(&raw, false)
                    .into_iter()
                    .map(|ip| {
                        ip.parse::<IpAddr>().map_err(|_| ConfigError::Invalid {
                            var: "TRUSTED_PROXIES",
                            value: ip,
                        })
                    })
                    .collect::<Result<_, _>>()?,
            ),
            None => TrustedProxies::default(),
        };

        Ok(Self {
            env,
            port: parse(&get, "PORT", 5000)?,
            database_url,
            database_max_connections: parse(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            auth,
            paystack,
            mailer,
            storage,
            catalog,
            commerce,
            downloads: DownloadConfig::default(),
            cors_origins: split_list(
                &get("CORS_ORIGINS").unwrap_or_else(|| client_url.clone()),
                false,
            ),
            trusted_proxies,
            rate_limit,
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Config for tests and local tooling: no database URL check, every
    /// integration disabled.
    pub fn development(database_url: impl Into<String>) -> Self {
        Self {
            env: AppEnv::Development,
            port: 5000,
            database_url: database_url.into(),
            database_max_connections: 10,
            auth: AuthConfig::development(),
            paystack: PaystackConfig::default(),
            mailer: MailerConfig::default(),
            storage: None,
            catalog: CatalogConfig::default(),
            commerce: CommerceConfig::default(),
            downloads: DownloadConfig::default(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            trusted_proxies: TrustedProxies::default(),
            rate_limit: RateLimitConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

fn parse<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value: raw }),
        None => Ok(default),
    }
}

/// Whole seconds in `1..=max`.
fn parse_secs<G>(get: &G, var: &'static str, default: u64, max: u64) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse(get, var, default)?;
    if secs == 0 || secs > max {
        return Err(ConfigError::Invalid {
            var,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

fn split_list(raw: &str, lowercase: bool) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let s = s.trim_start_matches('.');
            if lowercase { s.to_ascii_lowercase() } else { s.to_string() }
        })
        .collect()
}
