//! Runtime configuration loaded from the environment.
//!
//! A `.env` file in the working directory is honored (via dotenvy) but real
//! environment variables always win.

use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Shelters served when `SHELTERS` is not set.
pub const DEFAULT_SHELTERS: [&str; 3] = ["Abba", "Haven", "Gratitude"];

/// Session secret used when `SESSION_SECRET` is missing. Startup logs a warning.
pub const INSECURE_DEFAULT_SECRET: &str = "change_me";

/// Longest leave a deployment may allow.
pub const MAX_LEAVE_DAYS_LIMIT: i64 = 365;

/// Longest session lifetime (one year).
pub const SESSION_TTL_HOURS_LIMIT: i64 = 8760;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub shelters: Vec<String>,
    pub max_leave_days: i64,
    pub overdue_scan_interval_secs: u64,
    pub log_format: LogFormat,
    pub deployment_id: Option<String>,
}

impl Config {
    /// Load configuration from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| -> Option<String> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| AppError::Config("DATABASE_URL must be set".to_string()))?;

        let shelters = match get("SHELTERS") {
            Some(raw) => {
                let list: Vec<String> = raw
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
                if list.is_empty() {
                    return Err(AppError::Config("SHELTERS must list at least one shelter".into()));
                }
                list
            }
            None => DEFAULT_SHELTERS.iter().map(|s| s.to_string()).collect(),
        };

        let max_leave_days = parse_in_range(&get, "MAX_LEAVE_DAYS", 7, 1..=MAX_LEAVE_DAYS_LIMIT)?;

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            database_url,
            database_max_connections: parse_in_range(&get, "DATABASE_MAX_CONNECTIONS", 10, 1..=1000)?,
            session_secret: get("SESSION_SECRET")
                .unwrap_or_else(|| INSECURE_DEFAULT_SECRET.to_string()),
            session_ttl_hours: parse_in_range(&get, "SESSION_TTL_HOURS", 12, 1..=SESSION_TTL_HOURS_LIMIT)?,
            bcrypt_cost: parse_in_range(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST, 4..=31)?,
            admin_username: get("ADMIN_USERNAME"),
            admin_password: get("ADMIN_PASSWORD"),
            shelters,
            max_leave_days,
            overdue_scan_interval_secs: parse_in_range(
                &get,
                "OVERDUE_SCAN_INTERVAL_SECS",
                300,
                1..=86_400,
            )?,
            log_format: parse_or(&get, "LOG_FORMAT", LogFormat::Pretty)?,
            deployment_id: get("RAILWAY_DEPLOYMENT_ID"),
        })
    }

    /// Socket address string the server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_known_shelter(&self, shelter: &str) -> bool {
        self.shelters.iter().any(|s| s == shelter)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.session_secret == INSECURE_DEFAULT_SECRET
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| AppError::Config(format!("{} has invalid value '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

/// Like [`parse_or`], but values outside `range` are configuration errors.
fn parse_in_range<T, G>(get: &G, key: &str, default: T, range: RangeInclusive<T>) -> Result<T>
where
    T: FromStr + PartialOrd + std::fmt::Display,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let value = parse_or(get, key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(AppError::Config(format!(
            "{} must be between {} and {}, got {}",
            key,
            range.start(),
            range.end(),
            value
        )))
    }
}
