use std::{env, fmt::Display, str::FromStr};

use chrono::Duration;
use thiserror::Error;
use tracing::info;

use crate::credentials::DEFAULT_ROUNDS;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("You need to add {0} to the env")]
    Missing(&'static str),
    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreKind {
    Mongo { uri: String, database: String },
    Memory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub store: StoreKind,
    pub token_secret: String,
    pub token_ttl: Option<Duration>,
    pub password_rounds: u32,
    pub host: String,
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, `load` uses the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store = match var("PLANIT_STORE").as_deref() {
            None | Some("mongo") => StoreKind::Mongo {
                uri: var("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
                database: var("MONGODB_DATABASE").unwrap_or_else(|| "PlanIt".to_owned()),
            },
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "PLANIT_STORE",
                    reason: format!("expected mongo or memory, got {other}"),
                })
            }
        };

        let token_ttl = match var("TOKEN_TTL_SECS") {
            Some(raw) => Some(positive_seconds("TOKEN_TTL_SECS", &raw)?),
            None => None,
        };

        let password_rounds = match var("PASSWORD_ROUNDS") {
            Some(raw) => match parse("PASSWORD_ROUNDS", &raw)? {
                0 => {
                    return Err(ConfigError::Invalid {
                        key: "PASSWORD_ROUNDS",
                        reason: "must be at least 1".to_owned(),
                    })
                }
                rounds => rounds,
            },
            None => DEFAULT_ROUNDS,
        };

        Ok(Config {
            store,
            token_secret: var("TOKEN_SECRET").ok_or(ConfigError::Missing("TOKEN_SECRET"))?,
            token_ttl,
            password_rounds,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: match var("PORT") {
                Some(raw) => parse("PORT", &raw)?,
                None => {
                    info!("PORT not set, using default: 5000");
                    5000
                }
            },
            cors_origin: var("CORS_ORIGIN"),
        })
    }
}

// chrono panics on second counts it cannot represent
fn positive_seconds(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let seconds: u64 = parse(key, raw)?;
    i64::try_from(seconds)
        .ok()
        .filter(|s| *s > 0)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError::Invalid {
            key,
            reason: format!("{seconds} is not a usable number of seconds"),
        })
}

fn parse<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}
