use std::path::PathBuf;

use thiserror::Error;

/// Placeholder secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me",
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is unset or still a placeholder")]
    MissingSecret(&'static str),

    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub polka_key: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Keep the existing document instead of starting from an empty one.
    pub keep_db: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = required_secret(&lookup, "JWT_SECRET")?;
        // POLKA_KEY is accepted as an alias.
        let polka_key = required_secret(&lookup, "POLKA_SECRET")
            .or_else(|e| required_secret(&lookup, "POLKA_KEY").map_err(|_| e))?;

        let db_path = lookup("CHIRPY_DB_PATH")
            .unwrap_or_else(|| "database.json".into())
            .into();
        let host = lookup("CHIRPY_HOST").unwrap_or_else(|| "0.0.0.0".into());

        let port = match lookup("CHIRPY_PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "CHIRPY_PORT",
                value,
            })?,
            None => 8080,
        };

        let keep_db = match lookup("CHIRPY_KEEP_DB").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "CHIRPY_KEEP_DB",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            jwt_secret,
            polka_key,
            db_path,
            host,
            port,
            keep_db,
        })
    }
}

fn required_secret<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.is_empty() && !PLACEHOLDER_SECRETS.contains(&value.as_str()) => {
            Ok(value)
        }
        _ => Err(ConfigError::MissingSecret(name)),
    }
}
