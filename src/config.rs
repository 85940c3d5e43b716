//! Process configuration read from the environment.
//!
//! `.env` files are loaded by [`crate::run`] before [`Config::from_env`] runs,
//! so everything here is plain environment lookups.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_WAR_API_BASE: &str = "https://helldiverstrainingmanual.com/api/v1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}: expected {expected}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Bot token used for both the gateway and REST.
    pub token: String,
    /// Application id for command registration. Taken from READY when unset.
    pub application_id: Option<String>,
    /// Liveness listener port.
    pub port: u16,
    pub war_api_base: String,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let token = get("DISCORD_TOKEN").ok_or(ConfigError::Missing("DISCORD_TOKEN"))?;

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
                expected: "a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let fetch_timeout = match get("WAR_API_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "WAR_API_TIMEOUT_SECS",
                        value: raw,
                        expected: "a positive number of seconds",
                    })
                }
            },
            None => DEFAULT_FETCH_TIMEOUT,
        };

        let war_api_base = get("WAR_API_BASE")
            .map(|base| base.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_WAR_API_BASE.to_string());

        Ok(Self {
            token: token.trim().to_string(),
            application_id: get("CLIENT_ID").map(|id| id.trim().to_string()),
            port,
            war_api_base,
            fetch_timeout,
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("token", &"<redacted>")
            .field("application_id", &self.application_id)
            .field("port", &self.port)
            .field("war_api_base", &self.war_api_base)
            .field("fetch_timeout", &self.fetch_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn token_is_required() {
        assert_eq!(config_from(&[]), Err(ConfigError::Missing("DISCORD_TOKEN")));
        assert_eq!(
            config_from(&[("DISCORD_TOKEN", "   ")]),
            Err(ConfigError::Missing("DISCORD_TOKEN"))
        );
    }

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = config_from(&[("DISCORD_TOKEN", "abc")]).expect("valid config");
        assert_eq!(config.token, "abc");
        assert_eq!(config.application_id, None);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.war_api_base, DEFAULT_WAR_API_BASE);
        assert_eq!(config.fetch_timeout, DEFAULT_FETCH_TIMEOUT);
    }

    #[test]
    fn optional_values_are_read() {
        let config = config_from(&[
            ("DISCORD_TOKEN", "abc"),
            ("CLIENT_ID", "1234"),
            ("PORT", "8080"),
            ("WAR_API_BASE", "http://localhost:9000/api/"),
            ("WAR_API_TIMEOUT_SECS", "3"),
        ])
        .expect("valid config");
        assert_eq!(config.application_id.as_deref(), Some("1234"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.war_api_base, "http://localhost:9000/api");
        assert_eq!(config.fetch_timeout, Duration::from_secs(3));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = config_from(&[("DISCORD_TOKEN", "abc"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = config_from(&[("DISCORD_TOKEN", "abc"), ("WAR_API_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "WAR_API_TIMEOUT_SECS", .. }));
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let config = config_from(&[("DISCORD_TOKEN", "super-secret")]).expect("valid config");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
