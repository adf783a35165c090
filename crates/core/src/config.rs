use crate::provider::Platform;
use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const DEFAULT_SOURCE_LANG: &str = "en";
pub const ENV_GOOGLE_API_KEY: &str = "HELLO_GOOGLE_API_KEY";
pub const ENV_AZURE_API_KEY: &str = "HELLO_AZURE_API_KEY";
pub const ENV_STORE_URL: &str = "HELLO_STORE_URL";
pub const ENV_ENVIRONMENT: &str = "HELLO_ENVIRONMENT";

/// Deployment-stage partition of the shared translation store. Every remote
/// path is rooted under the environment's name, so staging clients never see
/// production entries.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::UnknownEnvironment(s.to_owned())),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, ConfigError> {
        let v = value.into();
        if v.trim().is_empty() {
            return Err(ConfigError::EmptyApiKey);
        }
        Ok(Self(v))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(**redacted**)")
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiKeys {
    pub google: Option<ApiKey>,
    pub azure: Option<ApiKey>,
}

/// Remote-store connection settings. `page_size` bounds how many entries a
/// bulk table download asks for in one request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    pub base_url: Option<String>,
    pub page_size: usize,
}

impl StoreConfig {
    pub fn new(base_url: Option<String>, page_size: usize) -> Result<Self, ConfigError> {
        if let Some(url) = &base_url {
            if url.trim().is_empty() {
                return Err(ConfigError::EmptyStoreUrl);
            }
        }
        if page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        Ok(Self {
            base_url,
            page_size,
        })
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreConfig,
    pub api_keys: ApiKeys,
    pub archive_path: Option<PathBuf>,
    pub platform: Platform,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("api key must not be empty")]
    EmptyApiKey,
    #[error("store url must not be empty")]
    EmptyStoreUrl,
    #[error("store page size must be > 0")]
    ZeroPageSize,
    #[error("unknown environment: {0}")]
    UnknownEnvironment(String),
}

pub trait Env {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Clone, Debug, Default)]
pub struct StdEnv;

impl Env for StdEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: std::collections::BTreeMap<String, String>,
}

impl MapEnv {
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.vars.insert(key.to_owned(), value.to_owned());
        self
    }
}

impl Env for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn resolve_api_key(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Result<Option<ApiKey>, ConfigError> {
    match cli_value {
        Some(v) => Ok(Some(ApiKey::new(v)?)),
        None => match env.var(env_key) {
            Some(v) => Ok(Some(ApiKey::new(v)?)),
            None => Ok(None),
        },
    }
}

pub fn resolve_string_with_default(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
    default: &str,
) -> String {
    match cli_value {
        Some(v) => v,
        None => env.var(env_key).unwrap_or_else(|| default.to_owned()),
    }
}

pub fn resolve_optional_string(
    cli_value: Option<String>,
    env_key: &str,
    env: &impl Env,
) -> Option<String> {
    match cli_value {
        Some(v) => Some(v),
        None => env.var(env_key),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_cli_takes_precedence_over_env() {
        let env = MapEnv::default().with_var(ENV_GOOGLE_API_KEY, "env-key");
        let key = resolve_api_key(Some("cli-key".to_owned()), ENV_GOOGLE_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "cli-key");
    }

    #[test]
    fn api_key_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_AZURE_API_KEY, "env-key");
        let key = resolve_api_key(None, ENV_AZURE_API_KEY, &env)
            .expect("valid key")
            .expect("present");
        assert_eq!(key.expose(), "env-key");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let env = MapEnv::default();
        let err = resolve_api_key(Some("   ".to_owned()), ENV_GOOGLE_API_KEY, &env)
            .expect_err("blank key");
        assert_eq!(err, ConfigError::EmptyApiKey);
    }

    #[test]
    fn api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret").expect("valid key");
        assert_eq!(format!("{key:?}"), "ApiKey(**redacted**)");
    }

    #[test]
    fn environment_parses_aliases() {
        assert_eq!(
            "dev".parse::<Environment>().expect("parses"),
            Environment::Development
        );
        assert_eq!(
            "PRODUCTION".parse::<Environment>().expect("parses"),
            Environment::Production
        );
        assert!("qa".parse::<Environment>().is_err());
    }

    #[test]
    fn store_config_rejects_zero_page_size() {
        let err = StoreConfig::new(None, 0).expect_err("zero page size");
        assert_eq!(err, ConfigError::ZeroPageSize);
    }

    #[test]
    fn store_config_rejects_blank_url() {
        let err = StoreConfig::new(Some("  ".to_owned()), 50).expect_err("blank url");
        assert_eq!(err, ConfigError::EmptyStoreUrl);
    }

    #[test]
    fn resolve_string_with_default_env_used_when_cli_missing() {
        let env = MapEnv::default().with_var(ENV_STORE_URL, "https://env.example");
        let v = resolve_string_with_default(None, ENV_STORE_URL, &env, "https://def.example");
        assert_eq!(v, "https://env.example");
    }

    #[test]
    fn resolve_string_with_default_default_used_when_both_missing() {
        let env = MapEnv::default();
        let v = resolve_string_with_default(None, ENV_STORE_URL, &env, "https://def.example");
        assert_eq!(v, "https://def.example");
    }
}
