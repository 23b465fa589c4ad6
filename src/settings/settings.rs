use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub http: Http,
    pub log: Log,
    pub mail: Mail,
    pub reset: Reset,
    pub store: Store,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub verification_ttl_secs: u64,
    /// Used only when `JWT_SIGNING_KEY` is not set.
    pub dev_signing_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    /// Serves plain HTTP when either path is missing.
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Mail {
    pub base_url: String,
    pub from: String,
}

#[derive(Debug, Deserialize)]
pub struct Reset {
    pub hmac_key: String,
    pub code_ttl_secs: i64,
    pub max_attempts: u32,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: Option<String>,
    pub redis_dsn: Option<String>,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub const SIGNING_KEY_ENV: &str = "JWT_SIGNING_KEY";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

impl Auth {
    pub fn signing_key(&self) -> Result<Vec<u8>> {
        match std::env::var(SIGNING_KEY_ENV) {
            Ok(key) if !key.is_empty() => Ok(key.into_bytes()),
            _ => self
                .dev_signing_key
                .as_ref()
                .map(|key| key.as_bytes().to_vec())
                .ok_or_else(|| anyhow!("{SIGNING_KEY_ENV} is not set")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_settings_parse() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();
        assert_eq!(settings.store.backend, "memory");
        assert!(settings.http.cert_path.is_none());
        assert!(settings.reset.max_attempts > 0);
    }

    #[test]
    fn release_settings_parse() {
        let settings = parse_settings(Some("settings/release.toml")).unwrap();
        assert_eq!(settings.store.backend, "mysql");
        assert!(settings.auth.dev_signing_key.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/absent.toml")).is_err());
    }
}
