use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::PathBuf};

use crate::provider::ProviderId;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

pub const ENV_GEO_API_KEY: &str = "IP_GEOLOCATION_API_KEY";
pub const ENV_WEATHER_API_KEY: &str = "WEATHER_API_KEY";
pub const ENV_GEO_PROVIDER: &str = "GEO_PROVIDER";
pub const ENV_PORT: &str = "PORT";
pub const ENV_HOST: &str = "HOST";

/// Configuration for a single provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,

    /// Overrides the provider's public endpoint, mostly for tests and proxies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Top-level configuration, stored on disk and overlaid by the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Geolocation provider id, "geoapify" or "ipgeolocation".
    pub geo_provider: Option<String>,

    pub host: Option<String>,
    pub port: Option<u16>,

    /// Example TOML:
    /// [providers.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// `IP_GEOLOCATION_API_KEY`, kept apart from `providers` because the
    /// geolocation provider may still change after the environment is read.
    #[serde(skip)]
    pub geo_api_key: Option<String>,
}

impl Config {
    /// The geolocation provider to use; Geoapify when nothing is configured.
    pub fn geo_provider_id(&self) -> Result<ProviderId> {
        let Some(s) = self.geo_provider.as_deref() else {
            return Ok(ProviderId::Geoapify);
        };

        let id = ProviderId::try_from(s)?;
        if !id.is_geolocation() {
            return Err(anyhow!(
                "Provider '{id}' cannot resolve IP addresses. \
                 Use one of: geoapify, ipgeolocation."
            ));
        }
        Ok(id)
    }

    pub fn set_geo_provider(&mut self, id: ProviderId) {
        self.geo_provider = Some(id.as_str().to_string());
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or(DEFAULT_HOST)
    }

    pub fn port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn provider_config(&self, id: ProviderId) -> Option<&ProviderConfig> {
        self.providers.get(id.as_str())
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "visitor-greeter", "greeter")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`. `IP_GEOLOCATION_API_KEY` is resolved against
    /// the geolocation provider selected last, see [`Config::api_key_for`].
    pub fn apply_vars<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var(ENV_GEO_PROVIDER) {
            self.geo_provider = Some(provider.trim().to_string());
        }
        if let Some(host) = var(ENV_HOST) {
            self.host = Some(host);
        }
        if let Some(port) = var(ENV_PORT) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("{ENV_PORT} must be a port number, got '{port}'"))?;
            self.port = Some(port);
        }
        if let Some(key) = var(ENV_GEO_API_KEY) {
            self.geo_api_key = Some(key);
        }
        if let Some(key) = var(ENV_WEATHER_API_KEY) {
            self.upsert_provider_api_key(ProviderId::OpenWeather, key);
        }

        Ok(())
    }

    /// Set/replace a provider API key, keeping any configured base URL.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers
            .entry(provider_id.as_str().to_string())
            .or_default()
            .api_key = api_key;
    }

    /// Returns API key for a provider, if present.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.provider_config(provider_id)
            .map(|cfg| cfg.api_key.as_str())
            .filter(|key| !key.is_empty())
    }

    /// Effective API key: the environment's geolocation key wins for the
    /// selected geolocation provider, otherwise the stored one.
    pub fn api_key_for(&self, provider_id: ProviderId) -> Option<&str> {
        let selected_geo = self.geo_provider_id().ok() == Some(provider_id);
        match self.geo_api_key.as_deref() {
            Some(key) if selected_geo => Some(key),
            _ => self.provider_api_key(provider_id),
        }
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.api_key_for(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let cfg = Config::default();

        assert_eq!(cfg.geo_provider_id().unwrap(), ProviderId::Geoapify);
        assert_eq!(cfg.host(), "0.0.0.0");
        assert_eq!(cfg.port(), 8080);
        assert!(!cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn env_keys_land_on_selected_providers() {
        let mut cfg = Config::default();
        cfg.apply_vars(env(&[
            ("IP_GEOLOCATION_API_KEY", "GEO_KEY"),
            ("WEATHER_API_KEY", "OW_KEY"),
            ("PORT", "3000"),
        ]))
        .unwrap();

        assert_eq!(cfg.api_key_for(ProviderId::Geoapify), Some("GEO_KEY"));
        assert_eq!(cfg.api_key_for(ProviderId::OpenWeather), Some("OW_KEY"));
        assert_eq!(cfg.port(), 3000);
    }

    #[test]
    fn geo_key_follows_geo_provider_env() {
        let mut cfg = Config::default();
        cfg.apply_vars(env(&[
            ("GEO_PROVIDER", "ipgeolocation"),
            ("IP_GEOLOCATION_API_KEY", "GEO_KEY"),
        ]))
        .unwrap();

        assert_eq!(cfg.geo_provider_id().unwrap(), ProviderId::IpGeolocation);
        assert_eq!(cfg.api_key_for(ProviderId::IpGeolocation), Some("GEO_KEY"));
        assert!(!cfg.is_provider_configured(ProviderId::Geoapify));
    }

    #[test]
    fn geo_key_follows_provider_chosen_after_env() {
        // Order used by `greeter serve --geo-provider ...`: env first, flags last.
        let mut cfg = Config::default();
        cfg.apply_vars(env(&[("IP_GEOLOCATION_API_KEY", "GEO_KEY")]))
            .unwrap();
        cfg.set_geo_provider(ProviderId::IpGeolocation);

        assert_eq!(cfg.geo_provider_id().unwrap(), ProviderId::IpGeolocation);
        assert_eq!(cfg.api_key_for(ProviderId::IpGeolocation), Some("GEO_KEY"));
        assert!(!cfg.is_provider_configured(ProviderId::Geoapify));
    }

    #[test]
    fn env_geo_key_beats_stored_key_only_for_selected_provider() {
        let mut cfg = Config::from_toml(
            r#"
            geo_provider = "ipgeolocation"

            [providers.geoapify]
            api_key = "FILE_GA"

            [providers.ipgeolocation]
            api_key = "FILE_IG"
            "#,
        )
        .unwrap();
        cfg.apply_vars(env(&[("IP_GEOLOCATION_API_KEY", "ENV_KEY")]))
            .unwrap();

        assert_eq!(cfg.api_key_for(ProviderId::IpGeolocation), Some("ENV_KEY"));
        assert_eq!(cfg.api_key_for(ProviderId::Geoapify), Some("FILE_GA"));
    }

    #[test]
    fn env_geo_key_is_not_saved() {
        let mut cfg = Config::default();
        cfg.apply_vars(env(&[("IP_GEOLOCATION_API_KEY", "GEO_KEY")]))
            .unwrap();

        let toml = toml::to_string_pretty(&cfg).unwrap();
        assert!(!toml.contains("GEO_KEY"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = Config {
            port: Some(9000),
            ..Config::default()
        };
        cfg.apply_vars(env(&[("PORT", ""), ("WEATHER_API_KEY", "  ")]))
            .unwrap();

        assert_eq!(cfg.port(), 9000);
        assert!(!cfg.is_provider_configured(ProviderId::OpenWeather));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut cfg = Config::default();
        let err = cfg.apply_vars(env(&[("PORT", "eighty")])).unwrap_err();

        assert!(err.to_string().contains("PORT must be a port number"));
    }

    #[test]
    fn weather_provider_cannot_be_geo_provider() {
        let mut cfg = Config::default();
        cfg.set_geo_provider(ProviderId::OpenWeather);

        let err = cfg.geo_provider_id().unwrap_err();
        assert!(err.to_string().contains("cannot resolve IP addresses"));
    }

    #[test]
    fn env_overrides_key_but_keeps_base_url() {
        let mut cfg = Config::from_toml(
            r#"
            geo_provider = "geoapify"
            port = 8081

            [providers.openweather]
            api_key = "FILE_KEY"
            base_url = "http://localhost:9999"
            "#,
        )
        .unwrap();

        cfg.apply_vars(env(&[("WEATHER_API_KEY", "ENV_KEY")]))
            .unwrap();

        let ow = cfg.provider_config(ProviderId::OpenWeather).unwrap();
        assert_eq!(ow.api_key, "ENV_KEY");
        assert_eq!(ow.base_url.as_deref(), Some("http://localhost:9999"));
        assert_eq!(cfg.port(), 8081);
    }
}
