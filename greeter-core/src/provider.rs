use crate::{
    Config, GeoResult, GreetError, Stage, WeatherResult,
    provider::{
        geoapify::GeoapifyProvider, ipgeolocation::IpGeolocationProvider,
        openweather::OpenWeatherProvider,
    },
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug, net::IpAddr, sync::Arc};

pub mod geoapify;
pub mod ipgeolocation;
pub mod openweather;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Geoapify,
    IpGeolocation,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Geoapify => "geoapify",
            ProviderId::IpGeolocation => "ipgeolocation",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::Geoapify,
            ProviderId::IpGeolocation,
            ProviderId::OpenWeather,
        ]
    }

    /// Whether this provider resolves IP addresses (as opposed to weather).
    pub fn is_geolocation(&self) -> bool {
        matches!(self, ProviderId::Geoapify | ProviderId::IpGeolocation)
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "geoapify" => Ok(ProviderId::Geoapify),
            "ipgeolocation" => Ok(ProviderId::IpGeolocation),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => {
                let supported: Vec<&str> = ProviderId::all().iter().map(|id| id.as_str()).collect();
                Err(anyhow::anyhow!(
                    "Unknown provider '{value}'. Supported providers: {}.",
                    supported.join(", ")
                ))
            }
        }
    }
}

/// Resolves an IP address to a city/country pair.
#[async_trait]
pub trait GeoProvider: Send + Sync + Debug {
    async fn locate(&self, ip: IpAddr) -> Result<GeoResult, GreetError>;
}

/// Looks up the current temperature for a place name.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_temperature(&self, place: &str) -> Result<WeatherResult, GreetError>;
}

fn api_key_or_warn(id: ProviderId, config: &Config) -> String {
    if !config.is_provider_configured(id) {
        tracing::warn!(
            provider = %id,
            "No API key configured; requests to this provider will likely be rejected"
        );
    }
    config.api_key_for(id).unwrap_or_default().to_owned()
}

fn base_url(id: ProviderId, config: &Config) -> Option<String> {
    config
        .provider_config(id)
        .and_then(|cfg| cfg.base_url.clone())
}

/// Construct the configured geolocation provider.
pub fn geo_provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn GeoProvider>> {
    let id = config.geo_provider_id()?;
    let api_key = api_key_or_warn(id, config);
    let base = base_url(id, config);

    let provider: Arc<dyn GeoProvider> = match id {
        ProviderId::Geoapify => {
            let mut p = GeoapifyProvider::new(api_key);
            if let Some(url) = base {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderId::IpGeolocation => {
            let mut p = IpGeolocationProvider::new(api_key);
            if let Some(url) = base {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        ProviderId::OpenWeather => {
            anyhow::bail!("Provider '{id}' cannot resolve IP addresses")
        }
    };

    Ok(provider)
}

/// Construct the weather provider. OpenWeather is the only one supported.
pub fn weather_provider_from_config(config: &Config) -> Arc<dyn WeatherProvider> {
    let id = ProviderId::OpenWeather;
    let mut provider = OpenWeatherProvider::new(api_key_or_warn(id, config));
    if let Some(url) = base_url(id, config) {
        provider = provider.with_base_url(url);
    }
    Arc::new(provider)
}

/// Send a prepared GET and decode its JSON body, tagging failures with `stage`.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &Client,
    request: RequestBuilder,
    stage: Stage,
) -> Result<T, GreetError> {
    let request = request.build().map_err(|e| GreetError::Request {
        stage,
        reason: e.to_string(),
    })?;

    tracing::debug!(%stage, url = %redact_query(request.url()), "Sending provider request");

    let res = http
        .execute(request)
        .await
        .map_err(|source| GreetError::Fetch { stage, source })?;

    let status = res.status();
    let body = res.text().await;

    // A non-2xx status is reported as such even if its body can't be read.
    if !status.is_success() {
        return Err(GreetError::Status {
            stage,
            status,
            body: body.map(|b| truncate_body(&b)).unwrap_or_default(),
        });
    }

    let body = body.map_err(|source| GreetError::Read { stage, source })?;

    serde_json::from_str(&body).map_err(|source| GreetError::Parse { stage, source })
}

pub(crate) fn join_url(base: &str, path: &str, stage: Stage) -> Result<reqwest::Url, GreetError> {
    let url = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    reqwest::Url::parse(&url).map_err(|e| GreetError::Request {
        stage,
        reason: format!("invalid URL '{url}': {e}"),
    })
}

/// Strips the query string so API keys never reach the logs.
fn redact_query(url: &reqwest::Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        assert_eq!(
            ProviderId::try_from(" GeoApify ").unwrap(),
            ProviderId::Geoapify
        );
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
        assert!(
            err.to_string()
                .contains("Supported providers: geoapify, ipgeolocation, openweather.")
        );
    }

    #[test]
    fn only_ip_providers_are_geolocation() {
        assert!(ProviderId::Geoapify.is_geolocation());
        assert!(ProviderId::IpGeolocation.is_geolocation());
        assert!(!ProviderId::OpenWeather.is_geolocation());
    }

    #[test]
    fn geo_provider_from_config_defaults_to_geoapify() {
        let cfg = Config::default();
        let provider = geo_provider_from_config(&cfg).expect("default provider");
        assert!(format!("{provider:?}").contains("GeoapifyProvider"));
    }

    #[test]
    fn geo_provider_from_config_uses_env_key_for_flag_selected_provider() {
        let mut cfg = Config::default();
        cfg.apply_vars(|name| (name == "IP_GEOLOCATION_API_KEY").then(|| "GEO_KEY".to_string()))
            .unwrap();
        cfg.set_geo_provider(ProviderId::IpGeolocation);

        let provider = geo_provider_from_config(&cfg).expect("configured provider");
        let debug = format!("{provider:?}");
        assert!(debug.contains("IpGeolocationProvider"));
        assert!(debug.contains("api_key: \"GEO_KEY\""));
    }

    #[test]
    fn geo_provider_from_config_rejects_weather_provider() {
        let mut cfg = Config::default();
        cfg.set_geo_provider(ProviderId::OpenWeather);
        assert!(geo_provider_from_config(&cfg).is_err());
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn join_url_tolerates_slashes() {
        let url = join_url("http://localhost:1234/", "/v1/ipinfo", Stage::Location).unwrap();
        assert_eq!(url.as_str(), "http://localhost:1234/v1/ipinfo");
    }

    #[test]
    fn join_url_rejects_garbage() {
        let err = join_url("not a url", "x", Stage::Weather).unwrap_err();
        assert_eq!(err.public_message(), "Failed to create request");
    }

    #[test]
    fn redact_query_drops_api_keys() {
        let url = reqwest::Url::parse("https://api.example.com/x?apiKey=secret").unwrap();
        assert_eq!(redact_query(&url), "https://api.example.com/x");
    }
}
