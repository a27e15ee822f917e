use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;

use crate::{GeoResult, GreetError, Stage};

use super::{GeoProvider, fetch_json, join_url};

const DEFAULT_BASE_URL: &str = "https://api.geoapify.com";

/// Geoapify IP info lookup (`/v1/ipinfo`).
#[derive(Debug, Clone)]
pub struct GeoapifyProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl GeoapifyProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct GaNamed {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GaIpInfoResponse {
    city: Option<GaNamed>,
    country: Option<GaNamed>,
}

#[async_trait]
impl GeoProvider for GeoapifyProvider {
    async fn locate(&self, ip: IpAddr) -> Result<GeoResult, GreetError> {
        let url = join_url(&self.base_url, "v1/ipinfo", Stage::Location)?;
        let ip = ip.to_string();

        let request = self
            .http
            .get(url)
            .query(&[("ip", ip.as_str()), ("apiKey", self.api_key.as_str())])
            .header("X-Forwarded-For", ip.as_str());

        let parsed: GaIpInfoResponse = fetch_json(&self.http, request, Stage::Location).await?;

        Ok(GeoResult {
            city: parsed.city.map(|c| c.name).unwrap_or_default(),
            country: parsed.country.map(|c| c.name).unwrap_or_default(),
        })
    }
}
