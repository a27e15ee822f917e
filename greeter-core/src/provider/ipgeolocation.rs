use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::net::IpAddr;

use crate::{GeoResult, GreetError, Stage};

use super::{GeoProvider, fetch_json, join_url};

const DEFAULT_BASE_URL: &str = "https://api.ipgeolocation.io";

/// ipgeolocation.io lookup (`/ipgeo`). Fields are flat strings, unlike Geoapify.
#[derive(Debug, Clone)]
pub struct IpGeolocationProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl IpGeolocationProvider {
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
struct IgResponse {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
}

#[async_trait]
impl GeoProvider for IpGeolocationProvider {
    async fn locate(&self, ip: IpAddr) -> Result<GeoResult, GreetError> {
        let url = join_url(&self.base_url, "ipgeo", Stage::Location)?;
        let ip = ip.to_string();

        let request = self
            .http
            .get(url)
            .query(&[("apiKey", self.api_key.as_str()), ("ip", ip.as_str())]);

        let parsed: IgResponse = fetch_json(&self.http, request, Stage::Location).await?;

        Ok(GeoResult {
            city: parsed.city.unwrap_or_default(),
            country: parsed.country_name.unwrap_or_default(),
        })
    }
}
