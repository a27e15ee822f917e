use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{GreetError, Stage, WeatherResult};

use super::{WeatherProvider, fetch_json, join_url};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
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
struct OwMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_temperature(&self, place: &str) -> Result<WeatherResult, GreetError> {
        let url = join_url(&self.base_url, "data/2.5/weather", Stage::Weather)?;

        let request = self.http.get(url).query(&[
            ("q", place),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);

        let parsed: OwCurrentResponse = fetch_json(&self.http, request, Stage::Weather).await?;

        Ok(WeatherResult {
            temperature_celsius: parsed.main.temp,
        })
    }
}
