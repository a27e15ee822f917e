use serde::{Deserialize, Serialize};

/// City/country pair resolved from the visitor's IP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeoResult {
    pub city: String,
    pub country: String,
}

impl GeoResult {
    pub fn is_empty(&self) -> bool {
        self.city.is_empty() && self.country.is_empty()
    }

    /// `"<city>, <country>"`, as embedded in the greeting.
    pub fn display(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }

    /// Place name handed to the weather provider.
    pub fn weather_query(&self) -> &str {
        if self.city.is_empty() {
            &self.country
        } else {
            &self.city
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherResult {
    pub temperature_celsius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub client_ip: String,
    pub location: String,
    pub greeting: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
