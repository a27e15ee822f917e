//! The greeting pipeline: locate the visitor, look up the weather there,
//! and compose the response.

use std::{
    net::{IpAddr, Ipv4Addr},
    sync::Arc,
};

use tracing::{debug, instrument};

use crate::{ApiResponse, GeoProvider, GreetError, WeatherProvider};

pub const DEFAULT_VISITOR_NAME: &str = "Guest";

/// Public address substituted for loopback callers, so local runs still
/// resolve to a real location.
pub const LOOPBACK_FALLBACK_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8));

/// Replace loopback addresses (including IPv4-mapped ones) with
/// [`LOOPBACK_FALLBACK_IP`].
pub fn resolve_client_ip(ip: IpAddr) -> IpAddr {
    if ip.to_canonical().is_loopback() {
        LOOPBACK_FALLBACK_IP
    } else {
        ip
    }
}

pub fn visitor_name_or_default(name: Option<&str>) -> &str {
    match name {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_VISITOR_NAME,
    }
}

pub fn compose_greeting(visitor_name: &str, temperature_celsius: f64, location: &str) -> String {
    format!(
        "Hello, {visitor_name}! The temperature is {temperature_celsius:.2} degrees Celsius in {location}"
    )
}

#[derive(Debug, Clone)]
pub struct Greeter {
    geo: Arc<dyn GeoProvider>,
    weather: Arc<dyn WeatherProvider>,
}

impl Greeter {
    pub fn new(geo: Arc<dyn GeoProvider>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { geo, weather }
    }

    /// Run both lookups in order. The weather provider is only called once a
    /// non-empty location has been resolved.
    #[instrument(skip(self))]
    pub async fn greet(
        &self,
        visitor_name: Option<&str>,
        client_ip: IpAddr,
    ) -> Result<ApiResponse, GreetError> {
        let visitor_name = visitor_name_or_default(visitor_name);
        let client_ip = resolve_client_ip(client_ip);

        let geo = self.geo.locate(client_ip).await?;
        if geo.is_empty() {
            return Err(GreetError::EmptyLocation);
        }
        let location = geo.display();
        debug!(%location, "Resolved visitor location");

        let weather = self.weather.current_temperature(geo.weather_query()).await?;
        debug!(temperature = weather.temperature_celsius, "Fetched temperature");

        Ok(ApiResponse {
            client_ip: client_ip.to_string(),
            greeting: compose_greeting(visitor_name, weather.temperature_celsius, &location),
            location,
        })
    }
}
