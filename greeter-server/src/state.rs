use anyhow::Result;
use greeter_core::{
    Config, Greeter,
    provider::{geo_provider_from_config, weather_provider_from_config},
};

/// Shared, immutable handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub greeter: Greeter,
}

impl AppState {
    pub fn new(greeter: Greeter) -> Self {
        Self { greeter }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let geo = geo_provider_from_config(config)?;
        let weather = weather_provider_from_config(config);
        Ok(Self::new(Greeter::new(geo, weather)))
    }
}
