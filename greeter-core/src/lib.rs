//! Core library for the visitor greeter service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Abstraction over geolocation and weather providers
//! - Shared domain models (lookup results, wire responses)
//! - The greeting pipeline that chains both lookups
//!
//! It is used by `greeter-server`, but can also be reused by other binaries.

pub mod config;
pub mod error;
pub mod greeting;
pub mod model;
pub mod provider;

pub use config::{Config, ProviderConfig};
pub use error::{GreetError, Stage};
pub use greeting::Greeter;
pub use model::{ApiResponse, ErrorResponse, GeoResult, HomeResponse, WeatherResult};
pub use provider::{GeoProvider, ProviderId, WeatherProvider};
