//! Trait and types for retrieving current weather conditions.

use anyhow::Result;
use serde::Serialize;

/// A point on the map, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Current conditions at the installation site as reported by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// °C
    pub temperature: f64,
    /// Relative humidity, 0–100.
    pub humidity: f64,
    /// Fraction of the sky covered by clouds, 0–1.
    pub cloud_fraction: f64,
    pub visibility_km: f64,
    /// Short condition label, e.g. `"Clear"`, `"Clouds"`, `"Rain"`.
    pub condition: String,
    /// Provider icon identifier, e.g. `"01d"`.
    pub icon: String,
}

/// Abstraction over a current-weather provider (e.g., OpenWeatherMap).
#[async_trait::async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current_conditions(&self, at: Coordinates) -> Result<CurrentConditions>;
}
