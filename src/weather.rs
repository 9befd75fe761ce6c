//! Weather-based panel efficiency estimate.
//!
//! Expected output is modelled from a 1000 W/m² peak irradiance, reduced by
//! cloud cover, time of day and haze, then derated for heat, clouds and
//! humidity. Efficiency is the reported actual output relative to that
//! expectation.
//!
//! When no live conditions are available the same formula runs over a fixed
//! set of conditions and the result is flagged as mock data.

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PanelConfig;
use crate::services::weather_api::{Coordinates, CurrentConditions, WeatherApi};

/// W/m² under standard test conditions.
pub const PEAK_IRRADIANCE: f64 = 1000.0;

/// `(exclusive upper bound, multiplier)` by cloud fraction.
pub const CLOUD_BANDS: &[(f64, f64)] = &[
    (0.1, 0.95),
    (0.3, 0.85),
    (0.6, 0.65),
    (0.8, 0.45),
    (f64::INFINITY, 0.25),
];

/// `(exclusive upper bound, multiplier)` by local hour of day.
pub const HOUR_BANDS: &[(f64, f64)] = &[
    (6.0, 0.1),
    (8.0, 0.7),
    (17.0, 1.0),
    (19.0, 0.7),
    (f64::INFINITY, 0.1),
];

const STC_TEMPERATURE: f64 = 25.0;
const TEMPERATURE_COEFFICIENT: f64 = 0.004;

const MOCK_TEMPERATURE: f64 = 32.0;
const MOCK_CLOUD_FRACTION: f64 = 0.15;
const MOCK_IRRADIANCE: f64 = 850.0;
const MOCK_HUMIDITY: f64 = 45.0;
const MOCK_MAX_CAPACITY_WATTS: f64 = 5440.0;
const MOCK_ACTUAL_OUTPUT_WATTS: f64 = 3988.0;
const MOCK_CONDITION: &str = "Sunny";
const MOCK_ICON: &str = "01d";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub is_mock: bool,
    /// °C
    pub temperature: f64,
    /// 0–1
    pub cloud_cover: f64,
    /// W/m², 0–1000
    pub irradiance: f64,
    /// %
    pub humidity: f64,
    /// %, 0–100
    pub efficiency: f64,
    pub condition: String,
    pub icon: String,
}

/// Looks up the multiplier of the first band whose upper bound exceeds
/// `value`. Values past every bound (or NaN) get the last band's multiplier.
pub fn band_multiplier(bands: &[(f64, f64)], value: f64) -> f64 {
    bands
        .iter()
        .find(|(upper, _)| value < *upper)
        .or_else(|| bands.last())
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

/// Irradiance expected at the panels, in W/m².
pub fn estimate_irradiance(cloud_fraction: f64, hour: u32, visibility_km: f64) -> f64 {
    let mut irradiance = PEAK_IRRADIANCE;
    irradiance *= band_multiplier(CLOUD_BANDS, cloud_fraction);
    irradiance *= band_multiplier(HOUR_BANDS, hour as f64);

    let clarity = (visibility_km / 10.0).clamp(0.0, 1.0);
    irradiance * (0.9 + clarity * 0.1)
}

/// Output the installation should deliver under the given conditions, in watts.
pub fn expected_output_watts(
    max_capacity_watts: f64,
    irradiance: f64,
    temperature: f64,
    cloud_fraction: f64,
    humidity: f64,
) -> f64 {
    let temperature_derate = if temperature > STC_TEMPERATURE {
        1.0 - (temperature - STC_TEMPERATURE) * TEMPERATURE_COEFFICIENT
    } else {
        1.0
    };
    let cloud_derate = 1.0 - cloud_fraction * 0.5;
    let humidity_derate = 1.0 - (humidity / 100.0) * 0.02;

    max_capacity_watts
        * (irradiance / PEAK_IRRADIANCE)
        * temperature_derate
        * cloud_derate
        * humidity_derate
}

/// `actual / expected` as a whole percentage clamped to 0–100. Returns 0
/// when nothing is expected.
pub fn efficiency_percent(actual_watts: f64, expected_watts: f64) -> f64 {
    if !expected_watts.is_finite() || expected_watts <= 0.0 {
        return 0.0;
    }
    let efficiency = (actual_watts / expected_watts * 100.0).round();
    if efficiency.is_nan() {
        0.0
    } else {
        efficiency.clamp(0.0, 100.0)
    }
}

/// Snapshot computed from live conditions at local `hour`.
pub fn live_snapshot(
    conditions: &CurrentConditions,
    panels: &PanelConfig,
    hour: u32,
) -> WeatherSnapshot {
    let temperature = conditions.temperature.round();
    let irradiance =
        estimate_irradiance(conditions.cloud_fraction, hour, conditions.visibility_km);

    let expected = expected_output_watts(
        panels.max_capacity_watts(),
        irradiance,
        temperature,
        conditions.cloud_fraction,
        conditions.humidity,
    );

    WeatherSnapshot {
        is_mock: false,
        temperature,
        cloud_cover: conditions.cloud_fraction,
        irradiance: irradiance.round(),
        humidity: conditions.humidity,
        efficiency: efficiency_percent(panels.actual_output_watts, expected),
        condition: conditions.condition.clone(),
        icon: conditions.icon.clone(),
    }
}

/// Snapshot computed from the fixed fallback conditions and installation.
/// Independent of the configured panels.
pub fn mock_snapshot() -> WeatherSnapshot {
    let expected = expected_output_watts(
        MOCK_MAX_CAPACITY_WATTS,
        MOCK_IRRADIANCE,
        MOCK_TEMPERATURE,
        MOCK_CLOUD_FRACTION,
        MOCK_HUMIDITY,
    );

    WeatherSnapshot {
        is_mock: true,
        temperature: MOCK_TEMPERATURE,
        cloud_cover: MOCK_CLOUD_FRACTION,
        irradiance: MOCK_IRRADIANCE,
        humidity: MOCK_HUMIDITY,
        efficiency: efficiency_percent(MOCK_ACTUAL_OUTPUT_WATTS, expected),
        condition: MOCK_CONDITION.to_string(),
        icon: MOCK_ICON.to_string(),
    }
}

/// Fetches live conditions from `api` and derives the snapshot, falling
/// back to [`mock_snapshot`] when no provider is configured or the request
/// fails. Never returns an error.
pub async fn resolve_weather(
    api: Option<&dyn WeatherApi>,
    at: Coordinates,
    panels: &PanelConfig,
    hour: u32,
) -> WeatherSnapshot {
    let Some(api) = api else {
        warn!("No weather API key configured, using mock weather data");
        return mock_snapshot();
    };

    match api.current_conditions(at).await {
        Ok(conditions) => {
            let snapshot = live_snapshot(&conditions, panels, hour);
            debug!(
                efficiency = snapshot.efficiency,
                irradiance = snapshot.irradiance,
                "Live weather snapshot computed"
            );
            snapshot
        }
        Err(e) => {
            warn!(error = %e, "Weather fetch failed, using mock weather data");
            mock_snapshot()
        }
    }
}
