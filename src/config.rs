//! Dashboard configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! yields a working configuration:
//! ```json
//! {
//!   "rates": { "purchase_rate_per_kwh": 0.21 },
//!   "panels": { "total_panels": 20, "next_maintenance": "2026-05-02" },
//!   "locale": "de"
//! }
//! ```
//! The weather API key is never read from the file; it comes from the
//! `OPENWEATHER_API_KEY` environment variable.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Deserialize;

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Fixed conversion rates used by the metric aggregator.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Rates {
    /// Grid carbon intensity, kg CO2 per kWh.
    pub co2_intensity_kg_per_kwh: f64,
    /// Price paid for a kWh imported from the grid.
    pub purchase_rate_per_kwh: f64,
    /// Compensation received for a kWh exported to the grid.
    pub feed_in_rate_per_kwh: f64,
    /// kg CO2 a tree absorbs per year, for the "equivalent trees" figure.
    pub co2_kg_per_tree: f64,
}

impl Default for Rates {
    fn default() -> Self {
        Self {
            co2_intensity_kg_per_kwh: 0.128,
            purchase_rate_per_kwh: 0.17,
            feed_in_rate_per_kwh: 0.08,
            co2_kg_per_tree: 25.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub total_panels: u32,
    pub watts_per_panel: f64,
    /// Current output reported by the panel controller, in watts.
    pub actual_output_watts: f64,
    pub next_maintenance: Option<NaiveDate>,
}

impl PanelConfig {
    /// Theoretical maximum output of the installation in watts.
    pub fn max_capacity_watts(&self) -> f64 {
        self.total_panels as f64 * self.watts_per_panel
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            total_panels: 16,
            watts_per_panel: 350.0,
            actual_output_watts: 2788.0,
            next_maintenance: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for Location {
    fn default() -> Self {
        // Zurich
        Self {
            latitude: 47.3769,
            longitude: 8.5417,
        }
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL of the current-weather endpoint, or of a proxy in front of it.
    pub base_url: String,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            api_key: None,
        }
    }
}

/// Language used for month labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelLocale {
    #[default]
    En,
    De,
}

impl LabelLocale {
    /// Abbreviated name of a 1-based month.
    ///
    /// Pinned tables rather than chrono's `format_localized`, which needs the
    /// `unstable-locales` feature and may change labels between releases.
    pub fn month_abbrev(self, month: u32) -> &'static str {
        const EN: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        const DE: [&str; 12] = [
            "Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez",
        ];
        let idx = (month.clamp(1, 12) - 1) as usize;
        match self {
            LabelLocale::En => EN[idx],
            LabelLocale::De => DE[idx],
        }
    }
}

/// Normalizes a raw API key value; blank means no key.
pub fn api_key_from(raw: Option<String>) -> Option<String> {
    raw.map(|k| k.trim().to_string()).filter(|k| !k.is_empty())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub rates: Rates,
    pub panels: PanelConfig,
    pub location: Location,
    pub weather: WeatherConfig,
    pub refresh_interval_secs: u64,
    pub locale: LabelLocale,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            rates: Rates::default(),
            panels: PanelConfig::default(),
            location: Location::default(),
            weather: WeatherConfig::default(),
            refresh_interval_secs: 300,
            locale: LabelLocale::default(),
        }
    }
}

impl DashboardConfig {
    /// Loads the config from a JSON file at `path`, or the defaults when
    /// `path` is `None`, then picks up the API key from the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file '{path}'"))?;
                Self::from_json(&content)
                    .with_context(|| format!("Invalid config file '{path}'"))?
            }
            None => Self::default(),
        };

        config.weather.api_key = api_key_from(std::env::var(API_KEY_ENV).ok());

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn validate(&self) -> Result<()> {
        let rates = [
            ("co2_intensity_kg_per_kwh", self.rates.co2_intensity_kg_per_kwh),
            ("purchase_rate_per_kwh", self.rates.purchase_rate_per_kwh),
            ("feed_in_rate_per_kwh", self.rates.feed_in_rate_per_kwh),
            ("co2_kg_per_tree", self.rates.co2_kg_per_tree),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value <= 0.0 {
                bail!("rates.{name} must be a positive number, got {value}");
            }
        }

        if self.panels.total_panels == 0 {
            bail!("panels.total_panels must be at least 1");
        }

        if !self.panels.watts_per_panel.is_finite() || self.panels.watts_per_panel <= 0.0 {
            bail!("panels.watts_per_panel must be a positive number");
        }

        if !self.panels.actual_output_watts.is_finite() || self.panels.actual_output_watts < 0.0 {
            bail!("panels.actual_output_watts cannot be negative");
        }

        if self.refresh_interval_secs == 0 {
            bail!("refresh_interval_secs must be at least 1");
        }

        if self.weather.base_url.is_empty() {
            bail!("weather.base_url cannot be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = DashboardConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.panels.max_capacity_watts(), 5600.0);
        assert_eq!(config.refresh_interval_secs, 300);
    }

    #[test]
    fn test_partial_json_keeps_other_defaults() {
        let config = DashboardConfig::from_json(
            r#"{ "rates": { "purchase_rate_per_kwh": 0.21 }, "locale": "de" }"#,
        )
        .unwrap();

        assert_eq!(config.rates.purchase_rate_per_kwh, 0.21);
        assert_eq!(config.rates.feed_in_rate_per_kwh, 0.08);
        assert_eq!(config.panels.total_panels, 16);
        assert_eq!(config.locale, LabelLocale::De);
    }

    #[test]
    fn test_maintenance_date_parses() {
        let config =
            DashboardConfig::from_json(r#"{ "panels": { "next_maintenance": "2026-05-02" } }"#)
                .unwrap();
        assert_eq!(
            config.panels.next_maintenance,
            NaiveDate::from_ymd_opt(2026, 5, 2)
        );
    }

    #[test]
    fn test_non_positive_rate_rejected() {
        let mut config = DashboardConfig::default();
        config.rates.feed_in_rate_per_kwh = 0.0;
        assert!(config.validate().is_err());

        config.rates.feed_in_rate_per_kwh = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_panels_rejected() {
        let mut config = DashboardConfig::default();
        config.panels.total_panels = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = DashboardConfig::default();
        config.weather.api_key = Some("secret-key".to_string());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_api_key_from_env_value() {
        assert_eq!(api_key_from(None), None);
        assert_eq!(api_key_from(Some(String::new())), None);
        assert_eq!(api_key_from(Some("   ".to_string())), None);
        assert_eq!(
            api_key_from(Some(" abc123 \n".to_string())),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_month_abbrev() {
        assert_eq!(LabelLocale::En.month_abbrev(3), "Mar");
        assert_eq!(LabelLocale::De.month_abbrev(3), "Mär");
        assert_eq!(LabelLocale::De.month_abbrev(12), "Dez");
    }
}
