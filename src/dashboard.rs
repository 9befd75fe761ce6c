//! Fetch cycle and refresh loop.
//!
//! A cycle loads the readings file and the weather snapshot concurrently
//! and replaces the previous [`DashboardSnapshot`] as a whole. Cycles in the
//! refresh loop run one after another; a slow cycle delays the next tick
//! instead of overlapping with it.

use std::time::Duration;

use anyhow::Result;
use chrono::{NaiveDateTime, Timelike};
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::analyzers::types::{EnergyReading, MonthlyBucket, SeriesPoint};
use crate::analyzers::window::{TimeWindow, chart_series, monthly_buckets};
use crate::config::DashboardConfig;
use crate::fetch::{BasicClient, load_source};
use crate::infra::openweather::OpenWeatherClient;
use crate::output::{append_record, print_json};
use crate::parser::parse_readings;
use crate::services::weather_api::{Coordinates, WeatherApi};
use crate::stats::DashboardStats;
use crate::weather::{WeatherSnapshot, resolve_weather};

/// Immutable result of one fetch cycle.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    pub readings: Vec<EnergyReading>,
    pub weather: WeatherSnapshot,
    /// Set when the readings could not be loaded; `readings` is empty then.
    pub readings_error: Option<String>,
}

pub struct Dashboard {
    config: DashboardConfig,
    http: BasicClient,
    weather_api: Option<Box<dyn WeatherApi>>,
}

impl Dashboard {
    /// Builds a dashboard that uses OpenWeatherMap when an API key is configured.
    pub fn new(config: DashboardConfig) -> Self {
        let weather_api = config.weather.api_key.clone().map(|key| {
            Box::new(OpenWeatherClient::new(&config.weather.base_url, key)) as Box<dyn WeatherApi>
        });
        Self::with_weather_api(config, weather_api)
    }

    pub fn with_weather_api(
        config: DashboardConfig,
        weather_api: Option<Box<dyn WeatherApi>>,
    ) -> Self {
        Self {
            config,
            http: BasicClient::new(),
            weather_api,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.config.location.latitude,
            longitude: self.config.location.longitude,
        }
    }

    /// Current weather snapshot; falls back to mock data, never fails.
    pub async fn weather(&self, reference: NaiveDateTime) -> WeatherSnapshot {
        resolve_weather(
            self.weather_api.as_deref(),
            self.coordinates(),
            &self.config.panels,
            reference.hour(),
        )
        .await
    }

    async fn readings(&self, source: &str) -> Result<Vec<EnergyReading>> {
        let bytes = load_source(&self.http, source).await?;
        Ok(parse_readings(&bytes, self.config.panels.total_panels))
    }

    /// Runs one fetch cycle anchored at `reference`.
    #[tracing::instrument(skip(self, reference), fields(reference = %reference))]
    pub async fn load_snapshot(&self, source: &str, reference: NaiveDateTime) -> DashboardSnapshot {
        let (readings, weather) = tokio::join!(self.readings(source), self.weather(reference));

        let (readings, readings_error) = match readings {
            Ok(readings) => {
                info!(count = readings.len(), "Loaded energy readings");
                (readings, None)
            }
            Err(e) => {
                let message = format!("{e:#}");
                error!(error = %message, "Failed to load energy readings");
                (Vec::new(), Some(message))
            }
        };

        DashboardSnapshot {
            readings,
            weather,
            readings_error,
        }
    }

    pub fn summarize(&self, snapshot: &DashboardSnapshot, reference: NaiveDateTime) -> DashboardStats {
        DashboardStats::from_snapshot(snapshot, &self.config, reference)
    }

    pub fn monthly(&self, snapshot: &DashboardSnapshot, reference: NaiveDateTime) -> Vec<MonthlyBucket> {
        monthly_buckets(&snapshot.readings, reference, self.config.locale)
    }

    pub fn series(
        &self,
        snapshot: &DashboardSnapshot,
        window: TimeWindow,
        reference: NaiveDateTime,
    ) -> Vec<SeriesPoint> {
        chart_series(&snapshot.readings, window, reference)
    }

    /// Refreshes every `refresh_interval_secs`, logging each summary and
    /// appending it to `output` when given. `num_cycles == 0` runs forever.
    ///
    /// `now` is read once at the start of every cycle.
    #[tracing::instrument(skip(self, now))]
    pub async fn run_refresh_loop<F>(
        &self,
        source: &str,
        output: Option<&str>,
        num_cycles: usize,
        now: F,
    ) -> Result<()>
    where
        F: Fn() -> NaiveDateTime,
    {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.refresh_interval_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut cycle = 0usize;
        let mut snapshot: Option<DashboardSnapshot> = None;

        while num_cycles == 0 || cycle < num_cycles {
            interval.tick().await;
            cycle += 1;

            let reference = now();
            info!(cycle, %reference, "Starting refresh cycle");

            let fresh = self.load_snapshot(source, reference).await;
            let stats = self.summarize(&fresh, reference);
            snapshot = Some(fresh);

            print_json(&stats)?;
            if let Some(path) = output {
                if let Err(e) = append_record(path, &stats) {
                    error!(path, error = %e, "Failed to append dashboard history");
                }
            }
        }

        if let Some(snapshot) = snapshot {
            info!(
                cycles = cycle,
                readings = snapshot.readings.len(),
                "Refresh loop finished"
            );
        }
        Ok(())
    }
}
