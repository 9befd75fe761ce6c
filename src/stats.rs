use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::analyzers::aggregate::{
    compute_totals, environmental_impact, impact_from_totals, independence_from_totals,
    percentage_change, trees_equivalent,
};
use crate::analyzers::status::panel_status;
use crate::analyzers::types::PanelStatus;
use crate::analyzers::window::previous_period;
use crate::config::DashboardConfig;
use crate::dashboard::DashboardSnapshot;

/// Flat summary of one dashboard refresh, suitable for a CSV history row.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub reference: NaiveDateTime,
    pub readings: usize,

    // lifetime totals
    pub total_production: f64,
    pub total_consumption: f64,
    pub net_balance: f64,
    pub energy_independence: f64,
    pub co2_avoided_kg: f64,
    pub trees_equivalent: u64,
    pub money_saved_total: f64,

    // month over month
    pub money_saved_this_month: f64,
    pub money_saved_last_month: f64,
    pub money_saved_change_pct: f64,
    pub money_saved_increasing: bool,

    // panels
    pub panels_online: Option<u32>,
    pub total_panels: u32,
    pub panel_status: Option<PanelStatus>,
    pub next_maintenance: Option<NaiveDate>,

    // weather
    pub weather_is_mock: bool,
    pub temperature: f64,
    pub cloud_cover: f64,
    pub irradiance: f64,
    pub humidity: f64,
    pub efficiency: f64,
    pub weather_condition: String,
    pub weather_icon: String,

    // error tracking
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl DashboardStats {
    pub fn from_snapshot(
        snapshot: &DashboardSnapshot,
        config: &DashboardConfig,
        reference: NaiveDateTime,
    ) -> Self {
        let readings = &snapshot.readings;
        let rates = &config.rates;

        let totals = compute_totals(readings);
        let impact = impact_from_totals(&totals, rates);

        let period = previous_period(readings, reference);
        let this_month = environmental_impact(&period.current, rates);
        let last_month = environmental_impact(&period.previous, rates);
        let change = percentage_change(this_month.money_saved, last_month.money_saved);

        let latest = readings.iter().max_by_key(|r| r.timestamp);
        let panels_online = latest.map(|r| r.panels_online);
        let total_panels = config.panels.total_panels;

        let weather = &snapshot.weather;

        DashboardStats {
            reference,
            readings: readings.len(),
            total_production: totals.production,
            total_consumption: totals.expenditure,
            net_balance: totals.net_balance(),
            energy_independence: independence_from_totals(&totals),
            co2_avoided_kg: impact.co2_emissions_avoided,
            trees_equivalent: trees_equivalent(impact.co2_emissions_avoided, rates),
            money_saved_total: impact.money_saved,
            money_saved_this_month: this_month.money_saved,
            money_saved_last_month: last_month.money_saved,
            money_saved_change_pct: change.percent,
            money_saved_increasing: change.increasing,
            panels_online,
            total_panels,
            panel_status: panels_online.map(|online| panel_status(online, total_panels)),
            next_maintenance: config.panels.next_maintenance,
            weather_is_mock: weather.is_mock,
            temperature: weather.temperature,
            cloud_cover: weather.cloud_cover,
            irradiance: weather.irradiance,
            humidity: weather.humidity,
            efficiency: weather.efficiency,
            weather_condition: weather.condition.clone(),
            weather_icon: weather.icon.clone(),
            error_type: snapshot
                .readings_error
                .as_ref()
                .map(|_| "fetch_error".to_string()),
            error_message: snapshot.readings_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::EnergyReading;
    use crate::weather::mock_snapshot;
    use approx::assert_relative_eq;
    use chrono::TimeDelta;

    fn reference() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn snapshot(readings: Vec<EnergyReading>) -> DashboardSnapshot {
        DashboardSnapshot {
            readings,
            weather: mock_snapshot(),
            readings_error: None,
        }
    }

    #[test]
    fn test_from_empty_snapshot() {
        let config = DashboardConfig::default();
        let stats = DashboardStats::from_snapshot(&snapshot(vec![]), &config, reference());

        assert_eq!(stats.readings, 0);
        assert_eq!(stats.energy_independence, 0.0);
        assert_eq!(stats.money_saved_total, 0.0);
        assert_eq!(stats.money_saved_change_pct, 0.0);
        assert_eq!(stats.panels_online, None);
        assert_eq!(stats.panel_status, None);
        assert!(stats.weather_is_mock);
    }

    #[test]
    fn test_from_snapshot_month_over_month() {
        let config = DashboardConfig::default();
        let now = reference();
        let readings = vec![
            // this month: 10 kWh produced, 2 consumed -> 2 direct, 8 exported
            EnergyReading::new(now - TimeDelta::days(2), 2.0, 10.0, 16),
            // 40 days back: consumption only
            EnergyReading::new(now - TimeDelta::days(40), 5.0, 0.0, 12),
        ];

        let stats = DashboardStats::from_snapshot(&snapshot(readings), &config, now);

        assert_relative_eq!(stats.money_saved_this_month, 2.0 * 0.17 + 8.0 * 0.08);
        assert_eq!(stats.money_saved_last_month, 0.0);
        assert_eq!(stats.money_saved_change_pct, 100.0);
        assert!(stats.money_saved_increasing);
        assert_eq!(stats.net_balance, 3.0);
        // 7 kWh consumed, 5 imported
        assert_relative_eq!(stats.energy_independence, (1.0 - 5.0 / 7.0) * 100.0);
    }

    #[test]
    fn test_panels_taken_from_latest_reading() {
        let config = DashboardConfig::default();
        let now = reference();
        let readings = vec![
            EnergyReading::new(now - TimeDelta::hours(1), 1.0, 1.0, 16),
            EnergyReading::new(now - TimeDelta::hours(3), 1.0, 1.0, 0),
        ];

        let stats = DashboardStats::from_snapshot(&snapshot(readings), &config, now);
        assert_eq!(stats.panels_online, Some(16));
        assert_eq!(stats.panel_status, Some(PanelStatus::Online));
    }

    #[test]
    fn test_failed_readings_fetch_is_recorded() {
        let config = DashboardConfig::default();
        let mut snap = snapshot(vec![]);
        snap.readings_error = Some("timeout".to_string());

        let stats = DashboardStats::from_snapshot(&snap, &config, reference());
        assert_eq!(stats.error_type.as_deref(), Some("fetch_error"));
        assert_eq!(stats.error_message.as_deref(), Some("timeout"));
        assert_eq!(stats.readings, 0);
        assert!(stats.weather_is_mock);
    }
}
