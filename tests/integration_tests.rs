use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use solar_dashboard::analyzers::aggregate::{
    compute_totals, energy_independence, environmental_impact, percentage_change,
};
use solar_dashboard::analyzers::types::PanelStatus;
use solar_dashboard::analyzers::window::{TimeWindow, chart_series, monthly_buckets, previous_period};
use solar_dashboard::config::{DashboardConfig, LabelLocale};
use solar_dashboard::dashboard::Dashboard;
use solar_dashboard::parser::parse_readings;

const FIXTURE: &[u8] = include_bytes!("fixtures/solar_readings.csv");
const FIXTURE_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/solar_readings.csv");

fn reference() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 30)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

#[test]
fn test_full_pipeline() {
    let config = DashboardConfig::default();
    let readings = parse_readings(FIXTURE, config.panels.total_panels);

    // two rows lack a date or time
    assert_eq!(readings.len(), 31);

    let totals = compute_totals(&readings);
    assert_relative_eq!(totals.production, 63.0);
    assert_relative_eq!(totals.expenditure, 51.5);
    assert_relative_eq!(totals.grid_supply, 28.0);
    assert_relative_eq!(
        energy_independence(&readings),
        (1.0 - 28.0 / 51.5) * 100.0
    );

    let buckets = monthly_buckets(&readings, reference(), LabelLocale::En);
    assert_eq!(buckets.len(), 12);
    assert_eq!(buckets[0].label, "Jul 2024");
    assert_eq!(buckets[0].production, 4.0);
    assert_eq!(buckets[0].expenditure, 3.5);
    assert_eq!(buckets[11].label, "Jun 2025");
    assert_eq!(buckets[11].production, 11.0);
    assert_eq!(buckets[11].expenditure, 6.0);
}

#[test]
fn test_chart_series_windows() {
    let readings = parse_readings(FIXTURE, 16);

    let week = chart_series(&readings, TimeWindow::Week, reference());
    assert_eq!(week.len(), 3);

    let month = chart_series(&readings, TimeWindow::Month, reference());
    assert_eq!(month.len(), 3);
    assert_eq!(month[1].production, 6.0);

    let year = chart_series(&readings, TimeWindow::Year, reference());
    assert!(year.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[test]
fn test_month_over_month_money_saved() {
    let config = DashboardConfig::default();
    let readings = parse_readings(FIXTURE, 16);

    let split = previous_period(&readings, reference());
    let current = environmental_impact(&split.current, &config.rates);
    let previous = environmental_impact(&split.previous, &config.rates);

    assert_relative_eq!(current.money_saved, 4.0 * 0.17 + 7.0 * 0.08, epsilon = 1e-9);
    assert_relative_eq!(previous.money_saved, 1.5 * 0.17 + 2.5 * 0.08, epsilon = 1e-9);

    let change = percentage_change(current.money_saved, previous.money_saved);
    assert!(change.increasing);
    assert!(change.percent > 100.0);
}

#[tokio::test]
async fn test_dashboard_summary_from_file() {
    let dashboard = Dashboard::with_weather_api(DashboardConfig::default(), None);

    let snapshot = dashboard.load_snapshot(FIXTURE_PATH, reference()).await;
    let stats = dashboard.summarize(&snapshot, reference());

    assert_eq!(stats.readings, 31);
    assert_eq!(stats.panels_online, Some(14));
    assert_eq!(stats.panel_status, Some(PanelStatus::SomeOffline));
    assert_relative_eq!(stats.net_balance, 11.5);
    assert_eq!(stats.trees_equivalent, 0);
    assert!(stats.weather_is_mock);
    assert!(stats.error_type.is_none());
}
