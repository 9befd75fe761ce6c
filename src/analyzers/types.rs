//! Data types used by the derivation pipeline.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::analyzers::utility::round_to;

/// One sampled interval from the readings file.
///
/// `feed_in` and `grid_supply` are derived from `production` and
/// `consumption` on construction and are mutually exclusive: at most one of
/// them is non-zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnergyReading {
    pub timestamp: NaiveDateTime,
    /// kWh consumed by the household during the interval.
    pub consumption: f64,
    /// kWh produced by the panels during the interval.
    pub production: f64,
    pub panels_online: u32,
    pub feed_in: f64,
    pub grid_supply: f64,
}

impl EnergyReading {
    pub fn new(
        timestamp: NaiveDateTime,
        consumption: f64,
        production: f64,
        panels_online: u32,
    ) -> Self {
        let feed_in = round_to((production - consumption).max(0.0), 3);
        let grid_supply = round_to((consumption - production).max(0.0), 3);

        Self {
            timestamp,
            consumption,
            production,
            panels_online,
            feed_in,
            grid_supply,
        }
    }
}

/// Sums over a set of readings. `expenditure` is total consumption.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AggregateTotals {
    pub production: f64,
    pub expenditure: f64,
    pub grid_supply: f64,
    pub feed_in: f64,
}

impl AggregateTotals {
    /// Production minus consumption; negative when the household is a net importer.
    pub fn net_balance(&self) -> f64 {
        self.production - self.expenditure
    }
}

/// CO2 avoided (kg) and money saved (currency units), both floored at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EnvironmentalImpact {
    pub co2_emissions_avoided: f64,
    pub money_saved: f64,
}

/// Production and expenditure for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyBucket {
    /// e.g. `"Aug 2024"`
    pub label: String,
    pub year: i32,
    /// 1-based.
    pub month: u32,
    pub production: f64,
    pub expenditure: f64,
}

/// A single point of the production-vs-consumption chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub consumption: f64,
    pub production: f64,
}

impl From<&EnergyReading> for SeriesPoint {
    fn from(r: &EnergyReading) -> Self {
        Self {
            timestamp: r.timestamp,
            consumption: r.consumption,
            production: r.production,
        }
    }
}

/// Readings split into the trailing 30 days and the 30 days before that.
#[derive(Debug, Clone, Default)]
pub struct PeriodSplit {
    pub current: Vec<EnergyReading>,
    pub previous: Vec<EnergyReading>,
}

/// Magnitude and direction of a period-over-period change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeriodChange {
    /// Absolute percentage change.
    pub percent: f64,
    pub increasing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelStatus {
    Online,
    SomeOffline,
    Offline,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_deficit_reading_has_only_grid_supply() {
        let r = EnergyReading::new(at(14, 30), 5.5, 3.2, 10);
        assert_eq!(r.grid_supply, 2.3);
        assert_eq!(r.feed_in, 0.0);
    }

    #[test]
    fn test_surplus_reading_has_only_feed_in() {
        let r = EnergyReading::new(at(12, 0), 1.25, 4.0, 16);
        assert_eq!(r.feed_in, 2.75);
        assert_eq!(r.grid_supply, 0.0);
    }

    #[test]
    fn test_feed_in_and_grid_supply_are_mutually_exclusive() {
        let samples = [(0.0, 0.0), (1.0, 1.0), (0.3333, 0.1), (0.1, 0.3333), (7.0, 0.0)];
        for (c, p) in samples {
            let r = EnergyReading::new(at(8, 0), c, p, 1);
            assert_eq!(r.feed_in * r.grid_supply, 0.0);
            assert!(r.feed_in >= 0.0);
            assert!(r.grid_supply >= 0.0);
        }
    }

    #[test]
    fn test_derived_values_rounded_to_three_decimals() {
        let r = EnergyReading::new(at(9, 15), 0.0, 1.23456, 4);
        assert_eq!(r.feed_in, 1.235);
    }

    #[test]
    fn test_net_balance_sign() {
        let totals = AggregateTotals {
            production: 10.0,
            expenditure: 12.5,
            ..Default::default()
        };
        assert_eq!(totals.net_balance(), -2.5);
    }
}
