//! Calendar windows over a set of readings.
//!
//! None of these functions read the clock. Callers pass the instant the
//! windows are anchored to.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::analyzers::types::{EnergyReading, MonthlyBucket, PeriodSplit, SeriesPoint};
use crate::analyzers::utility::round_to;
use crate::config::LabelLocale;

const PERIOD_DAYS: i64 = 30;
const MONTHS: usize = 12;

/// Trailing windows offered by the production-vs-consumption chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    Day,
    Week,
    Month,
    Year,
}

impl TimeWindow {
    pub fn days(self) -> i64 {
        match self {
            TimeWindow::Day => 1,
            TimeWindow::Week => 7,
            TimeWindow::Month => 30,
            TimeWindow::Year => 365,
        }
    }

    /// Whether chart points are summed per calendar day for this window.
    pub fn aggregates_daily(self) -> bool {
        matches!(self, TimeWindow::Month | TimeWindow::Year)
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1d" => Ok(TimeWindow::Day),
            "7d" => Ok(TimeWindow::Week),
            "30d" => Ok(TimeWindow::Month),
            "365d" => Ok(TimeWindow::Year),
            other => Err(format!(
                "unknown time range '{other}', expected one of 1d, 7d, 30d, 365d"
            )),
        }
    }
}

/// Readings with `timestamp >= reference - window`, in input order.
///
/// Readings sharing a timestamp are all kept.
pub fn select_window(
    readings: &[EnergyReading],
    window: TimeWindow,
    reference: NaiveDateTime,
) -> Vec<EnergyReading> {
    let start = reference - TimeDelta::days(window.days());
    readings
        .iter()
        .filter(|r| r.timestamp >= start)
        .cloned()
        .collect()
}

/// Sums consumption and production per calendar day. Points are stamped at
/// midnight and returned in chronological order.
pub fn daily_series(readings: &[EnergyReading]) -> Vec<SeriesPoint> {
    let mut days: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();

    for r in readings {
        let entry = days.entry(r.timestamp.date()).or_default();
        entry.0 += r.consumption;
        entry.1 += r.production;
    }

    days.into_iter()
        .map(|(date, (consumption, production))| SeriesPoint {
            timestamp: date.and_time(NaiveTime::MIN),
            consumption,
            production,
        })
        .collect()
}

/// Chart points for `window`: one per reading for short windows, one per
/// day for the 30- and 365-day windows.
pub fn chart_series(
    readings: &[EnergyReading],
    window: TimeWindow,
    reference: NaiveDateTime,
) -> Vec<SeriesPoint> {
    let selected = select_window(readings, window, reference);
    if window.aggregates_daily() {
        daily_series(&selected)
    } else {
        selected.iter().map(SeriesPoint::from).collect()
    }
}

fn month_index(year: i32, month0: u32) -> i64 {
    year as i64 * 12 + month0 as i64
}

/// Production and expenditure for the 12 calendar months ending with the
/// month of `reference`, oldest first.
///
/// Months without readings are present with zero values. Sums are rounded
/// to two decimals.
pub fn monthly_buckets(
    readings: &[EnergyReading],
    reference: NaiveDateTime,
    locale: LabelLocale,
) -> Vec<MonthlyBucket> {
    let current = month_index(reference.year(), reference.month0());
    let mut sums = [(0.0f64, 0.0f64); MONTHS];

    for r in readings {
        let offset = current - month_index(r.timestamp.year(), r.timestamp.month0());
        if (0..MONTHS as i64).contains(&offset) {
            let slot = &mut sums[MONTHS - 1 - offset as usize];
            slot.0 += r.production;
            slot.1 += r.consumption;
        }
    }

    sums.iter()
        .enumerate()
        .map(|(i, (production, expenditure))| {
            let idx = current - (MONTHS - 1 - i) as i64;
            let year = idx.div_euclid(12) as i32;
            let month = idx.rem_euclid(12) as u32 + 1;

            MonthlyBucket {
                label: format!("{} {:04}", locale.month_abbrev(month), year),
                year,
                month,
                production: round_to(*production, 2),
                expenditure: round_to(*expenditure, 2),
            }
        })
        .collect()
}

/// Splits readings into the trailing 30 days (`current`) and the 30 days
/// before that (`previous`, days 31 to 60 back).
pub fn previous_period(readings: &[EnergyReading], reference: NaiveDateTime) -> PeriodSplit {
    let current_start = reference - TimeDelta::days(PERIOD_DAYS);
    let previous_start = reference - TimeDelta::days(PERIOD_DAYS * 2);

    let mut split = PeriodSplit::default();
    for r in readings {
        if r.timestamp >= current_start {
            split.current.push(r.clone());
        } else if r.timestamp >= previous_start {
            split.previous.push(r.clone());
        }
    }
    split
}
