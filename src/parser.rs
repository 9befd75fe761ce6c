//! CSV parser for household energy readings.
//!
//! The export uses German column labels:
//!
//! | Column               | Meaning                         |
//! |----------------------|---------------------------------|
//! | `tag`                | date, `YYYY-MM-DD`              |
//! | `zeit`               | time, `HH:MM`                   |
//! | `verbrauch_haushalt` | household consumption, kWh      |
//! | `produktion_solar`   | solar production, kWh           |
//! | `panels_online`      | number of panels online         |
//!
//! `eigenverbrauch`, `einspeisung` and `netzbezug` may be present but are
//! recomputed from consumption and production instead of being trusted.

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::analyzers::types::EnergyReading;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawReading {
    tag: Option<String>,
    zeit: Option<String>,
    verbrauch_haushalt: Option<String>,
    produktion_solar: Option<String>,
    panels_online: Option<String>,
}

/// Parses comma-separated readings with a header row.
///
/// Rows without a usable date or time are logged and skipped; the remaining
/// rows are returned in input order. Missing or non-numeric energy values
/// count as zero. Panel counts above `total_panels` are clamped.
pub fn parse_readings(bytes: &[u8], total_panels: u32) -> Vec<EnergyReading> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b',')
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let mut readings = Vec::new();
    let mut skipped = 0usize;

    for (index, result) in rdr.deserialize::<RawReading>().enumerate() {
        let row = index + 1;
        let parsed = result
            .map_err(anyhow::Error::from)
            .and_then(|raw| reading_from_raw(&raw, total_panels));

        match parsed {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                skipped += 1;
                warn!(row, error = %e, "Skipping unparseable reading row");
            }
        }
    }

    debug!(parsed = readings.len(), skipped, "Readings parsed");
    readings
}

fn reading_from_raw(raw: &RawReading, total_panels: u32) -> Result<EnergyReading> {
    let date = raw
        .tag
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing date"))?;
    let time = raw
        .zeit
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing time"))?;

    let timestamp = parse_timestamp(date, time)?;

    let consumption = parse_energy(raw.verbrauch_haushalt.as_deref());
    let production = parse_energy(raw.produktion_solar.as_deref());

    let mut panels_online = parse_count(raw.panels_online.as_deref());
    if panels_online > total_panels {
        warn!(
            panels_online,
            total_panels, "Panel count exceeds installed panels, clamping"
        );
        panels_online = total_panels;
    }

    Ok(EnergyReading::new(
        timestamp,
        consumption,
        production,
        panels_online,
    ))
}

/// Combines a `YYYY-MM-DD` date and an `HH:MM` time. Seconds, if present,
/// are dropped.
pub fn parse_timestamp(date: &str, time: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("invalid date '{date}'"))?;

    let time = time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .with_context(|| format!("invalid time '{time}'"))?;
    let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
        .ok_or_else(|| anyhow!("invalid time"))?;

    Ok(date.and_time(time))
}

fn parse_energy(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

fn parse_count(value: Option<&str>) -> u32 {
    let Some(value) = value else {
        return 0;
    };

    value
        .parse::<u32>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.trunc().min(u32::MAX as f64) as u32)
        })
        .unwrap_or(0)
}
