use crate::analyzers::types::{AggregateTotals, EnergyReading, EnvironmentalImpact, PeriodChange};
use crate::config::Rates;

/// Sums production, consumption, grid supply and feed-in over `readings`.
pub fn compute_totals(readings: &[EnergyReading]) -> AggregateTotals {
    readings
        .iter()
        .fold(AggregateTotals::default(), |acc, r| AggregateTotals {
            production: acc.production + r.production,
            expenditure: acc.expenditure + r.consumption,
            grid_supply: acc.grid_supply + r.grid_supply,
            feed_in: acc.feed_in + r.feed_in,
        })
}

/// Share of household consumption that was not imported from the grid, in
/// percent. Returns 0.0 when nothing was consumed.
pub fn energy_independence(readings: &[EnergyReading]) -> f64 {
    let totals = compute_totals(readings);
    independence_from_totals(&totals)
}

pub fn independence_from_totals(totals: &AggregateTotals) -> f64 {
    if totals.expenditure > 0.0 {
        ((1.0 - totals.grid_supply / totals.expenditure) * 100.0).max(0.0)
    } else {
        0.0
    }
}

/// CO2 avoided and money saved for `readings` under the given `rates`.
///
/// Production that was consumed on site is valued at the purchase rate,
/// exported production at the feed-in rate.
pub fn environmental_impact(readings: &[EnergyReading], rates: &Rates) -> EnvironmentalImpact {
    let totals = compute_totals(readings);
    impact_from_totals(&totals, rates)
}

pub fn impact_from_totals(totals: &AggregateTotals, rates: &Rates) -> EnvironmentalImpact {
    let co2_emissions_avoided = totals.production * rates.co2_intensity_kg_per_kwh;

    let used_directly = totals.production - totals.feed_in;
    let money_saved =
        used_directly * rates.purchase_rate_per_kwh + totals.feed_in * rates.feed_in_rate_per_kwh;

    EnvironmentalImpact {
        co2_emissions_avoided: co2_emissions_avoided.max(0.0),
        money_saved: money_saved.max(0.0),
    }
}

/// Number of whole trees needed to absorb `co2_kg` in a year.
pub fn trees_equivalent(co2_kg: f64, rates: &Rates) -> u64 {
    (co2_kg / rates.co2_kg_per_tree).floor().max(0.0) as u64
}

/// Change from `previous` to `current`.
///
/// When `previous` is zero the change is reported as 100% if `current` is
/// positive and 0% otherwise.
pub fn percentage_change(current: f64, previous: f64) -> PeriodChange {
    let percent = if previous == 0.0 {
        if current > 0.0 { 100.0 } else { 0.0 }
    } else {
        ((current - previous) / previous.abs() * 100.0).abs()
    };

    PeriodChange {
        percent,
        increasing: current >= previous,
    }
}
