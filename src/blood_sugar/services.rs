use serde::Serialize;

use crate::nutrition::heuristics::round1;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReadingSummary {
    pub count: usize,
    pub average: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Share of readings inside the target band, 0..=100.
    pub in_range_pct: Option<f64>,
    pub target_min: f64,
    pub target_max: f64,
}

/// Aggregates readings (mg/dL) against an inclusive target band.
pub fn summarize(readings: &[f64], (target_min, target_max): (f64, f64)) -> ReadingSummary {
    if readings.is_empty() {
        return ReadingSummary {
            count: 0,
            average: None,
            min: None,
            max: None,
            in_range_pct: None,
            target_min,
            target_max,
        };
    }
    let n = readings.len() as f64;
    let in_range = readings
        .iter()
        .filter(|r| (target_min..=target_max).contains(*r))
        .count() as f64;
    ReadingSummary {
        count: readings.len(),
        average: Some(round1(readings.iter().sum::<f64>() / n)),
        min: readings.iter().copied().reduce(f64::min),
        max: readings.iter().copied().reduce(f64::max),
        in_range_pct: Some(round1(in_range / n * 100.0)),
        target_min,
        target_max,
    }
}
