use serde::Serialize;

use super::heuristics::round1;
use crate::profiles::repo_types::{ActivityLevel, DiabetesType};

const MAX_SPIKE_MG_DL: f64 = 150.0;

#[derive(Debug, Clone, Default)]
pub struct SpikeInput {
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub glycemic_load: f64,
    pub sugar_g: Option<f64>,
    pub activity: Option<ActivityLevel>,
    pub diabetes: Option<DiabetesType>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

pub fn risk_level(spike_mg_dl: f64) -> RiskLevel {
    if spike_mg_dl <= 30.0 {
        RiskLevel::Low
    } else if spike_mg_dl <= 60.0 {
        RiskLevel::Moderate
    } else {
        RiskLevel::High
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpikePrediction {
    pub predicted_spike_mg_dl: f64,
    pub risk_level: RiskLevel,
}

fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.3,
        ActivityLevel::Light => 1.1,
        ActivityLevel::Moderate => 1.0,
        ActivityLevel::Active => 0.8,
        ActivityLevel::VeryActive => 0.7,
    }
}

/// Rule-based estimate of the post-meal rise in blood glucose (mg/dL).
pub fn predict(input: &SpikeInput) -> SpikePrediction {
    let mut spike = input.glycemic_load * 2.5;
    spike = (spike - input.fiber_g * 2.0).max(0.0);
    // fat and protein slow digestion
    spike = (spike - (input.fat_g + input.protein_g) * 0.3).max(0.0);
    if let Some(sugar) = input.sugar_g {
        spike += sugar * 0.5;
    }
    if input.diabetes == Some(DiabetesType::Type1) {
        spike *= 1.2;
    }
    if let Some(level) = input.activity {
        spike *= activity_multiplier(level);
    }
    let spike = round1(spike.clamp(0.0, MAX_SPIKE_MG_DL));

    SpikePrediction {
        predicted_spike_mg_dl: spike,
        risk_level: risk_level(spike),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_case_without_profile() {
        let p = predict(&SpikeInput {
            glycemic_load: 20.0,
            fiber_g: 5.0,
            fat_g: 10.0,
            protein_g: 10.0,
            ..Default::default()
        });
        // 50 - 10 - 6
        assert_eq!(p.predicted_spike_mg_dl, 34.0);
        assert_eq!(p.risk_level, RiskLevel::Moderate);
    }

    #[test]
    fn fiber_floor_applies_before_sugar() {
        let p = predict(&SpikeInput {
            glycemic_load: 2.0,
            fiber_g: 10.0,
            sugar_g: Some(10.0),
            ..Default::default()
        });
        assert_eq!(p.predicted_spike_mg_dl, 5.0);
        assert_eq!(p.risk_level, RiskLevel::Low);
    }

    #[test]
    fn type1_and_activity_multipliers() {
        let base = SpikeInput {
            glycemic_load: 20.0,
            ..Default::default()
        };
        let sedentary_type1 = predict(&SpikeInput {
            activity: Some(ActivityLevel::Sedentary),
            diabetes: Some(DiabetesType::Type1),
            ..base.clone()
        });
        assert_eq!(sedentary_type1.predicted_spike_mg_dl, 78.0);
        assert_eq!(sedentary_type1.risk_level, RiskLevel::High);

        let very_active = predict(&SpikeInput {
            activity: Some(ActivityLevel::VeryActive),
            diabetes: Some(DiabetesType::Type2),
            ..base
        });
        assert_eq!(very_active.predicted_spike_mg_dl, 35.0);
    }

    #[test]
    fn clamped_at_maximum() {
        let p = predict(&SpikeInput {
            glycemic_load: 200.0,
            sugar_g: Some(80.0),
            ..Default::default()
        });
        assert_eq!(p.predicted_spike_mg_dl, 150.0);
    }

    #[test]
    fn risk_bands() {
        assert_eq!(risk_level(30.0), RiskLevel::Low);
        assert_eq!(risk_level(30.1), RiskLevel::Moderate);
        assert_eq!(risk_level(60.0), RiskLevel::Moderate);
        assert_eq!(risk_level(60.1), RiskLevel::High);
    }
}
