use serde::{Deserialize, Serialize};

use crate::profiles::repo_types::Profile;

/// Logs from this many days back are averaged, always dividing by the full window.
pub const WINDOW_DAYS: i64 = 7;
pub const DEFAULT_WEIGHT_KG: f64 = 70.0;
pub const PROTEIN_G_PER_KG: f64 = 0.8;
pub const RECOMMENDED_FIBER_G: f64 = 25.0;

/// Nutrient amounts of one logged meal. Missing values count as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntakeSample {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    pub glycemic_load: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
        }
    }

    /// `high_below` and `moderate_below` are fractions of the recommendation.
    fn grade(current: f64, recommended: f64, high_below: f64, moderate_below: f64) -> Self {
        if current < recommended * high_below {
            Severity::High
        } else if current < recommended * moderate_below {
            Severity::Moderate
        } else {
            Severity::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NutrientGap {
    pub nutrient_name: String,
    pub current_intake: f64,
    pub recommended_intake: f64,
    pub unit: String,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailyAverages {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GapAnalysis {
    pub log_count: usize,
    pub daily: DailyAverages,
    /// Mean glycemic load per logged meal.
    pub avg_glycemic_load: f64,
    pub gaps: Vec<NutrientGap>,
}

/// Returns `None` when there is nothing logged in the window.
pub fn analyze(samples: &[IntakeSample], weight_kg: Option<f64>) -> Option<GapAnalysis> {
    if samples.is_empty() {
        return None;
    }
    let days = WINDOW_DAYS as f64;
    let avg = |f: fn(&IntakeSample) -> f64| samples.iter().map(f).sum::<f64>() / days;
    let daily = DailyAverages {
        calories: avg(|s| s.calories),
        protein_g: avg(|s| s.protein_g),
        carbs_g: avg(|s| s.carbs_g),
        fat_g: avg(|s| s.fat_g),
        fiber_g: avg(|s| s.fiber_g),
    };
    let avg_glycemic_load =
        samples.iter().map(|s| s.glycemic_load).sum::<f64>() / samples.len() as f64;

    let protein_target = weight_kg.unwrap_or(DEFAULT_WEIGHT_KG) * PROTEIN_G_PER_KG;
    let gaps = vec![
        NutrientGap {
            nutrient_name: "Protein".into(),
            current_intake: daily.protein_g,
            recommended_intake: protein_target,
            unit: "g".into(),
            severity: Severity::grade(daily.protein_g, protein_target, 0.7, 0.9),
        },
        NutrientGap {
            nutrient_name: "Fiber".into(),
            current_intake: daily.fiber_g,
            recommended_intake: RECOMMENDED_FIBER_G,
            unit: "g".into(),
            severity: Severity::grade(daily.fiber_g, RECOMMENDED_FIBER_G, 0.6, 0.8),
        },
    ];

    Some(GapAnalysis {
        log_count: samples.len(),
        daily,
        avg_glycemic_load,
        gaps,
    })
}

/// Prompt asking a model to narrate the top gaps for this user.
pub fn summary_prompt(analysis: &GapAnalysis, profile: &Profile) -> String {
    let d = &analysis.daily;
    let age = profile
        .age
        .map(|a| a.to_string())
        .unwrap_or_else(|| "Unknown".into());
    format!(
        "Based on this user's weekly nutrition data and profile, identify nutritional gaps:\n\n\
         User Profile:\n\
         - Age: {age}\n\
         - Weight: {weight}kg\n\
         - Activity Level: {activity}\n\
         - Health Conditions: {conditions}\n\n\
         Average Daily Intake (last {WINDOW_DAYS} days):\n\
         - Calories: {cal:.0}\n\
         - Protein: {protein:.1}g\n\
         - Carbs: {carbs:.1}g\n\
         - Fat: {fat:.1}g\n\
         - Fiber: {fiber:.1}g\n\n\
         Analyze and identify the top 3 nutritional gaps with severity levels (low, moderate, high) \
         and recommended intake values. Keep it under 120 words.",
        weight = profile.weight_kg.unwrap_or(DEFAULT_WEIGHT_KG),
        activity = profile.activity_level.as_deref().unwrap_or("Unknown"),
        conditions = Profile::joined(&profile.health_conditions),
        cal = d.calories,
        protein = d.protein_g,
        carbs = d.carbs_g,
        fat = d.fat_g,
        fiber = d.fiber_g,
    )
}
