//! Per-item enrichment and whole-meal scoring.
//!
//! Scores are 0..=100 where higher is healthier. The overall meal score is the
//! plain mean of the eight component scores.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::{
    catalog::Catalog,
    fusion::{Detection, DetectionSource},
    synonyms::{beverage_heuristic, is_beverage, is_dessert},
};

/// GI assumed for glycemic load when an item has none.
const DEFAULT_GI: f64 = 50.0;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedFood {
    pub name: String,
    pub confidence: f64,
    pub source: DetectionSource,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub glycemic_index: Option<f64>,
    pub flags: Vec<String>,
    pub warnings: BTreeMap<String, String>,
    pub portion_advice: String,
}

impl EnrichedFood {
    fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

pub fn enrich(catalog: &Catalog, detection: &Detection) -> EnrichedFood {
    let mut item = match catalog.lookup(&detection.name) {
        Some(food) => EnrichedFood {
            name: detection.name.clone(),
            confidence: detection.confidence,
            source: detection.source,
            calories: food.calories,
            carbs: food.carbs,
            protein: food.protein,
            fat: food.fat,
            fiber: food.fiber,
            glycemic_index: catalog.glycemic_index(&detection.name),
            flags: food.flags.clone(),
            warnings: food.warnings.clone(),
            portion_advice: String::new(),
        },
        None if is_beverage(&detection.name) => {
            let est = beverage_heuristic();
            EnrichedFood {
                name: detection.name.clone(),
                confidence: est.confidence,
                source: DetectionSource::Heuristic,
                calories: est.calories,
                carbs: est.carbs,
                protein: est.protein,
                fat: est.fat,
                fiber: est.fiber,
                glycemic_index: Some(est.glycemic_index),
                flags: est.flags,
                warnings: est.warnings,
                portion_advice: String::new(),
            }
        }
        None => {
            warn!(name = %detection.name, "no nutrition data, using defaults");
            EnrichedFood {
                name: detection.name.clone(),
                confidence: detection.confidence,
                source: detection.source,
                calories: 150.0,
                carbs: 20.0,
                protein: 5.0,
                fat: 5.0,
                fiber: 2.0,
                glycemic_index: catalog.glycemic_index(&detection.name),
                flags: vec!["unknown".into()],
                warnings: BTreeMap::new(),
                portion_advice: String::new(),
            }
        }
    };
    item.portion_advice = portion_advice(&item);
    item
}

pub fn portion_advice(item: &EnrichedFood) -> String {
    let mut parts: Vec<&str> = Vec::new();

    if let Some(gi) = item.glycemic_index.filter(|gi| *gi > 0.0) {
        parts.push(if gi >= 70.0 {
            "High GI - limit portion for blood sugar control"
        } else if gi >= 56.0 {
            "Moderate GI - consume in moderation"
        } else {
            "Low GI - good for steady energy"
        });
    }
    if item.has_flag("fried") {
        parts.push("Fried food - reduce portion to lower fat intake");
    }
    if item.has_flag("carb-heavy") || item.has_flag("starchy") {
        parts.push("High carb content - balance with protein and vegetables");
    }
    if item.calories > 300.0 {
        parts.push("Calorie-dense - watch portion size");
    }
    if item.fiber < 2.0 {
        parts.push("Low fiber - pair with vegetables");
    }

    if parts.is_empty() {
        "Enjoy in moderation".into()
    } else {
        parts.join(" | ")
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum MealQuality {
    Excellent,
    Good,
    Fair,
    Risky,
    Dangerous,
    Unknown,
}

impl MealQuality {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            MealQuality::Excellent
        } else if score >= 65.0 {
            MealQuality::Good
        } else if score >= 50.0 {
            MealQuality::Fair
        } else if score >= 35.0 {
            MealQuality::Risky
        } else {
            MealQuality::Dangerous
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComponentScores {
    pub meal_diversity: f64,
    pub nutrient_completeness: f64,
    pub glycemic_load_score: f64,
    pub fiber_adequacy: f64,
    pub protein_adequacy: f64,
    pub fat_quality: f64,
    pub sodium_penalty: f64,
    pub diabetes_friendly: f64,
}

impl ComponentScores {
    fn values(&self) -> [f64; 8] {
        [
            self.meal_diversity,
            self.nutrient_completeness,
            self.glycemic_load_score,
            self.fiber_adequacy,
            self.protein_adequacy,
            self.fat_quality,
            self.sodium_penalty,
            self.diabetes_friendly,
        ]
    }

    fn mean(&self) -> f64 {
        let v = self.values();
        v.iter().sum::<f64>() / v.len() as f64
    }

    fn rounded(&self) -> Self {
        Self {
            meal_diversity: round1(self.meal_diversity),
            nutrient_completeness: round1(self.nutrient_completeness),
            glycemic_load_score: round1(self.glycemic_load_score),
            fiber_adequacy: round1(self.fiber_adequacy),
            protein_adequacy: round1(self.protein_adequacy),
            fat_quality: round1(self.fat_quality),
            sodium_penalty: round1(self.sodium_penalty),
            diabetes_friendly: round1(self.diabetes_friendly),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MealSummary {
    pub item_count: usize,
    pub total_calories: f64,
    pub total_carbs: f64,
    pub total_protein: f64,
    pub total_fat: f64,
    pub total_fiber: f64,
    pub glycemic_load: f64,
    pub score: f64,
    pub quality: MealQuality,
    pub components: Option<ComponentScores>,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
}

impl MealSummary {
    fn empty() -> Self {
        Self {
            item_count: 0,
            total_calories: 0.0,
            total_carbs: 0.0,
            total_protein: 0.0,
            total_fat: 0.0,
            total_fiber: 0.0,
            glycemic_load: 0.0,
            score: 0.0,
            quality: MealQuality::Unknown,
            components: None,
            recommendations: vec!["No foods detected".into()],
            warnings: Vec::new(),
        }
    }
}

pub(crate) fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Σ GI × carbs / 100, with a GI of 50 when unknown.
pub fn glycemic_load(items: &[EnrichedFood]) -> f64 {
    items
        .iter()
        .map(|i| {
            let gi = i.glycemic_index.filter(|g| *g > 0.0).unwrap_or(DEFAULT_GI);
            gi * i.carbs / 100.0
        })
        .sum()
}

pub fn meal_summary(items: &[EnrichedFood]) -> MealSummary {
    if items.is_empty() {
        return MealSummary::empty();
    }

    let total = |f: fn(&EnrichedFood) -> f64| items.iter().map(f).sum::<f64>();
    let calories = total(|i| i.calories);
    let carbs = total(|i| i.carbs);
    let protein = total(|i| i.protein);
    let fat = total(|i| i.fat);
    let fiber = total(|i| i.fiber);
    let gl = glycemic_load(items);

    let components = component_scores(items, calories, carbs, protein, fat, fiber, gl);
    let score = components.mean();

    MealSummary {
        item_count: items.len(),
        total_calories: round1(calories),
        total_carbs: round1(carbs),
        total_protein: round1(protein),
        total_fat: round1(fat),
        total_fiber: round1(fiber),
        glycemic_load: round1(gl),
        score: round1(score),
        quality: MealQuality::from_score(score),
        recommendations: recommendations(&components),
        warnings: warnings(items, gl),
        components: Some(components.rounded()),
    }
}

fn component_scores(
    items: &[EnrichedFood],
    calories: f64,
    carbs: f64,
    protein: f64,
    fat: f64,
    fiber: f64,
    gl: f64,
) -> ComponentScores {
    let clamp = |v: f64| v.clamp(0.0, 100.0);

    let diversity = (items.len() as f64 * 25.0).min(100.0);

    let ratio = |grams: f64, kcal_per_g: f64| {
        if calories > 0.0 {
            grams * kcal_per_g / calories
        } else {
            0.0
        }
    };
    // target split: 30% protein, 40% carbs, 30% fat
    let completeness = ((1.0 - (ratio(protein, 4.0) - 0.3).abs())
        + (1.0 - (ratio(carbs, 4.0) - 0.4).abs())
        + (1.0 - (ratio(fat, 9.0) - 0.3).abs()))
        / 3.0
        * 100.0;

    let gl_score = if gl < 10.0 {
        100.0
    } else if gl < 20.0 {
        80.0
    } else if gl < 30.0 {
        60.0
    } else {
        (60.0 - (gl - 30.0) * 2.0).max(0.0)
    };

    let fiber_score = (fiber / 8.0 * 100.0).min(100.0);
    let protein_score = (protein / 25.0 * 100.0).min(100.0);

    let fried = items.iter().filter(|i| i.has_flag("fried")).count() as f64;
    let processed = items.iter().filter(|i| i.has_flag("processed")).count() as f64;

    ComponentScores {
        meal_diversity: clamp(diversity),
        nutrient_completeness: clamp(completeness),
        glycemic_load_score: clamp(gl_score),
        fiber_adequacy: clamp(fiber_score),
        protein_adequacy: clamp(protein_score),
        fat_quality: clamp(100.0 - fried * 20.0),
        sodium_penalty: clamp(100.0 - processed * 15.0),
        diabetes_friendly: clamp((gl_score + fiber_score) / 2.0),
    }
}

fn recommendations(c: &ComponentScores) -> Vec<String> {
    let mut out = Vec::new();
    if c.meal_diversity < 50.0 {
        out.push("Add more variety - include vegetables or sides".to_string());
    }
    if c.fiber_adequacy < 60.0 {
        out.push("Increase fiber - add leafy greens or whole grains".to_string());
    }
    if c.protein_adequacy < 60.0 {
        out.push("Add more protein - fish, chicken, or legumes".to_string());
    }
    if c.glycemic_load_score < 60.0 {
        out.push("Reduce carb-heavy items or add low-GI alternatives".to_string());
    }
    if c.fat_quality < 70.0 {
        out.push("Replace fried items with grilled or steamed options".to_string());
    }
    out
}

fn warnings(items: &[EnrichedFood], gl: f64) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |w: String| {
        if !out.contains(&w) {
            out.push(w);
        }
    };

    if gl > 30.0 {
        push("High glycemic load - monitor blood sugar".into());
    }
    if items.iter().filter(|i| i.has_flag("fried")).count() >= 2 {
        push("Multiple fried foods - high saturated fat".into());
    }
    for item in items {
        if let Some(w) = item.warnings.get("diabetes") {
            push(format!("{}: {}", item.name, w));
        }
    }
    out
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MealRecommendations {
    pub healthy_alternatives: Vec<String>,
    pub portion_adjustments: Vec<String>,
    pub additions: Vec<String>,
}

const ALTERNATIVES: &[(&str, &str)] = &[
    (
        "fried plantain",
        "Replace with boiled or boli (roasted) plantain (~40% fewer calories)",
    ),
    ("fried chicken", "Use grilled or baked chicken instead"),
    ("fried rice", "Switch to brown rice or cauliflower rice"),
    ("white rice", "Use brown rice or quinoa (lower GI)"),
    ("jollof rice", "Reduce oil and add more vegetables to jollof"),
];

fn healthy_alternative(name: &str) -> Option<&'static str> {
    let lower = name.to_lowercase();
    ALTERNATIVES
        .iter()
        .find(|(key, _)| lower.contains(key))
        .map(|(_, alt)| *alt)
}

pub fn meal_recommendations(items: &[EnrichedFood], summary: &MealSummary) -> MealRecommendations {
    let mut rec = MealRecommendations::default();

    for item in items {
        if item.has_flag("fried") {
            if let Some(alt) = healthy_alternative(&item.name) {
                rec.healthy_alternatives.push(alt.to_string());
            }
        }
        if item.glycemic_index.unwrap_or(0.0) >= 70.0 {
            rec.portion_adjustments
                .push(format!("Reduce {} portion by 30-40% (high GI)", item.name));
        }
        if item.has_flag("dessert") || is_dessert(&item.name) {
            rec.portion_adjustments.push(format!(
                "Keep {} to a small serving and eat it after protein",
                item.name
            ));
        }
    }

    if summary.total_fiber < 8.0 {
        rec.additions
            .push("Add leafy greens (spinach, kale) for fiber and minerals".into());
    }
    if summary.total_protein < 20.0 {
        rec.additions
            .push("Add lean protein (fish, chicken breast, tofu)".into());
    }
    if !items
        .iter()
        .any(|i| i.name.to_lowercase().contains("vegetable"))
    {
        rec.additions
            .push("Add vegetable salad or steamed vegetables".into());
    }
    rec
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::embedded().unwrap()
    }

    fn enriched(names: &[&str]) -> Vec<EnrichedFood> {
        let c = catalog();
        names
            .iter()
            .map(|n| enrich(&c, &Detection::new(*n, 0.8, DetectionSource::Detector)))
            .collect()
    }

    #[test]
    fn enrich_uses_catalog_values_and_advice() {
        let items = enriched(&["fried_rice"]);
        let rice = &items[0];
        assert_eq!(rice.calories, 370.0);
        assert_eq!(rice.glycemic_index, Some(72.0));
        assert_eq!(
            rice.portion_advice,
            "High GI - limit portion for blood sugar control | Fried food - reduce portion to lower fat intake | High carb content - balance with protein and vegetables | Calorie-dense - watch portion size"
        );
    }

    #[test]
    fn enrich_falls_back_to_defaults_and_beverage_estimate() {
        let items = enriched(&["mystery stew thing", "chocolate milkshake"]);
        let unknown = &items[0];
        assert_eq!(unknown.calories, 150.0);
        assert_eq!(unknown.flags, vec!["unknown".to_string()]);
        assert_eq!(unknown.portion_advice, "Enjoy in moderation");

        let shake = &items[1];
        assert_eq!(shake.source, DetectionSource::Heuristic);
        assert_eq!(shake.calories, 350.0);
        assert_eq!(shake.confidence, 0.35);
        assert!(shake.portion_advice.starts_with("Moderate GI"));
    }

    #[test]
    fn empty_meal_is_unknown() {
        let summary = meal_summary(&[]);
        assert_eq!(summary.item_count, 0);
        assert_eq!(summary.quality, MealQuality::Unknown);
        assert_eq!(summary.recommendations, vec!["No foods detected".to_string()]);
        assert!(summary.components.is_none());
    }

    #[test]
    fn fried_starchy_meal_scores_poorly_with_warnings() {
        let items = enriched(&["fried rice", "fried chicken", "fried plantain"]);
        let summary = meal_summary(&items);
        assert_eq!(summary.item_count, 3);
        assert_eq!(summary.total_calories, 1055.0);
        // 72*52/100 + 50*11/100 + 66*58/100
        assert_eq!(summary.glycemic_load, round1(37.44 + 5.5 + 38.28));

        let c = summary.components.clone().unwrap();
        assert_eq!(c.meal_diversity, 75.0);
        assert_eq!(c.fat_quality, 40.0);
        assert_eq!(c.sodium_penalty, 85.0);
        assert_eq!(c.glycemic_load_score, 0.0);
        for v in c.values() {
            assert!((0.0..=100.0).contains(&v));
        }
        assert!(matches!(summary.quality, MealQuality::Risky | MealQuality::Dangerous | MealQuality::Fair));

        assert!(summary
            .warnings
            .contains(&"High glycemic load - monitor blood sugar".to_string()));
        assert!(summary
            .warnings
            .contains(&"Multiple fried foods - high saturated fat".to_string()));
        assert!(summary
            .recommendations
            .contains(&"Replace fried items with grilled or steamed options".to_string()));
    }

    #[test]
    fn balanced_meal_rates_better() {
        let balanced = meal_summary(&enriched(&["grilled chicken", "beans", "broccoli", "avocado"]));
        let fried = meal_summary(&enriched(&["fried rice", "fried chicken", "puff puff"]));
        assert!(balanced.score > fried.score);
        assert!(matches!(balanced.quality, MealQuality::Excellent | MealQuality::Good));
    }

    #[test]
    fn quality_bands() {
        assert_eq!(MealQuality::from_score(80.0), MealQuality::Excellent);
        assert_eq!(MealQuality::from_score(65.0), MealQuality::Good);
        assert_eq!(MealQuality::from_score(50.0), MealQuality::Fair);
        assert_eq!(MealQuality::from_score(35.0), MealQuality::Risky);
        assert_eq!(MealQuality::from_score(34.9), MealQuality::Dangerous);
    }

    #[test]
    fn duplicate_item_warnings_are_collapsed() {
        let items = enriched(&["white rice", "white rice"]);
        let summary = meal_summary(&items);
        let rice_warnings = summary
            .warnings
            .iter()
            .filter(|w| w.starts_with("white rice:"))
            .count();
        assert_eq!(rice_warnings, 1);
    }

    #[test]
    fn recommendations_cover_alternatives_portions_and_additions() {
        let items = enriched(&["fried plantain", "white rice"]);
        let summary = meal_summary(&items);
        let rec = meal_recommendations(&items, &summary);
        assert_eq!(
            rec.healthy_alternatives,
            vec!["Replace with boiled or boli (roasted) plantain (~40% fewer calories)".to_string()]
        );
        assert_eq!(
            rec.portion_adjustments,
            vec!["Reduce white rice portion by 30-40% (high GI)".to_string()]
        );
        assert_eq!(rec.additions.len(), 3);

        let veg = enriched(&["vegetable soup", "salmon", "beans"]);
        let rec = meal_recommendations(&veg, &meal_summary(&veg));
        assert!(rec.additions.is_empty());
    }

    #[test]
    fn desserts_get_a_small_serving_note() {
        // flagged in the catalog, and unknown but named like a dessert
        let items = enriched(&["cheesecake", "red velvet cake", "grilled chicken"]);
        let rec = meal_recommendations(&items, &meal_summary(&items));
        let notes: Vec<&str> = rec
            .portion_adjustments
            .iter()
            .filter(|a| a.contains("small serving"))
            .map(String::as_str)
            .collect();
        assert_eq!(
            notes,
            vec![
                "Keep cheesecake to a small serving and eat it after protein",
                "Keep red velvet cake to a small serving and eat it after protein",
            ]
        );
    }
}
