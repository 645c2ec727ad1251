use base64::Engine as _;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{
    repo_types::{FoodLog, MealType, NutritionalGapRow},
    services::GapRefresh,
};

pub const DEFAULT_IMAGE_MIME: &str = "image/png";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    /// Raw base64 or a `data:<mime>;base64,` URL.
    pub image_base64: String,
    pub mime_type: Option<String>,
    #[serde(default)]
    pub store_image: bool,
}

impl AnalyzeRequest {
    /// Decodes the payload and resolves its MIME type. An explicit
    /// `mime_type` wins over the one in a data URL.
    pub fn decode(&self) -> Result<(Vec<u8>, String), String> {
        let raw = self.image_base64.trim();
        let (url_mime, data) = match raw.strip_prefix("data:") {
            Some(rest) => {
                let (header, data) = rest
                    .split_once(',')
                    .ok_or_else(|| "malformed data URL".to_string())?;
                let mime = header.trim_end_matches(";base64");
                (Some(mime.to_string()).filter(|m| !m.is_empty()), data)
            }
            None => (None, raw),
        };
        if data.is_empty() {
            return Err("image_base64 is required".into());
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| format!("image_base64 is not valid base64: {e}"))?;
        let mime = self
            .mime_type
            .clone()
            .or(url_mime)
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.into());
        if !mime.starts_with("image/") {
            return Err(format!("unsupported mime type: {mime}"));
        }
        Ok((bytes, mime))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sugar: f64,
    /// milligrams
    pub sodium: f64,
}

/// Structured nutrition analysis of one food photo, as the model returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FoodAnalysis {
    pub food_name: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub nutrition: AnalysisNutrition,
    pub glycemic_index: f64,
    pub glycemic_load: f64,
    pub predicted_blood_sugar_spike: f64,
    pub portion_size: String,
    pub estimated_cost: f64,
    pub health_score: f64,
    pub recommendations: Vec<String>,
}

impl FoodAnalysis {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.health_score) {
            return Err(format!("healthScore out of range: {}", self.health_score));
        }
        if self.food_name.trim().is_empty() {
            return Err("foodName is empty".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: FoodAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFoodLogRequest {
    pub meal_type: MealType,
    pub food_name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub calories: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbs_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub fiber_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub sodium_mg: Option<f64>,
    pub glycemic_index: Option<f64>,
    pub glycemic_load: Option<f64>,
    pub predicted_blood_sugar_spike: Option<f64>,
    pub portion_size: Option<String>,
    pub cost_usd: Option<f64>,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub logged_at: Option<OffsetDateTime>,
}

impl CreateFoodLogRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.food_name.trim().is_empty() {
            return Err("food_name is required".into());
        }
        let amounts = [
            ("calories", self.calories),
            ("protein_g", self.protein_g),
            ("carbs_g", self.carbs_g),
            ("fat_g", self.fat_g),
            ("fiber_g", self.fiber_g),
            ("sugar_g", self.sugar_g),
            ("sodium_mg", self.sodium_mg),
            ("glycemic_load", self.glycemic_load),
            ("cost_usd", self.cost_usd),
        ];
        for (field, value) in amounts {
            if value.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(format!("{field} must be a non-negative number"));
            }
        }
        if self
            .glycemic_index
            .is_some_and(|gi| !(0.0..=100.0).contains(&gi))
        {
            return Err("glycemic_index must be between 0 and 100".into());
        }
        if self
            .logged_at
            .is_some_and(|t| t > OffsetDateTime::now_utc() + time::Duration::minutes(5))
        {
            return Err("logged_at is in the future".into());
        }
        Ok(())
    }
}

/// `gaps` is absent when the refresh after saving failed; the log itself
/// is already committed.
#[derive(Debug, Serialize)]
pub struct FoodLogCreated {
    pub food_log: FoodLog,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gaps: Option<Vec<NutritionalGapRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_summary: Option<String>,
}

impl FoodLogCreated {
    pub fn new(food_log: FoodLog, refresh: Option<GapRefresh>) -> Self {
        match refresh {
            Some(r) => Self {
                food_log,
                gaps: Some(r.gaps),
                gap_summary: r.summary,
            },
            None => Self {
                food_log,
                gaps: None,
                gap_summary: None,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, 100), self.offset.max(0))
    }
}
