use serde::{Deserialize, Serialize};

use crate::analyzer::repo_types::MealType;

pub const MAX_PLAN_DAYS: i32 = 14;

#[derive(Debug, Deserialize)]
pub struct GenerateMealPlanRequest {
    /// Total budget in USD for the whole plan.
    pub budget: f64,
    pub days: i32,
    #[serde(default)]
    pub preferences: String,
}

impl GenerateMealPlanRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !self.budget.is_finite() || self.budget <= 0.0 {
            return Err("budget must be greater than 0".into());
        }
        if !(1..=MAX_PLAN_DAYS).contains(&self.days) {
            return Err(format!("days must be between 1 and {MAX_PLAN_DAYS}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlannedNutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedMeal {
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub nutrition: PlannedNutrition,
    pub cost: f64,
    /// minutes
    pub prep_time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cultural_context: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub meals: Vec<PlannedMeal>,
    pub total_cost: f64,
    pub total_calories: f64,
    pub nutritional_analysis: String,
}
