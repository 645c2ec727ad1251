use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::nutrition::gaps::IntakeSample;
use crate::profiles::repo_types::text_enum;

text_enum!(MealType {
    Breakfast => "breakfast",
    Lunch => "lunch",
    Dinner => "dinner",
    Snack => "snack",
});

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FoodLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub meal_type: String,
    pub food_name: String,
    pub food_description: Option<String>,
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
    #[serde(with = "time::serde::rfc3339")]
    pub logged_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<&FoodLog> for IntakeSample {
    fn from(log: &FoodLog) -> Self {
        IntakeSample {
            calories: log.calories.unwrap_or_default(),
            protein_g: log.protein_g.unwrap_or_default(),
            carbs_g: log.carbs_g.unwrap_or_default(),
            fat_g: log.fat_g.unwrap_or_default(),
            fiber_g: log.fiber_g.unwrap_or_default(),
            glycemic_load: log.glycemic_load.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NutritionalGapRow {
    pub id: Uuid,
    pub nutrient_name: String,
    pub current_intake: f64,
    pub recommended_intake: f64,
    pub unit: String,
    pub severity: String,
    #[serde(with = "time::serde::rfc3339")]
    pub analysis_date: OffsetDateTime,
}

#[cfg(test)]
pub(crate) fn sample_food_log() -> FoodLog {
    let now = OffsetDateTime::now_utc();
    FoodLog {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        meal_type: MealType::Lunch.as_str().into(),
        food_name: "jollof rice".into(),
        food_description: None,
        image_url: None,
        calories: Some(520.0),
        protein_g: Some(12.0),
        carbs_g: None,
        fat_g: Some(14.0),
        fiber_g: None,
        sugar_g: None,
        sodium_mg: None,
        glycemic_index: Some(72.0),
        glycemic_load: Some(30.0),
        predicted_blood_sugar_spike: None,
        portion_size: None,
        cost_usd: None,
        notes: None,
        logged_at: now,
        created_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_nutrients_count_as_zero() {
        let log = sample_food_log();
        let sample = IntakeSample::from(&log);
        assert_eq!(sample.calories, 520.0);
        assert_eq!(sample.carbs_g, 0.0);
        assert_eq!(sample.fiber_g, 0.0);
        assert_eq!(sample.glycemic_load, 30.0);
    }

    #[test]
    fn meal_types_parse() {
        assert_eq!("Snack".parse::<MealType>(), Ok(MealType::Snack));
        assert!("brunch".parse::<MealType>().is_err());
    }
}
