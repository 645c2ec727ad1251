use serde::Deserialize;

use super::repo_types::{ActivityLevel, DiabetesType, Gender};

/// Answers collected by the onboarding questionnaire.
#[derive(Debug, Default, Deserialize)]
pub struct OnboardingRequest {
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub age: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub primary_goal: Option<String>,
    #[serde(default)]
    pub secondary_goals: Vec<String>,
    pub eating_pattern: Option<String>,
    pub activity_level: Option<ActivityLevel>,
    pub weekly_budget: Option<String>,
    #[serde(default)]
    pub dietary_preferences: Vec<String>,
    /// Free text, comma separated.
    pub allergies: Option<String>,
    #[serde(default)]
    pub health_conditions: Vec<String>,
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,
    #[serde(default)]
    pub has_diabetes: bool,
    pub diabetes_type: Option<DiabetesType>,
    pub target_blood_sugar_min: Option<f64>,
    pub target_blood_sugar_max: Option<f64>,
}

/// Validated, normalized column values. Empty lists become NULL.
#[derive(Debug, Clone, PartialEq)]
pub struct OnboardingUpdate {
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub age: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<Gender>,
    pub primary_goal: Option<String>,
    pub secondary_goals: Option<Vec<String>>,
    pub eating_pattern: Option<String>,
    pub activity_level: Option<ActivityLevel>,
    pub weekly_budget: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub health_conditions: Option<Vec<String>>,
    pub cuisine_preferences: Option<Vec<String>>,
    pub has_diabetes: bool,
    pub diabetes_type: Option<DiabetesType>,
    pub target_blood_sugar_min: Option<f64>,
    pub target_blood_sugar_max: Option<f64>,
}

impl OnboardingRequest {
    pub fn validate(self) -> Result<OnboardingUpdate, String> {
        if let Some(age) = self.age {
            if !(1..=120).contains(&age) {
                return Err("age must be between 1 and 120".into());
            }
        }
        for (field, value) in [("weight_kg", self.weight_kg), ("height_cm", self.height_cm)] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 {
                    return Err(format!("{field} must be positive"));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.target_blood_sugar_min, self.target_blood_sugar_max) {
            if min >= max {
                return Err("target_blood_sugar_min must be below target_blood_sugar_max".into());
            }
        }

        let health_conditions = non_empty(self.health_conditions);
        let diabetes_type = self.diabetes_type.or_else(|| {
            health_conditions
                .as_deref()
                .unwrap_or_default()
                .iter()
                .find_map(|c| DiabetesType::from_condition_label(c))
        });
        let has_diabetes = self.has_diabetes || diabetes_type.is_some();

        Ok(OnboardingUpdate {
            full_name: trimmed(self.full_name),
            country: trimmed(self.country),
            region: trimmed(self.region),
            age: self.age,
            weight_kg: self.weight_kg,
            height_cm: self.height_cm,
            gender: self.gender,
            primary_goal: trimmed(self.primary_goal),
            secondary_goals: non_empty(self.secondary_goals),
            eating_pattern: trimmed(self.eating_pattern),
            activity_level: self.activity_level,
            weekly_budget: trimmed(self.weekly_budget),
            dietary_preferences: non_empty(self.dietary_preferences),
            allergies: self.allergies.as_deref().map(split_list).and_then(non_empty),
            health_conditions,
            cuisine_preferences: non_empty(self.cuisine_preferences),
            has_diabetes,
            diabetes_type,
            target_blood_sugar_min: self.target_blood_sugar_min,
            target_blood_sugar_max: self.target_blood_sugar_max,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',').map(|s| s.trim().to_string()).collect()
}

fn non_empty(items: Vec<String>) -> Option<Vec<String>> {
    let items: Vec<String> = items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!items.is_empty()).then_some(items)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_lists_and_allergies() {
        let req = OnboardingRequest {
            allergies: Some(" peanuts, ,shellfish ".into()),
            dietary_preferences: vec!["  ".into()],
            cuisine_preferences: vec!["Nigerian".into()],
            full_name: Some("  ".into()),
            ..Default::default()
        };
        let update = req.validate().unwrap();
        assert_eq!(
            update.allergies,
            Some(vec!["peanuts".to_string(), "shellfish".to_string()])
        );
        assert_eq!(update.dietary_preferences, None);
        assert_eq!(update.cuisine_preferences, Some(vec!["Nigerian".to_string()]));
        assert_eq!(update.full_name, None);
        assert!(!update.has_diabetes);
    }

    #[test]
    fn derives_diabetes_type_from_condition_labels() {
        let req = OnboardingRequest {
            health_conditions: vec!["Hypertension".into(), "Type 1 Diabetes".into()],
            ..Default::default()
        };
        let update = req.validate().unwrap();
        assert!(update.has_diabetes);
        assert_eq!(update.diabetes_type, Some(DiabetesType::Type1));
    }

    #[test]
    fn explicit_diabetes_type_implies_diabetes() {
        let req = OnboardingRequest {
            has_diabetes: false,
            diabetes_type: Some(DiabetesType::Type2),
            ..Default::default()
        };
        let update = req.validate().unwrap();
        assert!(update.has_diabetes);
        assert_eq!(update.diabetes_type, Some(DiabetesType::Type2));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let bad_age = OnboardingRequest {
            age: Some(0),
            ..Default::default()
        };
        assert!(bad_age.validate().unwrap_err().contains("age"));

        let bad_weight = OnboardingRequest {
            weight_kg: Some(-3.0),
            ..Default::default()
        };
        assert!(bad_weight.validate().unwrap_err().contains("weight_kg"));

        let bad_range = OnboardingRequest {
            target_blood_sugar_min: Some(180.0),
            target_blood_sugar_max: Some(90.0),
            ..Default::default()
        };
        assert!(bad_range.validate().is_err());
    }

    #[test]
    fn deserializes_questionnaire_payload() {
        let json = r#"{
            "age": 34, "weight_kg": 72.5, "gender": "female",
            "activity_level": "very_active", "has_diabetes": true,
            "diabetes_type": "prediabetes", "allergies": "milk"
        }"#;
        let req: OnboardingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.activity_level, Some(ActivityLevel::VeryActive));
        assert_eq!(req.gender, Some(Gender::Female));
        let update = req.validate().unwrap();
        assert_eq!(update.diabetes_type, Some(DiabetesType::Prediabetes));
    }
}
