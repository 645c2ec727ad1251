use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Default blood sugar target band (mg/dL) when the profile has none.
pub const DEFAULT_TARGET_MIN: f64 = 70.0;
pub const DEFAULT_TARGET_MAX: f64 = 180.0;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, ::serde::Serialize, ::serde::Deserialize, PartialEq, Eq)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {}: {}", stringify!($name), other)),
                }
            }
        }
    };
}
pub(crate) use text_enum;

text_enum!(Gender {
    Male => "male",
    Female => "female",
    PreferNotSay => "prefer_not_say",
});

text_enum!(ActivityLevel {
    Sedentary => "sedentary",
    Light => "light",
    Moderate => "moderate",
    Active => "active",
    VeryActive => "very_active",
});

text_enum!(DiabetesType {
    Type1 => "type1",
    Type2 => "type2",
    Prediabetes => "prediabetes",
});

impl DiabetesType {
    /// Maps the onboarding condition labels ("Type 2 Diabetes") to a type.
    pub fn from_condition_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Type 1 Diabetes" => Some(DiabetesType::Type1),
            "Type 2 Diabetes" => Some(DiabetesType::Type2),
            "Prediabetes" => Some(DiabetesType::Prediabetes),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub age: Option<i32>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub gender: Option<String>,
    pub primary_goal: Option<String>,
    pub secondary_goals: Option<Vec<String>>,
    pub eating_pattern: Option<String>,
    pub activity_level: Option<String>,
    pub weekly_budget: Option<String>,
    pub dietary_preferences: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
    pub health_conditions: Option<Vec<String>>,
    pub cuisine_preferences: Option<Vec<String>>,
    pub has_diabetes: bool,
    pub diabetes_type: Option<String>,
    pub target_blood_sugar_min: Option<f64>,
    pub target_blood_sugar_max: Option<f64>,
    pub onboarding_completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Profile {
    pub fn activity(&self) -> Option<ActivityLevel> {
        self.activity_level.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn diabetes(&self) -> Option<DiabetesType> {
        self.diabetes_type.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.health_conditions
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|c| c.eq_ignore_ascii_case(condition))
    }

    /// True when the goal is primary or listed among the secondary goals.
    pub fn has_goal(&self, goal: &str) -> bool {
        self.primary_goal.as_deref() == Some(goal)
            || self
                .secondary_goals
                .as_deref()
                .unwrap_or_default()
                .iter()
                .any(|g| g == goal)
    }

    pub fn blood_sugar_target(&self) -> (f64, f64) {
        (
            self.target_blood_sugar_min.unwrap_or(DEFAULT_TARGET_MIN),
            self.target_blood_sugar_max.unwrap_or(DEFAULT_TARGET_MAX),
        )
    }

    pub fn joined(list: &Option<Vec<String>>) -> String {
        match list.as_deref() {
            Some(items) if !items.is_empty() => items.join(", "),
            _ => "None".into(),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_profile() -> Profile {
    let now = OffsetDateTime::now_utc();
    Profile {
        id: Uuid::new_v4(),
        email: "ada@example.com".into(),
        full_name: Some("Ada".into()),
        country: Some("Nigeria".into()),
        region: None,
        age: Some(45),
        weight_kg: Some(80.0),
        height_cm: Some(170.0),
        gender: Some("female".into()),
        primary_goal: Some("blood_sugar_control".into()),
        secondary_goals: Some(vec!["weight_loss".into()]),
        eating_pattern: None,
        activity_level: Some("light".into()),
        weekly_budget: None,
        dietary_preferences: None,
        allergies: Some(vec!["peanuts".into()]),
        health_conditions: Some(vec!["Hypertension".into()]),
        cuisine_preferences: Some(vec!["Nigerian".into()]),
        has_diabetes: true,
        diabetes_type: Some("type2".into()),
        target_blood_sugar_min: Some(80.0),
        target_blood_sugar_max: Some(160.0),
        onboarding_completed: true,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_wire_names() {
        assert_eq!("very_active".parse::<ActivityLevel>(), Ok(ActivityLevel::VeryActive));
        assert_eq!(" Type1 ".parse::<DiabetesType>(), Ok(DiabetesType::Type1));
        assert_eq!(Gender::PreferNotSay.as_str(), "prefer_not_say");
        assert!("vigorous".parse::<ActivityLevel>().is_err());
    }

    #[test]
    fn condition_labels_map_to_diabetes_type() {
        assert_eq!(
            DiabetesType::from_condition_label("Type 2 Diabetes"),
            Some(DiabetesType::Type2)
        );
        assert_eq!(DiabetesType::from_condition_label("Hypertension"), None);
    }

    #[test]
    fn profile_helpers() {
        let mut p = sample_profile();
        assert_eq!(p.activity(), Some(ActivityLevel::Light));
        assert_eq!(p.diabetes(), Some(DiabetesType::Type2));
        assert!(p.has_condition("hypertension"));
        assert!(!p.has_condition("ulcer"));
        assert!(p.has_goal("weight_loss"));
        assert_eq!(p.blood_sugar_target(), (80.0, 160.0));

        p.target_blood_sugar_min = None;
        p.target_blood_sugar_max = None;
        assert_eq!(p.blood_sugar_target(), (70.0, 180.0));
        assert_eq!(Profile::joined(&p.allergies), "peanuts");
        assert_eq!(Profile::joined(&None), "None");
    }
}
