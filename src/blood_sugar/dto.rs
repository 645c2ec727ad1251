use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::repo::BloodSugarReading;
use super::services::ReadingSummary;
use crate::profiles::repo_types::text_enum;

pub const MIN_READING_MG_DL: f64 = 20.0;
pub const MAX_READING_MG_DL: f64 = 600.0;
pub const DEFAULT_DAYS: i64 = 7;
pub const MAX_DAYS: i64 = 90;

text_enum!(ReadingType {
    Fasting => "fasting",
    BeforeMeal => "before_meal",
    AfterMeal => "after_meal",
    Bedtime => "bedtime",
    Random => "random",
});

#[derive(Debug, Deserialize)]
pub struct RecordReadingRequest {
    pub reading_mg_dl: f64,
    pub reading_type: ReadingType,
    pub notes: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub measured_at: Option<OffsetDateTime>,
}

impl RecordReadingRequest {
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_READING_MG_DL..=MAX_READING_MG_DL).contains(&self.reading_mg_dl) {
            return Err(format!(
                "reading_mg_dl must be between {MIN_READING_MG_DL} and {MAX_READING_MG_DL}"
            ));
        }
        if self
            .measured_at
            .is_some_and(|t| t > OffsetDateTime::now_utc() + time::Duration::minutes(5))
        {
            return Err("measured_at is in the future".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<i64>,
}

impl HistoryQuery {
    pub fn days(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_DAYS).clamp(1, MAX_DAYS)
    }
}

#[derive(Debug, Serialize)]
pub struct ReadingHistory {
    pub days: i64,
    pub readings: Vec<BloodSugarReading>,
    pub summary: ReadingSummary,
}
