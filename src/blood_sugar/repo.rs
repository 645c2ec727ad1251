use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::RecordReadingRequest;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BloodSugarReading {
    pub id: Uuid,
    pub reading_mg_dl: f64,
    pub reading_type: String,
    pub notes: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub measured_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    req: &RecordReadingRequest,
) -> anyhow::Result<BloodSugarReading> {
    let reading = sqlx::query_as::<_, BloodSugarReading>(
        r#"
        INSERT INTO blood_sugar_readings (id, user_id, reading_mg_dl, reading_type, notes, measured_at)
        VALUES ($1, $2, $3, $4, $5, COALESCE($6, now()))
        RETURNING id, reading_mg_dl, reading_type, notes, measured_at, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(req.reading_mg_dl)
    .bind(req.reading_type.as_str())
    .bind(req.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()))
    .bind(req.measured_at)
    .fetch_one(db)
    .await
    .context("insert blood sugar reading")?;
    Ok(reading)
}

/// Readings measured at or after `since`, newest first.
pub async fn list_since(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<BloodSugarReading>> {
    let rows = sqlx::query_as::<_, BloodSugarReading>(
        r#"
        SELECT id, reading_mg_dl, reading_type, notes, measured_at, created_at
        FROM blood_sugar_readings
        WHERE user_id = $1 AND measured_at >= $2
        ORDER BY measured_at DESC
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_all(db)
    .await
    .context("list blood sugar readings")?;
    Ok(rows)
}
