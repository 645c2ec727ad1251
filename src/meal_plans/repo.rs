use anyhow::Context;
use serde::Serialize;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::MealPlan;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MealPlanRecord {
    pub id: Uuid,
    pub budget: f64,
    pub days: i32,
    pub preferences: Option<String>,
    pub meal_plan: Json<MealPlan>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    budget: f64,
    days: i32,
    preferences: Option<&str>,
    plan: &MealPlan,
) -> anyhow::Result<MealPlanRecord> {
    let record = sqlx::query_as::<_, MealPlanRecord>(
        r#"
        INSERT INTO meal_plans (id, user_id, budget, days, preferences, meal_plan)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, budget, days, preferences, meal_plan, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(budget)
    .bind(days)
    .bind(preferences)
    .bind(Json(plan))
    .fetch_one(db)
    .await
    .context("insert meal plan")?;
    Ok(record)
}

pub async fn list(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<MealPlanRecord>> {
    let rows = sqlx::query_as::<_, MealPlanRecord>(
        r#"
        SELECT id, budget, days, preferences, meal_plan, created_at
        FROM meal_plans
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
    .context("list meal plans")?;
    Ok(rows)
}
