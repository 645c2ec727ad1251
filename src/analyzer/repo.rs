use anyhow::Context;
use sqlx::{PgExecutor, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::CreateFoodLogRequest;
use super::repo_types::{FoodLog, NutritionalGapRow};
use crate::nutrition::gaps::NutrientGap;

const FOOD_LOG_COLUMNS: &str = r#"
    id, user_id, meal_type, food_name, food_description, image_url, calories,
    protein_g, carbs_g, fat_g, fiber_g, sugar_g, sodium_mg, glycemic_index,
    glycemic_load, predicted_blood_sugar_spike, portion_size, cost_usd, notes,
    logged_at, created_at
"#;

const GAP_COLUMNS: &str =
    "id, nutrient_name, current_intake, recommended_intake, unit, severity, analysis_date";

pub async fn insert_food_log(
    db: &PgPool,
    user_id: Uuid,
    req: &CreateFoodLogRequest,
) -> anyhow::Result<FoodLog> {
    let sql = format!(
        r#"
        INSERT INTO food_logs (
            id, user_id, meal_type, food_name, food_description, image_url, calories,
            protein_g, carbs_g, fat_g, fiber_g, sugar_g, sodium_mg, glycemic_index,
            glycemic_load, predicted_blood_sugar_spike, portion_size, cost_usd, notes,
            logged_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                $17, $18, $19, COALESCE($20, now()))
        RETURNING {FOOD_LOG_COLUMNS}
        "#
    );
    let log = sqlx::query_as::<_, FoodLog>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(req.meal_type.as_str())
        .bind(req.food_name.trim())
        .bind(&req.description)
        .bind(&req.image_url)
        .bind(req.calories)
        .bind(req.protein_g)
        .bind(req.carbs_g)
        .bind(req.fat_g)
        .bind(req.fiber_g)
        .bind(req.sugar_g)
        .bind(req.sodium_mg)
        .bind(req.glycemic_index)
        .bind(req.glycemic_load)
        .bind(req.predicted_blood_sugar_spike)
        .bind(&req.portion_size)
        .bind(req.cost_usd)
        .bind(&req.notes)
        .bind(req.logged_at)
        .fetch_one(db)
        .await
        .context("insert food log")?;
    Ok(log)
}

pub async fn list_food_logs(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<FoodLog>> {
    let sql = format!(
        r#"
        SELECT {FOOD_LOG_COLUMNS}
        FROM food_logs
        WHERE user_id = $1
        ORDER BY logged_at DESC
        LIMIT $2 OFFSET $3
        "#
    );
    let rows = sqlx::query_as::<_, FoodLog>(&sql)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
        .context("list food logs")?;
    Ok(rows)
}

pub async fn food_logs_since(
    db: &PgPool,
    user_id: Uuid,
    since: OffsetDateTime,
) -> anyhow::Result<Vec<FoodLog>> {
    let sql = format!(
        "SELECT {FOOD_LOG_COLUMNS} FROM food_logs \
         WHERE user_id = $1 AND logged_at >= $2 AND logged_at <= now()"
    );
    let rows = sqlx::query_as::<_, FoodLog>(&sql)
        .bind(user_id)
        .bind(since)
        .fetch_all(db)
        .await
        .context("select recent food logs")?;
    Ok(rows)
}

pub async fn list_gaps(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<NutritionalGapRow>> {
    let sql = format!(
        "SELECT {GAP_COLUMNS} FROM nutritional_gaps WHERE user_id = $1 ORDER BY nutrient_name"
    );
    let rows = sqlx::query_as::<_, NutritionalGapRow>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await
        .context("list nutritional gaps")?;
    Ok(rows)
}

pub async fn delete_gaps<'e, E: PgExecutor<'e>>(db: E, user_id: Uuid) -> anyhow::Result<u64> {
    let res = sqlx::query("DELETE FROM nutritional_gaps WHERE user_id = $1")
        .bind(user_id)
        .execute(db)
        .await
        .context("delete nutritional gaps")?;
    Ok(res.rows_affected())
}

pub async fn insert_gap<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: Uuid,
    gap: &NutrientGap,
) -> anyhow::Result<NutritionalGapRow> {
    let sql = format!(
        r#"
        INSERT INTO nutritional_gaps
            (id, user_id, nutrient_name, current_intake, recommended_intake, unit, severity)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {GAP_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, NutritionalGapRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&gap.nutrient_name)
        .bind(gap.current_intake)
        .bind(gap.recommended_intake)
        .bind(&gap.unit)
        .bind(gap.severity.as_str())
        .fetch_one(db)
        .await
        .context("insert nutritional gap")?;
    Ok(row)
}
