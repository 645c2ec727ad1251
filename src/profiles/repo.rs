use anyhow::Context;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::dto::OnboardingUpdate;
use super::repo_types::Profile;

const PROFILE_COLUMNS: &str = r#"
    id, email, full_name, country, region, age, weight_kg, height_cm, gender,
    primary_goal, secondary_goals, eating_pattern, activity_level, weekly_budget,
    dietary_preferences, allergies, health_conditions, cuisine_preferences,
    has_diabetes, diabetes_type, target_blood_sugar_min, target_blood_sugar_max,
    onboarding_completed, created_at, updated_at
"#;

/// Inserts the empty profile that registration creates alongside the user.
pub async fn create_empty<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: Uuid,
    email: &str,
    full_name: Option<&str>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profiles (id, email, full_name)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(email)
    .bind(full_name)
    .execute(db)
    .await
    .context("insert profile")?;
    Ok(())
}

pub async fn find(db: &PgPool, user_id: Uuid) -> anyhow::Result<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1");
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("select profile")?;
    Ok(profile)
}

pub async fn apply_onboarding(
    db: &PgPool,
    user_id: Uuid,
    u: &OnboardingUpdate,
) -> anyhow::Result<Option<Profile>> {
    let sql = format!(
        r#"
        UPDATE profiles SET
            full_name = COALESCE($2, full_name),
            country = $3,
            region = $4,
            age = $5,
            weight_kg = $6,
            height_cm = $7,
            gender = $8,
            primary_goal = $9,
            secondary_goals = $10,
            eating_pattern = $11,
            activity_level = $12,
            weekly_budget = $13,
            dietary_preferences = $14,
            allergies = $15,
            health_conditions = $16,
            cuisine_preferences = $17,
            has_diabetes = $18,
            diabetes_type = $19,
            target_blood_sugar_min = $20,
            target_blood_sugar_max = $21,
            onboarding_completed = TRUE,
            updated_at = now()
        WHERE id = $1
        RETURNING {PROFILE_COLUMNS}
        "#
    );
    let profile = sqlx::query_as::<_, Profile>(&sql)
        .bind(user_id)
        .bind(&u.full_name)
        .bind(&u.country)
        .bind(&u.region)
        .bind(u.age)
        .bind(u.weight_kg)
        .bind(u.height_cm)
        .bind(u.gender.map(|g| g.as_str()))
        .bind(&u.primary_goal)
        .bind(&u.secondary_goals)
        .bind(&u.eating_pattern)
        .bind(u.activity_level.map(|a| a.as_str()))
        .bind(&u.weekly_budget)
        .bind(&u.dietary_preferences)
        .bind(&u.allergies)
        .bind(&u.health_conditions)
        .bind(&u.cuisine_preferences)
        .bind(u.has_diabetes)
        .bind(u.diabetes_type.map(|d| d.as_str()))
        .bind(u.target_blood_sugar_min)
        .bind(u.target_blood_sugar_max)
        .fetch_optional(db)
        .await
        .context("update profile onboarding")?;
    Ok(profile)
}
