use anyhow::Context;
use sqlx::PgPool;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{dto::FoodAnalysis, repo, repo_types::NutritionalGapRow};
use crate::{
    ai::{extract_json, AiError, ChatMessage, ChatRequest, InlineImage, LlmClient},
    nutrition::gaps::{self, GapAnalysis, IntakeSample, WINDOW_DAYS},
    profiles::{self, repo_types::Profile},
};

const ANALYSIS_MAX_TOKENS: u32 = 2048;
const GAP_SUMMARY_MAX_TOKENS: u32 = 1024;

pub const ANALYSIS_PROMPT: &str = r#"Analyze this food image and provide detailed nutritional information.

Instructions:
- Identify all visible foods and ingredients
- Estimate portion sizes accurately
- Calculate nutritional values based on the portions shown
- Provide glycemic index and load (important for diabetes management)
- Predict potential blood sugar spike in mg/dL
- Estimate the cost of this meal in USD
- Give a health score (0-100) based on nutritional balance
- Provide practical recommendations for healthier alternatives or modifications

Be as accurate as possible with your estimates.

Output your response strictly as JSON with exactly these fields:
{
  "foodName": string,
  "description": string,
  "ingredients": string[],
  "nutrition": {
    "calories": number, "protein": number (g), "carbs": number (g), "fat": number (g),
    "fiber": number (g), "sugar": number (g), "sodium": number (mg)
  },
  "glycemicIndex": number (0-100),
  "glycemicLoad": number,
  "predictedBloodSugarSpike": number (mg/dL),
  "portionSize": string,
  "estimatedCost": number (USD),
  "healthScore": number (0-100),
  "recommendations": string[]
}"#;

/// Asks the vision model for a structured analysis of one photo.
#[instrument(skip_all, fields(provider = llm.provider()))]
pub async fn analyze_image(
    llm: &dyn LlmClient,
    image: InlineImage,
) -> Result<FoodAnalysis, AiError> {
    let request = ChatRequest::new(vec![ChatMessage::user(ANALYSIS_PROMPT)])
        .with_image(image)
        .with_max_tokens(ANALYSIS_MAX_TOKENS)
        .expect_json();
    let response = llm.complete(&request).await?;
    let analysis: FoodAnalysis = extract_json(&response.content)?;
    analysis.validate().map_err(AiError::Parse)?;
    info!(
        model = %response.model,
        food = %analysis.food_name,
        calories = analysis.nutrition.calories,
        health_score = analysis.health_score,
        "food image analyzed"
    );
    Ok(analysis)
}

#[derive(Debug, Default)]
pub struct GapRefresh {
    pub gaps: Vec<NutritionalGapRow>,
    pub summary: Option<String>,
}

/// Recomputes the user's gaps from the last week of logs and replaces the
/// stored set. Without logs or a profile the stored gaps are left alone.
#[instrument(skip(db, llm))]
pub async fn refresh_gaps(
    db: &PgPool,
    llm: &dyn LlmClient,
    user_id: Uuid,
) -> anyhow::Result<GapRefresh> {
    let since = OffsetDateTime::now_utc() - Duration::days(WINDOW_DAYS);
    let logs = repo::food_logs_since(db, user_id, since).await?;
    let samples: Vec<IntakeSample> = logs.iter().map(IntakeSample::from).collect();

    let Some(profile) = profiles::repo::find(db, user_id).await? else {
        debug!(%user_id, "no profile, gaps unchanged");
        return Ok(GapRefresh {
            gaps: repo::list_gaps(db, user_id).await?,
            summary: None,
        });
    };
    let Some(analysis) = gaps::analyze(&samples, profile.weight_kg) else {
        debug!(%user_id, "no recent logs, gaps unchanged");
        return Ok(GapRefresh {
            gaps: repo::list_gaps(db, user_id).await?,
            summary: None,
        });
    };

    let mut tx = db.begin().await.context("begin gap refresh")?;
    let removed = repo::delete_gaps(&mut *tx, user_id).await?;
    let mut rows = Vec::with_capacity(analysis.gaps.len());
    for gap in &analysis.gaps {
        rows.push(repo::insert_gap(&mut *tx, user_id, gap).await?);
    }
    tx.commit().await.context("commit gap refresh")?;
    info!(%user_id, logs = analysis.log_count, removed, stored = rows.len(), "nutritional gaps refreshed");

    let summary = gap_summary(llm, &analysis, &profile).await;
    Ok(GapRefresh {
        gaps: rows,
        summary,
    })
}

/// Short narrative of the gaps; `None` when the model is unavailable.
pub async fn gap_summary(
    llm: &dyn LlmClient,
    analysis: &GapAnalysis,
    profile: &Profile,
) -> Option<String> {
    let request = ChatRequest::new(vec![ChatMessage::user(gaps::summary_prompt(
        analysis, profile,
    ))])
    .with_max_tokens(GAP_SUMMARY_MAX_TOKENS);
    match llm.complete(&request).await {
        Ok(resp) => Some(resp.content.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => {
            warn!(error = %e, "gap summary unavailable");
            None
        }
    }
}
