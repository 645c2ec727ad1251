use tracing::{info, instrument, warn};

use super::dto::{GenerateMealPlanRequest, MealPlan};
use crate::{
    ai::{extract_json, AiError, ChatMessage, ChatRequest, LlmClient},
    profiles::repo_types::Profile,
};

const MEAL_PLAN_MAX_TOKENS: u32 = 8192;
const MEALS_PER_DAY: i32 = 3;

const MEAL_PLAN_SCHEMA: &str = r#"{
  "meals": [{
    "name": string,
    "type": "breakfast" | "lunch" | "dinner" | "snack",
    "ingredients": string[],
    "instructions": string[],
    "nutrition": {"calories": number, "protein": number, "carbs": number, "fat": number, "fiber": number},
    "cost": number (USD),
    "prepTime": number (minutes),
    "culturalContext": string (optional)
  }],
  "totalCost": number,
  "totalCalories": number,
  "nutritionalAnalysis": string
}"#;

fn profile_section(profile: Option<&Profile>) -> String {
    let Some(p) = profile else {
        return "No user profile available".into();
    };
    let or_unknown = |v: Option<String>| v.unwrap_or_else(|| "Unknown".into());

    let mut restrictions: Vec<String> = p.dietary_preferences.clone().unwrap_or_default();
    restrictions.extend(
        p.allergies
            .iter()
            .flatten()
            .map(|a| format!("allergic to {a}")),
    );
    let mut goals: Vec<String> = p.primary_goal.iter().cloned().collect();
    goals.extend(p.secondary_goals.iter().flatten().cloned());

    let mut lines = vec![
        format!("- Age: {}", or_unknown(p.age.map(|a| a.to_string()))),
        format!("- Weight: {} kg", or_unknown(p.weight_kg.map(|w| w.to_string()))),
        format!("- Height: {} cm", or_unknown(p.height_cm.map(|h| h.to_string()))),
        format!("- Activity Level: {}", or_unknown(p.activity_level.clone())),
        format!("- Dietary Restrictions: {}", Profile::joined(&Some(restrictions))),
        format!("- Health Goals: {}", Profile::joined(&Some(goals))),
        format!("- Health Conditions: {}", Profile::joined(&p.health_conditions)),
    ];
    if p.has_diabetes {
        let kind = p.diabetes().map(|d| d.as_str()).unwrap_or("unspecified");
        let (lo, hi) = p.blood_sugar_target();
        lines.push(format!("- Diabetes: {kind} (target {lo:.0}-{hi:.0} mg/dL)"));
    }
    if let Some(cuisines) = p.cuisine_preferences.as_ref().filter(|c| !c.is_empty()) {
        lines.push(format!("- Cuisine Preferences: {}", cuisines.join(", ")));
    }
    if let Some(country) = &p.country {
        lines.push(format!("- Location: {country}"));
    }
    lines.join("\n") + "\n"
}

pub fn meal_plan_prompt(req: &GenerateMealPlanRequest, profile: Option<&Profile>) -> String {
    let days = req.days;
    let budget = req.budget;
    let preferences = match req.preferences.trim() {
        "" => "None",
        p => p,
    };
    format!(
        "Generate a {days}-day meal plan with a total budget of ${budget}.\n\n\
         User Profile:\n{profile}\n\
         Additional Preferences: {preferences}\n\n\
         Requirements:\n\
         - Create {meals} meals (breakfast, lunch, dinner for each day)\n\
         - Stay within the ${budget} total budget\n\
         - Consider the user's health conditions, especially if diabetic (focus on low glycemic index foods)\n\
         - Include culturally appropriate foods based on preferences\n\
         - Provide realistic ingredient costs and prep times\n\
         - Balance nutrition across all meals\n\
         - Include detailed cooking instructions\n\
         - Ensure meals are affordable and accessible\n\n\
         Focus on:\n\
         - Budget-friendly ingredients\n\
         - Nutritional balance (especially managing carbs for diabetes)\n\
         - Cultural food preferences\n\
         - Easy-to-follow recipes\n\
         - Realistic portion sizes\n\n\
         Output your response strictly as JSON matching this schema: {MEAL_PLAN_SCHEMA}",
        profile = profile_section(profile),
        meals = days * MEALS_PER_DAY,
    )
}

#[instrument(skip_all, fields(days = req.days, budget = req.budget))]
pub async fn generate(
    llm: &dyn LlmClient,
    req: &GenerateMealPlanRequest,
    profile: Option<&Profile>,
) -> Result<MealPlan, AiError> {
    let request = ChatRequest::new(vec![ChatMessage::user(meal_plan_prompt(req, profile))])
        .with_max_tokens(MEAL_PLAN_MAX_TOKENS)
        .expect_json();
    let response = llm.complete(&request).await?;
    let plan: MealPlan = extract_json(&response.content)?;
    if plan.meals.is_empty() {
        return Err(AiError::Parse("meal plan has no meals".into()));
    }
    if plan.total_cost > req.budget {
        warn!(total_cost = plan.total_cost, budget = req.budget, "meal plan exceeds budget");
    }
    info!(
        model = %response.model,
        meals = plan.meals.len(),
        total_cost = plan.total_cost,
        "meal plan generated"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ai::scripted::ScriptedLlm, profiles::repo_types::sample_profile};

    fn req() -> GenerateMealPlanRequest {
        GenerateMealPlanRequest {
            budget: 40.0,
            days: 2,
            preferences: "no pork".into(),
        }
    }

    #[test]
    fn prompt_without_profile() {
        let prompt = meal_plan_prompt(&req(), None);
        assert!(prompt.starts_with("Generate a 2-day meal plan with a total budget of $40."));
        assert!(prompt.contains("No user profile available"));
        assert!(prompt.contains("Additional Preferences: no pork"));
        assert!(prompt.contains("- Create 6 meals"));
    }

    #[test]
    fn prompt_with_profile() {
        let prompt = meal_plan_prompt(&req(), Some(&sample_profile()));
        assert!(prompt.contains("- Age: 45"));
        assert!(prompt.contains("- Weight: 80 kg"));
        assert!(prompt.contains("- Dietary Restrictions: allergic to peanuts"));
        assert!(prompt.contains("- Health Goals: blood_sugar_control, weight_loss"));
        assert!(prompt.contains("- Diabetes: type2 (target 80-160 mg/dL)"));
        assert!(prompt.contains("- Cuisine Preferences: Nigerian"));
    }

    #[test]
    fn profile_section_is_one_bullet_per_line() {
        let section = profile_section(Some(&sample_profile()));
        assert!(section.ends_with('\n') && !section.ends_with("\n\n"));
        assert!(section.lines().all(|l| l.starts_with("- ")), "{section}");
        assert!(section.lines().count() >= 9);
    }

    #[tokio::test]
    async fn generate_parses_plan_and_rejects_empty() {
        let plan_json = r#"{"meals": [{"name": "Beans and plantain", "type": "lunch",
            "ingredients": ["beans", "plantain"], "instructions": ["Cook beans"],
            "nutrition": {"calories": 500, "protein": 20, "carbs": 70, "fat": 10, "fiber": 15},
            "cost": 2.5, "prepTime": 45, "culturalContext": "Ewa dodo"}],
            "totalCost": 2.5, "totalCalories": 500, "nutritionalAnalysis": "ok"}"#;
        let llm = ScriptedLlm::replying(plan_json);
        let plan = generate(&llm, &req(), None).await.unwrap();
        assert_eq!(plan.meals.len(), 1);
        assert_eq!(plan.meals[0].cultural_context.as_deref(), Some("Ewa dodo"));
        assert!(llm.recorded()[0].json_output);

        let empty = ScriptedLlm::replying(
            r#"{"meals": [], "totalCost": 0, "totalCalories": 0, "nutritionalAnalysis": ""}"#,
        );
        assert!(matches!(
            generate(&empty, &req(), None).await.unwrap_err(),
            AiError::Parse(_)
        ));
    }
}
