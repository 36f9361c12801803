use std::sync::Arc;

use crate::error::ExtractionError;
use crate::models::{GoalRequest, GoalResult};
use crate::services::completion::{CompletionClient, OutputSchema};
use crate::services::prompts::build_goal_prompt;
use crate::services::validator::extract;

pub const PLAN_TOOL: &str = "plan_nutrition";

pub fn goal_schema() -> OutputSchema {
    OutputSchema::new(
        PLAN_TOOL,
        "Calculate daily calorie target and provide fitness suggestions",
    )
    .number(
        "dailyCalorieTarget",
        "The recommended daily calorie intake in kcal",
    )
    .text(
        "burnSuggestion",
        "A short, encouraging paragraph (100-150 words) on how to achieve the goal through \
         exercise and lifestyle changes, specific to Indian context",
    )
}

/// Turns a weight goal into a daily calorie target. The band choice is left to the model;
/// only the shape and positivity of the answer are checked here.
pub struct GoalPlanningService {
    client: Arc<dyn CompletionClient>,
    schema: OutputSchema,
}

impl GoalPlanningService {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            schema: goal_schema(),
        }
    }

    pub async fn plan(&self, request: &GoalRequest) -> Result<GoalResult, ExtractionError> {
        validate(request)?;

        let prompt = build_goal_prompt(request);
        let completion = self.client.complete(&prompt, &self.schema).await?;
        let payload = extract(&completion, &self.schema)?;

        let daily_calorie_target = payload.calories("dailyCalorieTarget")?;
        if daily_calorie_target == 0 {
            log::error!("❌ Planner returned a non-positive calorie target");
            return Err(ExtractionError::MalformedPayload(
                "dailyCalorieTarget must be positive".to_string(),
            ));
        }

        let result = GoalResult {
            daily_calorie_target,
            activity_suggestion: payload.text("burnSuggestion")?,
        };

        log::info!(
            "🎯 Planned {} kcal/day for '{}'",
            result.daily_calorie_target,
            request.goal_text()
        );
        Ok(result)
    }
}

fn validate(request: &GoalRequest) -> Result<(), ExtractionError> {
    for (name, weight) in [
        ("currentWeight", request.current_weight),
        ("targetWeight", request.target_weight),
    ] {
        if !weight.is_finite() || weight <= 0.0 {
            return Err(ExtractionError::InvalidRequest(format!(
                "{} must be a positive number of kg",
                name
            )));
        }
    }
    Ok(())
}
