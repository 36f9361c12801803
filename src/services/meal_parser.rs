use std::sync::Arc;

use crate::error::ExtractionError;
use crate::models::{MealRequest, MealResult};
use crate::services::completion::{CompletionClient, OutputSchema};
use crate::services::prompts::build_meal_prompt;
use crate::services::validator::extract;

pub const PARSE_TOOL: &str = "parse_meal";

pub fn meal_schema() -> OutputSchema {
    OutputSchema::new(PARSE_TOOL, "Parse meal description and estimate calories")
        .non_empty_text(
            "foodItem",
            "Normalized, clear description of the food logged",
        )
        .number(
            "estimatedCalories",
            "The estimated total calories for this meal entry",
        )
        .text(
            "completionSuggestion",
            "A brief suggestion (max 15 words) to help reach daily target, or congratulations \
             if target met/exceeded",
        )
}

pub struct MealParsingService {
    client: Arc<dyn CompletionClient>,
    schema: OutputSchema,
}

impl MealParsingService {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            schema: meal_schema(),
        }
    }

    pub async fn parse(&self, request: &MealRequest) -> Result<MealResult, ExtractionError> {
        if request.description.trim().is_empty() {
            return Err(ExtractionError::InvalidRequest(
                "mealDescription must not be empty".to_string(),
            ));
        }

        let prompt = build_meal_prompt(request);
        let completion = self.client.complete(&prompt, &self.schema).await?;
        let payload = extract(&completion, &self.schema)?;

        let result = MealResult {
            normalized_label: payload.text("foodItem")?,
            estimated_calories: payload.calories("estimatedCalories")?,
            suggestion: payload.text("completionSuggestion")?,
        };

        log::info!(
            "🍽️ Parsed '{}' as {} ({} kcal)",
            request.description,
            result.normalized_label,
            result.estimated_calories
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::completion::stub::StubClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_parse_meal_end_to_end() {
        let stub = StubClient::tool_call(
            PARSE_TOOL,
            json!({
                "foodItem": "2 Rotis with Dal",
                "estimatedCalories": 350,
                "completionSuggestion": "Add a bowl of curd to round out lunch"
            }),
        );
        let service = MealParsingService::new(stub.clone());

        let request = MealRequest {
            description: "2 rotis with dal".to_string(),
            current_calories: 600,
            target_calories: 2000,
        };
        let result = service.parse(&request).await.unwrap();

        assert_eq!(
            result,
            MealResult {
                normalized_label: "2 Rotis with Dal".to_string(),
                estimated_calories: 350,
                suggestion: "Add a bowl of curd to round out lunch".to_string(),
            }
        );

        let prompts = stub.prompts.lock().unwrap();
        assert!(prompts[0].user.contains("\"2 rotis with dal\""));
        assert!(prompts[0].user.contains("600 kcal"));
    }

    #[tokio::test]
    async fn test_missing_calories_is_malformed() {
        let stub = StubClient::tool_call(
            PARSE_TOOL,
            json!({"foodItem": "Samosa", "completionSuggestion": "ok"}),
        );
        let service = MealParsingService::new(stub);

        let request = MealRequest {
            description: "1 samosa".to_string(),
            current_calories: 0,
            target_calories: 1800,
        };
        let err = service.parse(&request).await.unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedPayload(_)));
    }

    #[tokio::test]
    async fn test_blank_description_rejected() {
        let stub = StubClient::new(vec![]);
        let service = MealParsingService::new(stub.clone());

        let request = MealRequest {
            description: "   ".to_string(),
            current_calories: 0,
            target_calories: 1800,
        };
        let err = service.parse(&request).await.unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidRequest(_)));
        assert!(stub.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_propagates() {
        let stub = StubClient::new(vec![Err(ExtractionError::RateLimited)]);
        let service = MealParsingService::new(stub);

        let request = MealRequest {
            description: "chai".to_string(),
            current_calories: 0,
            target_calories: 1800,
        };
        let err = service.parse(&request).await.unwrap_err();
        assert!(matches!(err, ExtractionError::RateLimited));
    }
}
