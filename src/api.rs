use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;
use crate::handlers::TrackerError;
use crate::models::{GoalDirection, GoalRequest, MealRequest};

/// Body of `POST /plan-goal` and `POST /users/:user_id/goals`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanGoalRequest {
    #[serde(default)]
    pub goal: Option<String>,
    pub current_weight: f64,
    pub target_weight: f64,
    #[serde(default)]
    pub direction: Option<String>,
}

impl PlanGoalRequest {
    pub fn into_goal_request(self) -> Result<GoalRequest, ExtractionError> {
        let mut request = GoalRequest::new(self.current_weight, self.target_weight);

        if let Some(direction) = self.direction.as_deref().filter(|d| !d.trim().is_empty()) {
            request.direction = GoalDirection::from_string(direction).ok_or_else(|| {
                ExtractionError::InvalidRequest(format!("unknown direction: {}", direction))
            })?;
        }
        request.goal_text = self
            .goal
            .map(|g| g.trim().to_string())
            .filter(|g| !g.is_empty());

        Ok(request)
    }
}

/// Body of `POST /parse-meal`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseMealRequest {
    pub meal_description: String,
    #[serde(default)]
    pub current_calories: f64,
    #[serde(default)]
    pub target_calories: f64,
}

impl ParseMealRequest {
    pub fn into_meal_request(self) -> Result<MealRequest, ExtractionError> {
        Ok(MealRequest {
            current_calories: calorie_count("currentCalories", self.current_calories)?,
            target_calories: calorie_count("targetCalories", self.target_calories)?,
            description: self.meal_description,
        })
    }
}

fn calorie_count(name: &str, value: f64) -> Result<u32, ExtractionError> {
    if !value.is_finite() || value < 0.0 || value > u32::MAX as f64 {
        return Err(ExtractionError::InvalidRequest(format!(
            "{} must be a non-negative number",
            name
        )));
    }
    Ok(value.round() as u32)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Every failed request renders as `{ "error": message }` with this status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Tracker routes answer rejected input with 400; other failures keep their status.
    pub fn rejecting_input(err: ExtractionError) -> Self {
        if err.is_caller_error() {
            log::warn!("⚠️ Rejected input: {}", err);
            Self::bad_request(err.to_string())
        } else {
            err.into()
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ExtractionError> for ApiError {
    fn from(err: ExtractionError) -> Self {
        if err.is_retryable() {
            log::warn!("⚠️ Extraction failed, caller may retry: {}", err);
        } else {
            log::error!("❌ Extraction failed: {}", err);
        }

        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        log::error!("❌ Store error: {:#}", err);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::Extraction(e) => Self::rejecting_input(e),
            TrackerError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Parses a JSON request body; an unreadable body is `InvalidRequest`.
pub fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ExtractionError> {
    serde_json::from_str(body).map_err(|e| {
        log::debug!("📦 Rejected body ({} bytes): {}", body.len(), e);
        ExtractionError::InvalidRequest(format!("unreadable body: {}", e))
    })
}

pub mod tracker;

pub mod server {
    use super::*;
    use axum::{
        extract::State,
        http::{header, HeaderName, HeaderValue, Method},
        routing::{get, post},
        Router,
    };
    use std::sync::Arc;
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::set_header::SetResponseHeaderLayer;

    use crate::handlers::DayTracker;
    use crate::models::{GoalResult, MealResult};
    use crate::services::{GoalPlanningService, MealParsingService};

    pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

    pub struct AppState {
        pub goal_planner: Arc<GoalPlanningService>,
        pub meal_parser: Arc<MealParsingService>,
        pub tracker: Arc<DayTracker>,
    }

    pub fn create_router(state: AppState) -> Router {
        let state = Arc::new(state);

        Router::new()
            .route("/plan-goal", post(plan_goal))
            .route("/parse-meal", post(parse_meal))
            .route("/health", get(health_check))
            .nest("/users", super::tracker::create_tracker_router())
            .with_state(state)
            .layer(cors_layer())
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static(ALLOWED_HEADERS),
            ))
    }

    /// Answers every OPTIONS request with an empty 200.
    fn cors_layer() -> CorsLayer {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers([
                header::AUTHORIZATION,
                HeaderName::from_static("x-client-info"),
                HeaderName::from_static("apikey"),
                header::CONTENT_TYPE,
            ])
    }

    async fn plan_goal(
        State(state): State<Arc<AppState>>,
        body: String,
    ) -> Result<Json<GoalResult>, ApiError> {
        let request: PlanGoalRequest = parse_body(&body)?;
        let request = request.into_goal_request()?;

        log::info!(
            "🎯 Plan goal: {} kg -> {} kg",
            request.current_weight,
            request.target_weight
        );
        let result = state.goal_planner.plan(&request).await?;
        Ok(Json(result))
    }

    async fn parse_meal(
        State(state): State<Arc<AppState>>,
        body: String,
    ) -> Result<Json<MealResult>, ApiError> {
        let request: ParseMealRequest = parse_body(&body)?;
        let request = request.into_meal_request()?;

        log::info!("🍽️ Parse meal: '{}'", request.description);
        let result = state.meal_parser.parse(&request).await?;
        Ok(Json(result))
    }

    async fn health_check() -> &'static str {
        "OK"
    }
}
