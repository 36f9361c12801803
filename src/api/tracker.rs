use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use super::server::AppState;
use super::{parse_body, ApiError, PlanGoalRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMealRequest {
    pub meal_description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Per-user goal, meal log and dashboard routes, nested under `/users`.
pub fn create_tracker_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:user_id/goals", get(list_goals).post(set_goal))
        .route("/:user_id/goals/:id", delete(delete_goal))
        .route("/:user_id/meals", get(list_meals).post(log_meal))
        .route("/:user_id/dashboard", get(dashboard))
}

fn day_query(query: Result<Query<DayQuery>, QueryRejection>) -> Result<DayQuery, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::bad_request(format!("invalid query: {}", e)))
}

async fn set_goal(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let request: PlanGoalRequest = parse_body(&body).map_err(ApiError::rejecting_input)?;
    let request = request
        .into_goal_request()
        .map_err(ApiError::rejecting_input)?;

    let goal = state.tracker.set_goal(&user_id, &request).await?;
    log::info!(
        "🎯 New goal for {}: {} ({} kcal/day)",
        user_id,
        goal.goal,
        goal.daily_calorie_target
    );

    Ok((StatusCode::CREATED, Json(goal)))
}

async fn list_goals(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let goals = state.tracker.goals(&user_id).await?;
    Ok(Json(goals))
}

async fn delete_goal(
    Path((user_id, id)): Path<(String, i64)>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, ApiError> {
    if state.tracker.delete_goal(&user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("goal {} not found", id)))
    }
}

async fn log_meal(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<impl IntoResponse, ApiError> {
    let request: LogMealRequest = parse_body(&body).map_err(ApiError::rejecting_input)?;
    let logged = state
        .tracker
        .log_meal(&user_id, &request.meal_description)
        .await?;

    Ok((StatusCode::CREATED, Json(logged)))
}

async fn list_meals(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    query: Result<Query<DayQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = day_query(query)?;

    let meals = match (query.from, query.to) {
        (Some(from), Some(to)) => {
            if from > to {
                return Err(ApiError::bad_request("from must not be after to"));
            }
            state.tracker.history(&user_id, from, to).await?
        }
        (None, None) => {
            let date = query.date.unwrap_or_else(|| state.tracker.today());
            state.tracker.meals_on(&user_id, date).await?
        }
        _ => return Err(ApiError::bad_request("from and to must be given together")),
    };

    Ok(Json(meals))
}

async fn dashboard(
    Path(user_id): Path<String>,
    State(state): State<Arc<AppState>>,
    query: Result<Query<DayQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let query = day_query(query)?;
    let dashboard = state.tracker.dashboard(&user_id, query.date).await?;
    Ok(Json(dashboard))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{router, send};
    use super::*;
    use crate::services::completion::RawCompletion;
    use crate::services::goal_planner::PLAN_TOOL;
    use crate::services::meal_parser::PARSE_TOOL;
    use serde_json::{json, Value};

    fn plan(target: u32) -> Result<RawCompletion, crate::error::ExtractionError> {
        Ok(RawCompletion::with_tool_call(
            PLAN_TOOL,
            json!({"dailyCalorieTarget": target, "burnSuggestion": "Try a 20 minute yoga flow"}),
        ))
    }

    fn meal(label: &str, calories: u32) -> Result<RawCompletion, crate::error::ExtractionError> {
        Ok(RawCompletion::with_tool_call(
            PARSE_TOOL,
            json!({"foodItem": label, "estimatedCalories": calories, "completionSuggestion": "Have some fruit"}),
        ))
    }

    #[tokio::test]
    async fn test_goal_meal_dashboard_flow() {
        let app = router(vec![plan(1000), meal("Masala Dosa", 400), meal("Lassi", 550)]);

        let (status, _, body) = send(
            &app,
            "POST",
            "/users/asha/goals",
            Some(json!({"currentWeight": 68, "targetWeight": 62})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let goal: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(goal["goal"], "Lose 6 kg");
        assert_eq!(goal["dailyCalorieTarget"], 1000);

        for description in ["masala dosa", "sweet lassi"] {
            let (status, _, _) = send(
                &app,
                "POST",
                "/users/asha/meals",
                Some(json!({"mealDescription": description})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, _, body) = send(&app, "GET", "/users/asha/dashboard", None).await;
        assert_eq!(status, StatusCode::OK);
        let dashboard: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(dashboard["progress"]["dailyTotal"], 950);
        assert_eq!(dashboard["progress"]["status"], "on-track");
        assert_eq!(dashboard["progress"]["mealsCount"], 2);
        assert_eq!(dashboard["meals"][0]["foodItem"], "Masala Dosa");
        assert_eq!(dashboard["latestSuggestion"], "Have some fruit");

        let (_, _, body) = send(&app, "GET", "/users/asha/meals", None).await;
        let meals: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(meals.as_array().unwrap().len(), 2);

        let (_, _, body) = send(&app, "GET", "/users/ravi/dashboard", None).await;
        let other: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(other["progress"]["dailyTotal"], 0);
        assert!(other["goal"].is_null());
    }

    #[tokio::test]
    async fn test_delete_goal_route() {
        let app = router(vec![plan(2200)]);

        let (_, _, body) = send(
            &app,
            "POST",
            "/users/asha/goals",
            Some(json!({"currentWeight": 55, "targetWeight": 60})),
        )
        .await;
        let id = serde_json::from_str::<Value>(&body).unwrap()["id"]
            .as_i64()
            .unwrap();

        let uri = format!("/users/asha/goals/{}", id);
        let (status, _, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _, body) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains("not found"));

        let (_, _, body) = send(&app, "GET", "/users/asha/goals", None).await;
        assert_eq!(body, "[]");
    }

    #[tokio::test]
    async fn test_meal_range_queries() {
        let app = router(vec![]);

        let (status, _, body) = send(
            &app,
            "GET",
            "/users/asha/meals?from=2024-03-01&to=2024-03-07",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "[]");

        let (status, _, _) = send(&app, "GET", "/users/asha/meals?from=2024-03-01", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, _) = send(
            &app,
            "GET",
            "/users/asha/meals?from=2024-03-07&to=2024-03-01",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(&app, "GET", "/users/asha/dashboard?date=yesterday", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("invalid query"));
    }

    #[tokio::test]
    async fn test_log_meal_failure_status() {
        let app = router(vec![Err(crate::error::ExtractionError::QuotaExceeded)]);

        let (status, headers, _) = send(
            &app,
            "POST",
            "/users/asha/meals",
            Some(json!({"mealDescription": "pav bhaji"})),
        )
        .await;
        assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(headers["access-control-allow-origin"], "*");

        let (status, _, _) = send(
            &app,
            "POST",
            "/users/asha/meals",
            Some(json!({"mealDescription": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _, body) = send(
            &app,
            "POST",
            "/users/asha/goals",
            Some(json!({"currentWeight": "heavy"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("unreadable body"));
    }
}
