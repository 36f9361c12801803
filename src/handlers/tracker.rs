use anyhow::Result;
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::sync::Arc;

use crate::error::ExtractionError;
use crate::models::{
    GoalRecord, GoalRequest, MealLogRecord, MealRequest, MealResult, ProgressSnapshot,
};
use crate::services::database::{DayRange, Store};
use crate::services::progress;
use crate::services::{GoalPlanningService, MealParsingService};

/// Either side of a tracker call can fail: the extraction or the store.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggedMeal {
    pub meal: MealLogRecord,
    pub progress: ProgressSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub date: NaiveDate,
    pub goal: Option<GoalRecord>,
    pub meals: Vec<MealLogRecord>,
    pub progress: ProgressSnapshot,
    pub latest_suggestion: Option<String>,
    pub burn_suggestion: Option<String>,
}

/// Per-user goal and daily meal log, kept in a [`Store`].
pub struct DayTracker {
    store: Arc<dyn Store>,
    planner: Arc<GoalPlanningService>,
    parser: Arc<MealParsingService>,
    timezone: Tz,
}

impl DayTracker {
    pub fn new(
        store: Arc<dyn Store>,
        planner: Arc<GoalPlanningService>,
        parser: Arc<MealParsingService>,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            planner,
            parser,
            timezone,
        }
    }

    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }

    async fn active_goal(&self, user_id: &str) -> Result<Option<GoalRecord>> {
        Ok(self.store.list_goals(user_id).await?.into_iter().next())
    }

    /// Plans and stores a new goal. A new goal starts the day over, so today's meal log is cleared.
    pub async fn set_goal(
        &self,
        user_id: &str,
        request: &GoalRequest,
    ) -> Result<GoalRecord, TrackerError> {
        let plan = self.planner.plan(request).await?;

        // Cleared first: a failed clear leaves the previous goal in charge of today's log.
        let cleared = self
            .store
            .clear_meal_logs(user_id, DayRange::for_date(self.timezone, self.today()))
            .await?;
        if cleared > 0 {
            log::info!("🧹 Cleared {} meal logs for {} before new goal", cleared, user_id);
        }

        let mut record = GoalRecord {
            id: None,
            user_id: user_id.to_string(),
            goal: request.goal_text(),
            current_weight: request.current_weight,
            target_weight: request.target_weight,
            daily_calorie_target: plan.daily_calorie_target,
            burn_suggestion: plan.activity_suggestion,
            created_at: Utc::now(),
        };
        record.id = Some(self.store.insert_goal(&record).await.map_err(|e| {
            log::error!(
                "❌ Goal insert failed for {} after today's log was cleared: {}",
                user_id,
                e
            );
            e
        })?);

        Ok(record)
    }

    /// Removes one goal. Meal logs are left alone.
    pub async fn delete_goal(&self, user_id: &str, id: i64) -> Result<bool> {
        let deleted = self.store.delete_goal(user_id, id).await?;
        if !deleted {
            log::warn!("⚠️ Goal {} not found for {}", id, user_id);
        }
        Ok(deleted)
    }

    pub async fn goals(&self, user_id: &str) -> Result<Vec<GoalRecord>> {
        self.store.list_goals(user_id).await
    }

    pub async fn log_meal(
        &self,
        user_id: &str,
        description: &str,
    ) -> Result<LoggedMeal, TrackerError> {
        let goal = self.active_goal(user_id).await?;
        let before = self.day_progress(user_id, goal.as_ref()).await?;
        let request = MealRequest {
            description: description.trim().to_string(),
            current_calories: before.daily_total,
            target_calories: before.target,
        };
        let parsed = self.parser.parse(&request).await?;

        let mut entry = MealLogRecord {
            id: None,
            user_id: user_id.to_string(),
            description: request.description,
            food_item: parsed.normalized_label.clone(),
            calories: parsed.estimated_calories,
            suggestion: parsed.suggestion.clone(),
            created_at: Utc::now(),
        };
        entry.id = Some(self.store.insert_meal_log(&entry).await?);

        // Other meals may have landed while the parse was in flight.
        let progress = self.day_progress(user_id, goal.as_ref()).await?;
        log::info!(
            "✅ Logged {} kcal for {} (today: {}/{} kcal, {})",
            entry.calories,
            user_id,
            progress.daily_total,
            progress.target,
            progress.status
        );

        Ok(LoggedMeal {
            meal: entry,
            progress,
        })
    }

    async fn day_progress(
        &self,
        user_id: &str,
        goal: Option<&GoalRecord>,
    ) -> Result<ProgressSnapshot> {
        let meals = self
            .store
            .list_meal_logs(user_id, DayRange::for_date(self.timezone, self.today()))
            .await?;
        let results: Vec<MealResult> = meals.iter().map(MealLogRecord::result).collect();
        Ok(progress::calculate(
            goal.map(GoalRecord::result).as_ref(),
            &results,
        ))
    }

    pub async fn dashboard(&self, user_id: &str, date: Option<NaiveDate>) -> Result<Dashboard> {
        let date = date.unwrap_or_else(|| self.today());
        let goal = self.active_goal(user_id).await?;
        let meals = self
            .store
            .list_meal_logs(user_id, DayRange::for_date(self.timezone, date))
            .await?;

        let results: Vec<MealResult> = meals.iter().map(MealLogRecord::result).collect();
        let progress = progress::calculate(goal.as_ref().map(|g| g.result()).as_ref(), &results);

        let latest_suggestion = meals
            .last()
            .map(|m| m.suggestion.clone())
            .filter(|s| !s.is_empty());
        let burn_suggestion = goal.as_ref().map(|g| g.burn_suggestion.clone());

        Ok(Dashboard {
            date,
            goal,
            meals,
            progress,
            latest_suggestion,
            burn_suggestion,
        })
    }

    pub async fn meals_on(&self, user_id: &str, date: NaiveDate) -> Result<Vec<MealLogRecord>> {
        self.store
            .list_meal_logs(user_id, DayRange::for_date(self.timezone, date))
            .await
    }

    pub async fn history(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<MealLogRecord>> {
        self.store
            .list_meal_logs(user_id, DayRange::between(self.timezone, from, to))
            .await
    }
}
