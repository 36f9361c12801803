use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalDirection {
    Gain,
    Lose,
    Maintain,
}

impl std::fmt::Display for GoalDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GoalDirection::Gain => "Gain",
            GoalDirection::Lose => "Lose",
            GoalDirection::Maintain => "Maintain",
        };
        write!(f, "{}", s)
    }
}

impl GoalDirection {
    /// Direction implied by moving from `current` to `target` kilograms.
    pub fn from_weights(current: f64, target: f64) -> Self {
        if target < current {
            GoalDirection::Lose
        } else if target > current {
            GoalDirection::Gain
        } else {
            GoalDirection::Maintain
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "gain" => Some(GoalDirection::Gain),
            "lose" | "loss" => Some(GoalDirection::Lose),
            "maintain" => Some(GoalDirection::Maintain),
            _ => None,
        }
    }

    /// Phrase used in the planning prompt.
    pub fn prompt_text(&self) -> &'static str {
        match self {
            GoalDirection::Gain => "Weight Gain",
            GoalDirection::Lose => "Weight Loss",
            GoalDirection::Maintain => "Maintenance",
        }
    }
}

/// A weight-change intent. Weights are kilograms.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalRequest {
    pub current_weight: f64,
    pub target_weight: f64,
    pub direction: GoalDirection,
    /// Free-text goal as the user phrased it; `None` falls back to [`GoalRequest::label`].
    pub goal_text: Option<String>,
}

impl GoalRequest {
    pub fn new(current_weight: f64, target_weight: f64) -> Self {
        Self {
            current_weight,
            target_weight,
            direction: GoalDirection::from_weights(current_weight, target_weight),
            goal_text: None,
        }
    }

    pub fn weight_difference(&self) -> f64 {
        (self.target_weight - self.current_weight).abs()
    }

    /// e.g. "Lose 5 kg"
    pub fn label(&self) -> String {
        format!("{} {} kg", self.direction, self.weight_difference())
    }

    pub fn goal_text(&self) -> String {
        self.goal_text.clone().unwrap_or_else(|| self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalResult {
    pub daily_calorie_target: u32,
    #[serde(rename = "burnSuggestion")]
    pub activity_suggestion: String,
}

/// One free-text meal entry plus the running day context it is logged against.
#[derive(Debug, Clone, PartialEq)]
pub struct MealRequest {
    pub description: String,
    pub current_calories: u32,
    pub target_calories: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealResult {
    #[serde(rename = "foodItem")]
    pub normalized_label: String,
    pub estimated_calories: u32,
    #[serde(rename = "completionSuggestion")]
    pub suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    OnTrack,
    Over,
    Under,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProgressStatus::OnTrack => "on-track",
            ProgressStatus::Over => "over",
            ProgressStatus::Under => "under",
        };
        write!(f, "{}", s)
    }
}

/// Derived display state; always recomputed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub daily_total: u32,
    pub target: u32,
    pub progress_ratio: f64,
    pub remaining: u32,
    pub status: ProgressStatus,
    pub meals_count: usize,
    pub bar_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalRecord {
    pub id: Option<i64>,
    pub user_id: String,
    pub goal: String,
    pub current_weight: f64,
    pub target_weight: f64,
    pub daily_calorie_target: u32,
    pub burn_suggestion: String,
    pub created_at: DateTime<Utc>,
}

impl GoalRecord {
    pub fn result(&self) -> GoalResult {
        GoalResult {
            daily_calorie_target: self.daily_calorie_target,
            activity_suggestion: self.burn_suggestion.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLogRecord {
    pub id: Option<i64>,
    pub user_id: String,
    pub description: String,
    pub food_item: String,
    pub calories: u32,
    pub suggestion: String,
    pub created_at: DateTime<Utc>,
}

impl MealLogRecord {
    pub fn result(&self) -> MealResult {
        MealResult {
            normalized_label: self.food_item.clone(),
            estimated_calories: self.calories,
            suggestion: self.suggestion.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_weights() {
        assert_eq!(GoalDirection::from_weights(80.0, 75.0), GoalDirection::Lose);
        assert_eq!(GoalDirection::from_weights(60.0, 65.0), GoalDirection::Gain);
        assert_eq!(GoalDirection::from_weights(70.0, 70.0), GoalDirection::Maintain);
    }

    #[test]
    fn test_direction_from_string() {
        assert_eq!(GoalDirection::from_string("Lose"), Some(GoalDirection::Lose));
        assert_eq!(GoalDirection::from_string(" gain "), Some(GoalDirection::Gain));
        assert_eq!(GoalDirection::from_string("bulk"), None);
    }

    #[test]
    fn test_goal_label() {
        let request = GoalRequest::new(80.0, 75.0);
        assert_eq!(request.label(), "Lose 5 kg");
        assert_eq!(request.goal_text(), "Lose 5 kg");

        let request = GoalRequest::new(60.0, 62.5);
        assert_eq!(request.label(), "Gain 2.5 kg");
    }

    #[test]
    fn test_meal_result_wire_names() {
        let result = MealResult {
            normalized_label: "2 Rotis with Dal".to_string(),
            estimated_calories: 350,
            suggestion: "Add curd".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["foodItem"], "2 Rotis with Dal");
        assert_eq!(json["estimatedCalories"], 350);
        assert_eq!(json["completionSuggestion"], "Add curd");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ProgressStatus::OnTrack).unwrap();
        assert_eq!(json, "\"on-track\"");
        assert_eq!(ProgressStatus::Over.to_string(), "over");
    }
}
