use crate::models::{GoalResult, MealResult, ProgressSnapshot, ProgressStatus};

const ON_TRACK_LOW: f64 = 0.90;
const ON_TRACK_HIGH: f64 = 1.10;

/// Derives the day's progress from the active goal and the meal log.
/// Pure and total; a missing goal or a zero target yields a zero ratio.
pub fn calculate(goal: Option<&GoalResult>, meals: &[MealResult]) -> ProgressSnapshot {
    let target = goal.map(|g| g.daily_calorie_target).unwrap_or(0);
    let daily_total = meals
        .iter()
        .fold(0u32, |sum, meal| sum.saturating_add(meal.estimated_calories));

    let progress_ratio = if target > 0 {
        daily_total as f64 / target as f64
    } else {
        0.0
    };

    ProgressSnapshot {
        daily_total,
        target,
        progress_ratio,
        remaining: target.saturating_sub(daily_total),
        status: classify(progress_ratio),
        meals_count: meals.len(),
        bar_percent: (progress_ratio * 100.0).min(100.0),
    }
}

pub fn classify(ratio: f64) -> ProgressStatus {
    if ratio > ON_TRACK_HIGH {
        ProgressStatus::Over
    } else if ratio >= ON_TRACK_LOW {
        ProgressStatus::OnTrack
    } else {
        ProgressStatus::Under
    }
}
