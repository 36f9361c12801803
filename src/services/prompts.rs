use crate::models::{GoalRequest, MealRequest};

/// A rendered system/user message pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const GOAL_SYSTEM_PROMPT: &str = "You are a specialized Indian Nutrition Planner and Fitness Coach. \
Your task is to calculate a daily calorie target based on the user's weight goals.

CALCULATION RULES:
1. Baseline intake for an average adult: 2000 kcal/day
2. Losing 1 kg of body weight needs a deficit of about 7700 kcal
3. Safe weight loss: 0.5-1 kg per week
4. Safe weight gain: about 0.5 kg per week

CALORIE BANDS (by absolute weight difference):
- Weight loss, starting from the 2000 kcal baseline:
  * 1-3 kg: 1600-1800 kcal/day
  * 3-7 kg: 1400-1600 kcal/day
  * 7 kg or more: 1300-1500 kcal/day
- Weight gain, starting from the 2000 kcal baseline:
  * 1-3 kg: 2300-2500 kcal/day
  * 3-7 kg: 2500-2700 kcal/day
  * 7 kg or more: 2700-3000 kcal/day
- Maintenance: stay close to the 2000 kcal baseline.

Pick one value inside the applicable band.
Provide culturally appropriate fitness suggestions (yoga, walking, cricket, home exercises, etc.).";

const MEAL_SYSTEM_PROMPT: &str = "You are an expert in parsing natural language descriptions of \
Indian meals and estimating their calorie count. You must handle variations like 'extra roti', \
'less oil', 'small bowl', 'large serving' etc.

Be accurate for common Indian dishes:
- Dal, Sabzi (vegetables), Rice, Roti/Chapati, Paratha
- Poha, Idli, Dosa, Upma
- Chicken Curry, Fish Curry, Paneer dishes
- Samosa, Pakora, Namkeen
- Chai, Lassi, Juice, Shakes
- Sweets: Gulab Jamun, Jalebi, Barfi

Consider:
- Portion sizes (small/medium/large, number of pieces)
- Cooking methods (fried, steamed, less oil)
- Accompaniments (ghee, butter, oil quantity)

Provide realistic calorie estimates based on typical Indian portion sizes.";

pub fn build_goal_prompt(request: &GoalRequest) -> Prompt {
    let user = format!(
        "Goal: {}\n\
         Current Weight: {} kg\n\
         Target Weight: {} kg\n\
         Weight Difference: {:.1} kg\n\
         Direction: {}\n\
         \n\
         Calculate the appropriate daily calorie target based on the weight difference and provide fitness suggestions.",
        request.goal_text(),
        request.current_weight,
        request.target_weight,
        request.weight_difference(),
        request.direction.prompt_text(),
    );

    Prompt {
        system: GOAL_SYSTEM_PROMPT.to_string(),
        user,
    }
}

pub fn build_meal_prompt(request: &MealRequest) -> Prompt {
    let user = format!(
        "Meal Description: \"{}\"\n\
         Current day's calories: {} kcal\n\
         Daily target: {} kcal\n\
         \n\
         Parse this meal and estimate calories. If the user is under target, provide a brief \
         encouraging suggestion (max 15 words) on what they could add to reach their goal. \
         Otherwise give a short acknowledgement (max 15 words) that the target is met or exceeded.",
        request.description, request.current_calories, request.target_calories,
    );

    Prompt {
        system: MEAL_SYSTEM_PROMPT.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GoalDirection;

    #[test]
    fn test_goal_prompt_interpolation() {
        let request = GoalRequest::new(82.0, 75.0);
        let prompt = build_goal_prompt(&request);

        assert!(prompt.user.contains("Goal: Lose 7 kg"));
        assert!(prompt.user.contains("Current Weight: 82 kg"));
        assert!(prompt.user.contains("Target Weight: 75 kg"));
        assert!(prompt.user.contains("Weight Difference: 7.0 kg"));
        assert!(prompt.user.contains("Direction: Weight Loss"));
        assert!(prompt.system.contains("2000 kcal"));
        assert!(prompt.system.contains("1300-1500"));
        assert!(prompt.system.contains("2700-3000"));
    }

    #[test]
    fn test_goal_prompt_uses_caller_text_verbatim() {
        let mut request = GoalRequest::new(60.0, 63.0);
        request.goal_text = Some("Gain 3 kg before the wedding".to_string());
        let prompt = build_goal_prompt(&request);

        assert!(prompt.user.contains("Goal: Gain 3 kg before the wedding"));
        assert!(prompt.user.contains("Direction: Weight Gain"));
    }

    #[test]
    fn test_maintain_direction_text() {
        let request = GoalRequest::new(70.0, 70.0);
        assert_eq!(request.direction, GoalDirection::Maintain);
        let prompt = build_goal_prompt(&request);
        assert!(prompt.user.contains("Direction: Maintenance"));
    }

    #[test]
    fn test_meal_prompt_interpolation() {
        let request = MealRequest {
            description: "2 rotis with dal".to_string(),
            current_calories: 600,
            target_calories: 2000,
        };
        let prompt = build_meal_prompt(&request);

        assert!(prompt.user.contains("Meal Description: \"2 rotis with dal\""));
        assert!(prompt.user.contains("Current day's calories: 600 kcal"));
        assert!(prompt.user.contains("Daily target: 2000 kcal"));
        assert!(prompt.system.contains("ghee"));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let request = MealRequest {
            description: "1 extra roti with palak paneer".to_string(),
            current_calories: 1200,
            target_calories: 1800,
        };
        assert_eq!(build_meal_prompt(&request), build_meal_prompt(&request));

        let goal = GoalRequest::new(90.0, 80.0);
        assert_eq!(build_goal_prompt(&goal), build_goal_prompt(&goal));
    }
}
