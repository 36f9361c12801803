pub mod completion; // OpenAI-compatible gateway client
pub mod database;
pub mod goal_planner;
pub mod meal_parser;
pub mod progress;
pub mod prompts;
pub mod validator; // Tool-call payload checks

pub use completion::{CompletionClient, GatewayClient};
pub use database::{Database, MemoryStore, Store};
pub use goal_planner::GoalPlanningService;
pub use meal_parser::MealParsingService;
