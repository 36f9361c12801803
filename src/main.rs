mod api; // HTTP routes
mod config;
mod error;
mod handlers;
mod models;
mod services;

use anyhow::{Context, Result};
use dotenv::dotenv;
use std::sync::Arc;

use api::server::{create_router, AppState};
use config::AppConfig;
use handlers::DayTracker;
use services::{
    CompletionClient, Database, GatewayClient, GoalPlanningService, MealParsingService,
    MemoryStore, Store,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init();

    log::info!("🚀 Starting calorie planner...");

    let config = AppConfig::from_env()?;

    let gateway = GatewayClient::new(
        config.api_key.clone(),
        config.model.clone(),
        config.gateway_url.clone(),
        config.completion_timeout,
    )?;
    if config.api_key.is_none() {
        log::warn!("⚠️ AI_GATEWAY_API_KEY not set, extraction calls will fail until it is configured");
    }
    log::info!("✅ AI gateway client initialized with model: {}", gateway.model());
    let client: Arc<dyn CompletionClient> = Arc::new(gateway);

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let db = Database::new(url).await?;
            log::info!("✅ PostgreSQL database initialized");
            Arc::new(db)
        }
        None => {
            log::warn!("⚠️ DATABASE_URL not set, using in-memory store (data is lost on restart)");
            Arc::new(MemoryStore::new())
        }
    };

    let goal_planner = Arc::new(GoalPlanningService::new(client.clone()));
    let meal_parser = Arc::new(MealParsingService::new(client));
    let tracker = Arc::new(DayTracker::new(
        store,
        goal_planner.clone(),
        meal_parser.clone(),
        config.timezone,
    ));
    log::info!("✅ Day tracker initialized (timezone: {})", config.timezone);

    let app = create_router(AppState {
        goal_planner,
        meal_parser,
        tracker,
    });

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    log::info!("🌐 HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            log::info!("🛑 Shutting down...");
        })
        .await?;

    Ok(())
}
