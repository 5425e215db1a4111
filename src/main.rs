//! Operator entry point: prepares the database and prints instructor statistics.
//!
//! Usage: `course-market [instructor_id]`

use course_market::config::{database, market};
use course_market::core::report::{compute_instructor_statistics, format_statistics_summary};
use course_market::errors::Result;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH_VAR: &str = "MARKET_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "market.toml";

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since variables can be set externally
    dotenv().ok();

    // 3. Load marketplace configuration
    let config_path =
        std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = market::load_config_or_default(&config_path)
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Print statistics when an instructor id is given
    if let Some(instructor_id) = std::env::args().nth(1) {
        let report =
            compute_instructor_statistics(&db, &instructor_id, &config.statistics).await?;
        println!(
            "{}",
            format_statistics_summary(&report, &config.purchases.currency)?
        );
    } else {
        info!("No instructor id given, nothing to report.");
    }

    Ok(())
}
