#[macro_use]
extern crate rocket;

use quizcert::database::add_reset_columns;
use quizcert::db::{open_database, run_migrations};
use quizcert::env::{Settings, load_environment};
use quizcert::init_rocket;
use quizcert::telemetry::init_tracing;
use rocket::{Build, Rocket};
use tracing::{error, info};

#[launch]
async fn rocket() -> Rocket<Build> {
    init_tracing();
    if let Err(err) = load_environment() {
        error!("Failed to load environment files: {}", err);
    }

    let settings = Settings::from_env();

    let pool = match open_database(&settings.database_url).await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to connect to SQLite database: {}", e),
    };

    info!("Running database migrations...");
    if let Err(e) = run_migrations(&pool).await {
        error!("Failed to run migrations: {}", e);
        panic!("Database migration failed: {}", e);
    }

    match add_reset_columns(&pool).await {
        Ok(report) => info!(added = report.added(), "Reset columns checked"),
        Err(e) => panic!("Failed to add reset columns: {}", e),
    }

    init_rocket(pool, settings)
}
