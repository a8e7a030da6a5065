use clap::Args;

use crate::env::{DEFAULT_BASE_URL, DEFAULT_DATABASE_URL, load_environment};

#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// SQLite connection string, e.g. `sqlite:quiz.db`
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,
}

#[derive(Args, Debug, Clone)]
pub struct BaseUrlArgs {
    /// Origin of the web application
    #[arg(long, env = "BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

/// Installs tracing and loads the env files. Call before parsing arguments so
/// the file values feed the `env` fallbacks.
pub fn init() {
    crate::telemetry::init_tracing();
    if let Err(err) = load_environment() {
        tracing::warn!(error = %err, "Failed to load environment files");
    }
}
