use quizcert::cli;
use quizcert::error::AppError;
use quizcert::smoke::smoke_rocket;
use quizcert::telemetry::shutdown_telemetry;

/// Serves only `GET /api/test`, for checking that the web stack starts.
#[rocket::main]
async fn main() -> anyhow::Result<()> {
    cli::init();

    let result = smoke_rocket().launch().await.map_err(AppError::from);

    shutdown_telemetry();
    result?;
    Ok(())
}
