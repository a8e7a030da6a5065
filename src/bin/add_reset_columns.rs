use clap::Parser;
use quizcert::cli::{self, DatabaseArgs};
use quizcert::database::{ColumnOutcome, add_reset_columns};
use quizcert::db::with_pool;
use quizcert::telemetry::shutdown_telemetry;

/// Adds the `reset_token` and `reset_token_expiry` columns to `users`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    database: DatabaseArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::init();
    let args = Args::parse();

    let result = with_pool(&args.database.database_url, |pool| async move {
        let report = add_reset_columns(&pool).await?;

        for (column, outcome) in &report.columns {
            match outcome {
                ColumnOutcome::Added => println!("Added column {}", column),
                ColumnOutcome::AlreadyExists => println!("Column {} already exists", column),
            }
        }
        Ok(())
    })
    .await;

    shutdown_telemetry();
    Ok(result?)
}
