use clap::Parser;
use quizcert::certificates::plan_repair;
use quizcert::cli::{self, DatabaseArgs};
use quizcert::database::install_certificate_constraints;
use quizcert::db::with_pool;
use quizcert::error::AppError;
use quizcert::telemetry::shutdown_telemetry;

/// Installs triggers that keep certificates in line with their quiz score and
/// reject certificates below the passing threshold.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Install even if existing rows still need repair
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::init();
    let args = Args::parse();
    let force = args.force;

    let result = with_pool(&args.database.database_url, |pool| async move {
        let plan = plan_repair(&pool).await?;
        if !plan.is_empty() && !force {
            return Err(AppError::Validation(
                "certificates need repair first, run fix_certificates or pass --force".to_string(),
            ));
        }

        let report = install_certificate_constraints(&pool).await?;
        for name in &report.created {
            println!("Created trigger {}", name);
        }
        for name in &report.already_present {
            println!("Trigger {} already exists", name);
        }
        Ok(())
    })
    .await;

    shutdown_telemetry();
    Ok(result?)
}
