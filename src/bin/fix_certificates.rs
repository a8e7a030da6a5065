use clap::Parser;
use quizcert::certificates::{RepairPlan, plan_repair, repair_certificates};
use quizcert::cli::{self, DatabaseArgs};
use quizcert::db::with_pool;
use quizcert::report::format_percentage;
use quizcert::telemetry::shutdown_telemetry;

/// Deletes certificates below the passing threshold and copies each quiz
/// score into its certificates.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Print what would change without touching the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::init();
    let args = Args::parse();

    let result = if args.dry_run {
        with_pool(&args.database.database_url, |pool| async move {
            let plan = plan_repair(&pool).await?;
            print_plan(&plan);
            Ok(())
        })
        .await
    } else {
        with_pool(&args.database.database_url, |pool| async move {
            let report = repair_certificates(&pool).await?;

            println!(
                "Deleted {} certificates below the passing threshold",
                report.deleted_below_threshold
            );
            if report.deleted_failing_quiz > 0 {
                println!(
                    "Deleted {} certificates whose quiz score is below the threshold",
                    report.deleted_failing_quiz
                );
            }
            println!("Corrected {} certificates", report.corrected);
            println!("{} certificates remaining", report.remaining);

            if report.total_changes() == 0 {
                println!("Nothing to fix ✓");
            }
            Ok(())
        })
        .await
    };

    shutdown_telemetry();
    Ok(result?)
}

fn print_plan(plan: &RepairPlan) {
    if plan.is_empty() {
        println!("Nothing to fix ✓");
    }

    for certificate in &plan.to_delete {
        println!(
            "    Delete {} ({}): percentage {}",
            certificate.certificate_id,
            certificate.quiz_title,
            format_percentage(certificate.percentage)
        );
    }

    for certificate in &plan.to_delete_failing_quiz {
        println!(
            "    Delete {} ({}): quiz score {} is below the threshold",
            certificate.certificate_id,
            certificate.quiz_title,
            format_percentage(certificate.quiz_score)
        );
    }

    for correction in &plan.to_correct {
        println!(
            "    Fix {} ({}): percentage {} / score {} -> {}",
            correction.certificate.certificate_id,
            correction.certificate.quiz_title,
            format_percentage(correction.certificate.percentage),
            format_percentage(correction.certificate.score),
            format_percentage(Some(correction.target))
        );
    }

    for certificate in &plan.orphaned {
        println!(
            "    Keep {}: quiz {:?} does not exist, percentage is authoritative",
            certificate.certificate_id, certificate.quiz_id
        );
    }
}
