use clap::{Parser, Subcommand};
use quizcert::cli::{self, DatabaseArgs};
use quizcert::db::with_pool;
use quizcert::report::{
    certificate_summary, format_percentage, list_certificates, quiz_overview,
    reset_token_statuses, threshold_label,
};
use quizcert::telemetry::shutdown_telemetry;

/// Read-only reports over the quiz database.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    database: DatabaseArgs,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Certificate counts by validity
    Summary,
    /// Every certificate next to its quiz score
    Certificates,
    /// Quizzes with their certificate counts
    Quizzes,
    /// Reset token state per user
    Tokens,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::init();
    let args = Args::parse();
    let json = args.json;
    let command = args.command;

    let result = with_pool(&args.database.database_url, |pool| async move {
        match command {
            Command::Summary => {
                let summary = certificate_summary(&pool).await?;
                if json {
                    print_json(&summary);
                } else {
                    println!("Certificates:          {}", summary.total);
                    println!("  valid:               {}", summary.valid);
                    println!("  below {}:           {}", threshold_label(), summary.below_threshold);
                    println!("  score mismatch:      {}", summary.mismatched);
                    println!("  missing quiz:        {}", summary.orphaned);
                    println!(
                        "Average percentage:    {}",
                        format_percentage(summary.average_percentage)
                    );
                }
            }
            Command::Certificates => {
                let certificates = list_certificates(&pool).await?;
                if json {
                    print_json(&certificates);
                } else {
                    for c in &certificates {
                        println!(
                            "{:>5}  {:<36}  {:<30}  percentage {:>7}  score {:>7}  quiz {:>7}",
                            c.id,
                            c.certificate_id,
                            c.quiz_title,
                            format_percentage(c.percentage),
                            format_percentage(c.score),
                            format_percentage(c.quiz_score)
                        );
                    }
                    println!("{} certificates", certificates.len());
                }
            }
            Command::Quizzes => {
                let quizzes = quiz_overview(&pool).await?;
                if json {
                    print_json(&quizzes);
                } else {
                    for q in &quizzes {
                        println!(
                            "{:>5}  {:<30}  score {:>7}  questions {:>3}  certificates {}",
                            q.id,
                            q.title,
                            format_percentage(q.score),
                            q.total_questions,
                            q.certificate_count
                        );
                    }
                }
            }
            Command::Tokens => {
                let statuses = reset_token_statuses(&pool).await?;
                if json {
                    print_json(&statuses);
                } else {
                    for s in &statuses {
                        let state = match (s.has_token, s.expired) {
                            (false, _) => "none".to_string(),
                            (true, true) => "expired".to_string(),
                            (true, false) => format!("active until {}", s.expires_at.unwrap_or_default()),
                        };
                        println!("{:>5}  {:<30}  {:<30}  {}", s.id, s.name, s.email, state);
                    }
                }
            }
        }
        Ok(())
    })
    .await;

    shutdown_telemetry();
    Ok(result?)
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(err) => eprintln!("Failed to serialize output: {}", err),
    }
}
