use clap::Parser;
use quizcert::cli::{self, BaseUrlArgs, DatabaseArgs};
use quizcert::db::with_pool;
use quizcert::error::AppError;
use quizcert::password_reset::issue_reset;
use quizcert::telemetry::shutdown_telemetry;

/// Issues a one-hour password reset token for a user and prints the link.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    database: DatabaseArgs,

    #[command(flatten)]
    base_url: BaseUrlArgs,

    /// Email of the user to issue the token for
    #[arg(short, long)]
    email: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::init();
    let args = Args::parse();
    let base_url = args.base_url.base_url;
    let email = args.email;

    let result = with_pool(&args.database.database_url, |pool| async move {
        match issue_reset(&pool, &base_url, &email).await? {
            Some(issued) => {
                println!("Token:      {}", issued.token.token);
                println!("Expires at: {} (epoch ms)", issued.token.expires_at);
                println!("Reset link: {}", issued.link);
                Ok(())
            }
            None => Err(AppError::NotFound(format!("No user with email {}", email))),
        }
    })
    .await;

    shutdown_telemetry();
    Ok(result?)
}
