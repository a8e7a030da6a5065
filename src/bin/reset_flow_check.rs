use clap::Parser;
use quizcert::cli::{self, BaseUrlArgs};
use quizcert::client::ApiClient;
use quizcert::reset_flow::run_reset_flow;
use quizcert::telemetry::shutdown_telemetry;

/// Requests a reset link from a running server and uses it to set a new
/// password.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    base_url: BaseUrlArgs,

    #[arg(short, long)]
    email: String,

    #[arg(long, default_value = "newpassword123")]
    new_password: String,
}

#[tokio::main]
async fn main() {
    cli::init();
    let args = Args::parse();

    let outcome = match ApiClient::new(&args.base_url.base_url) {
        Ok(client) => run_reset_flow(&client, &args.email, &args.new_password).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(report) => {
            println!("Reset link: {}", report.reset_link);
            println!("Token:      {}", report.token);
            println!("Password reset for {} ✓", report.email);
        }
        Err(err) => {
            eprintln!("Reset flow failed: {}", err);
            shutdown_telemetry();
            std::process::exit(1);
        }
    }

    shutdown_telemetry();
}
