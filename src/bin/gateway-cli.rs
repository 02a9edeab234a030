use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for the racing data session gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3001")]
    url: String,

    /// Provider account email.
    #[arg(long)]
    username: Option<String>,

    /// Provider account password.
    #[arg(long, env = "GATEWAY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway liveness
    Health,
    /// Log in and list the account's recent races
    RecentRaces,
    /// Log in and fetch the result of one subsession
    Race {
        /// Numeric subsession id
        subsession_id: String,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder().cookie_store(true).build()?;
    let base = cli.url.trim_end_matches('/');

    let ok = match &cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            print_response(res).await?
        }
        Commands::RecentRaces => {
            login(&client, base, &cli).await? && {
                let res = client.get(format!("{}/api/recent-races", base)).send().await?;
                print_response(res).await?
            }
        }
        Commands::Race { subsession_id } => {
            login(&client, base, &cli).await? && {
                let res = client
                    .get(format!("{}/api/race/{}", base, subsession_id))
                    .send()
                    .await?;
                print_response(res).await?
            }
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Authenticate the cookie-carrying client. Returns false after printing the
/// gateway's error when the login is refused.
async fn login(
    client: &reqwest::Client,
    base: &str,
    cli: &Cli,
) -> Result<bool, Box<dyn std::error::Error>> {
    let (Some(username), Some(password)) = (&cli.username, &cli.password) else {
        eprintln!("Error: --username and --password (or GATEWAY_PASSWORD) are required");
        return Ok(false);
    };

    let res = client
        .post(format!("{}/api/login", base))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;

    if !res.status().is_success() {
        print_response(res).await?;
        return Ok(false);
    }
    Ok(true)
}

/// Print the body; returns whether the gateway answered with success.
async fn print_response(res: reqwest::Response) -> Result<bool, Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(false);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(true)
}
