pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "goodday",
    about = "Good Day operator CLI",
    long_about = "Inspect configuration, apply migrations, and mint or check capability tokens.",
    after_help = "Examples:\n  goodday keygen\n  goodday sign --team T1 --user U1 --tz -5\n  goodday inspect https://goodday.example/report/7b2274..."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Generate a random 32-byte signing key (base64)")]
    Keygen,
    #[command(about = "Mint signed heatmap and report URLs for one viewer")]
    Sign {
        #[arg(long, help = "Slack team id")]
        team: String,
        #[arg(long, help = "Slack user id")]
        user: String,
        #[arg(long, allow_hyphen_values = true, help = "Viewer UTC offset in whole hours")]
        tz: i32,
        #[arg(long, help = "Link lifetime in days (defaults to signer.ttl_days)")]
        ttl_days: Option<u32>,
    },
    #[command(about = "Verify a capability token or image URL and print what it grants")]
    Inspect {
        #[arg(help = "Token, or a full heatmap/report URL")]
        token_or_url: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Migrate => commands::migrate::run(),
        Command::Keygen => commands::keygen::run(),
        Command::Sign { team, user, tz, ttl_days } => {
            commands::sign::run(&team, &user, tz, ttl_days)
        }
        Command::Inspect { token_or_url } => commands::inspect::run(&token_or_url),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
