pub mod commands;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "mercabot",
    about = "Mercabot assistant CLI",
    long_about = "Run an interactive chat session, classify single utterances, or inspect the effective configuration.",
    after_help = "Examples:\n  mercabot chat\n  mercabot chat --user u-42\n  mercabot classify \"busco mochilas rojas\"\n  mercabot config"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Start an interactive chat session against the demo catalog")]
    Chat {
        #[arg(long, help = "Act as an authenticated user with this id")]
        user: Option<String>,
    },
    #[command(about = "Classify one utterance through the guardrail tier and print the result")]
    Classify {
        #[arg(help = "The utterance to classify")]
        text: String,
    },
    #[command(about = "Inspect effective configuration values with secrets redacted")]
    Config,
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Chat { user } => commands::chat::run(user.as_deref()).await,
        Command::Classify { text } => commands::classify::run(&text),
        Command::Config => commands::config::run(),
    };

    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    ExitCode::from(result.exit_code)
}
