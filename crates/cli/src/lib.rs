pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "liftline",
    about = "Liftline operator CLI",
    long_about = "Ask the meet-results agent network questions and inspect runtime readiness.",
    after_help = "Examples:\n  liftline ask \"Who had the biggest deadlift in 2024?\"\n  liftline config\n  liftline doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Ask the agent network one question and print the answer")]
    Ask {
        #[arg(help = "The question to ask")]
        question: String,
        #[arg(long, help = "Conversation thread id; a fresh one is generated when omitted")]
        thread: Option<String>,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, LLM key presence, and store/history connectivity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Ask { question, thread } => commands::ask::run(&question, thread),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
