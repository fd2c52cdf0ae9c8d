mod api;
mod cli;
mod commands;
mod config;
mod error;
mod models;
mod ui;
mod upload;

use clap::Parser;
use cli::{App, Cli};
use colored::*;
use commands::DispatchOutcome;
use error::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --debug.
    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut app = match App::new(&cli) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            eprintln!("{} {}", "Error:".red(), e.to_string().red());
            return Err(e);
        },
    };

    // One-shot mode: run the trailing command and exit.
    if !cli.is_interactive() {
        return match app.run_command(&cli.command).await {
            Ok(_) => Ok(()),
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e.to_string().red());
                Err(e)
            },
        };
    }

    info!("Starting interactive shell with profile {}", app.session().profile);
    println!(
        "{}",
        "Interactive cloud shell. Type 'help' for commands, 'exit' to quit."
            .cyan()
            .bold()
    );

    loop {
        let tokens = match cli::prompt_command(&app.session().profile) {
            Ok(tokens) => tokens,
            Err(error::AppError::Dialoguer(e)) => {
                // Terminal closed or interrupted.
                info!("Prompt ended: {}", e);
                break;
            },
            Err(e) => {
                println!("{}", e.to_string().red());
                continue;
            },
        };
        if tokens.is_empty() {
            continue;
        }

        match app.run_command(&tokens).await {
            Ok(DispatchOutcome::Exit) => break,
            Ok(DispatchOutcome::Continue) => {},
            Err(e) => {
                error!("Command execution failed: {:?}", e);
                println!("{}", format!("💩 {}", e).red());
            },
        }
    }

    println!("{}", "Goodbye!".green());
    Ok(())
}
