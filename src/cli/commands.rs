use super::prompt::DialoguerPrompt;
use crate::api::HttpApiInvoker;
use crate::commands::{DispatchOutcome, Dispatcher, Registry, RegistryBuilder};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::ui::SpinnerController;
use crate::upload::UploadClient;
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Interactive shell for a cloud management API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Server profile to use
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Management API endpoint
    #[arg(short, long)]
    pub url: Option<String>,

    /// Output format (json, text)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Cached listApis response used to discover APIs
    #[arg(long)]
    pub api_cache: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Command to run once instead of starting the shell
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// True when no one-shot command was given.
    pub fn is_interactive(&self) -> bool {
        self.command.is_empty()
    }
}

/// CLI application state shared by every request.
pub struct App {
    registry: Registry,
    invoker: HttpApiInvoker,
    spinners: SpinnerController,
    uploads: UploadClient,
    session: SessionConfig,
}

impl App {
    /// Builds the session from the environment and command-line overrides,
    /// then loads the command registry.
    pub fn new(cli: &Cli) -> Result<Self> {
        let mut session = SessionConfig::from_env()?;
        if let Some(profile) = &cli.profile {
            session.profile = profile.clone();
        }
        if let Some(url) = &cli.url {
            session.url = url.clone();
        }
        if let Some(output) = &cli.output {
            session.output = output.parse()?;
        }
        session.interactive = cli.is_interactive();

        let mut builder = RegistryBuilder::new().with_builtins(&session.profiles);
        if let Some(path) = &cli.api_cache {
            builder.load_api_cache(path)?;
        }
        let registry = builder.build();
        info!(
            "Registry ready: {} commands, {} APIs",
            registry.len(),
            registry.api_count()
        );

        Ok(Self {
            invoker: HttpApiInvoker::new(session.url.clone(), session.api_key.clone()),
            spinners: SpinnerController::new(session.interactive),
            uploads: UploadClient::new()?,
            registry,
            session,
        })
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// Runs one tokenised command line. Ctrl-C cancels the request in flight.
    pub async fn run_command(&mut self, tokens: &[String]) -> Result<DispatchOutcome> {
        debug!("Dispatching {:?}", tokens);
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            }
        });

        let prompt = DialoguerPrompt;
        let dispatcher = Dispatcher::new(
            &self.registry,
            &self.invoker,
            &self.spinners,
            &self.uploads,
            &prompt,
        );
        let outcome = dispatcher.dispatch(&mut self.session, tokens, &cancel).await;
        watcher.abort();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_tokens_make_one_shot_command() {
        let cli = Cli::parse_from(["stack-shell", "-o", "text", "list", "zones", "filter=name"]);
        assert_eq!(cli.output.as_deref(), Some("text"));
        assert_eq!(cli.command, vec!["list", "zones", "filter=name"]);
        assert!(!cli.is_interactive());
    }

    #[test]
    fn test_help_flag_after_command_is_passed_through() {
        let cli = Cli::parse_from(["stack-shell", "listZones", "-h"]);
        assert_eq!(cli.command, vec!["listZones", "-h"]);
    }

    #[test]
    fn test_no_command_is_interactive() {
        let cli = Cli::parse_from(["stack-shell", "--debug"]);
        assert!(cli.debug);
        assert!(cli.is_interactive());
    }
}
