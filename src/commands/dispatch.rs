//! Dispatches typed commands: resolution, argument checks, API invocation and the
//! follow-up upload flow for upload-credential responses.

use super::registry::{Command, Handler, Registry};
use super::resolver::{missing_required_args, resolve, Resolution};
use crate::api::{ApiInvoker, InvokeError};
use crate::config::{split_list, SessionConfig};
use crate::error::{AppError, Result};
use crate::models::{Response, UploadParams};
use crate::ui::{render_response, SpinnerController};
use crate::upload::{UploadClient, UploadOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// APIs whose responses carry upload credentials, lower-cased.
pub const UPLOAD_APIS: [&str; 3] = [
    "getuploadparamsforiso",
    "getuploadparamsforvolume",
    "getuploadparamsfortemplate",
];

/// Whether `api` returns upload credentials.
pub fn is_upload_api(api: &str) -> bool {
    let api = api.to_lowercase();
    UPLOAD_APIS.contains(&api.as_str())
}

/// Values of every `<prefix>a,b` token, comma split and trimmed.
pub fn extract_hints(args: &[String], prefix: &str) -> Vec<String> {
    args.iter()
        .filter_map(|arg| arg.strip_prefix(prefix))
        .flat_map(split_list)
        .collect()
}

/// Reads the comma separated file list for an upload.
pub trait PathPrompt {
    fn read_paths(&self) -> Result<String>;
}

/// What the shell loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Continue,
    Exit,
}

/// A resolved command with its arguments and the session it runs in.
pub struct Request<'a> {
    pub command: &'a Command,
    pub args: Vec<String>,
    pub session: &'a mut SessionConfig,
}

/// Routes typed tokens to built-in handlers or the API invoker.
pub struct Dispatcher<'a, I: ApiInvoker> {
    registry: &'a Registry,
    invoker: &'a I,
    spinners: &'a SpinnerController,
    uploads: &'a UploadClient,
    prompt: &'a dyn PathPrompt,
}

impl<'a, I: ApiInvoker> Dispatcher<'a, I> {
    pub fn new(
        registry: &'a Registry,
        invoker: &'a I,
        spinners: &'a SpinnerController,
        uploads: &'a UploadClient,
        prompt: &'a dyn PathPrompt,
    ) -> Self {
        Self {
            registry,
            invoker,
            spinners,
            uploads,
            prompt,
        }
    }

    /// Runs one command line.
    ///
    /// Cancellation is swallowed here; every other error is returned for the
    /// caller to report.
    pub async fn dispatch(
        &self,
        session: &mut SessionConfig,
        tokens: &[String],
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        match self.dispatch_inner(session, tokens, cancel).await {
            Err(e) if e.is_silent() => {
                debug!("Request cancelled");
                Ok(DispatchOutcome::Continue)
            },
            other => other,
        }
    }

    async fn dispatch_inner(
        &self,
        session: &mut SessionConfig,
        tokens: &[String],
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        let (command, args) = match resolve(self.registry, tokens)? {
            Resolution::Help { name } => {
                self.show_help(&name)?;
                return Ok(DispatchOutcome::Continue);
            },
            Resolution::Dispatch { command, args } => (command, args),
        };
        let request = Request {
            command,
            args,
            session,
        };

        match command.handler {
            Handler::Api => self.run_api(request, cancel).await?,
            Handler::ApiRunner => self.run_api_runner(request, cancel).await?,
            Handler::Help => self.run_help(&request)?,
            Handler::Switch => self.run_switch(request)?,
            Handler::Exit => return Ok(DispatchOutcome::Exit),
        }
        Ok(DispatchOutcome::Continue)
    }

    /// `api <name> ...`: the following tokens must resolve to a remote API.
    async fn run_api_runner(&self, request: Request<'_>, cancel: &CancellationToken) -> Result<()> {
        match resolve(self.registry, &request.args)? {
            Resolution::Help { name } => self.show_help(&name),
            Resolution::Dispatch { command, args } if command.handler == Handler::Api => {
                let inner = Request {
                    command,
                    args,
                    session: request.session,
                };
                self.run_api(inner, cancel).await
            },
            Resolution::Dispatch { command, .. } => {
                Err(AppError::UnknownCommand(command.name.clone()))
            },
        }
    }

    async fn run_api(&self, request: Request<'_>, cancel: &CancellationToken) -> Result<()> {
        let api = request.command;
        let missing = missing_required_args(api, &request.args);
        if !missing.is_empty() {
            return Err(AppError::MissingRequiredArgs(missing));
        }

        let spinner = self.spinners.start(&format!("Calling {}...", api.name))?;
        let result = self
            .invoker
            .invoke(&api.name, &request.args, api.is_async, cancel)
            .await;
        self.spinners.stop(&spinner);

        let response = match result {
            Ok(response) => response,
            Err(InvokeError { error, partial }) => {
                if error.is_silent() {
                    return Err(error);
                }
                if let Some(partial) = partial {
                    render_response(request.session.output, &partial, &[], &[])?;
                }
                return Err(error);
            },
        };

        if !response.is_empty() {
            self.route_response(&request, &response, cancel).await?;
        }
        Ok(())
    }

    /// Prints a successful response and starts the upload flow for
    /// upload-credential APIs in interactive sessions.
    async fn route_response(
        &self,
        request: &Request<'_>,
        response: &Response,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let filter = extract_hints(&request.args, "filter=");
        let exclude = extract_hints(&request.args, "exclude=");
        render_response(request.session.output, response, &filter, &exclude)?;

        let api = request.command.name.to_lowercase();
        if !request.session.interactive || !is_upload_api(&api) {
            return Ok(());
        }

        let params = UploadParams::from_response(response)?;
        let input = self.prompt.read_paths()?;
        info!("Starting upload flow for {}", api);
        UploadOrchestrator::new(self.uploads, self.spinners)
            .run(&api, &params, &input, cancel)
            .await?;
        Ok(())
    }

    fn run_help(&self, request: &Request<'_>) -> Result<()> {
        if request.args.is_empty() {
            println!("Available commands and APIs:");
            for name in self.registry.names() {
                println!("  {}", name);
            }
            return Ok(());
        }
        match resolve(self.registry, &request.args)? {
            Resolution::Help { name } => self.show_help(&name),
            Resolution::Dispatch { command, .. } => {
                println!("{}", render_help(command));
                Ok(())
            },
        }
    }

    fn show_help(&self, name: &str) -> Result<()> {
        let command = self
            .registry
            .get(name)
            .ok_or_else(|| AppError::UnknownCommand(name.to_string()))?;
        println!("{}", render_help(command));
        Ok(())
    }

    fn run_switch(&self, request: Request<'_>) -> Result<()> {
        let command = request.command;
        let Some(sub_command) = request.args.first() else {
            let subs: Vec<&str> = command.sub_commands.keys().map(String::as_str).collect();
            println!(
                "Please provide one of the sub-commands: {}",
                subs.join(", ")
            );
            return Ok(());
        };
        let value = request.args[1..].join(" ").trim().to_string();
        debug!("Switch command received: {} value: {}", sub_command, value);

        let valid = command.sub_commands.get(sub_command).ok_or_else(|| {
            AppError::Cli(format!("Unknown sub-command '{}' for {}", sub_command, command.name))
        })?;
        if !valid.is_empty() && !valid.contains(&value) {
            return Err(AppError::Cli(format!(
                "Invalid value for {}. Supported values: {}",
                sub_command,
                valid.join(", ")
            )));
        }

        if sub_command == "profile" {
            request.session.switch_profile(&value)?;
            if request.session.interactive {
                println!(
                    "Loaded server profile: {}\nUrl:        {}\nTotal APIs: {}\n",
                    request.session.profile,
                    request.session.url,
                    self.registry.api_count()
                );
            }
        }
        Ok(())
    }
}

/// Help text for one command: description, required args and sub-commands.
pub fn render_help(command: &Command) -> String {
    let mut out = format!("{}: {}", command.name, command.help);
    if command.is_async {
        out.push_str("\nThis API is asynchronous.");
    }
    let required: Vec<String> = command.required_names().collect();
    if !required.is_empty() {
        out.push_str(&format!("\nRequired parameters: {}", required.join(", ")));
    }
    if !command.sub_commands.is_empty() {
        out.push_str(&format!(
            "\nUsage: {} <subcommand> <option>",
            command.name
        ));
        for (sub, values) in &command.sub_commands {
            if values.is_empty() {
                out.push_str(&format!("\n  {}", sub));
            } else {
                out.push_str(&format!("\n  {} [{}]", sub, values.join(", ")));
            }
        }
    }
    out
}
