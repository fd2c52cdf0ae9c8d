//! Command registry: built-in shell commands plus APIs discovered at startup.
//!
//! The registry is assembled with [`RegistryBuilder`] and is read-only afterwards;
//! the dispatcher borrows it for the lifetime of the session.

use crate::error::{AppError, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// What runs when a command is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// A remote API call executed through the API invoker.
    Api,
    /// `api <name> ...`: resolve the following tokens as an API.
    ApiRunner,
    Help,
    Switch,
    Exit,
}

/// A registered command or API.
#[derive(Debug, Clone)]
pub struct Command {
    pub name: String,
    pub help: String,
    /// Sub-command name to permitted option values; an empty list accepts anything.
    pub sub_commands: BTreeMap<String, Vec<String>>,
    /// Required argument prefixes as stored, e.g. `"id="`.
    pub required_args: Vec<String>,
    pub is_async: bool,
    pub handler: Handler,
}

impl Command {
    /// Creates a command with no arguments or sub-commands.
    pub fn new(name: impl Into<String>, help: impl Into<String>, handler: Handler) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            sub_commands: BTreeMap::new(),
            required_args: Vec::new(),
            is_async: false,
            handler,
        }
    }

    pub fn with_sub_command(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.sub_commands.insert(name.into(), values);
        self
    }

    pub fn with_required_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn asynchronous(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    /// Required argument names with any `=` stripped.
    pub fn required_names(&self) -> impl Iterator<Item = String> + '_ {
        self.required_args.iter().map(|r| r.replace('=', ""))
    }
}

/// Immutable lookup table of commands keyed by lower-cased name.
#[derive(Debug, Default)]
pub struct Registry {
    commands: HashMap<String, Command>,
}

impl Registry {
    /// Looks a command up by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Command names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.values().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of discovered remote APIs.
    pub fn api_count(&self) -> usize {
        self.commands
            .values()
            .filter(|c| c.handler == Handler::Api)
            .count()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

// --- listApis document shape ---

#[derive(Debug, Deserialize)]
struct ApiListing {
    #[serde(default)]
    api: Vec<ApiSpec>,
}

#[derive(Debug, Deserialize)]
struct ApiSpec {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "isasync")]
    is_async: bool,
    #[serde(default)]
    params: Vec<ApiParam>,
}

#[derive(Debug, Deserialize)]
struct ApiParam {
    name: String,
    #[serde(default)]
    required: bool,
}

/// Collects commands before freezing them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    commands: HashMap<String, Command>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the shell's built-in commands.
    ///
    /// `profiles` populates the permitted values of `switch profile`.
    pub fn with_builtins(mut self, profiles: &[String]) -> Self {
        self.register(Command::new(
            "api",
            "Runs a provided API",
            Handler::ApiRunner,
        ));
        self.register(Command::new(
            "help",
            "Shows help for a command or API",
            Handler::Help,
        ));
        self.register(
            Command::new("switch", "Switches profile", Handler::Switch)
                .with_sub_command("profile", profiles.to_vec()),
        );
        self.register(Command::new("exit", "Exits the shell", Handler::Exit));
        self.register(Command::new("quit", "Exits the shell", Handler::Exit));
        self
    }

    /// Adds or replaces a command.
    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name.to_lowercase(), command);
    }

    /// Registers every API in a `listApis` document and returns how many were added.
    ///
    /// Accepts either the bare `{"api": [...]}` listing or one wrapped in a
    /// `listapisresponse` envelope.
    pub fn discover_apis(&mut self, document: &Value) -> Result<usize> {
        let listing = document
            .get("listapisresponse")
            .unwrap_or(document)
            .clone();
        let listing: ApiListing = serde_json::from_value(listing)?;

        let count = listing.api.len();
        for spec in listing.api {
            let required: Vec<String> = spec
                .params
                .iter()
                .filter(|p| p.required)
                .map(|p| format!("{}=", p.name))
                .collect();
            debug!("Discovered API {} ({} required args)", spec.name, required.len());
            self.register(
                Command::new(spec.name, spec.description, Handler::Api)
                    .with_required_args(required)
                    .asynchronous(spec.is_async),
            );
        }
        Ok(count)
    }

    /// Reads a cached `listApis` document from disk and registers its APIs.
    pub fn load_api_cache(&mut self, path: &Path) -> Result<usize> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Cli(format!(
                "Failed to read API cache {}: {}",
                path.display(),
                e
            ))
        })?;
        let document: Value = serde_json::from_str(&raw)?;
        let count = self.discover_apis(&document)?;
        info!("Loaded {} APIs from {}", count, path.display());
        Ok(count)
    }

    pub fn build(self) -> Registry {
        Registry {
            commands: self.commands,
        }
    }
}
