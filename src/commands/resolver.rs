//! Turns typed tokens into a registered command and checks its required arguments.

use super::registry::{Command, Handler, Registry};
use crate::error::{AppError, Result};
use tracing::debug;

const HELP_FLAG: &str = "-h";

/// Outcome of resolving a token list.
#[derive(Debug)]
pub enum Resolution<'a> {
    /// Run `command` with the remaining `args`.
    Dispatch {
        command: &'a Command,
        args: Vec<String>,
    },
    /// A `-h` flag was present; show help for `name` instead of running anything.
    Help { name: String },
}

/// Resolves the leading tokens to a command.
///
/// The first token is looked up case-insensitively. When that fails and a second
/// token exists, both are concatenated (so `list zones` finds `listZones`) and the
/// two tokens are consumed as the name.
pub fn resolve<'a>(registry: &'a Registry, tokens: &[String]) -> Result<Resolution<'a>> {
    let Some(first) = tokens.first() else {
        return Err(AppError::Cli("please provide an API to execute".to_string()));
    };

    let mut name = first.to_lowercase();
    let mut consumed = 1;
    if !registry.contains(&name) && tokens.len() > 1 {
        let merged = format!("{}{}", first, tokens[1]).to_lowercase();
        if registry.contains(&merged) {
            debug!("Resolved '{} {}' as {}", first, tokens[1], merged);
            name = merged;
            consumed = 2;
        }
    }

    let command = registry.get(&name);

    // `api <name> -h` asks about the named API, so the runner re-resolves it.
    let is_runner = command.is_some_and(|c| matches!(c.handler, Handler::ApiRunner));
    if !is_runner && tokens.iter().any(|t| t == HELP_FLAG) {
        return Ok(Resolution::Help { name });
    }

    let command = command.ok_or_else(|| AppError::UnknownCommand(first.clone()))?;

    Ok(Resolution::Dispatch {
        command,
        args: tokens[consumed..].to_vec(),
    })
}

/// Returns the names of required arguments missing from `args`, in registry order.
///
/// An argument counts as supplied only when its key, the text before the first
/// `=`, matches the required name exactly; `idx=5` does not satisfy `id`.
pub fn missing_required_args(command: &Command, args: &[String]) -> Vec<String> {
    command
        .required_names()
        .filter(|required| {
            !args.iter().any(|arg| {
                arg.split_once('=')
                    .is_some_and(|(key, _)| key == required.as_str())
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::RegistryBuilder;
    use rstest::rstest;

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::new().with_builtins(&[]);
        builder.register(
            Command::new("listZones", "Lists zones", Handler::Api),
        );
        builder.register(
            Command::new("createNetwork", "Creates a network", Handler::Api)
                .with_required_args(["id=", "name="]),
        );
        builder.build()
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_token_lookup_is_case_insensitive() {
        let registry = registry();
        match resolve(&registry, &tokens(&["LISTZONES", "available=true"])).unwrap() {
            Resolution::Dispatch { command, args } => {
                assert_eq!(command.name, "listZones");
                assert_eq!(args, tokens(&["available=true"]));
            },
            other => panic!("Expected Dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_two_token_merge_consumes_both_tokens() {
        let registry = registry();
        match resolve(&registry, &tokens(&["list", "zones", "id=1", "name=z"])).unwrap() {
            Resolution::Dispatch { command, args } => {
                assert_eq!(command.name, "listZones");
                assert_eq!(args, tokens(&["id=1", "name=z"]));
            },
            other => panic!("Expected Dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_wins_over_merge() {
        let registry = registry();
        match resolve(&registry, &tokens(&["switch", "profile", "dev"])).unwrap() {
            Resolution::Dispatch { command, args } => {
                assert_eq!(command.handler, Handler::Switch);
                assert_eq!(args, tokens(&["profile", "dev"]));
            },
            other => panic!("Expected Dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_help_flag_short_circuits_with_merged_name() {
        let registry = registry();
        match resolve(&registry, &tokens(&["list", "zones", "-h"])).unwrap() {
            Resolution::Help { name } => assert_eq!(name, "listzones"),
            other => panic!("Expected Help, got {:?}", other),
        }
    }

    #[test]
    fn test_help_flag_after_api_runner_is_forwarded() {
        let registry = registry();
        match resolve(&registry, &tokens(&["api", "listZones", "-h"])).unwrap() {
            Resolution::Dispatch { command, args } => {
                assert_eq!(command.handler, Handler::ApiRunner);
                assert_eq!(args, tokens(&["listZones", "-h"]));
            },
            other => panic!("Expected Dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command() {
        let registry = registry();
        let result = resolve(&registry, &tokens(&["frobnicate", "things"]));
        assert!(matches!(result, Err(AppError::UnknownCommand(name)) if name == "frobnicate"));
    }

    #[test]
    fn test_empty_tokens_rejected() {
        let registry = registry();
        assert!(matches!(resolve(&registry, &[]), Err(AppError::Cli(_))));
    }

    #[rstest]
    #[case(&["id=5"], &["name"])]
    #[case(&["id=5", "name=web"], &[])]
    #[case(&[], &["id", "name"])]
    #[case(&["idx=5", "name=web"], &["id"])]
    #[case(&["id", "name=web"], &["id"])]
    #[case(&["name=id=5"], &["id"])]
    fn test_missing_required_args(#[case] args: &[&str], #[case] expected: &[&str]) {
        let registry = registry();
        let command = registry.get("createnetwork").unwrap();
        assert_eq!(missing_required_args(command, &tokens(args)), tokens(expected));
    }
}
