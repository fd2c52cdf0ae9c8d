//! Session configuration.
//!
//! Values come from the environment (optionally seeded from a `.env` file) and are
//! overridden by command-line flags. Persisted profile files are handled elsewhere.

use crate::error::{AppError, Result};
use std::env;
use std::str::FromStr;
use tracing::debug;

const DEFAULT_PROFILE: &str = "localcloud";
const DEFAULT_URL: &str = "http://localhost:8080/client/api";

/// How successful responses are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Text,
}

impl FromStr for OutputFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "text" | "table" => Ok(OutputFormat::Text),
            other => Err(AppError::Cli(format!(
                "Invalid output format '{}'. Supported values: json, text",
                other
            ))),
        }
    }
}

/// Per-process session settings shared by every request.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub profile: String,
    pub url: String,
    pub api_key: Option<String>,
    pub output: OutputFormat,
    /// Known profile names; empty means any name is accepted.
    pub profiles: Vec<String>,
    /// True when a user is attached to an interactive shell.
    pub interactive: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile: DEFAULT_PROFILE.to_string(),
            url: DEFAULT_URL.to_string(),
            api_key: None,
            output: OutputFormat::default(),
            profiles: Vec::new(),
            interactive: false,
        }
    }
}

impl SessionConfig {
    /// Build a configuration from `CMK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Ok(profile) = env::var("CMK_PROFILE") {
            config.profile = profile;
        }
        if let Ok(url) = env::var("CMK_URL") {
            config.url = url;
        }
        config.api_key = env::var("CMK_APIKEY").ok().filter(|k| !k.is_empty());
        if let Ok(output) = env::var("CMK_OUTPUT") {
            config.output = output.parse()?;
        }
        if let Ok(profiles) = env::var("CMK_PROFILES") {
            config.profiles = split_list(&profiles);
        }

        debug!(
            "Loaded session config: profile={} url={} output={:?}",
            config.profile, config.url, config.output
        );
        Ok(config)
    }

    /// Switch the active profile, checking it against the known profiles.
    pub fn switch_profile(&mut self, name: &str) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Cli("Please provide a profile name".to_string()));
        }
        if !self.profiles.is_empty() && !self.profiles.iter().any(|p| p == name) {
            return Err(AppError::Cli(format!(
                "Unknown profile '{}'. Known profiles: {}",
                name,
                self.profiles.join(", ")
            )));
        }
        self.profile = name.to_string();
        Ok(())
    }
}

/// Split a comma separated list, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serial_test::serial;

    #[rstest]
    #[case("json", OutputFormat::Json)]
    #[case("TEXT", OutputFormat::Text)]
    #[case(" table ", OutputFormat::Text)]
    fn test_output_format_parse(#[case] raw: &str, #[case] expected: OutputFormat) {
        assert_eq!(raw.parse::<OutputFormat>().unwrap(), expected);
    }

    #[test]
    fn test_output_format_rejects_unknown() {
        assert!(matches!("xml".parse::<OutputFormat>(), Err(AppError::Cli(_))));
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list(" a, ,b ,"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_variables() {
        env::set_var("CMK_PROFILE", "prod");
        env::set_var("CMK_OUTPUT", "text");
        env::set_var("CMK_PROFILES", "prod, dev");
        let config = SessionConfig::from_env().unwrap();
        env::remove_var("CMK_PROFILE");
        env::remove_var("CMK_OUTPUT");
        env::remove_var("CMK_PROFILES");

        assert_eq!(config.profile, "prod");
        assert_eq!(config.output, OutputFormat::Text);
        assert_eq!(config.profiles, vec!["prod".to_string(), "dev".to_string()]);
        assert!(!config.interactive);
    }

    #[test]
    fn test_switch_profile_checks_known_names() {
        let mut config = SessionConfig {
            profiles: vec!["prod".into(), "dev".into()],
            ..SessionConfig::default()
        };
        assert!(config.switch_profile("dev").is_ok());
        assert_eq!(config.profile, "dev");
        assert!(config.switch_profile("staging").is_err());
        assert_eq!(config.profile, "dev");
    }
}
