//! Configuration for the `tasksync` command-line client.
//!
//! Layered with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/tasksync/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use tasksync_core::domain::{Session, User};
use tasksync_core::impls::RestConfig;
use tasksync_core::{TaskFilter, TaskStatus, UserId};

/// Errors that can occur when loading client configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The REST backend was selected without the settings it needs.
    #[error("rest backend requires `{0}` (flag, env var or [backend] in the config file)")]
    MissingRestSetting(&'static str),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct CliConfigFile {
    backend: BackendFileConfig,
    session: SessionFileConfig,
}

/// `[backend]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BackendFileConfig {
    kind: Option<BackendKind>,
    url: Option<String>,
    api_key: Option<String>,
    table: Option<String>,
    timeout_secs: Option<u64>,
}

/// `[session]` section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    user_id: Option<String>,
    email: Option<String>,
    access_token: Option<String>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local store; contents are gone when the command exits.
    #[default]
    Memory,
    /// PostgREST-compatible row API.
    Rest,
}

#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Task list client for a hosted row store")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/tasksync/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Backend to talk to.
    #[arg(long, value_enum, env = "TASKSYNC_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Project URL of the row API.
    #[arg(long, env = "TASKSYNC_URL")]
    pub url: Option<String>,

    /// Public API key sent as the `apikey` header.
    #[arg(long, env = "TASKSYNC_API_KEY")]
    pub api_key: Option<String>,

    /// Signed-in user id.
    #[arg(long, env = "TASKSYNC_USER_ID")]
    pub user_id: Option<String>,

    /// Bearer token of the signed-in user.
    #[arg(long, env = "TASKSYNC_ACCESS_TOKEN")]
    pub access_token: Option<String>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn", env = "TASKSYNC_LOG")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List tasks, newest first.
    List {
        /// all, open, in_progress or done.
        #[arg(short, long, default_value = "all")]
        filter: TaskFilter,
    },
    /// Show one task.
    Show { id: String },
    /// Create a task.
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        status: Option<TaskStatus>,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: Option<NaiveDate>,
    },
    /// Change fields of a task.
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,
        #[arg(long)]
        clear_description: bool,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,
        #[arg(long)]
        clear_deadline: bool,
    },
    /// Mark a task as done.
    Done { id: String },
    /// Delete a task.
    Rm { id: String },
    /// Task counts per status.
    Summary,
    /// Walk through create / update / filter / delete against the in-memory store.
    Demo,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub backend: BackendKind,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub timeout: Duration,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub access_token: Option<String>,
    pub log_level: String,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            url: None,
            api_key: None,
            table: "tasks".to_string(),
            timeout: Duration::from_secs(15),
            user_id: None,
            email: None,
            access_token: None,
            log_level: "warn".to_string(),
        }
    }
}

impl CliConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// An explicit `--config` that does not exist is an error; a missing
    /// default file is treated as empty.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &CliConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            backend: cli
                .backend
                .or(file.backend.kind)
                .unwrap_or(defaults.backend),
            url: cli.url.clone().or_else(|| file.backend.url.clone()),
            api_key: cli.api_key.clone().or_else(|| file.backend.api_key.clone()),
            table: file.backend.table.clone().unwrap_or(defaults.table),
            timeout: file
                .backend
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_id: cli.user_id.clone().or_else(|| file.session.user_id.clone()),
            email: file.session.email.clone(),
            access_token: cli
                .access_token
                .clone()
                .or_else(|| file.session.access_token.clone()),
            log_level: cli.log_level.clone(),
        }
    }

    /// The session to sign in with, if a user id is configured.
    pub fn session(&self) -> Option<Session> {
        let user_id = self.user_id.as_deref().filter(|id| !id.trim().is_empty())?;
        Some(Session::new(
            User {
                id: UserId::new(user_id.trim()),
                email: self.email.clone(),
            },
            self.access_token.clone().unwrap_or_default(),
        ))
    }

    pub fn rest(&self) -> Result<RestConfig, ConfigError> {
        let url = self.url.clone().ok_or(ConfigError::MissingRestSetting("url"))?;
        let api_key = self
            .api_key
            .clone()
            .ok_or(ConfigError::MissingRestSetting("api_key"))?;
        // 空の bearer トークンでは送らない
        if self.access_token.as_deref().is_none_or(|t| t.trim().is_empty()) {
            return Err(ConfigError::MissingRestSetting("access_token"));
        }

        let mut rest = RestConfig::new(url, api_key);
        rest.table = self.table.clone();
        rest.timeout = self.timeout;
        Ok(rest)
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<CliConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(CliConfigFile::default());
        };
        config_dir.join("tasksync").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CliConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rstest::rstest;

    #[test]
    fn defaults_use_memory_backend() {
        let config = CliConfig::default();
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.table, "tasks");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert!(config.session().is_none());
    }

    #[test]
    fn toml_parsing_full() {
        let toml_str = r#"
[backend]
kind = "rest"
url = "https://xyz.supabase.co"
api_key = "anon"
table = "todo_items"
timeout_secs = 5

[session]
user_id = "u1"
email = "u1@example.com"
access_token = "jwt"
"#;
        let file: CliConfigFile = toml::from_str(toml_str).unwrap();
        let config = CliConfig::resolve(&CliArgs::default(), &file);

        assert_eq!(config.backend, BackendKind::Rest);
        assert_eq!(config.table, "todo_items");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let rest = config.rest().unwrap();
        assert_eq!(rest.endpoint(), "https://xyz.supabase.co/rest/v1/todo_items");

        let session = config.session().unwrap();
        assert_eq!(session.user_id(), &UserId::new("u1"));
        assert_eq!(session.access_token, "jwt");
    }

    #[test]
    fn toml_parsing_empty() {
        let file: CliConfigFile = toml::from_str("").unwrap();
        let config = CliConfig::resolve(&CliArgs::default(), &file);

        assert_eq!(config.backend, BackendKind::Memory);
        assert!(config.url.is_none());
    }

    #[test]
    fn cli_overrides_file() {
        let toml_str = r#"
[backend]
kind = "rest"
url = "https://from-file.example"

[session]
user_id = "file-user"
"#;
        let file: CliConfigFile = toml::from_str(toml_str).unwrap();
        let cli = CliArgs {
            backend: Some(BackendKind::Memory),
            user_id: Some("cli-user".to_string()),
            ..Default::default()
        };
        let config = CliConfig::resolve(&cli, &file);

        assert_eq!(config.backend, BackendKind::Memory); // from CLI
        assert_eq!(config.url.as_deref(), Some("https://from-file.example")); // from file
        assert_eq!(config.user_id.as_deref(), Some("cli-user"));
    }

    #[test]
    fn blank_user_id_means_signed_out() {
        let config = CliConfig {
            user_id: Some("  ".to_string()),
            ..CliConfig::default()
        };
        assert!(config.session().is_none());
    }

    #[test]
    fn rest_without_url_is_an_error() {
        let config = CliConfig {
            backend: BackendKind::Rest,
            api_key: Some("anon".to_string()),
            ..CliConfig::default()
        };
        assert!(matches!(config.rest(), Err(ConfigError::MissingRestSetting("url"))));
    }

    #[rstest]
    #[case::absent(None)]
    #[case::blank(Some("  "))]
    fn rest_without_access_token_is_an_error(#[case] token: Option<&str>) {
        let config = CliConfig {
            backend: BackendKind::Rest,
            url: Some("https://xyz.supabase.co".to_string()),
            api_key: Some("anon".to_string()),
            user_id: Some("u1".to_string()),
            access_token: token.map(str::to_string),
            ..CliConfig::default()
        };
        assert!(matches!(
            config.rest(),
            Err(ConfigError::MissingRestSetting("access_token"))
        ));
    }

    #[test]
    fn explicit_missing_config_file_returns_error() {
        let result = load_config_file(Some(std::path::Path::new("/nonexistent/config.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn subcommands_parse_typed_values() {
        let args = CliArgs::try_parse_from([
            "tasksync",
            "add",
            "Buy milk",
            "--status",
            "in_progress",
            "--deadline",
            "2024-12-24",
        ])
        .unwrap();

        assert_eq!(
            args.command,
            Some(Command::Add {
                title: "Buy milk".to_string(),
                description: None,
                status: Some(TaskStatus::InProgress),
                deadline: NaiveDate::from_ymd_opt(2024, 12, 24),
            })
        );
    }

    #[test]
    fn unknown_filter_is_rejected_by_the_parser() {
        let result = CliArgs::try_parse_from(["tasksync", "list", "--filter", "archived"]);
        assert!(result.is_err());
    }
}
