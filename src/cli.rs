// CLI layer: argument definitions and the single bootstrap flow. The flow
// is synchronous and runs once: resolve the file, load it, upsert one user,
// write it back and report what is in it.

use crate::error::BootstrapError;
use crate::paths::{resolve_target_path, DEFAULT_PASSWORDS_FILE};
use crate::store::{load_map, persist, upsert};
use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::Parser;
use dialoguer::Password;
use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

/// Bootstrap Airflow SimpleAuthManager passwords.
#[derive(Parser, Debug)]
#[command(name = "bootstrap-simple-auth", version)]
pub struct Cli {
    // Empty values are accepted here and treated as absent when the
    // target path is resolved.
    /// AIRFLOW_HOME directory; the passwords file is created inside it.
    #[arg(long, env = "AIRFLOW_HOME", value_name = "DIR")]
    pub airflow_home: Option<OsString>,

    /// Override the passwords JSON file path.
    #[arg(long, value_name = "PATH")]
    pub passwords_file: Option<OsString>,

    /// User to create or update.
    #[arg(long, default_value = "admin", value_parser = NonEmptyStringValueParser::new())]
    pub username: String,

    /// Plaintext password stored for the user.
    #[arg(long, default_value = "admin", conflicts_with = "prompt_password")]
    pub password: String,

    /// Read the password from a hidden terminal prompt.
    #[arg(long)]
    pub prompt_password: bool,
}

/// Where the password comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordSource {
    Literal(String),
    Prompt,
}

/// Everything the bootstrap flow needs, detached from how it was parsed.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub airflow_home: Option<PathBuf>,
    pub passwords_file: Option<PathBuf>,
    pub username: String,
    pub password: PasswordSource,
}

impl From<Cli> for BootstrapConfig {
    fn from(cli: Cli) -> Self {
        let password = if cli.prompt_password {
            PasswordSource::Prompt
        } else {
            PasswordSource::Literal(cli.password)
        };
        BootstrapConfig {
            airflow_home: cli.airflow_home.map(PathBuf::from),
            passwords_file: cli.passwords_file.map(PathBuf::from),
            username: cli.username,
            password,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub path: PathBuf,
    pub usernames: Vec<String>,
}

/// Run the bootstrap and print the two-line summary to `out`.
///
/// Path resolution happens first, so a missing target fails before any
/// prompt or filesystem access.
pub fn run(config: &BootstrapConfig, out: &mut impl Write) -> Result<Report> {
    let path = resolve_target_path(
        config.passwords_file.as_deref(),
        config.airflow_home.as_deref(),
        DEFAULT_PASSWORDS_FILE,
    )?;
    tracing::debug!(path = %path.display(), "resolved passwords file");

    let password = match &config.password {
        PasswordSource::Literal(p) => p.clone(),
        PasswordSource::Prompt => prompt_password(&config.username)?,
    };

    let map = load_map(&path).context("Loading passwords file")?;
    let map = upsert(map, config.username.as_str(), password);
    persist(&path, &map).context("Writing passwords file")?;

    let report = Report {
        path,
        usernames: map.usernames().map(str::to_string).collect(),
    };
    writeln!(out, "Wrote: {}", report.path.display())?;
    writeln!(out, "Users in file: {}", report.usernames.join(", "))?;
    Ok(report)
}

/// Ask for the password on the terminal without echoing it.
fn prompt_password(username: &str) -> Result<String, BootstrapError> {
    Password::new()
        .with_prompt(format!("Password for {username}"))
        .with_confirmation("Repeat password", "Passwords do not match")
        .allow_empty_password(true)
        .interact()
        .map_err(BootstrapError::Prompt)
}
