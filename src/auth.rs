//! Google API access tokens for the classifier and blob storage.
//!
//! A token is either fixed (from `SITESEER_ACCESS_TOKEN` or the config file)
//! or fetched on every request by running a command that prints one,
//! `gcloud auth print-access-token` by default.

use std::{io, process::Command};

use crate::config::GoogleConfig;

/// Errors obtaining an access token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} failed: {stderr}")]
    Failed { program: String, stderr: String },

    #[error("{program} printed no token")]
    Empty { program: String },

    #[error("no token command configured")]
    NoCommand,
}

/// Where bearer tokens come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Static(String),
    Command(Vec<String>),
}

impl TokenSource {
    pub fn from_config(config: &GoogleConfig) -> Self {
        match &config.access_token {
            Some(token) => Self::Static(token.clone()),
            None => Self::Command(config.token_command.clone()),
        }
    }

    /// The current token.
    pub fn token(&self) -> Result<String, AuthError> {
        match self {
            Self::Static(token) => Ok(token.clone()),
            Self::Command(command) => run_token_command(command),
        }
    }
}

fn run_token_command(command: &[String]) -> Result<String, AuthError> {
    let (program, args) = command.split_first().ok_or(AuthError::NoCommand)?;

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| AuthError::Spawn {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AuthError::Failed {
            program: program.clone(),
            stderr: stderr.trim().to_string(),
        });
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        return Err(AuthError::Empty {
            program: program.clone(),
        });
    }
    Ok(token)
}
