use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::launch_config::DEFAULT_PROFILE;
use crate::store;

pub const ENV_WORKSPACE: &str = "JAVA_LAUNCHER_WORKSPACE";
pub const ENV_JAVA: &str = "JAVA_LAUNCHER_JAVA";
pub const ENV_CONFIG: &str = "JAVA_LAUNCHER_CONFIG";

pub const VSCODE_DIR: &str = ".vscode";
pub const LAUNCH_JSON: &str = "launch.json";
pub const AGGREGATED_LAUNCH_JSON: &str = "aggregated-launch.json";
pub const LAUNCH_HISTORY_JSON: &str = "java-launch-history.json";

/// What to do when one item of an aggregated run fails to start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Ask,
    Continue,
    Stop,
}

/// User settings file. Every field is optional on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub spring_profile: String,
    pub extra_vm_args: Vec<String>,
    pub on_failure: FailurePolicy,
    pub startup_grace_ms: u64,
    pub classpath: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            spring_profile: DEFAULT_PROFILE.to_string(),
            extra_vm_args: Vec::new(),
            on_failure: FailurePolicy::Ask,
            startup_grace_ms: 300,
            classpath: Vec::new(),
        }
    }
}

pub fn launch_json_path(workspace: &Path) -> PathBuf {
    workspace.join(VSCODE_DIR).join(LAUNCH_JSON)
}

pub fn aggregated_store_path(workspace: &Path) -> PathBuf {
    workspace.join(VSCODE_DIR).join(AGGREGATED_LAUNCH_JSON)
}

pub fn history_store_path(workspace: &Path) -> PathBuf {
    workspace.join(VSCODE_DIR).join(LAUNCH_HISTORY_JSON)
}

/// `--workspace`, then `JAVA_LAUNCHER_WORKSPACE`, then the current directory.
pub fn resolve_workspace(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.workspace.clone() {
        return validate_workspace(&p);
    }

    if let Some(p) = env_path(ENV_WORKSPACE) {
        return validate_workspace(&p);
    }

    let cwd = env::current_dir().map_err(|_| Error::WorkspaceNotFound(PathBuf::from(".")))?;
    validate_workspace(&cwd)
}

pub fn validate_workspace(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(Error::WorkspaceNotFound(path.to_path_buf()));
    }
    path.canonicalize()
        .map_err(|_| Error::WorkspaceNotFound(path.to_path_buf()))
}

pub fn resolve_java_binary(cli: &Cli) -> PathBuf {
    if let Some(p) = cli.java.clone() {
        return p;
    }

    env_path(ENV_JAVA).unwrap_or_else(|| PathBuf::from("java"))
}

/// Settings from `--config`, `JAVA_LAUNCHER_CONFIG`, or the user config
/// directory. An explicitly named file must exist; the default location is
/// optional.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    if let Some(p) = cli.config.clone().or_else(|| env_path(ENV_CONFIG)) {
        debug!(path = %p.display(), "loading settings");
        return store::read_json(&p);
    }

    match default_settings_path() {
        Some(p) if store::exists(&p) => {
            debug!(path = %p.display(), "loading settings");
            store::read_json(&p)
        }
        _ => Ok(Settings::default()),
    }
}

pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("java-launcher").join("settings.json"))
}

fn env_path(key: &str) -> Option<PathBuf> {
    env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
