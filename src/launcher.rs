use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{Settings, launch_json_path};
use crate::error::{Error, Result};
use crate::launch_config::{LaunchConfig, LaunchDocument, WORKSPACE_FOLDER};
use crate::sequence::Launcher;
use crate::store;

/// Compiled-class directories added to the classpath when they exist.
pub const CONVENTIONAL_OUTPUT_DIRS: [&str; 5] = [
    "target/classes",
    "target/test-classes",
    "build/classes/java/main",
    "build/classes/java/test",
    "out",
];

/// Fully resolved process invocation for one launch record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: PathBuf,
    pub env: BTreeMap<String, String>,
}

/// Starts generated launch records as JVM processes.
///
/// Test records are started the same way as applications; no test runner is
/// involved.
#[derive(Debug, Clone)]
pub struct JavaLauncher {
    workspace: PathBuf,
    java_bin: PathBuf,
    classpath: Vec<String>,
    startup_grace: Duration,
}

impl JavaLauncher {
    pub fn new(workspace: PathBuf, java_bin: PathBuf) -> Self {
        Self {
            workspace,
            java_bin,
            classpath: Vec::new(),
            startup_grace: Duration::from_millis(300),
        }
    }

    pub fn from_settings(workspace: PathBuf, java_bin: PathBuf, settings: &Settings) -> Self {
        Self::new(workspace, java_bin)
            .with_classpath(settings.classpath.clone())
            .with_startup_grace(Duration::from_millis(settings.startup_grace_ms))
    }

    pub fn with_classpath(mut self, entries: Vec<String>) -> Self {
        self.classpath = entries;
        self
    }

    pub fn with_startup_grace(mut self, grace: Duration) -> Self {
        self.startup_grace = grace;
        self
    }

    fn substitute(&self, value: &str) -> String {
        value.replace(WORKSPACE_FOLDER, &self.workspace.to_string_lossy())
    }

    fn resolve_path(&self, value: &str) -> PathBuf {
        let path = PathBuf::from(self.substitute(value));
        if path.is_absolute() {
            path
        } else {
            self.workspace.join(path)
        }
    }

    fn classpath_entries(&self) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = self.classpath.iter().map(|e| self.resolve_path(e)).collect();
        entries.extend(
            CONVENTIONAL_OUTPUT_DIRS
                .iter()
                .map(|d| self.workspace.join(d))
                .filter(|p| p.is_dir()),
        );
        entries
    }

    pub fn command_line(&self, config: &LaunchConfig) -> Result<LaunchCommand> {
        let mut args: Vec<OsString> = config
            .vm_args
            .split_whitespace()
            .map(|a| OsString::from(self.substitute(a)))
            .collect();

        let classpath = self.classpath_entries();
        if !classpath.is_empty() {
            let joined = std::env::join_paths(&classpath).map_err(|e| Error::LaunchFailure {
                target: config.name.clone(),
                reason: format!("invalid classpath entry: {e}"),
            })?;
            args.push(OsString::from("-cp"));
            args.push(joined);
        }

        args.push(OsString::from(&config.main_class));
        args.extend(
            config
                .args
                .split_whitespace()
                .map(|a| OsString::from(self.substitute(a))),
        );

        let mut env = BTreeMap::new();
        if let Some(env_file) = &config.env_file {
            let path = self.resolve_path(env_file);
            if store::exists(&path) {
                env.extend(parse_env_file(&store::read_text(&path)?));
            } else {
                debug!(path = %path.display(), "env file not present");
            }
        }
        if let Some(vars) = &config.env {
            for (k, v) in vars {
                env.insert(k.clone(), self.substitute(v));
            }
        }

        let cwd = config
            .cwd
            .as_deref()
            .map(|c| self.resolve_path(c))
            .unwrap_or_else(|| self.workspace.clone());

        Ok(LaunchCommand {
            program: self.java_bin.clone(),
            args,
            cwd,
            env,
        })
    }

    fn spawn_command(&self, launch: &LaunchCommand) -> Command {
        #[cfg(windows)]
        {
            let lower = launch.program.to_string_lossy().to_ascii_lowercase();
            if lower.ends_with(".cmd") || lower.ends_with(".bat") {
                let mut cmd = Command::new("cmd");
                cmd.arg("/C").arg(&launch.program).args(&launch.args);
                return cmd;
            }
        }

        let mut cmd = Command::new(&launch.program);
        cmd.args(&launch.args);
        // Terminal Ctrl-C must reach the launcher only, not the JVMs it started.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

#[async_trait]
impl Launcher for JavaLauncher {
    async fn start_launch(&self, target: &str) -> Result<bool> {
        let doc = LaunchDocument::load(&launch_json_path(&self.workspace))?;
        let config = match doc.find(target) {
            Ok(Some(config)) => config,
            Ok(None) => {
                warn!(target, "launch configuration not found");
                return Ok(false);
            }
            Err(err) => {
                warn!(target, error = %err, "launch configuration cannot be started");
                return Ok(false);
            }
        };

        let launch = self.command_line(&config)?;
        debug!(program = %launch.program.display(), args = ?launch.args, "spawning");

        let mut child = self
            .spawn_command(&launch)
            .current_dir(&launch.cwd)
            .envs(&launch.env)
            .stdin(Stdio::null())
            .stdout(Stdio::from(std::io::stderr()))
            .spawn()
            .map_err(|e| Error::LaunchFailure {
                target: target.to_string(),
                reason: format!("failed to execute {} ({e})", launch.program.display()),
            })?;

        match tokio::time::timeout(self.startup_grace, child.wait()).await {
            Err(_) => {
                info!(target, pid = child.id(), "started");
                Ok(true)
            }
            Ok(Ok(status)) if status.success() => {
                info!(target, "finished successfully");
                Ok(true)
            }
            Ok(Ok(status)) => {
                warn!(target, code = ?status.code(), "exited during startup");
                Ok(false)
            }
            Ok(Err(e)) => Err(Error::LaunchFailure {
                target: target.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// `KEY=VALUE` lines; blank lines, `#` comments and an `export ` prefix are
/// tolerated, surrounding quotes are removed.
pub fn parse_env_file(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .filter_map(|l| {
            let l = l.strip_prefix("export ").unwrap_or(l);
            let (key, value) = l.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
