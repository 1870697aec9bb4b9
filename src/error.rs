use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to scan project at {path}: {reason}")]
    Scan { path: PathBuf, reason: String },

    #[error("Unsupported or undetectable project type at: {0}")]
    UnsupportedProjectType(PathBuf),

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("Aggregated launch config already exists: {0}")]
    NameExists(String),

    #[error("Failed to launch {target}: {reason}")]
    LaunchFailure { target: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::NotFound { .. } => 3,
            Error::WorkspaceNotFound(_) | Error::UnsupportedProjectType(_) | Error::Scan { .. } => 2,
            Error::Read { .. }
            | Error::Write { .. }
            | Error::Json { .. }
            | Error::NameExists(_)
            | Error::LaunchFailure { .. }
            | Error::InvalidInput(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
