//! Failures of the orchestration layer. Problems in the analyzed program are
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s, never errors.
use std::path::PathBuf;
use std::process::ExitStatus;

#[derive(Debug, thiserror::Error)]
pub enum GqlkitError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("{0}")]
    Glob(#[from] glob::GlobError),
    #[error("config {path}: {message}")]
    Config { path: PathBuf, message: String },
    #[error("hook `{command}` exited with {status}")]
    Hook { command: String, status: ExitStatus },
}

pub type Result<T> = std::result::Result<T, GqlkitError>;
