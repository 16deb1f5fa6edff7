//! Errors surfaced by the `easel` binary.

use std::path::PathBuf;

use canvas::error::{ConfigError, LoadError, PayloadError, RenderError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write output: {0}")]
    Write(#[source] std::io::Error),
    #[error("invalid options: {0}")]
    Options(#[from] ConfigError),
    #[error("scene load failed: {0}")]
    Load(#[from] LoadError),
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("export failed: {0}")]
    Export(#[from] PayloadError),
    #[error("invalid replay script: {0}")]
    Script(#[source] serde_json::Error),
    #[error("replay step {step}: {reason}")]
    Replay { step: usize, reason: String },
}
