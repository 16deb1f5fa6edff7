//! Command-line and environment configuration.
//!
//! Flags override the options file, which overrides [`SceneOptions`]
//! defaults. Every flag can also be set through an `EASEL_*` variable.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::path::{Path, PathBuf};

use canvas::config::SceneOptions;
use clap::{ArgAction, Parser, ValueEnum};

use crate::error::CliError;

/// What to print once the scene has been rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// The scene payload as JSON.
    Json,
    /// A standalone SVG document.
    Svg,
    /// Drawing calls recorded on the scene surface, one per line.
    Ops,
}

#[derive(Parser, Debug)]
#[command(name = "easel", about = "Headless scene renderer and gesture replayer")]
pub struct Cli {
    /// Scene JSON to load.
    #[arg(env = "EASEL_SCENE")]
    pub scene: PathBuf,

    /// Scene options JSON (camelCase keys, every field optional).
    #[arg(long, env = "EASEL_OPTIONS")]
    pub options: Option<PathBuf>,

    /// Pointer/keyboard script to replay before rendering.
    #[arg(long, env = "EASEL_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Directory image sources resolve against; defaults to the scene's directory.
    #[arg(long, env = "EASEL_ASSETS")]
    pub assets: Option<PathBuf>,

    #[arg(long, value_enum, env = "EASEL_FORMAT", default_value_t = Format::Json)]
    pub format: Format,

    #[arg(long, env = "EASEL_WIDTH")]
    pub width: Option<f64>,

    #[arg(long, env = "EASEL_HEIGHT")]
    pub height: Option<f64>,

    #[arg(long, env = "EASEL_PIXEL_RATIO")]
    pub pixel_ratio: Option<f64>,

    /// Zoom applied around the top-left corner before replaying.
    #[arg(long, env = "EASEL_ZOOM")]
    pub zoom: Option<f64>,

    #[arg(long, env = "EASEL_BACKGROUND")]
    pub background: Option<String>,

    /// Repeat for more log output on stderr.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Root for image sources.
    #[must_use]
    pub fn asset_root(&self) -> PathBuf {
        match &self.assets {
            Some(dir) => dir.clone(),
            None => self.scene.parent().map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        }
    }

    /// Log level for the `-v` count.
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Apply flag overrides on top of `options` and validate the result.
    pub fn apply(&self, mut options: SceneOptions) -> Result<SceneOptions, CliError> {
        if let Some(width) = self.width {
            options.width = width;
        }
        if let Some(height) = self.height {
            options.height = height;
        }
        if let Some(ratio) = self.pixel_ratio {
            options.device_pixel_ratio = ratio;
        }
        if let Some(background) = &self.background {
            options.background_color = Some(background.clone());
        }
        options.validate()?;
        Ok(options)
    }
}

/// Read the options file, if any, and apply the flag overrides.
pub async fn scene_options(cli: &Cli) -> Result<SceneOptions, CliError> {
    let options = match &cli.options {
        Some(path) => SceneOptions::from_json(&read_text(path).await?)?,
        None => SceneOptions::default(),
    };
    cli.apply(options)
}

pub async fn read_text(path: &Path) -> Result<String, CliError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Read { path: path.to_path_buf(), source })
}
