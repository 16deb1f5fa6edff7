//! `easel`: load a scene, optionally replay input, render one frame, print it.

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

mod config;
mod error;
mod loader;
mod replay;

use std::io::Write;

use canvas::display_list::{RecordingFactory, RecordingSurface};
use canvas::engine::EngineCore;
use canvas::scene::Scene;
use canvas::serialize::{load_from_json, to_json};
use canvas::svg::to_svg;
use clap::Parser;
use tracing::{info, warn};

use crate::config::{Cli, Format, read_text, scene_options};
use crate::error::CliError;
use crate::loader::FileImageLoader;

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(cli.log_level()).init();

    let output = run(&cli).await?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{output}").map_err(CliError::Write)?;
    Ok(())
}

/// Everything but printing, so the pipeline can be tested.
async fn run(cli: &Cli) -> Result<String, CliError> {
    let options = scene_options(cli).await?;
    let mut scene = Scene::new(options, Box::new(RecordingFactory::new()))?;

    let raw = read_text(&cli.scene).await?;
    let loader = FileImageLoader::new(cli.asset_root());
    let count = load_from_json(&mut scene, &raw, &loader).await?;
    info!(scene = %cli.scene.display(), objects = count, "scene loaded");
    if let Some(background) = &cli.background {
        scene.set_background_color(Some(background.clone()));
    }
    if let Some(zoom) = cli.zoom {
        scene.set_zoom(zoom);
    }

    let mut engine = EngineCore::new(scene);
    if let Some(path) = &cli.script {
        let steps = replay::parse_script(&read_text(path).await?)?;
        let report = replay::replay(&mut engine, &steps)?;
        if report.modified == 0 {
            warn!(steps = report.steps, "script modified no objects");
        }
    }

    engine.scene.request_render_all();
    engine.render()?;
    render_output(&engine.scene, cli.format)
}

fn render_output(scene: &Scene, format: Format) -> Result<String, CliError> {
    match format {
        Format::Json => Ok(to_json(scene)?),
        Format::Svg => Ok(to_svg(scene, None)),
        Format::Ops => {
            let ops = scene
                .lower()
                .as_any()
                .downcast_ref::<RecordingSurface>()
                .map(|surface| surface.recording().ops().iter().map(|op| format!("{op:?}")).collect::<Vec<_>>())
                .unwrap_or_default();
            Ok(ops.join("\n"))
        }
    }
}
