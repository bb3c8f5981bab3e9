mod audio;
mod cli;
mod config;
mod encode;
mod error;
mod pipeline;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use cli::Cli;
use config::RenderConfig;
use pipeline::Pipeline;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let file_config = config::load_file_config(cli.config.as_deref())?;
    let render_config = RenderConfig::resolve(&cli, &file_config);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} frames ({eta} remaining)")
            .context("invalid progress bar template")?
            .progress_chars("=>-"),
    );

    let pipeline = Pipeline::new(render_config)
        .context("Invalid configuration")?
        .with_progress(pb);

    let cfg = pipeline.config();
    log::info!("sonogram - audio spectrogram video renderer");
    log::info!("Input: {}", cli.input.display());
    log::info!("Output: {}", cli.output.display());
    log::info!(
        "Resolution: {}x{} @ {}fps, frame size {}, colors {:?}",
        cfg.width,
        cfg.height,
        cfg.fps,
        cfg.frame_size,
        cfg.color_scheme
    );
    if cfg.parallel {
        log::info!("Rendering frames in parallel");
    }

    let summary = pipeline
        .run(&cli.input, &cli.output)
        .with_context(|| format!("Failed to render {}", cli.input.display()))?;

    log::info!(
        "Done! {} frames, {:.1}s @ {}Hz. Output: {}",
        summary.frames,
        summary.duration,
        summary.sample_rate,
        summary.output.display()
    );
    Ok(())
}
