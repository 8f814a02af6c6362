mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use common::setup_logging;
use labelmap::{LabelPipeline, diagnostic_overlay, load_gray, require_inputs, save_gray};
use log::{error, info};

use crate::config::load_config;

/// Transfers the labels of a small scan fragment into the frame of a large scan.
#[derive(Parser, Debug)]
#[command(name = "mapper", version, about)]
struct Args {
    /// Directory that relative image paths are resolved against
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Grayscale fragment the labels were drawn on
    #[arg(long, default_value = "small.tif")]
    small: PathBuf,

    /// Label raster aligned with the fragment, 0 is background
    #[arg(long, default_value = "small_inklabels.png")]
    labels: PathBuf,

    /// Grayscale image containing the fragment
    #[arg(long, default_value = "large.tif")]
    large: PathBuf,

    /// Mapped labels, rewritten after every cluster
    #[arg(long, default_value = "large_inklabels.png")]
    output: PathBuf,

    /// Large image with labeled pixels blanked, for visual checks
    #[arg(long, default_value = "large_inklabels_test.png")]
    diagnostic: PathBuf,

    /// Optional YAML pipeline config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `labelmap=debug`
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _logger = setup_logging(&args.log_level).context("Failed to start logging")?;

    let result = run(&args);
    if let Err(err) = &result {
        error!("{:#}", err);
    }
    result
}

fn run(args: &Args) -> Result<()> {
    let small_path = args.dir.join(&args.small);
    let labels_path = args.dir.join(&args.labels);
    let large_path = args.dir.join(&args.large);
    let output_path = args.dir.join(&args.output);
    let diagnostic_path = args.dir.join(&args.diagnostic);

    require_inputs(&[&small_path, &labels_path, &large_path])?;
    let config = load_config(args.config.as_deref())?;

    let small = load_gray(&small_path, true).context("Failed to load the small image")?;
    let labels = load_gray(&labels_path, false).context("Failed to load the labels")?;
    let large = load_gray(&large_path, true).context("Failed to load the large image")?;
    info!(
        "Small {}x{}, labels {}x{}, large {}x{}",
        small.width(),
        small.height(),
        labels.width(),
        labels.height(),
        large.width(),
        large.height()
    );

    let pipeline = LabelPipeline::new(config);
    let result = pipeline
        .run_with_sink(&large, &small, &labels, |progress| {
            save_gray(&output_path, progress.labels)?;
            Ok(())
        })
        .context("Label mapping failed")?;

    let mapped = result.clusters.iter().filter(|c| c.is_mapped()).count();
    info!(
        "Global orientation {:.3} degrees{}, {}/{} clusters mapped",
        result.global.angle,
        if result.global.flipped { " (mirrored)" } else { "" },
        mapped,
        result.clusters.len()
    );

    save_gray(&output_path, &result.labels)
        .with_context(|| format!("Failed to write '{}'", output_path.display()))?;
    save_gray(&diagnostic_path, &diagnostic_overlay(&large, &result.labels))
        .with_context(|| format!("Failed to write '{}'", diagnostic_path.display()))?;
    info!("Wrote {} and {}", output_path.display(), diagnostic_path.display());

    Ok(())
}
