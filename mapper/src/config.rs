use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use labelmap::PipelineConfig;
use log::info;

/// Reads and checks a YAML pipeline config. Missing fields keep their
/// defaults, and no path at all gives the default config.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let yaml = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config '{}'", path.display()))?;
    let config: PipelineConfig = serde_yml::from_str(&yaml)
        .with_context(|| format!("Failed to parse config '{}'", path.display()))?;
    config
        .try_validate()
        .with_context(|| format!("Rejected config '{}'", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}
