//! `config` subcommand — show resolved configuration and file path.

use std::path::Path;

use super::{Config, ConfigOutput, Result, output};

pub(super) fn cmd_config(
    config: &Config,
    custom_path: Option<&Path>,
    init: bool,
    pretty: bool,
) -> Result<()> {
    let config_path = custom_path.map(|p| p.to_path_buf()).or_else(Config::path);
    let mut config_exists = config_path.as_ref().is_some_and(|p| p.exists());

    if init
        && !config_exists
        && let Some(path) = &config_path
    {
        config.save_to(path)?;
        log::info!("wrote default config to {}", path.display());
        config_exists = true;
    }

    let out = ConfigOutput {
        config_file: config_path.as_ref().map(|p| p.display().to_string()),
        config_file_exists: config_exists,
        settings: config.clone(),
    };
    println!("{}", output::render_json(&out, pretty)?);
    Ok(())
}
