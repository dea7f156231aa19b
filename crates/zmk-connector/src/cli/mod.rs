//! CLI subcommands — device listing, capability and key reads, config.

mod config_cmd;
mod list_devices;
mod read_features;
mod read_key;

use std::path::{Path, PathBuf};

use clap::Subcommand;
use serde::Serialize;

pub(super) use zmk_connector_lib::ConnectorError;
pub(super) use zmk_connector_lib::config::Config;
pub(super) use zmk_connector_lib::error::Result;
pub(super) use zmk_connector_lib::output;
pub(super) use zmk_connector_lib::transport::{DeviceIds, HidApiTransport, HidTransport};

/// Command-line values that take precedence over the config file.
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub pretty: bool,
}

/// Config file values with command-line overrides applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Settings {
    pub ids: DeviceIds,
    pub pretty: bool,
}

/// Parse a 16-bit hex value, with or without a `0x` prefix.
pub fn parse_hex_u16(s: &str) -> std::result::Result<u16, String> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid hex ID '{s}': {e}"))
}

pub(super) fn load_config(custom_path: Option<&Path>) -> Config {
    match custom_path {
        Some(path) => {
            let (config, warnings) = Config::load_from(path);
            for w in &warnings {
                log::warn!("{w}");
            }
            config
        }
        None => Config::load(),
    }
}

/// Merge config and overrides, then validate.
pub(super) fn resolve(config: &Config, overrides: &Overrides) -> Result<Settings> {
    let merged = Config {
        vendor_id: overrides.vid.unwrap_or(config.vendor_id),
        product_id: overrides.pid.unwrap_or(config.product_id),
        pretty: overrides.pretty || config.pretty,
    };
    if let Err(errors) = merged.validate() {
        let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        return Err(ConnectorError::Config(msgs.join("; ")));
    }
    Ok(Settings {
        ids: merged.device_ids(),
        pretty: merged.pretty,
    })
}

// ── JSON output structs ──

#[derive(Serialize)]
pub(super) struct ConfigOutput {
    pub config_file: Option<String>,
    pub config_file_exists: bool,
    pub settings: Config,
}

#[derive(Subcommand)]
pub enum Command {
    /// List all connected devices in a JSON array
    #[command(name = "list_devices")]
    ListDevices,

    /// Read the feature report of the keyboard with the given serial
    #[command(name = "read_features")]
    ReadFeatures {
        /// Device serial (from list_devices)
        serial: String,
    },

    /// Read the binding of one key from the keyboard with the given serial
    #[command(name = "read_key")]
    ReadKey {
        /// Device serial (from list_devices)
        serial: String,
        /// Layer index
        layer: u8,
        /// Key index within the layer
        key_idx: u8,
    },

    /// Show the resolved configuration and config file path
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

pub fn run(cmd: Command, overrides: Overrides) -> Result<()> {
    let config = load_config(overrides.config.as_deref());
    let settings = resolve(&config, &overrides)?;
    match cmd {
        Command::ListDevices => list_devices::cmd_list_devices(settings),
        Command::ReadFeatures { serial } => read_features::cmd_read_features(settings, &serial),
        Command::ReadKey {
            serial,
            layer,
            key_idx,
        } => read_key::cmd_read_key(settings, &serial, layer, key_idx),
        Command::Config { init } => {
            config_cmd::cmd_config(&config, overrides.config.as_deref(), init, settings.pretty)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_overrides() -> Overrides {
        Overrides {
            config: None,
            vid: None,
            pid: None,
            pretty: false,
        }
    }

    #[test]
    fn parse_hex_accepts_prefix_and_bare() {
        assert_eq!(parse_hex_u16("1d50"), Ok(0x1d50));
        assert_eq!(parse_hex_u16("0x615E"), Ok(0x615e));
        assert_eq!(parse_hex_u16("0XFFFF"), Ok(0xffff));
    }

    #[test]
    fn parse_hex_rejects_garbage_and_overflow() {
        assert!(parse_hex_u16("zz").is_err());
        assert!(parse_hex_u16("10000").is_err());
        assert!(parse_hex_u16("").is_err());
    }

    #[test]
    fn resolve_uses_config_without_overrides() {
        let config = Config {
            vendor_id: 0x1209,
            product_id: 0x0002,
            pretty: true,
        };
        let s = resolve(&config, &no_overrides()).unwrap();
        assert_eq!(s.ids.vendor_id, 0x1209);
        assert_eq!(s.ids.product_id, 0x0002);
        assert!(s.pretty);
    }

    #[test]
    fn resolve_overrides_win() {
        let overrides = Overrides {
            vid: Some(0xAAAA),
            pretty: true,
            ..no_overrides()
        };
        let s = resolve(&Config::default(), &overrides).unwrap();
        assert_eq!(s.ids.vendor_id, 0xAAAA);
        assert_eq!(s.ids.product_id, 0x615e);
        assert!(s.pretty);
    }

    #[test]
    fn resolve_rejects_zero_ids() {
        let overrides = Overrides {
            pid: Some(0),
            ..no_overrides()
        };
        let err = resolve(&Config::default(), &overrides).unwrap_err();
        assert!(matches!(err, ConnectorError::Config(_)));
        assert!(err.to_string().contains("product_id"));
    }

    #[test]
    fn config_output_has_expected_fields() {
        let output = ConfigOutput {
            config_file: Some("/tmp/config.toml".into()),
            config_file_exists: false,
            settings: Config::default(),
        };
        let json = serde_json::to_value(&output).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 3, "ConfigOutput should have 3 fields");
        assert_eq!(json["settings"]["vendor_id"], 0x1d50);
    }
}
