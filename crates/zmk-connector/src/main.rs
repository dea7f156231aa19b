//! zmk-connector — read capability and key data from ZMK keyboards.
//!
//! Every command prints one JSON document on stdout. Diagnostics and logs
//! go to stderr.

use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;
use zmk_connector_lib::error::exit_code;

mod cli;

#[derive(Parser)]
#[command(
    name = "zmk-connector",
    version,
    about = "Interact with ZMK keyboards over the HID settings interface",
    arg_required_else_help = true
)]
struct Args {
    /// Indent JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Enable debug logging (report bytes, device matching)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// USB vendor ID override, hex (e.g. 1d50)
    #[arg(long, global = true, value_parser = cli::parse_hex_u16)]
    vid: Option<u16>,

    /// USB product ID override, hex (e.g. 615e)
    #[arg(long, global = true, value_parser = cli::parse_hex_u16)]
    pid: Option<u16>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => exit_code::INVALID_ARGUMENT,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let overrides = cli::Overrides {
        config: args.config,
        vid: args.vid,
        pid: args.pid,
        pretty: args.pretty,
    };

    if let Err(e) = cli::run(args.command, overrides) {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
