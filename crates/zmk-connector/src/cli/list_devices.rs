//! `list_devices` subcommand — JSON array of connected keyboards.

use zmk_connector_lib::directory;

use super::{DeviceIds, HidApiTransport, HidTransport, Result, Settings, output};

pub(super) fn cmd_list_devices(settings: Settings) -> Result<()> {
    let transport = HidApiTransport::new()?;
    let json = list_devices_json(&transport, settings.ids, settings.pretty)?;
    println!("{json}");
    Ok(())
}

fn list_devices_json(
    transport: &impl HidTransport,
    ids: DeviceIds,
    pretty: bool,
) -> Result<String> {
    let devices = directory::list_devices(transport, ids)?;
    log::debug!("{} device(s) after collapsing interfaces", devices.len());
    output::render_json(&output::device_records(devices), pretty)
}
