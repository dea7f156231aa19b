//! `read_key` subcommand — one key binding as JSON.

use zmk_connector_lib::output::KeyDataRecord;
use zmk_connector_lib::session;

use super::{DeviceIds, HidApiTransport, HidTransport, Result, Settings, output};

pub(super) fn cmd_read_key(
    settings: Settings,
    serial: &str,
    layer: u8,
    key_idx: u8,
) -> Result<()> {
    let transport = HidApiTransport::new()?;
    let json = read_key_json(
        &transport,
        settings.ids,
        serial,
        layer,
        key_idx,
        settings.pretty,
    )?;
    println!("{json}");
    Ok(())
}

fn read_key_json(
    transport: &impl HidTransport,
    ids: DeviceIds,
    serial: &str,
    layer: u8,
    key_idx: u8,
    pretty: bool,
) -> Result<String> {
    let data = session::read_key(transport, ids, serial, layer, key_idx)?;
    output::render_json(&KeyDataRecord::from(data), pretty)
}
