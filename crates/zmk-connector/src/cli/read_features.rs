//! `read_features` subcommand — capability report as JSON.

use zmk_connector_lib::output::FeaturesRecord;
use zmk_connector_lib::session;

use super::{DeviceIds, HidApiTransport, HidTransport, Result, Settings, output};

pub(super) fn cmd_read_features(settings: Settings, serial: &str) -> Result<()> {
    let transport = HidApiTransport::new()?;
    let json = read_features_json(&transport, settings.ids, serial, settings.pretty)?;
    println!("{json}");
    Ok(())
}

fn read_features_json(
    transport: &impl HidTransport,
    ids: DeviceIds,
    serial: &str,
    pretty: bool,
) -> Result<String> {
    let features = session::read_features(transport, ids, serial)?;
    output::render_json(&FeaturesRecord::from(features), pretty)
}
