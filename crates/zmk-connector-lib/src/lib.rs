//! zmk-connector — host-side client for the ZMK HID settings protocol.

pub mod config;
pub mod directory;
pub mod error;
pub mod output;
pub mod protocol;
pub mod report;
pub mod session;
pub mod text;
pub mod transport;

pub use error::ConnectorError;
