//! Identifier → resolved record → flags

use crate::config::ConfigStore;
use crate::device::DeviceIdentifier;
use crate::error::Error;

/// Resolve the flags for whichever board `device` reports.
pub fn resolve_flags(store: &ConfigStore, device: &dyn DeviceIdentifier) -> Result<String, Error> {
    let identifier = device.read_identifier()?;
    let config = store.get_for(&identifier)?;
    tracing::info!(
        identifier = %config.identifier(),
        keys = config.len(),
        "rendering build flags"
    );
    Ok(store.render_flags(config))
}
