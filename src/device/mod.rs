//! Attached device discovery
//!
//! The configuration engine only needs an identifier string. Everything
//! about talking to the board lives behind [`DeviceIdentifier`].

mod esptool;

use std::path::PathBuf;

pub use esptool::{EspTool, ToolPaths, DEFAULT_TIMEOUT_SECS};

/// Marker of the identifier line in `esptool.py read_mac` output
pub const MAC_MARKER: &str = "MAC:";

/// Device discovery errors
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("{what} ({}) not found", path.display())]
    Environment { what: &'static str, path: PathBuf },

    #[error("Can not identify mac address: {reason}")]
    NotFound { reason: String },
}

/// Source of the hardware identifier of the attached board
pub trait DeviceIdentifier {
    /// Read the identifier, uppercased.
    fn read_identifier(&self) -> Result<String, DeviceError>;
}

/// An identifier supplied up front, bypassing discovery
#[derive(Debug, Clone)]
pub struct FixedIdentifier(String);

impl FixedIdentifier {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }
}

impl DeviceIdentifier for FixedIdentifier {
    fn read_identifier(&self) -> Result<String, DeviceError> {
        let identifier = self.0.trim();
        if identifier.is_empty() {
            return Err(DeviceError::NotFound {
                reason: "empty identifier given".to_string(),
            });
        }
        Ok(identifier.to_uppercase())
    }
}

/// Extract the identifier from inspection tool output.
///
/// The last line starting with `MAC:` wins.
pub fn parse_identifier(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.strip_prefix(MAC_MARKER))
        .map(|rest| rest.trim().to_uppercase())
        .filter(|mac| !mac.is_empty())
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;

    const READ_MAC_OUTPUT: &str = "\
esptool.py v3.0
Found 1 serial ports
Serial port /dev/ttyUSB0
Connecting....
Detecting chip type... ESP8266
Chip is ESP8266EX
Features: WiFi
Crystal is 26MHz
MAC: 5c:cf:7f:12:34:56
Uploading stub...
Hard resetting via RTS pin...
";

    #[test]
    fn test_parse_identifier() {
        assert_eq!(
            parse_identifier(READ_MAC_OUTPUT),
            Some("5C:CF:7F:12:34:56".to_string())
        );
    }

    #[test]
    fn test_parse_identifier_last_wins() {
        let output = "MAC: aa:aa:aa:aa:aa:aa\nMAC: bb:bb:bb:bb:bb:bb\n";
        assert_eq!(parse_identifier(output), Some("BB:BB:BB:BB:BB:BB".to_string()));
    }

    #[test]
    fn test_parse_identifier_missing() {
        assert_eq!(parse_identifier("A fatal error occurred: Failed to connect"), None);
        assert_eq!(parse_identifier("MAC:   \n"), None);
        // Marker must start the line
        assert_eq!(parse_identifier("BASE MAC: aa:bb"), None);
    }

    #[test]
    fn test_fixed_identifier() {
        let id = FixedIdentifier::new(" aa:bb:cc ");
        assert_eq!(id.read_identifier().unwrap(), "AA:BB:CC");

        let empty = FixedIdentifier::new("");
        assert!(matches!(empty.read_identifier(), Err(DeviceError::NotFound { .. })));
    }
}
