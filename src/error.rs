//! Crate-level error and process exit codes

use crate::config::ConfigError;
use crate::device::DeviceError;

/// Any failure of a single invocation
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

impl Error {
    /// Process exit code for this failure. Never zero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config(ConfigError::Io { .. })
            | Error::Config(ConfigError::Parse(_))
            | Error::Config(ConfigError::InvalidDirective { .. })
            | Error::Config(ConfigError::InvalidRecord { .. }) => 2,
            Error::Config(ConfigError::Validation { .. })
            | Error::Config(ConfigError::Template { .. }) => 3,
            Error::Config(ConfigError::NotFound(_)) => 4,
            Error::Device(DeviceError::Environment { .. }) => 5,
            Error::Device(DeviceError::NotFound { .. }) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        let cases: Vec<(Error, i32)> = vec![
            (ConfigError::Parse("bad".into()).into(), 2),
            (
                ConfigError::Validation {
                    key: "name".into(),
                    identifier: "AA".into(),
                }
                .into(),
                3,
            ),
            (
                ConfigError::Template {
                    identifier: "AA".into(),
                    source: TemplateError::UnknownKey {
                        key: "x".into(),
                        template: "{x}".into(),
                    },
                }
                .into(),
                3,
            ),
            (ConfigError::NotFound("AA".into()).into(), 4),
            (
                DeviceError::Environment {
                    what: "ESPTOOL_BIN",
                    path: PathBuf::from("/x"),
                }
                .into(),
                5,
            ),
            (
                DeviceError::NotFound {
                    reason: "timeout".into(),
                }
                .into(),
                6,
            ),
        ];

        for (error, code) in cases {
            assert_eq!(error.exit_code(), code, "{error}");
        }
    }

    #[test]
    fn test_messages() {
        let err: Error = ConfigError::Validation {
            key: "ssid".into(),
            identifier: "AA:BB".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Invalid configuration. Key ssid is empty for AA:BB"
        );
    }
}
