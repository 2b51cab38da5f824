//! ESP build flags
//!
//! Resolves the configuration of the board currently attached to the build
//! machine from `config.toml` and renders it as `-D` compiler definitions for
//! PlatformIO's `build_flags`.

pub mod config;
pub mod device;
pub mod error;
pub mod flags;
pub mod pipeline;

pub use config::{ConfigError, ConfigStore, Directives, RawDocument, ResolvedConfig, TemplateError};
pub use device::{DeviceError, DeviceIdentifier, EspTool, FixedIdentifier, ToolPaths};
pub use error::Error;
pub use flags::Flag;
pub use pipeline::resolve_flags;
