//! Hardware glue for Amlogic Meson set-top boxes
//!
//! Everything here is a read or write of a small text value against a sysfs
//! node exposed by the Amlogic kernel drivers, interpreted through fixed
//! device-specific encodings.
//!
//! # Supported SoCs
//!
//! - Meson M1 (MESON-M1)
//! - Meson M3 (MESON-M3 / MESON3)
//! - Meson M6 (Meson6)
//! - Meson M8 (Meson8)
//!
//! # Example
//!
//! ```no_run
//! use aml_hal::{Platform, PlatformConfig, ResolutionInfo};
//!
//! fn main() -> aml_hal::Result<()> {
//!     let platform = Platform::from_config(&PlatformConfig::default());
//!     println!("Device: {}", platform.device_type());
//!
//!     let res = platform
//!         .mode_to_resolution("1080p24hz")
//!         .unwrap_or_default();
//!     println!("{}", res.label);
//!
//!     let fallback = ResolutionInfo::default();
//!     assert_eq!(fallback.width, 0);
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod config;
pub mod device;
pub mod display;
pub mod mock;
pub mod permissions;
pub mod platform;
pub mod power;
pub mod stereo;
pub mod sysfs;

pub use audio::HdmiAudioFormat;
pub use config::PlatformConfig;
pub use device::{CpuInfo, DeviceType, ProcCpuInfo};
pub use display::{DisplayAxis, ResolutionInfo};
pub use permissions::{PrivilegedOps, SuShell};
pub use platform::Platform;
pub use power::CpuGovernor;
pub use stereo::{StereoMode, StereoSettings, StereoView, VideoSettings};
pub use sysfs::{Sysfs, SysfsRoot};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AmlError {
    #[error("sysfs node unavailable: {path}")]
    NodeUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to change permissions of {path}: {reason}")]
    PermissionChange { path: String, reason: String },

    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// HAL Result type
pub type Result<T> = std::result::Result<T, AmlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_unavailable_message() {
        let err = AmlError::NodeUnavailable {
            path: "/sys/class/ppmgr/ppmgr_3d_mode".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(
            err.to_string(),
            "sysfs node unavailable: /sys/class/ppmgr/ppmgr_3d_mode"
        );
    }
}
