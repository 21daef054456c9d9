//! Device family detection
//!
//! The SoC generation is read from the `Hardware` line of `/proc/cpuinfo`
//! and matched against a fixed table of identifier substrings.

use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::PathBuf;

/// Amlogic SoC family, ordered by generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Unknown,
    M1,
    M3,
    M6,
    M8,
}

impl DeviceType {
    /// Get display name
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Unknown => "unknown",
            DeviceType::M1 => "m1",
            DeviceType::M3 => "m3",
            DeviceType::M6 => "m6",
            DeviceType::M8 => "m8",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != DeviceType::Unknown
    }

    /// Check if this is a known family no newer than `family`
    pub fn is_at_most(&self, family: DeviceType) -> bool {
        self.is_known() && *self <= family
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hardware identifier substrings, first match wins
pub const DEVICE_PATTERNS: &[(&str, DeviceType)] = &[
    ("MESON-M1", DeviceType::M1),
    ("MESON-M3", DeviceType::M3),
    ("MESON3", DeviceType::M3),
    ("Meson6", DeviceType::M6),
    ("Meson8", DeviceType::M8),
];

/// Classify a CPU hardware identifier
pub fn classify(hardware: &str) -> DeviceType {
    DEVICE_PATTERNS
        .iter()
        .find(|(pattern, _)| hardware.contains(pattern))
        .map(|&(_, device_type)| device_type)
        .unwrap_or(DeviceType::Unknown)
}

/// Source of the CPU hardware identifier
pub trait CpuInfo {
    /// The SoC identifier, e.g. `Amlogic Meson8`
    fn hardware(&self) -> String;
}

impl CpuInfo for String {
    fn hardware(&self) -> String {
        self.clone()
    }
}

impl CpuInfo for &str {
    fn hardware(&self) -> String {
        (*self).to_string()
    }
}

/// Reads the `Hardware` key from a cpuinfo file
#[derive(Debug, Clone)]
pub struct ProcCpuInfo {
    path: PathBuf,
}

impl ProcCpuInfo {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Default for ProcCpuInfo {
    fn default() -> Self {
        Self::new("/proc/cpuinfo")
    }
}

impl CpuInfo for ProcCpuInfo {
    fn hardware(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(contents) => parse_hardware(&contents).unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.path.display(), e);
                String::new()
            }
        }
    }
}

/// Extract the `Hardware` value from cpuinfo text
fn parse_hardware(contents: &str) -> Option<String> {
    contents.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "Hardware").then(|| value.trim().to_string())
    })
}
