//! Mock implementations for testing without Amlogic hardware
//!
//! Handles share their state, so a test can keep a clone of a mock after
//! handing it to a [`Platform`](crate::Platform) and inspect what the
//! policies did.
//!
//! # Usage
//!
//! ```
//! use aml_hal::mock::MockSysfs;
//! use aml_hal::{Platform, StereoMode, StereoView, VideoSettings};
//!
//! let sysfs = MockSysfs::new();
//! sysfs.set_node("/sys/class/amhdmitx/amhdmitx0/disp_cap_3d", "SidebySide");
//!
//! let platform = Platform::new(sysfs.clone(), "Amlogic Meson8");
//! platform.apply_stereo_mode(
//!     StereoMode::SplitVertical,
//!     StereoView::Off,
//!     &VideoSettings::default(),
//! );
//! assert_eq!(
//!     sysfs.node("/sys/class/amhdmitx/amhdmitx0/config").as_deref(),
//!     Some("3dlr")
//! );
//! ```

use crate::device::CpuInfo;
use crate::permissions::PrivilegedOps;
use crate::sysfs::Sysfs;
use crate::{AmlError, Result};
use std::collections::HashMap;
use std::io;
use std::sync::{Arc, RwLock};

/// Shared mock sysfs state
#[derive(Debug, Default)]
pub struct MockState {
    /// Node contents by path
    pub nodes: HashMap<String, String>,
    /// Every write, in order
    pub writes: Vec<(String, String)>,
}

/// In-memory sysfs
#[derive(Debug, Clone, Default)]
pub struct MockSysfs {
    state: Arc<RwLock<MockState>>,
}

impl MockSysfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a node without recording a write
    pub fn set_node(&self, path: &str, value: &str) {
        if let Ok(mut state) = self.state.write() {
            state.nodes.insert(path.to_string(), value.to_string());
        }
    }

    /// Remove a node so reads fail
    pub fn remove_node(&self, path: &str) {
        if let Ok(mut state) = self.state.write() {
            state.nodes.remove(path);
        }
    }

    /// Current contents of a node
    pub fn node(&self, path: &str) -> Option<String> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.nodes.get(path).cloned())
    }

    /// Writes recorded so far
    pub fn writes(&self) -> Vec<(String, String)> {
        self.state
            .read()
            .map(|s| s.writes.clone())
            .unwrap_or_default()
    }

    pub fn write_count(&self) -> usize {
        self.state.read().map(|s| s.writes.len()).unwrap_or(0)
    }

    /// Get shared state for manipulation in tests
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        Arc::clone(&self.state)
    }
}

impl Sysfs for MockSysfs {
    fn read_bytes(&self, path: &str, limit: usize) -> io::Result<Vec<u8>> {
        let state = self
            .state
            .read()
            .map_err(|_| io::Error::other("mock state poisoned"))?;
        let value = state
            .nodes
            .get(path)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;

        let bytes = value.as_bytes();
        Ok(bytes[..bytes.len().min(limit)].to_vec())
    }

    fn write_bytes(&self, path: &str, value: &[u8]) -> io::Result<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| io::Error::other("mock state poisoned"))?;
        let value = String::from_utf8_lossy(value).into_owned();
        state.nodes.insert(path.to_string(), value.clone());
        state.writes.push((path.to_string(), value));
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CpuState {
    hardware: String,
    reads: usize,
}

/// Scripted CPU identifier that counts how often it is queried
#[derive(Debug, Clone, Default)]
pub struct MockCpuInfo {
    state: Arc<RwLock<CpuState>>,
}

impl MockCpuInfo {
    pub fn new(hardware: &str) -> Self {
        Self {
            state: Arc::new(RwLock::new(CpuState {
                hardware: hardware.to_string(),
                reads: 0,
            })),
        }
    }

    pub fn set_hardware(&self, hardware: &str) {
        if let Ok(mut state) = self.state.write() {
            state.hardware = hardware.to_string();
        }
    }

    pub fn reads(&self) -> usize {
        self.state.read().map(|s| s.reads).unwrap_or(0)
    }
}

impl CpuInfo for MockCpuInfo {
    fn hardware(&self) -> String {
        match self.state.write() {
            Ok(mut state) => {
                state.reads += 1;
                state.hardware.clone()
            }
            Err(_) => String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct PrivilegedState {
    chmods: Vec<(String, u32)>,
    failing: Vec<String>,
}

/// Records privileged operations instead of running them
#[derive(Debug, Clone, Default)]
pub struct MockPrivileged {
    superuser: bool,
    state: Arc<RwLock<PrivilegedState>>,
}

impl MockPrivileged {
    pub fn new(superuser: bool) -> Self {
        Self {
            superuser,
            state: Arc::default(),
        }
    }

    /// Make `chmod` on `path` fail (after recording it)
    pub fn fail_on(&self, path: &str) {
        if let Ok(mut state) = self.state.write() {
            state.failing.push(path.to_string());
        }
    }

    /// Recorded `(path, mode)` pairs
    pub fn chmods(&self) -> Vec<(String, u32)> {
        self.state
            .read()
            .map(|s| s.chmods.clone())
            .unwrap_or_default()
    }
}

impl PrivilegedOps for MockPrivileged {
    fn has_superuser(&self) -> bool {
        self.superuser
    }

    fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        let Ok(mut state) = self.state.write() else {
            return Ok(());
        };
        state.chmods.push((path.to_string(), mode));
        tracing::debug!("[MOCK] chmod {:o} {}", mode, path);

        if state.failing.iter().any(|p| p == path) {
            return Err(AmlError::PermissionChange {
                path: path.to_string(),
                reason: "mock failure".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_sysfs_read_write() {
        let sysfs = MockSysfs::new();
        assert!(sysfs.get_str("/sys/class/display/mode", 256).is_err());

        sysfs.set_node("/sys/class/display/mode", "720p");
        assert_eq!(sysfs.get_str("/sys/class/display/mode", 256).unwrap(), "720p");
        assert_eq!(sysfs.write_count(), 0);

        sysfs.set_str("/sys/class/display/mode", "1080p").unwrap();
        assert_eq!(sysfs.node("/sys/class/display/mode").as_deref(), Some("1080p"));
        assert_eq!(
            sysfs.writes(),
            vec![("/sys/class/display/mode".to_string(), "1080p".to_string())]
        );
    }

    #[test]
    fn test_mock_sysfs_read_limit() {
        let sysfs = MockSysfs::new();
        sysfs.set_node("/node", "0123456789");
        assert_eq!(sysfs.get_str("/node", 5).unwrap(), "0123");
    }

    #[test]
    fn test_mock_sysfs_shared_between_clones() {
        let sysfs = MockSysfs::new();
        let clone = sysfs.clone();
        clone.set_int("/sys/class/audiodsp/digital_raw", 2).unwrap();
        assert_eq!(sysfs.get_int("/sys/class/audiodsp/digital_raw").unwrap(), 2);
        assert_eq!(sysfs.state().read().unwrap().writes.len(), 1);
    }

    #[test]
    fn test_mock_cpu_info() {
        let cpu = MockCpuInfo::new("Amlogic Meson6");
        assert_eq!(cpu.hardware(), "Amlogic Meson6");
        assert_eq!(cpu.reads(), 1);
    }

    #[test]
    fn test_mock_privileged() {
        let ops = MockPrivileged::new(true);
        ops.fail_on("/dev/amvideo");

        assert!(ops.chmod("/dev/amvideo", 0o666).is_err());
        assert!(ops.chmod("/sys/class/video/axis", 0o666).is_ok());
        assert_eq!(ops.chmods().len(), 2);
    }
}
