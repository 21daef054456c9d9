//! Platform context
//!
//! Holds the sysfs backend, the CPU identifier source, and every value the
//! policies cache for the lifetime of the process. Probes are computed on
//! first use and never re-read; there is no hot-plug handling.

use crate::config::PlatformConfig;
use crate::device::{self, CpuInfo, DeviceType, ProcCpuInfo};
use crate::stereo::StereoMode;
use crate::sysfs::{Sysfs, SysfsRoot};
use std::cell::{Cell, OnceCell};

const AUDIODSP_DIGITAL_RAW: &str = "/sys/class/audiodsp/digital_raw";
const PPMGR_3D_MODE: &str = "/sys/class/ppmgr/ppmgr_3d_mode";
const ETH0_OPERSTATE: &str = "/sys/class/net/eth0/operstate";

/// Amlogic platform handle.
///
/// Caches live in `Cell`s, so a `Platform` is meant to be owned by a single
/// control thread.
pub struct Platform<S: Sysfs = SysfsRoot> {
    pub(crate) sysfs: S,
    cpu_info: Box<dyn CpuInfo>,
    device_type: OnceCell<DeviceType>,
    present: OnceCell<bool>,
    hw3d_present: OnceCell<bool>,
    wired_present: OnceCell<bool>,
    pub(crate) stereo_caps: Cell<Option<(StereoMode, bool)>>,
    pub(crate) last_stereo_mode: Cell<Option<StereoMode>>,
    pub(crate) last_stereo_invert: Cell<bool>,
}

impl Platform<SysfsRoot> {
    /// Create a platform for the real device described by `config`
    pub fn from_config(config: &PlatformConfig) -> Self {
        Self::new(
            SysfsRoot::new(config.sysfs_root.clone()),
            ProcCpuInfo::new(config.cpuinfo_path.clone()),
        )
    }
}

impl<S: Sysfs> Platform<S> {
    pub fn new(sysfs: S, cpu_info: impl CpuInfo + 'static) -> Self {
        Self {
            sysfs,
            cpu_info: Box::new(cpu_info),
            device_type: OnceCell::new(),
            present: OnceCell::new(),
            hw3d_present: OnceCell::new(),
            wired_present: OnceCell::new(),
            stereo_caps: Cell::new(None),
            last_stereo_mode: Cell::new(None),
            last_stereo_invert: Cell::new(false),
        }
    }

    /// Get the sysfs backend
    pub fn sysfs(&self) -> &S {
        &self.sysfs
    }

    /// Check if this is Amlogic hardware
    pub fn aml_present(&self) -> bool {
        *self.present.get_or_init(|| match self.sysfs.get_int(AUDIODSP_DIGITAL_RAW) {
            Ok(raw) => {
                tracing::info!("aml_present, rtn({})", raw);
                true
            }
            Err(_) => false,
        })
    }

    /// Check if the 3D picture-processing manager is available
    pub fn hw3d_present(&self) -> bool {
        *self
            .hw3d_present
            .get_or_init(|| self.sysfs.get_int(PPMGR_3D_MODE).is_ok())
    }

    /// Check if a wired Ethernet interface exists
    pub fn wired_present(&self) -> bool {
        *self
            .wired_present
            .get_or_init(|| self.sysfs.get_str(ETH0_OPERSTATE, 64).is_ok())
    }

    /// SoC family, classified once from the CPU hardware identifier
    pub fn device_type(&self) -> DeviceType {
        *self.device_type.get_or_init(|| {
            let hardware = self.cpu_info.hardware();
            let device_type = device::classify(&hardware);
            tracing::info!("Detected device type {} from '{}'", device_type, hardware);
            device_type
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCpuInfo, MockSysfs};

    #[test]
    fn test_presence_probes() {
        let sysfs = MockSysfs::new();
        sysfs.set_node(AUDIODSP_DIGITAL_RAW, "0");
        sysfs.set_node(ETH0_OPERSTATE, "up");

        let platform = Platform::new(sysfs, "Amlogic Meson6");
        assert!(platform.aml_present());
        assert!(!platform.hw3d_present());
        assert!(platform.wired_present());
    }

    #[test]
    fn test_probes_are_cached() {
        let sysfs = MockSysfs::new();
        let platform = Platform::new(sysfs.clone(), "Amlogic Meson6");
        assert!(!platform.aml_present());
        assert!(!platform.hw3d_present());

        sysfs.set_node(AUDIODSP_DIGITAL_RAW, "2");
        sysfs.set_node(PPMGR_3D_MODE, "0x0");
        assert!(!platform.aml_present());
        assert!(!platform.hw3d_present());
    }

    #[test]
    fn test_device_type_read_once() {
        let cpu = MockCpuInfo::new("Amlogic Meson8");
        let platform = Platform::new(MockSysfs::new(), cpu.clone());

        assert_eq!(platform.device_type(), DeviceType::M8);
        cpu.set_hardware("Amlogic MESON-M1");
        assert_eq!(platform.device_type(), DeviceType::M8);
        assert_eq!(cpu.reads(), 1);
    }

    #[test]
    fn test_unknown_device() {
        let platform = Platform::new(MockSysfs::new(), "Rockchip RK3566");
        assert_eq!(platform.device_type(), DeviceType::Unknown);
    }
}
