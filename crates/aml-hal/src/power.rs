//! CPU frequency governance
//!
//! Older Meson parts need their minimum frequency raised during playback,
//! and the M6 HDMI sticks (no Ethernet) overheat at 1GHz.

use crate::device::DeviceType;
use crate::platform::Platform;
use crate::sysfs::Sysfs;

#[cfg_attr(target_os = "android", allow(dead_code))]
const SCALING_MIN_FREQ: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_min_freq";
const SCALING_MAX_FREQ: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_max_freq";
const SCALING_GOVERNOR: &str = "/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor";

/// CPU governor (performance profile)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuGovernor {
    Performance,
    Powersave,
    Ondemand,
    Interactive,
    Conservative,
}

impl CpuGovernor {
    /// Get sysfs name
    pub fn as_str(&self) -> &'static str {
        match self {
            CpuGovernor::Performance => "performance",
            CpuGovernor::Powersave => "powersave",
            CpuGovernor::Ondemand => "ondemand",
            CpuGovernor::Interactive => "interactive",
            CpuGovernor::Conservative => "conservative",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "performance" => Some(CpuGovernor::Performance),
            "powersave" => Some(CpuGovernor::Powersave),
            "ondemand" => Some(CpuGovernor::Ondemand),
            "interactive" => Some(CpuGovernor::Interactive),
            "conservative" => Some(CpuGovernor::Conservative),
            _ => None,
        }
    }
}

impl<S: Sysfs> Platform<S> {
    /// Raise (`limit`) or restore the minimum CPU frequency on M1/M3.
    ///
    /// Android manages `scaling_min_freq` itself, so this does nothing there.
    pub fn cpufreq_min(&self, limit: bool) {
        #[cfg(not(target_os = "android"))]
        {
            if !self.device_type().is_at_most(DeviceType::M3) {
                return;
            }

            let khz = if limit { 600_000 } else { 300_000 };
            tracing::debug!("cpufreq_min: {} kHz", khz);
            if let Err(e) = self.sysfs.set_int(SCALING_MIN_FREQ, khz) {
                tracing::warn!("Failed to set minimum CPU frequency: {}", e);
            }
        }

        #[cfg(target_os = "android")]
        let _ = limit;
    }

    /// Cap (`limit`) or restore the maximum CPU frequency on M6 sticks
    pub fn cpufreq_max(&self, limit: bool) {
        if self.wired_present() || self.device_type() != DeviceType::M6 {
            return;
        }

        let khz = if limit { 800_000 } else { 1_000_000 };
        tracing::debug!("cpufreq_max: {} kHz", khz);
        if let Err(e) = self.sysfs.set_int(SCALING_MAX_FREQ, khz) {
            tracing::warn!("Failed to set maximum CPU frequency: {}", e);
        }
        if let Err(e) = self
            .sysfs
            .set_str(SCALING_GOVERNOR, CpuGovernor::Ondemand.as_str())
        {
            tracing::warn!("Failed to set CPU governor: {}", e);
        }
    }

    /// Read the current governor
    pub fn governor(&self) -> Option<CpuGovernor> {
        self.sysfs
            .get_str(SCALING_GOVERNOR, 32)
            .ok()
            .and_then(|s| CpuGovernor::parse(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSysfs;

    const ETH0_OPERSTATE: &str = "/sys/class/net/eth0/operstate";

    #[test]
    fn test_cpu_governor_str() {
        assert_eq!(CpuGovernor::Ondemand.as_str(), "ondemand");
        assert_eq!(CpuGovernor::Interactive.as_str(), "interactive");
    }

    #[test]
    fn test_cpu_governor_parse() {
        assert_eq!(CpuGovernor::parse("ondemand\n"), Some(CpuGovernor::Ondemand));
        assert_eq!(CpuGovernor::parse("schedutil"), None);
    }

    #[cfg(not(target_os = "android"))]
    #[test]
    fn test_cpufreq_min_old_families() {
        for (hardware, limited, expected) in [
            ("Amlogic MESON-M1", true, "600000"),
            ("Amlogic MESON3", false, "300000"),
        ] {
            let sysfs = MockSysfs::new();
            let platform = Platform::new(sysfs.clone(), hardware);
            platform.cpufreq_min(limited);
            assert_eq!(sysfs.node(SCALING_MIN_FREQ).as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_cpufreq_min_skips_newer_families() {
        for hardware in ["Amlogic Meson6", "Amlogic Meson8", "unknown"] {
            let sysfs = MockSysfs::new();
            let platform = Platform::new(sysfs.clone(), hardware);
            platform.cpufreq_min(true);
            assert_eq!(sysfs.write_count(), 0);
        }
    }

    #[test]
    fn test_cpufreq_max_m6_stick() {
        let sysfs = MockSysfs::new();
        let platform = Platform::new(sysfs.clone(), "Amlogic Meson6");

        platform.cpufreq_max(true);
        assert_eq!(sysfs.node(SCALING_MAX_FREQ).as_deref(), Some("800000"));
        assert_eq!(sysfs.node(SCALING_GOVERNOR).as_deref(), Some("ondemand"));
        assert_eq!(platform.governor(), Some(CpuGovernor::Ondemand));

        platform.cpufreq_max(false);
        assert_eq!(sysfs.node(SCALING_MAX_FREQ).as_deref(), Some("1000000"));
    }

    #[test]
    fn test_cpufreq_max_skips_wired_m6() {
        let sysfs = MockSysfs::new();
        sysfs.set_node(ETH0_OPERSTATE, "up");
        let platform = Platform::new(sysfs.clone(), "Amlogic Meson6");

        platform.cpufreq_max(true);
        assert_eq!(sysfs.write_count(), 0);
    }

    #[test]
    fn test_cpufreq_max_skips_other_families() {
        for hardware in ["Amlogic Meson8", "Amlogic MESON-M1", "unknown"] {
            let sysfs = MockSysfs::new();
            let platform = Platform::new(sysfs.clone(), hardware);
            platform.cpufreq_max(true);
            assert_eq!(sysfs.write_count(), 0);
        }
    }
}
