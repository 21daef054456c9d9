//! Device node permission fix-up
//!
//! Some firmware ships the video and audio nodes as 0664, which keeps an
//! unprivileged player from driving them. Most boxes are rooted, so the
//! nodes are widened through `su`.

use crate::platform::Platform;
use crate::sysfs::Sysfs;
use crate::{AmlError, Result};
use std::path::PathBuf;
use std::process::Command;

/// Nodes the player needs read/write access to
pub const PLAYBACK_NODES: &[&str] = &[
    "/dev/amvideo",
    "/dev/amstream*",
    "/sys/class/video/axis",
    "/sys/class/video/screen_mode",
    "/sys/class/video/disable_video",
    "/sys/class/tsync/pts_pcrscr",
    "/sys/class/audiodsp/digital_raw",
    "/sys/class/ppmgr/ppmgr_3d_mode",
    "/sys/devices/system/cpu/cpu0/cpufreq/scaling_min_freq",
    "/sys/devices/system/cpu/cpu0/cpufreq/scaling_max_freq",
    "/sys/devices/system/cpu/cpu0/cpufreq/scaling_governor",
];

/// Mode applied to every playback node
pub const PLAYBACK_MODE: u32 = 0o666;

/// Operations that need superuser rights
pub trait PrivilegedOps {
    /// Check if superuser access is available
    fn has_superuser(&self) -> bool;

    /// Change the mode of `path`; shell globs are allowed
    fn chmod(&self, path: &str, mode: u32) -> Result<()>;
}

/// Runs privileged commands through an `su` binary
#[derive(Debug, Clone)]
pub struct SuShell {
    su_binary: PathBuf,
}

impl SuShell {
    pub fn new(su_binary: impl Into<PathBuf>) -> Self {
        Self {
            su_binary: su_binary.into(),
        }
    }
}

impl Default for SuShell {
    fn default() -> Self {
        Self::new("/system/xbin/su")
    }
}

impl PrivilegedOps for SuShell {
    fn has_superuser(&self) -> bool {
        which::which(&self.su_binary).is_ok()
    }

    fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        let output = Command::new(&self.su_binary)
            .args(["-c", &format!("chmod {:o} {}", mode, path)])
            .output()?;

        if output.status.success() {
            Ok(())
        } else {
            Err(AmlError::PermissionChange {
                path: path.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl<S: Sysfs> Platform<S> {
    /// Widen permissions on the playback nodes, if running on Amlogic
    /// hardware with superuser access
    pub fn fix_permissions(&self, ops: &dyn PrivilegedOps) {
        if !self.aml_present() {
            return;
        }

        if !ops.has_superuser() {
            tracing::warn!("fix_permissions: missing su, playback might fail");
            return;
        }

        for path in PLAYBACK_NODES {
            if let Err(e) = ops.chmod(path, PLAYBACK_MODE) {
                tracing::warn!("fix_permissions: {}", e);
            }
        }
        tracing::info!("fix_permissions: permissions changed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockPrivileged, MockSysfs};

    fn aml_platform() -> Platform<MockSysfs> {
        let sysfs = MockSysfs::new();
        sysfs.set_node("/sys/class/audiodsp/digital_raw", "0");
        Platform::new(sysfs, "Amlogic Meson8")
    }

    #[test]
    fn test_fix_permissions() {
        let platform = aml_platform();
        let ops = MockPrivileged::new(true);

        platform.fix_permissions(&ops);

        let calls = ops.chmods();
        assert_eq!(calls.len(), PLAYBACK_NODES.len());
        assert_eq!(calls[0], ("/dev/amvideo".to_string(), 0o666));
        assert_eq!(calls[1].0, "/dev/amstream*");
        assert!(calls.iter().all(|(_, mode)| *mode == 0o666));
    }

    #[test]
    fn test_fix_permissions_without_su() {
        let platform = aml_platform();
        let ops = MockPrivileged::new(false);

        platform.fix_permissions(&ops);
        assert!(ops.chmods().is_empty());
    }

    #[test]
    fn test_fix_permissions_without_hardware() {
        let platform = Platform::new(MockSysfs::new(), "Amlogic Meson8");
        let ops = MockPrivileged::new(true);

        platform.fix_permissions(&ops);
        assert!(ops.chmods().is_empty());
    }

    #[test]
    fn test_fix_permissions_continues_after_failure() {
        let platform = aml_platform();
        let ops = MockPrivileged::new(true);
        ops.fail_on("/dev/amvideo");

        platform.fix_permissions(&ops);
        assert_eq!(ops.chmods().len(), PLAYBACK_NODES.len());
    }

    #[test]
    fn test_su_shell_missing_binary() {
        let shell = SuShell::new("/nonexistent/xbin/su");
        assert!(!shell.has_superuser());
    }
}
