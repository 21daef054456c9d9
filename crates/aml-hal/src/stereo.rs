//! Stereoscopic 3D output
//!
//! 3D is driven through two nodes: the picture-processing manager (ppmgr),
//! which takes a 32-bit mode register, and the HDMI transmitter config,
//! which takes a short token telling the TV how frames are packed.

use crate::platform::Platform;
use crate::sysfs::Sysfs;

const PPMGR_3D_MODE: &str = "/sys/class/ppmgr/ppmgr_3d_mode";
const HDMI_CONFIG: &str = "/sys/class/amhdmitx/amhdmitx0/config";
const HDMI_DISP_CAP_3D: &str = "/sys/class/amhdmitx/amhdmitx0/disp_cap_3d";
const HDMI_DISP_MODE: &str = "/sys/class/amhdmitx/amhdmitx0/disp_mode";
const DISPLAY_MODE: &str = "/sys/class/display/mode";

/// Render stereo mode requested by the host application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StereoMode {
    Off,
    SplitHorizontal,
    SplitVertical,
    AnaglyphRedCyan,
    AnaglyphGreenMagenta,
    Interlaced,
    HardwareBased,
    Mono,
    Auto,
}

impl StereoMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StereoMode::Off => "off",
            StereoMode::SplitHorizontal => "split_horizontal",
            StereoMode::SplitVertical => "split_vertical",
            StereoMode::AnaglyphRedCyan => "anaglyph_red_cyan",
            StereoMode::AnaglyphGreenMagenta => "anaglyph_green_magenta",
            StereoMode::Interlaced => "interlaced",
            StereoMode::HardwareBased => "hardware_based",
            StereoMode::Mono => "mono",
            StereoMode::Auto => "auto",
        }
    }

    /// Capability string the TV must advertise in `disp_cap_3d`
    pub fn required_capability(&self) -> Option<&'static str> {
        STEREO_CAPABILITIES
            .iter()
            .find(|(mode, _)| mode == self)
            .map(|&(_, cap)| cap)
    }
}

/// Modes that need HDMI 3D support from the display
const STEREO_CAPABILITIES: &[(StereoMode, &str)] = &[
    (StereoMode::Interlaced, "FramePacking"),
    (StereoMode::SplitHorizontal, "TopBottom"),
    (StereoMode::SplitVertical, "SidebySide"),
];

/// Render view passed along with a stereo request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StereoView {
    #[default]
    Off,
    Left,
    Right,
}

/// Video settings and playback state the stereo policy consults
pub trait StereoSettings {
    /// Stereo mode configured for the current video
    fn stereo_mode(&self) -> StereoMode;

    /// Whether left and right eyes are swapped
    fn stereo_invert(&self) -> bool;

    /// Stereo packing of the stream that is playing right now
    fn playing_stereo_mode(&self) -> StereoMode;
}

/// Plain snapshot of the stereo settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    pub stereo_mode: StereoMode,
    pub stereo_invert: bool,
    pub playing_stereo_mode: StereoMode,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            stereo_mode: StereoMode::Off,
            stereo_invert: false,
            playing_stereo_mode: StereoMode::Off,
        }
    }
}

impl StereoSettings for VideoSettings {
    fn stereo_mode(&self) -> StereoMode {
        self.stereo_mode
    }

    fn stereo_invert(&self) -> bool {
        self.stereo_invert
    }

    fn playing_stereo_mode(&self) -> StereoMode {
        self.playing_stereo_mode
    }
}

/// ppmgr 3D register values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Video3dMode {
    Disable = 0x0000_0000,
    LeftRight = 0x0000_0101,
    LeftRightSwitch = 0x0000_0501,
    BottomTop = 0x0000_0201,
    BottomTopSwitch = 0x0000_0601,
    ToMonoLeft = 0x0000_0102,
    ToMonoRight = 0x0000_0902,
    ToMonoTop = 0x0000_0202,
    ToMonoBottom = 0x0000_0a02,
}

impl Video3dMode {
    pub fn register(self) -> u32 {
        self as u32
    }
}

/// HDMI transmitter 3D tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hdmi3dMode {
    LeftRight,
    TopBottom,
    Off,
}

impl Hdmi3dMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Hdmi3dMode::LeftRight => "3dlr",
            Hdmi3dMode::TopBottom => "3dtb",
            Hdmi3dMode::Off => "3doff",
        }
    }
}

/// Pick register and HDMI values for `mode`
fn plan(
    mode: StereoMode,
    invert: bool,
    settings: &dyn StereoSettings,
) -> (Video3dMode, Hdmi3dMode) {
    match mode {
        StereoMode::SplitVertical => (Video3dMode::Disable, Hdmi3dMode::LeftRight),
        StereoMode::SplitHorizontal => (Video3dMode::Disable, Hdmi3dMode::TopBottom),
        StereoMode::Interlaced => match settings.stereo_mode() {
            StereoMode::SplitVertical if invert => {
                (Video3dMode::LeftRightSwitch, Hdmi3dMode::LeftRight)
            }
            StereoMode::SplitVertical => (Video3dMode::LeftRight, Hdmi3dMode::LeftRight),
            StereoMode::SplitHorizontal if invert => {
                (Video3dMode::BottomTopSwitch, Hdmi3dMode::TopBottom)
            }
            StereoMode::SplitHorizontal => (Video3dMode::BottomTop, Hdmi3dMode::TopBottom),
            _ => (Video3dMode::Disable, Hdmi3dMode::Off),
        },
        StereoMode::Mono => {
            let video = match settings.playing_stereo_mode() {
                StereoMode::SplitVertical if invert => Video3dMode::ToMonoRight,
                StereoMode::SplitVertical => Video3dMode::ToMonoLeft,
                StereoMode::SplitHorizontal if invert => Video3dMode::ToMonoBottom,
                StereoMode::SplitHorizontal => Video3dMode::ToMonoTop,
                _ => Video3dMode::Disable,
            };
            (video, Hdmi3dMode::Off)
        }
        _ => (Video3dMode::Disable, Hdmi3dMode::Off),
    }
}

impl<S: Sysfs> Platform<S> {
    /// Check whether the connected display can show `mode`.
    ///
    /// Only the last queried mode is remembered.
    pub fn supports_stereo(&self, mode: StereoMode) -> bool {
        if let Some((last_mode, supported)) = self.stereo_caps.get()
            && last_mode == mode
        {
            return supported;
        }

        tracing::debug!("supports_stereo: mode({})", mode.as_str());
        let caps = match self.sysfs.get_str(HDMI_DISP_CAP_3D, 256) {
            Ok(caps) => caps,
            Err(_) => {
                self.stereo_caps.set(None);
                return false;
            }
        };

        let supported = match mode.required_capability() {
            Some(cap) => caps.contains(cap),
            None => true,
        };
        self.stereo_caps.set(Some((mode, supported)));
        supported
    }

    /// Switch video processing and HDMI output to `mode`.
    ///
    /// Repeating the previous mode with the same invert flag does nothing.
    pub fn apply_stereo_mode(
        &self,
        mode: StereoMode,
        view: StereoView,
        settings: &dyn StereoSettings,
    ) {
        let invert = settings.stereo_invert();
        if self.last_stereo_mode.get() == Some(mode) && self.last_stereo_invert.get() == invert {
            return;
        }

        self.last_stereo_invert.set(invert);
        self.last_stereo_mode.set(Some(mode));

        tracing::debug!(
            "apply_stereo_mode: mode({}) view({:?}) invert({})",
            mode.as_str(),
            view,
            invert
        );
        if !self.supports_stereo(mode) {
            return;
        }

        let (video, hdmi) = plan(mode, invert, settings);
        self.set_video_3d_mode(video);
        self.set_hdmi_3d_mode(hdmi);
    }

    fn set_video_3d_mode(&self, mode: Video3dMode) {
        let value = format!("0x{:08x}", mode.register());
        tracing::debug!("set_video_3d_mode: {}", value);
        if let Err(e) = self.sysfs.set_str(PPMGR_3D_MODE, &value) {
            tracing::warn!("Failed to set ppmgr 3D mode: {}", e);
        }
    }

    fn set_hdmi_3d_mode(&self, mode: Hdmi3dMode) {
        tracing::debug!("set_hdmi_3d_mode: {}", mode.as_str());
        if let Err(e) = self.sysfs.set_str(HDMI_CONFIG, mode.as_str()) {
            tracing::warn!("Failed to set HDMI 3D mode: {}", e);
        }

        if mode == Hdmi3dMode::Off {
            // Some TVs stay in 3D after 3doff until the output mode is rewritten
            if let Ok(disp_mode) = self.sysfs.get_str(DISPLAY_MODE, 256)
                && let Err(e) = self.sysfs.set_str(HDMI_DISP_MODE, &disp_mode)
            {
                tracing::warn!("Failed to refresh HDMI display mode: {}", e);
            }
        }
    }
}
