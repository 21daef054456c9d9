//! Display mode resolution lookup
//!
//! Maps the HDMI transmitter's mode names (as found in
//! `/sys/class/display/mode`) to resolution descriptors. 4K modes render
//! the GUI at 1080p and let the scaler fill the screen.

use crate::platform::Platform;
use crate::sysfs::Sysfs;
use serde::Serialize;

const DISPLAY_AXIS: &str = "/sys/class/display/axis";

/// Suffix the driver appends to the display's native mode
const NATIVE_MODE_MARKER: char = '*';

/// Fields of `/sys/class/display/axis`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayAxis {
    Left = 0,
    Top = 1,
    Width = 2,
    Height = 3,
    FbLeft = 4,
    FbTop = 5,
    FbWidth = 6,
    FbHeight = 7,
}

/// Resolution descriptor handed to the renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionInfo {
    pub width: i32,
    pub height: i32,
    pub screen_width: i32,
    pub screen_height: i32,
    pub refresh_rate: f32,
    pub interlaced: bool,
    pub screen: i32,
    pub fullscreen: bool,
    pub subtitles: i32,
    pub pixel_ratio: f32,
    pub label: String,
}

/// `(name, width, height, screen width, screen height, Hz, interlaced)`
type ModeEntry = (&'static str, i32, i32, i32, i32, f32, bool);

const MODES: &[ModeEntry] = &[
    ("720p", 1280, 720, 1280, 720, 60.0, false),
    ("720p50hz", 1280, 720, 1280, 720, 50.0, false),
    ("1080p", 1920, 1080, 1920, 1080, 60.0, false),
    ("1080p24hz", 1920, 1080, 1920, 1080, 24.0, false),
    ("1080p30hz", 1920, 1080, 1920, 1080, 30.0, false),
    ("1080p50hz", 1920, 1080, 1920, 1080, 50.0, false),
    ("1080i", 1920, 1080, 1920, 1080, 60.0, true),
    ("1080i50hz", 1920, 1080, 1920, 1080, 50.0, true),
    ("4k2ksmpte", 1920, 1080, 4096, 2160, 24.0, false),
    ("4k2k24hz", 1920, 1080, 3840, 2160, 24.0, false),
    ("4k2k25hz", 1920, 1080, 3840, 2160, 25.0, false),
    ("4k2k30hz", 1920, 1080, 3840, 2160, 30.0, false),
];

impl ResolutionInfo {
    /// Build a descriptor for the display mode `mode`.
    ///
    /// `panel` takes its size from `axis`. Returns `None` for unknown modes
    /// or non-positive sizes.
    pub fn from_mode(mode: &str, axis: impl Fn(DisplayAxis) -> i32) -> Option<Self> {
        let mode = mode.trim();
        let mode = mode.strip_suffix(NATIVE_MODE_MARKER).unwrap_or(mode);

        let mut res = if mode == "panel" {
            let width = axis(DisplayAxis::Width);
            let height = axis(DisplayAxis::Height);
            Self {
                width,
                height,
                screen_width: width,
                screen_height: height,
                refresh_rate: 60.0,
                ..Self::default()
            }
        } else {
            let &(_, width, height, screen_width, screen_height, refresh_rate, interlaced) =
                MODES.iter().find(|entry| entry.0 == mode)?;
            Self {
                width,
                height,
                screen_width,
                screen_height,
                refresh_rate,
                interlaced,
                ..Self::default()
            }
        };

        res.screen = 0;
        res.fullscreen = true;
        res.subtitles = (0.965 * f64::from(res.height)) as i32;
        res.pixel_ratio = 1.0;
        res.label = format!(
            "{}x{} @ {:.2}{} - Full Screen",
            res.screen_width,
            res.screen_height,
            res.refresh_rate,
            if res.interlaced { "i" } else { "" }
        );

        (res.width > 0 && res.height > 0).then_some(res)
    }
}

/// Parse the eight space-separated integers of the axis node.
///
/// Missing or malformed fields read as 0.
pub fn parse_axis(axis: &str) -> [i32; 8] {
    let mut values = [0; 8];
    for (slot, field) in values.iter_mut().zip(axis.split_whitespace()) {
        *slot = field.parse().unwrap_or(0);
    }
    values
}

impl<S: Sysfs> Platform<S> {
    /// Read one field of the display axis
    pub fn axis_value(&self, param: DisplayAxis) -> i32 {
        let axis = self.sysfs.get_str(DISPLAY_AXIS, 20).unwrap_or_default();
        parse_axis(&axis)[param as usize]
    }

    /// Resolve `mode` against this platform's panel geometry
    pub fn mode_to_resolution(&self, mode: &str) -> Option<ResolutionInfo> {
        ResolutionInfo::from_mode(mode, |param| self.axis_value(param))
    }
}
