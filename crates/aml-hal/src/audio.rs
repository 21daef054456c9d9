//! Audio passthrough and HDMI sink audio capabilities

use crate::device::DeviceType;
use crate::platform::Platform;
use crate::sysfs::Sysfs;
use serde::Serialize;
use std::fmt;

const AUDIODSP_DIGITAL_RAW: &str = "/sys/class/audiodsp/digital_raw";
const HDMI_EDID: &str = "/sys/class/amhdmitx/amhdmitx0/edid";

/// Audio format codes from the sink's EDID short audio descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HdmiAudioFormat {
    Pcm,
    Ac3,
    Mpeg1,
    Mp3,
    Mpeg2,
    Aac,
    Dts,
    Atrac,
    OneBitAudio,
    DolbyDigitalPlus,
    DtsHd,
    Mat,
    Dst,
    WmaPro,
}

impl HdmiAudioFormat {
    /// Map a CEA-861 audio format code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(HdmiAudioFormat::Pcm),
            2 => Some(HdmiAudioFormat::Ac3),
            3 => Some(HdmiAudioFormat::Mpeg1),
            4 => Some(HdmiAudioFormat::Mp3),
            5 => Some(HdmiAudioFormat::Mpeg2),
            6 => Some(HdmiAudioFormat::Aac),
            7 => Some(HdmiAudioFormat::Dts),
            8 => Some(HdmiAudioFormat::Atrac),
            9 => Some(HdmiAudioFormat::OneBitAudio),
            10 => Some(HdmiAudioFormat::DolbyDigitalPlus),
            11 => Some(HdmiAudioFormat::DtsHd),
            12 => Some(HdmiAudioFormat::Mat),
            13 => Some(HdmiAudioFormat::Dst),
            14 => Some(HdmiAudioFormat::WmaPro),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HdmiAudioFormat::Pcm => "PCM",
            HdmiAudioFormat::Ac3 => "AC3",
            HdmiAudioFormat::Mpeg1 => "MPEG1",
            HdmiAudioFormat::Mp3 => "MP3",
            HdmiAudioFormat::Mpeg2 => "MPEG2",
            HdmiAudioFormat::Aac => "AAC",
            HdmiAudioFormat::Dts => "DTS",
            HdmiAudioFormat::Atrac => "ATRAC",
            HdmiAudioFormat::OneBitAudio => "One_Bit_Audio",
            HdmiAudioFormat::DolbyDigitalPlus => "Dolby",
            HdmiAudioFormat::DtsHd => "DTS_HD",
            HdmiAudioFormat::Mat => "MAT",
            HdmiAudioFormat::Dst => "DST",
            HdmiAudioFormat::WmaPro => "WMA",
        }
    }
}

impl fmt::Display for HdmiAudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse the amhdmitx EDID dump.
///
/// The driver prints an `Audio {format, channel, freq, cce}` header followed
/// by one `{code, ...}` line per descriptor.
pub fn parse_edid_audio(edid: &str) -> Vec<HdmiAudioFormat> {
    let mut lines = edid.lines().skip_while(|line| !line.contains("Audio"));
    if lines.next().is_none() {
        return Vec::new();
    }

    lines.map_while(descriptor_format).collect()
}

/// Format code of a `{code, ...}` descriptor line
fn descriptor_format(line: &str) -> Option<HdmiAudioFormat> {
    let (_, rest) = line.split_once('{')?;
    let (code, _) = rest.split_once(',')?;
    HdmiAudioFormat::from_code(code.trim().parse().ok()?)
}

impl<S: Sysfs> Platform<S> {
    /// Enable or disable raw bitstream output from the audio DSP
    pub fn set_audio_passthrough(&self, passthrough: bool) {
        let device_type = self.device_type();
        if !self.aml_present() || !device_type.is_at_most(DeviceType::M8) {
            return;
        }

        // M1 uses 1, M3 and newer use 2
        let raw = if device_type == DeviceType::M1 { 1 } else { 2 };
        let value = if passthrough { raw } else { 0 };
        if let Err(e) = self.sysfs.set_int(AUDIODSP_DIGITAL_RAW, value) {
            tracing::warn!("Failed to set audio passthrough: {}", e);
        }
    }

    /// Audio formats the connected HDMI sink advertises
    pub fn probe_hdmi_audio(&self) -> Vec<HdmiAudioFormat> {
        let Ok(edid) = self.sysfs.get_str(HDMI_EDID, 1024) else {
            return Vec::new();
        };

        let formats = parse_edid_audio(&edid);
        for format in &formats {
            tracing::info!("HDMI sink supports {}", format);
        }
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSysfs;

    const EDID: &str = "Receiver Brand Name: SAM\n\
                        Receiver Product Name: SAMSUNG\n\
                        Audio {format, channel, freq, cce}\n\
                        {1, 7, 7f, 7}\n\
                        {7, 5, 1e, 0}\n\
                        {2, 5, 7, 0}\n\
                        {11, 7, 7e, 1}\n\
                        {10, 7, 6, 0}\n\
                        Speaker Allocation: 4f\n\
                        {12, 7, 7e, 0}\n";

    fn platform(hardware: &'static str) -> (MockSysfs, Platform<MockSysfs>) {
        let sysfs = MockSysfs::new();
        sysfs.set_node(AUDIODSP_DIGITAL_RAW, "0");
        let platform = Platform::new(sysfs.clone(), hardware);
        (sysfs, platform)
    }

    #[test]
    fn test_parse_edid_audio() {
        assert_eq!(
            parse_edid_audio(EDID),
            vec![
                HdmiAudioFormat::Pcm,
                HdmiAudioFormat::Dts,
                HdmiAudioFormat::Ac3,
                HdmiAudioFormat::DtsHd,
                HdmiAudioFormat::DolbyDigitalPlus,
            ]
        );
    }

    #[test]
    fn test_parse_edid_without_audio_block() {
        assert!(parse_edid_audio("Receiver Brand Name: SAM\n{1, 7, 7f, 7}\n").is_empty());
        assert!(parse_edid_audio("").is_empty());
    }

    #[test]
    fn test_format_codes() {
        assert_eq!(HdmiAudioFormat::from_code(14), Some(HdmiAudioFormat::WmaPro));
        assert_eq!(HdmiAudioFormat::from_code(0), None);
        assert_eq!(HdmiAudioFormat::from_code(15), None);
    }

    #[test]
    fn test_probe_hdmi_audio() {
        let (sysfs, platform) = platform("Amlogic Meson8");
        assert!(platform.probe_hdmi_audio().is_empty());

        sysfs.set_node(HDMI_EDID, EDID);
        assert_eq!(platform.probe_hdmi_audio().len(), 5);
    }

    #[test]
    fn test_passthrough_m1() {
        let (sysfs, platform) = platform("Amlogic MESON-M1");
        platform.set_audio_passthrough(true);
        assert_eq!(sysfs.node(AUDIODSP_DIGITAL_RAW).as_deref(), Some("1"));
        platform.set_audio_passthrough(false);
        assert_eq!(sysfs.node(AUDIODSP_DIGITAL_RAW).as_deref(), Some("0"));
    }

    #[test]
    fn test_passthrough_newer_families() {
        for hardware in ["Amlogic MESON3", "Amlogic Meson6", "Amlogic Meson8"] {
            let (sysfs, platform) = platform(hardware);
            platform.set_audio_passthrough(true);
            assert_eq!(sysfs.node(AUDIODSP_DIGITAL_RAW).as_deref(), Some("2"));
        }
    }

    #[test]
    fn test_passthrough_unknown_device() {
        let (sysfs, platform) = platform("Broadcom BCM2835");
        platform.set_audio_passthrough(true);
        assert_eq!(sysfs.write_count(), 0);
    }

    #[test]
    fn test_passthrough_without_hardware() {
        let sysfs = MockSysfs::new();
        let platform = Platform::new(sysfs.clone(), "Amlogic Meson8");
        platform.set_audio_passthrough(true);
        assert_eq!(sysfs.write_count(), 0);
    }
}
