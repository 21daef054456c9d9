//! aml-ctl
//!
//! Drives the Amlogic platform glue from a shell, mostly for bring-up and
//! for checking what a box and the attached TV report.

use aml_hal::{
    HdmiAudioFormat, Platform, PlatformConfig, ResolutionInfo, StereoMode, StereoView, SuShell,
    VideoSettings,
};
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// Amlogic platform control
#[derive(Parser, Debug)]
#[command(name = "aml-ctl")]
#[command(version, about = "Amlogic platform glue from the command line")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Report detected hardware
    Probe {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a display mode name
    Resolution {
        /// Mode name as found in /sys/class/display/mode
        mode: String,
    },

    /// Apply a stereo render mode
    Stereo {
        mode: StereoArg,

        /// Stereo mode configured for the video
        #[arg(long, default_value = "off")]
        configured: StereoArg,

        /// Stereo packing of the stream that is playing
        #[arg(long, default_value = "off")]
        playing: StereoArg,

        /// Swap left and right eyes
        #[arg(long)]
        invert: bool,
    },

    /// Toggle raw audio output
    Passthrough { state: Switch },

    /// Lower or restore the minimum CPU frequency
    CpufreqMin { level: Limit },

    /// Lower or restore the maximum CPU frequency
    CpufreqMax { level: Limit },

    /// Widen playback node permissions via su
    Permissions,

    /// List audio formats of the HDMI sink
    HdmiAudio,

    /// Write the effective configuration to a file
    SaveConfig {
        /// Destination file
        path: PathBuf,
    },
}

/// Stereo mode names accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum StereoArg {
    Off,
    #[value(alias = "tb")]
    SplitHorizontal,
    #[value(alias = "sbs")]
    SplitVertical,
    AnaglyphRedCyan,
    AnaglyphGreenMagenta,
    Interlaced,
    HardwareBased,
    Mono,
    Auto,
}

impl From<StereoArg> for StereoMode {
    fn from(arg: StereoArg) -> Self {
        match arg {
            StereoArg::Off => StereoMode::Off,
            StereoArg::SplitHorizontal => StereoMode::SplitHorizontal,
            StereoArg::SplitVertical => StereoMode::SplitVertical,
            StereoArg::AnaglyphRedCyan => StereoMode::AnaglyphRedCyan,
            StereoArg::AnaglyphGreenMagenta => StereoMode::AnaglyphGreenMagenta,
            StereoArg::Interlaced => StereoMode::Interlaced,
            StereoArg::HardwareBased => StereoMode::HardwareBased,
            StereoArg::Mono => StereoMode::Mono,
            StereoArg::Auto => StereoMode::Auto,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Switch {
    On,
    Off,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Limit {
    Limit,
    Normal,
}

/// Hardware summary printed by `probe`
#[derive(Debug, Serialize)]
struct ProbeReport {
    device_type: aml_hal::DeviceType,
    aml_present: bool,
    hw3d_present: bool,
    wired_present: bool,
    hdmi_audio: Vec<HdmiAudioFormat>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging();

    let config = PlatformConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let platform = Platform::from_config(&config);

    run(&platform, &config, cli.command)
}

fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn run(platform: &Platform, config: &PlatformConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Probe { json } => {
            let report = ProbeReport {
                device_type: platform.device_type(),
                aml_present: platform.aml_present(),
                hw3d_present: platform.hw3d_present(),
                wired_present: platform.wired_present(),
                hdmi_audio: platform.probe_hdmi_audio(),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("device type:   {}", report.device_type);
                println!("amlogic:       {}", report.aml_present);
                println!("3D hardware:   {}", report.hw3d_present);
                println!("wired network: {}", report.wired_present);
                let formats: Vec<&str> = report.hdmi_audio.iter().map(|f| f.name()).collect();
                println!("HDMI audio:    {}", formats.join(", "));
            }
        }
        Commands::Resolution { mode } => {
            let res = platform.mode_to_resolution(&mode);
            let found = res.is_some();
            let res: ResolutionInfo = res.unwrap_or_default();
            println!("{}", serde_json::to_string_pretty(&res)?);
            if !found {
                bail!("Unknown display mode '{}'", mode.trim());
            }
        }
        Commands::Stereo {
            mode,
            configured,
            playing,
            invert,
        } => {
            let mode = StereoMode::from(mode);
            let settings = VideoSettings {
                stereo_mode: configured.into(),
                stereo_invert: invert,
                playing_stereo_mode: playing.into(),
            };
            if !platform.supports_stereo(mode) {
                tracing::warn!("Display does not report support for {}", mode.as_str());
            }
            platform.apply_stereo_mode(mode, StereoView::Off, &settings);
        }
        Commands::Passthrough { state } => platform.set_audio_passthrough(state == Switch::On),
        Commands::CpufreqMin { level } => platform.cpufreq_min(level == Limit::Limit),
        Commands::CpufreqMax { level } => platform.cpufreq_max(level == Limit::Limit),
        Commands::Permissions => {
            let su = SuShell::new(config.su_binary.clone());
            platform.fix_permissions(&su);
        }
        Commands::HdmiAudio => {
            for format in platform.probe_hdmi_audio() {
                println!("{format}");
            }
        }
        Commands::SaveConfig { path } => config
            .save(&path)
            .with_context(|| format!("Failed to save configuration to {}", path.display()))?,
    }

    info!("Done");
    Ok(())
}
