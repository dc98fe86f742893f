//! Command-line interface module.
//!
//! This module handles CLI argument parsing for the launcher and the layering
//! of command-line values over the configuration file.

use crate::command::LaunchMode;
use crate::descriptor::ULTRASOUND_4D;
use crate::launcher::{LaunchSettings, Spawner};
use crate::logging::LogLevel;
use crate::models::request::{FieldValue, InvocationRequest, RequestError};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum, error::ErrorKind};
use std::path::PathBuf;

/// Launcher for the 4D Ultrasound acquisition executable (SynchroGrab)
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Print the XML module description for the host application and exit
    #[arg(long)]
    pub xml: bool,

    /// Path to the launcher configuration file (JSON).
    /// If not provided, looks for ultrasound4d.json in the current directory.
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity of the launcher's own log output, written to stderr
    #[arg(long = "log-level", value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Parameters of a host-style launch, used when no command is given
    #[command(flatten)]
    pub host: LaunchArgs,

    #[command(subcommand)]
    pub action: Option<Action>,
}

impl Args {
    /// Whether any launch parameter was given before (or instead of) a command.
    pub fn has_host_launch(&self) -> bool {
        self.host != LaunchArgs::default()
    }

    /// Rejects combinations that would otherwise be silently ignored.
    pub fn check(&self) -> Result<(), clap::Error> {
        if self.xml && (self.action.is_some() || self.has_host_launch()) {
            return Err(Args::command().error(
                ErrorKind::ArgumentConflict,
                "--xml cannot be combined with a command or launch parameters",
            ));
        }
        if self.action.is_some() && self.has_host_launch() {
            return Err(Args::command().error(
                ErrorKind::ArgumentConflict,
                "launch parameters must follow the `show` or `run` command",
            ));
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Print the parameter descriptor
    Describe {
        #[arg(long, value_enum, default_value = "json")]
        format: DescribeFormat,
    },
    /// Check the parameter descriptor against its invariants
    Validate,
    /// Print the command line `run` would launch, without launching it
    Show(LaunchArgs),
    /// Launch 4D Ultrasound and wait for it to exit
    Run {
        #[command(flatten)]
        launch: LaunchArgs,

        /// Print the launch report as JSON instead of a status line
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DescribeFormat {
    Json,
    Xml,
    Csv,
}

/// Values and launch overrides shared by `show`, `run` and the host-style launch.
#[derive(clap::Args, Debug, Default, PartialEq, Eq)]
pub struct LaunchArgs {
    #[command(flatten)]
    pub fields: FieldArgs,

    /// Set a parameter by identifier, e.g. `-p oigtlPort=18945`. May be repeated.
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Run the executable without a terminal emulator around it
    #[arg(long)]
    pub direct: bool,

    /// Spawn the command line directly instead of through the shell
    #[arg(long)]
    pub exec: bool,
}

/// One option per descriptor field, named after its longflag.
///
/// Boolean options take an optional value: `--verbose` alone means true,
/// `--reconstructVolume false` switches a default-on field off.
#[derive(clap::Args, Debug, Default, PartialEq, Eq)]
#[command(next_help_heading = "Parameters")]
pub struct FieldArgs {
    /// 4D Ultrasound executable
    #[arg(long = "ultrasound4D", value_name = "FILE")]
    pub ultrasound4d: Option<String>,

    /// Calibration File needed to start Synchrograb
    #[arg(long = "calibrationFile", value_name = "FILE")]
    pub calibration_file: Option<String>,

    /// Enable volume reconstruction [default: true]
    #[arg(long = "reconstructVolume", value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub reconstruct_volume: Option<bool>,

    /// IP-Address of OpenIGTLink Server [default: 127.0.0.1]
    #[arg(long = "oigtlServer", value_name = "ADDRESS")]
    pub oigtl_server: Option<String>,

    /// OpenIGTLink port of OpenIGTLink Server [default: 18944]
    #[arg(long = "oigtlPort", value_name = "PORT")]
    pub oigtl_port: Option<String>,

    /// Print more detailed information
    #[arg(long = "verbose", value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub verbose: Option<bool>,

    /// Enable ultrasound tracking
    #[arg(long = "trackUltrasound", value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub track_ultrasound: Option<bool>,

    /// Scan depth of ultrasound device in mm [default: 70]
    #[arg(long = "scanDepth", value_name = "MM")]
    pub scan_depth: Option<String>,

    /// Enable surgical instrument Tracking
    #[arg(long = "trackInstrument", value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub track_instrument: Option<bool>,

    /// Enable surgical Instrument Simulation
    #[arg(long = "simulateInstrument", value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub simulate_instrument: Option<bool>,

    /// Frames per second [default: 30]
    #[arg(long = "fps", value_name = "FPS")]
    pub fps: Option<String>,

    /// Video device for frame grabbing [default: /dev/video0]
    #[arg(long = "videoSource", value_name = "DEVICE")]
    pub video_source: Option<String>,

    /// Video channel of frame grabber card [default: 3]
    #[arg(long = "videoChannel", value_name = "CHANNEL")]
    pub video_channel: Option<String>,

    /// Videomode for video device, NTSC or PAL [default: NTSC]
    #[arg(long = "videoMode", value_name = "MODE")]
    pub video_mode: Option<String>,

    /// Number of frames to grab [default: 50]
    #[arg(long = "nbFrames", value_name = "N")]
    pub nb_frames: Option<String>,
}

fn assign<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

impl FieldArgs {
    /// Overwrites every value given on the command line.
    pub fn apply(&self, request: &mut InvocationRequest) {
        assign(&mut request.executable, &self.ultrasound4d);
        assign(&mut request.calibration_file, &self.calibration_file);
        assign(&mut request.reconstruct_volume, &self.reconstruct_volume);
        assign(&mut request.oigtl_server, &self.oigtl_server);
        assign(&mut request.oigtl_port, &self.oigtl_port);
        assign(&mut request.verbose, &self.verbose);
        assign(&mut request.track_ultrasound, &self.track_ultrasound);
        assign(&mut request.scan_depth, &self.scan_depth);
        assign(&mut request.track_instrument, &self.track_instrument);
        assign(&mut request.simulate_instrument, &self.simulate_instrument);
        assign(&mut request.fps, &self.fps);
        assign(&mut request.video_source, &self.video_source);
        assign(&mut request.video_channel, &self.video_channel);
        assign(&mut request.video_mode, &self.video_mode);
        assign(&mut request.nb_frames, &self.nb_frames);
    }
}

impl LaunchArgs {
    /// Layers `-p` pairs, then explicit options, over `base`.
    pub fn resolve(&self, base: InvocationRequest) -> Result<InvocationRequest, RequestError> {
        let mut request = base;
        for pair in &self.params {
            request.apply_pair(pair)?;
        }
        self.fields.apply(&mut request);
        Ok(request)
    }

    /// Resolves a host-style launch over `base`.
    ///
    /// The host passes a checked boolean as a bare flag and leaves an
    /// unchecked one out, so every declared boolean starts from false.
    pub fn resolve_host(&self, base: InvocationRequest) -> Result<InvocationRequest, RequestError> {
        let mut request = base;
        for field in ULTRASOUND_4D.fields().filter(|field| field.kind.is_boolean()) {
            request.set(field.name, FieldValue::Bool(false))?;
        }
        self.resolve(request)
    }

    /// Applies `--direct` and `--exec` to the configured settings.
    pub fn settings(&self, base: LaunchSettings) -> LaunchSettings {
        let mut settings = base;
        if self.direct {
            settings.mode = LaunchMode::Direct;
        }
        if self.exec {
            settings.spawner = Spawner::Exec;
        }
        settings
    }
}
