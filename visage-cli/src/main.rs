mod analysis;
mod args;
mod input;
mod live;
mod ops;
mod types;

use anyhow::Result;
use clap::Parser;
use log::debug;
use visage_utils::{AppSettings, configure_telemetry, init_logging};

use crate::args::{Cli, Command};

fn main() -> Result<()> {
    init_logging(log::LevelFilter::Info)?;
    let cli = Cli::parse();

    let settings = load_settings(&cli)?;
    if cli.telemetry || settings.telemetry.enabled {
        configure_telemetry(true, settings.telemetry.level_filter());
    }

    match &cli.command {
        Command::Blur(args) => ops::run_blur(args, &settings),
        Command::Sharpen(args) => ops::run_sharpen(args, &settings),
        Command::Contrast(args) => ops::run_contrast(args, &settings),
        Command::Crop(args) => ops::run_crop(args, &settings),
        Command::Resize(args) => ops::run_resize(args, &settings),
        Command::Rotate(args) => ops::run_rotate(args, &settings),
        Command::Grayscale(args) => ops::run_grayscale(args, &settings),
        Command::Mesh(args) => analysis::run_mesh(args, &settings),
        Command::Hands(args) => analysis::run_hands(args, &settings),
        Command::Pose(args) => analysis::run_pose(args, &settings),
        Command::Faces(args) => analysis::run_faces(args, &settings),
        Command::Objects(args) => analysis::run_objects(args, &settings),
        Command::Compare(args) => analysis::run_compare(args, &settings),
        Command::EyeStatus(args) => analysis::run_eye_status(args, &settings),
        Command::HeadPose(args) => analysis::run_head_pose(args, &settings),
        Command::Live(args) => live::run_live(args, &settings),
        Command::Devices => live::run_devices(),
    }
}

fn load_settings(cli: &Cli) -> Result<AppSettings> {
    match cli.config.as_ref() {
        Some(path) => AppSettings::load(path),
        None => {
            debug!("no settings file given; using built-in defaults");
            Ok(AppSettings::default())
        }
    }
}
