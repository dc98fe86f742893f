mod command;
mod config;
mod descriptor;
mod launcher;
mod logging;
mod models;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use command::CommandLine;
use config::resolve_config;
use descriptor::ULTRASOUND_4D;
use launcher::{LaunchSettings, dispatch};
use models::request::{InvocationRequest, RequestError};
use std::{env, path::Path, process};
use tracing::info;
use ui::cli::{Action, Args, DescribeFormat, LaunchArgs};
use ui::output;

fn main() {
    let args = Args::parse();
    if let Err(err) = args.check() {
        err.exit();
    }

    if let Err(err) = logging::init(args.log_level) {
        eprintln!("Warning: could not initialise logging: {}", err);
    }

    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.xml {
        ULTRASOUND_4D
            .validate()
            .context("the built-in descriptor is invalid")?;
        return output::print_descriptor(&ULTRASOUND_4D, DescribeFormat::Xml);
    }

    let host_launch = args.has_host_launch();
    match args.action {
        None if !host_launch => {
            Args::command().print_help()?;
            Ok(())
        }
        None => {
            let (request, settings) =
                prepare(args.config.as_deref(), &args.host, LaunchArgs::resolve_host)?;
            let report = dispatch(&request, &settings, output::print_command_line);
            output::print_exit_status(&report);
            Ok(())
        }
        Some(Action::Describe { format }) => {
            ULTRASOUND_4D
                .validate()
                .context("the built-in descriptor is invalid")?;
            output::print_descriptor(&ULTRASOUND_4D, format)
        }
        Some(Action::Validate) => {
            ULTRASOUND_4D
                .validate()
                .context("the built-in descriptor is invalid")?;
            output::print_validation_summary(&ULTRASOUND_4D);
            Ok(())
        }
        Some(Action::Show(launch)) => {
            let (request, settings) = prepare(args.config.as_deref(), &launch, LaunchArgs::resolve)?;
            output::print_command_line(&CommandLine::build(&request, &settings.mode));
            Ok(())
        }
        Some(Action::Run { launch, json }) => {
            let (request, settings) = prepare(args.config.as_deref(), &launch, LaunchArgs::resolve)?;
            let report = dispatch(&request, &settings, output::print_command_line);
            if json {
                output::print_report_json(&report)?;
            } else {
                output::print_exit_status(&report);
            }
            Ok(())
        }
    }
}

/// Resolves the request and launch settings: built-in defaults, then the
/// configuration file, then the command line as read by `resolve`.
fn prepare(
    config: Option<&Path>,
    launch: &LaunchArgs,
    resolve: fn(&LaunchArgs, InvocationRequest) -> Result<InvocationRequest, RequestError>,
) -> Result<(InvocationRequest, LaunchSettings)> {
    let cwd = env::current_dir().context("failed to read the current directory")?;
    let (config, source) = resolve_config(config, &cwd)?;
    if let Some(path) = source {
        info!("📂 Using launcher config: {}", path.display());
    }

    let settings = launch.settings(config.settings());
    let request = resolve(launch, config.values)
        .context("invalid parameter on the command line")?;
    Ok((request, settings))
}
