//! Output and reporting functions for the launcher.
//!
//! This module handles everything written to stdout:
//! - The descriptor, in the format the host asked for
//! - The descriptor validation summary
//! - The assembled command line
//! - The launch report once the child has exited

use super::cli::DescribeFormat;
use crate::command::CommandLine;
use crate::models::{report::LaunchReport, schema::Descriptor};
use std::io::{self, Write};

/// Prints the descriptor in the requested format.
///
/// # Arguments
/// * `descriptor` - The parameter schema to print
/// * `format` - JSON for programmatic hosts, XML for the host's module
///   loader, CSV for a tabular overview
pub fn print_descriptor(descriptor: &Descriptor, format: DescribeFormat) -> anyhow::Result<()> {
    match format {
        DescribeFormat::Json => println!("{}", serde_json::to_string_pretty(descriptor)?),
        DescribeFormat::Xml => print!("{}", descriptor.to_xml()),
        DescribeFormat::Csv => descriptor.write_csv(io::stdout().lock())?,
    }
    Ok(())
}

/// Prints a one-line summary of a descriptor that passed validation.
pub fn print_validation_summary(descriptor: &Descriptor) {
    println!(
        "✅ Descriptor '{}' is valid: {} groups, {} fields",
        descriptor.title,
        descriptor.groups.len(),
        descriptor.fields().count()
    );
}

/// Prints the fully assembled command line, exactly as it will be launched.
pub fn print_command_line(command: &CommandLine) {
    println!("{}", command);
    // The child may take over the terminal; make sure the line is out first.
    let _ = io::stdout().flush();
}

/// Formats the status line printed after the child has exited.
///
/// # Arguments
/// * `report` - The report returned by the dispatcher
pub fn exit_status_line(report: &LaunchReport) -> String {
    let mut line = format!(
        "🔚 4D Ultrasound exited with status {} after {:.1}s",
        report.exit_code,
        report.elapsed_secs()
    );
    if let Some(spawn_error) = &report.spawn_error {
        line.push_str(&format!("\n\t⚠️  Could not start the process: {}", spawn_error));
    }
    line
}

/// Prints the exit status of the child.
pub fn print_exit_status(report: &LaunchReport) {
    println!("{}", exit_status_line(report));
}

/// Prints the complete launch report as JSON.
pub fn print_report_json(report: &LaunchReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::exit_status_line;
    use crate::models::report::LaunchReport;

    fn report(exit_code: i32, spawn_error: Option<&str>) -> LaunchReport {
        let started_at = Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap();
        LaunchReport {
            command_line: String::from("xterm -e SynchroGrab"),
            argv: vec![
                String::from("xterm"),
                String::from("-e"),
                String::from("SynchroGrab"),
            ],
            exit_code,
            success: exit_code == 0,
            spawn_error: spawn_error.map(str::to_string),
            started_at,
            finished_at: started_at + chrono::Duration::milliseconds(2500),
        }
    }

    #[test]
    fn status_line_for_a_clean_exit() {
        assert_eq!(
            exit_status_line(&report(0, None)),
            "🔚 4D Ultrasound exited with status 0 after 2.5s"
        );
    }

    #[test]
    fn status_line_names_the_spawn_error() {
        let line = exit_status_line(&report(127, Some("No such file or directory (os error 2)")));

        assert!(line.starts_with("🔚 4D Ultrasound exited with status 127"));
        assert!(line.ends_with("Could not start the process: No such file or directory (os error 2)"));
    }

    #[test]
    fn report_serializes_without_empty_spawn_error() {
        let json = serde_json::to_value(report(3, None)).expect("should serialize");

        assert_eq!(json["exit_code"], 3);
        assert_eq!(json["success"], false);
        assert_eq!(json["argv"][2], "SynchroGrab");
        assert_eq!(json["started_at"], "2026-03-02T09:30:00Z");
        assert!(json.get("spawn_error").is_none());
    }
}
