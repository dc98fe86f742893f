//! Command-line construction for the acquisition executable.
//!
//! The executable parses its flags positionally, so the order of both rule
//! tables below is part of the wire contract:
//!
//! ```text
//! xterm -e <exe> -c <cal> -os <ip> -op <port> -vs <dev> -vsc <ch> -vm <mode> -n <frames> -sd <depth> -fps <fps> [-v] [-rv] [-tu] [-ti] [-si]
//! ```

use crate::models::request::InvocationRequest;
use serde::Deserialize;
use std::fmt;

/// How the executable is wrapped before it is spawned.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case", deny_unknown_fields)]
pub enum LaunchMode {
    /// Run inside a terminal emulator: `<program> <args...> <exe> ...`.
    Terminal {
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Run the executable itself.
    Direct,
}

impl Default for LaunchMode {
    fn default() -> Self {
        LaunchMode::Terminal {
            program: String::from("xterm"),
            args: vec![String::from("-e")],
        }
    }
}

impl LaunchMode {
    fn prefix(&self) -> Vec<String> {
        match self {
            LaunchMode::Terminal { program, args } => {
                std::iter::once(program.clone()).chain(args.iter().cloned()).collect()
            }
            LaunchMode::Direct => Vec::new(),
        }
    }
}

/// Option pairs, always emitted, in wire order.
fn option_pairs(request: &InvocationRequest) -> [(&'static str, &str); 9] {
    [
        ("-c", request.calibration_file.as_str()),
        ("-os", request.oigtl_server.as_str()),
        ("-op", request.oigtl_port.as_str()),
        ("-vs", request.video_source.as_str()),
        ("-vsc", request.video_channel.as_str()),
        ("-vm", request.video_mode.as_str()),
        ("-n", request.nb_frames.as_str()),
        ("-sd", request.scan_depth.as_str()),
        ("-fps", request.fps.as_str()),
    ]
}

/// Bare switches and the condition that emits each, in wire order.
fn switches(request: &InvocationRequest) -> [(bool, &'static str); 5] {
    [
        (request.verbose, "-v"),
        (request.reconstruct_volume, "-rv"),
        (request.track_ultrasound, "-tu"),
        (request.track_instrument, "-ti"),
        (request.simulate_instrument, "-si"),
    ]
}

/// A fully assembled command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    tokens: Vec<String>,
}

impl CommandLine {
    /// Builds the command line for `request`, wrapped as `mode` says.
    ///
    /// Values are copied verbatim, including empty ones.
    pub fn build(request: &InvocationRequest, mode: &LaunchMode) -> CommandLine {
        let mut tokens = mode.prefix();
        tokens.push(request.executable.clone());

        for (flag, value) in option_pairs(request) {
            tokens.push(flag.to_string());
            tokens.push(value.to_string());
        }

        tokens.extend(
            switches(request)
                .into_iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| flag.to_string()),
        );

        CommandLine { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The tokens joined by single spaces, as announced to the user and
    /// handed to the shell.
    pub fn render(&self) -> String {
        self.tokens.join(" ")
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use googletest::{assert_that, matchers::eq};
    use test_casing::test_casing;

    use super::{CommandLine, LaunchMode};
    use crate::models::request::InvocationRequest;

    const FIXED_FLAGS: [&str; 9] = ["-c", "-os", "-op", "-vs", "-vsc", "-vm", "-n", "-sd", "-fps"];

    fn echo_request() -> InvocationRequest {
        InvocationRequest {
            executable: String::from("/bin/echo"),
            calibration_file: String::from("cal.txt"),
            ..InvocationRequest::default()
        }
    }

    fn with_switches(bits: u8) -> InvocationRequest {
        InvocationRequest {
            verbose: bits & 0b10000 != 0,
            reconstruct_volume: bits & 0b01000 != 0,
            track_ultrasound: bits & 0b00100 != 0,
            track_instrument: bits & 0b00010 != 0,
            simulate_instrument: bits & 0b00001 != 0,
            ..echo_request()
        }
    }

    #[googletest::test]
    fn defaults_produce_the_reference_line() {
        let line = CommandLine::build(&echo_request(), &LaunchMode::default());

        assert_that!(
            line.render().as_str(),
            eq("xterm -e /bin/echo -c cal.txt -os 127.0.0.1 -op 18944 -vs /dev/video0 -vsc 3 -vm NTSC -n 50 -sd 70 -fps 30 -rv")
        );
    }

    #[googletest::test]
    fn all_switches_enabled_append_in_order() {
        let line = CommandLine::build(&with_switches(0b11111), &LaunchMode::default());

        assert_that!(line.render().ends_with(" -fps 30 -v -rv -tu -ti -si"), eq(true));
    }

    #[googletest::test]
    fn all_switches_disabled_append_nothing() {
        let line = CommandLine::build(&with_switches(0), &LaunchMode::default());

        assert_that!(line.render().ends_with(" -fps 30"), eq(true));
        assert_that!(line.tokens().len(), eq(2 + 1 + 18));
    }

    #[test_casing(8, [0b00000_u8, 0b10000, 0b01000, 0b00100, 0b00010, 0b00001, 0b10101, 0b11111])]
    fn fixed_pairs_are_independent_of_switches(bits: u8) {
        let line = CommandLine::build(&with_switches(bits), &LaunchMode::default());
        let tokens = line.tokens();

        assert_eq!(&tokens[..3], ["xterm", "-e", "/bin/echo"]);
        for (i, flag) in FIXED_FLAGS.iter().enumerate() {
            assert_eq!(tokens[3 + 2 * i], *flag);
        }

        let tail: Vec<&str> = tokens[21..].iter().map(String::as_str).collect();
        let expected: Vec<&str> = ["-v", "-rv", "-tu", "-ti", "-si"]
            .into_iter()
            .enumerate()
            .filter(|(i, _)| bits & (0b10000 >> i) != 0)
            .map(|(_, flag)| flag)
            .collect();
        assert_eq!(tail, expected);
    }

    #[test]
    fn identical_inputs_render_identically() {
        let request = with_switches(0b10110);
        let first = CommandLine::build(&request, &LaunchMode::default()).render();
        let second = CommandLine::build(&request, &LaunchMode::default()).render();

        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn values_pass_through_verbatim() {
        let request = InvocationRequest {
            oigtl_port: String::from("not-a-port"),
            video_mode: String::from("SECAM"),
            scan_depth: String::from("-1"),
            ..echo_request()
        };
        let line = CommandLine::build(&request, &LaunchMode::Direct);

        assert_eq!(
            line.render(),
            "/bin/echo -c cal.txt -os 127.0.0.1 -op not-a-port -vs /dev/video0 -vsc 3 -vm SECAM -n 50 -sd -1 -fps 30 -rv"
        );
    }

    #[test]
    fn empty_executable_keeps_its_slot() {
        let line = CommandLine::build(&InvocationRequest::default(), &LaunchMode::default());

        assert!(line.render().starts_with("xterm -e  -c  -os 127.0.0.1"));
        assert_eq!(line.tokens()[2], "");
    }

    #[test]
    fn custom_terminal_prefix() {
        let mode = LaunchMode::Terminal {
            program: String::from("gnome-terminal"),
            args: vec![String::from("--wait"), String::from("--")],
        };
        let line = CommandLine::build(&echo_request(), &mode);

        assert!(line.to_string().starts_with("gnome-terminal --wait -- /bin/echo -c cal.txt"));
    }

    #[test]
    fn launch_mode_from_json() {
        let terminal: LaunchMode =
            serde_json::from_str(r#"{"mode": "terminal", "program": "konsole", "args": ["-e"]}"#)
                .expect("should parse terminal mode");
        let direct: LaunchMode =
            serde_json::from_str(r#"{"mode": "direct"}"#).expect("should parse direct mode");

        assert_eq!(
            terminal,
            LaunchMode::Terminal {
                program: String::from("konsole"),
                args: vec![String::from("-e")],
            }
        );
        assert_eq!(direct, LaunchMode::Direct);
    }
}
