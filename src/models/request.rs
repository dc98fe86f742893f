use super::schema::FieldKind;
use super::serde_helpers::{lenient_bool, text_or_number};
use crate::descriptor::ULTRASOUND_4D;
use serde::Deserialize;
use thiserror::Error;

/// Identifier of the frame-count value, accepted by the dispatcher although
/// the descriptor does not declare it.
pub const NB_FRAMES: &str = "nbFrames";

/// Resolved values for one dispatcher call.
///
/// Every value is passed to the executable verbatim; nothing here checks
/// that a port is numeric or that a video mode is one of the declared
/// elements.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct InvocationRequest {
    #[serde(rename = "ultrasound4D", deserialize_with = "text_or_number")]
    pub executable: String,
    #[serde(deserialize_with = "text_or_number")]
    pub calibration_file: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub reconstruct_volume: bool,
    #[serde(deserialize_with = "text_or_number")]
    pub oigtl_server: String,
    #[serde(deserialize_with = "text_or_number")]
    pub oigtl_port: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub verbose: bool,
    #[serde(deserialize_with = "text_or_number")]
    pub video_source: String,
    #[serde(deserialize_with = "text_or_number")]
    pub video_channel: String,
    #[serde(deserialize_with = "text_or_number")]
    pub video_mode: String,
    #[serde(deserialize_with = "text_or_number")]
    pub nb_frames: String,
    #[serde(deserialize_with = "text_or_number")]
    pub fps: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub track_ultrasound: bool,
    #[serde(deserialize_with = "text_or_number")]
    pub scan_depth: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub track_instrument: bool,
    #[serde(deserialize_with = "lenient_bool")]
    pub simulate_instrument: bool,
}

impl Default for InvocationRequest {
    fn default() -> Self {
        InvocationRequest {
            executable: String::new(),
            calibration_file: String::new(),
            reconstruct_volume: true,
            oigtl_server: String::from("127.0.0.1"),
            oigtl_port: String::from("18944"),
            verbose: false,
            video_source: String::from("/dev/video0"),
            video_channel: String::from("3"),
            video_mode: String::from("NTSC"),
            nb_frames: String::from("50"),
            fps: String::from("30"),
            track_ultrasound: false,
            scan_depth: String::from("70"),
            track_instrument: false,
            simulate_instrument: false,
        }
    }
}

/// A single value addressed by field identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("unknown parameter '{0}'")]
    UnknownField(String),
    #[error("parameter '{name}' expects a {expected} value")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("'{value}' is not a boolean (expected true or false) for parameter '{name}'")]
    NotABoolean { name: String, value: String },
    #[error("malformed parameter '{0}', expected NAME=VALUE")]
    MalformedPair(String),
}

impl InvocationRequest {
    fn text(&self, name: &str) -> Option<&String> {
        match name {
            "ultrasound4D" => Some(&self.executable),
            "calibrationFile" => Some(&self.calibration_file),
            "oigtlServer" => Some(&self.oigtl_server),
            "oigtlPort" => Some(&self.oigtl_port),
            "videoSource" => Some(&self.video_source),
            "videoChannel" => Some(&self.video_channel),
            "videoMode" => Some(&self.video_mode),
            NB_FRAMES => Some(&self.nb_frames),
            "fps" => Some(&self.fps),
            "scanDepth" => Some(&self.scan_depth),
            _ => None,
        }
    }

    fn flag(&self, name: &str) -> Option<bool> {
        match name {
            "reconstructVolume" => Some(self.reconstruct_volume),
            "verbose" => Some(self.verbose),
            "trackUltrasound" => Some(self.track_ultrasound),
            "trackInstrument" => Some(self.track_instrument),
            "simulateInstrument" => Some(self.simulate_instrument),
            _ => None,
        }
    }

    fn text_slot(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "ultrasound4D" => Some(&mut self.executable),
            "calibrationFile" => Some(&mut self.calibration_file),
            "oigtlServer" => Some(&mut self.oigtl_server),
            "oigtlPort" => Some(&mut self.oigtl_port),
            "videoSource" => Some(&mut self.video_source),
            "videoChannel" => Some(&mut self.video_channel),
            "videoMode" => Some(&mut self.video_mode),
            NB_FRAMES => Some(&mut self.nb_frames),
            "fps" => Some(&mut self.fps),
            "scanDepth" => Some(&mut self.scan_depth),
            _ => None,
        }
    }

    fn bool_slot(&mut self, name: &str) -> Option<&mut bool> {
        match name {
            "reconstructVolume" => Some(&mut self.reconstruct_volume),
            "verbose" => Some(&mut self.verbose),
            "trackUltrasound" => Some(&mut self.track_ultrasound),
            "trackInstrument" => Some(&mut self.track_instrument),
            "simulateInstrument" => Some(&mut self.simulate_instrument),
            _ => None,
        }
    }

    /// Kind of the value addressed by `name`. The frame count reads as a
    /// plain string; other undeclared names have no kind.
    pub fn field_kind(name: &str) -> Option<FieldKind> {
        if name == NB_FRAMES {
            return Some(FieldKind::String);
        }
        ULTRASOUND_4D.field(name).map(|field| field.kind)
    }

    /// Current value of the field `name`.
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        if let Some(b) = self.flag(name) {
            return Some(FieldValue::Bool(b));
        }
        self.text(name).map(|s| FieldValue::Text(s.clone()))
    }

    /// Sets the field `name`, rejecting unknown names and kind mismatches.
    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), RequestError> {
        match value {
            FieldValue::Bool(b) => {
                if let Some(slot) = self.bool_slot(name) {
                    *slot = b;
                    return Ok(());
                }
                if self.text_slot(name).is_some() {
                    return Err(RequestError::TypeMismatch {
                        name: name.to_string(),
                        expected: "text",
                    });
                }
            }
            FieldValue::Text(s) => {
                if let Some(slot) = self.text_slot(name) {
                    *slot = s;
                    return Ok(());
                }
                if self.bool_slot(name).is_some() {
                    return Err(RequestError::TypeMismatch {
                        name: name.to_string(),
                        expected: "boolean",
                    });
                }
            }
        }
        Err(RequestError::UnknownField(name.to_string()))
    }

    /// Applies a raw `NAME=VALUE` pair, parsing the value after the field's kind.
    ///
    /// Only the first `=` splits, so values may themselves contain `=`.
    pub fn apply_pair(&mut self, pair: &str) -> Result<(), RequestError> {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| RequestError::MalformedPair(pair.to_string()))?;
        let name = name.trim();

        let value = match InvocationRequest::field_kind(name) {
            Some(kind) if kind.is_boolean() => FieldValue::Bool(parse_bool(name, raw)?),
            Some(_) => FieldValue::Text(raw.to_string()),
            None => return Err(RequestError::UnknownField(name.to_string())),
        };
        self.set(name, value)
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, RequestError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(RequestError::NotABoolean {
            name: name.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use googletest::{assert_that, matchers::eq};

    use super::{FieldValue, InvocationRequest, RequestError};
    use crate::models::schema::FieldKind;

    #[googletest::test]
    fn defaults_match_documented_values() {
        let request = InvocationRequest::default();

        assert_that!(request.executable.as_str(), eq(""));
        assert_that!(request.calibration_file.as_str(), eq(""));
        assert_that!(request.reconstruct_volume, eq(true));
        assert_that!(request.oigtl_server.as_str(), eq("127.0.0.1"));
        assert_that!(request.oigtl_port.as_str(), eq("18944"));
        assert_that!(request.video_source.as_str(), eq("/dev/video0"));
        assert_that!(request.video_channel.as_str(), eq("3"));
        assert_that!(request.video_mode.as_str(), eq("NTSC"));
        assert_that!(request.nb_frames.as_str(), eq("50"));
        assert_that!(request.fps.as_str(), eq("30"));
        assert_that!(request.scan_depth.as_str(), eq("70"));
        assert_that!(
            request.verbose
                || request.track_ultrasound
                || request.track_instrument
                || request.simulate_instrument,
            eq(false)
        );
    }

    #[test]
    fn set_and_get_by_identifier() {
        let mut request = InvocationRequest::default();

        assert_eq!(
            request.set("oigtlServer", FieldValue::Text("10.0.0.7".into())),
            Ok(())
        );
        assert_eq!(request.set("verbose", FieldValue::Bool(true)), Ok(()));

        assert_eq!(
            request.get("oigtlServer"),
            Some(FieldValue::Text("10.0.0.7".into()))
        );
        assert_eq!(request.get("verbose"), Some(FieldValue::Bool(true)));
        assert_eq!(request.get("noSuchField"), None);
        assert_eq!(request.get("nbFrames"), Some(FieldValue::Text("50".into())));
    }

    #[test]
    fn field_kinds_follow_the_descriptor() {
        assert_eq!(
            InvocationRequest::field_kind("videoMode"),
            Some(FieldKind::StringEnumeration)
        );
        assert_eq!(InvocationRequest::field_kind("verbose"), Some(FieldKind::Boolean));
        assert_eq!(InvocationRequest::field_kind("ultrasound4D"), Some(FieldKind::File));
        assert_eq!(InvocationRequest::field_kind("nbFrames"), Some(FieldKind::String));
        assert_eq!(InvocationRequest::field_kind("colour"), None);
    }

    #[test]
    fn set_rejects_unknown_and_mismatched_fields() {
        let mut request = InvocationRequest::default();

        assert_eq!(
            request.set("frobnicate", FieldValue::Bool(true)),
            Err(RequestError::UnknownField("frobnicate".into()))
        );
        assert_eq!(
            request.set("verbose", FieldValue::Text("yes".into())),
            Err(RequestError::TypeMismatch {
                name: "verbose".into(),
                expected: "boolean",
            })
        );
        assert_eq!(
            request.set("fps", FieldValue::Bool(false)),
            Err(RequestError::TypeMismatch {
                name: "fps".into(),
                expected: "text",
            })
        );
        assert_eq!(request, InvocationRequest::default());
    }

    #[googletest::test]
    fn apply_pair_parses_after_field_kind() {
        let mut request = InvocationRequest::default();

        request
            .apply_pair("reconstructVolume=False")
            .expect("boolean pair should apply");
        request
            .apply_pair("videoMode=SECAM")
            .expect("enumeration values pass through");
        request
            .apply_pair("ultrasound4D=/opt/a=b/SynchroGrab")
            .expect("value may contain '='");
        request
            .apply_pair("nbFrames=120")
            .expect("frame count is addressable");

        assert_that!(request.reconstruct_volume, eq(false));
        assert_that!(request.video_mode.as_str(), eq("SECAM"));
        assert_that!(request.executable.as_str(), eq("/opt/a=b/SynchroGrab"));
        assert_that!(request.nb_frames.as_str(), eq("120"));
    }

    #[test]
    fn apply_pair_reports_bad_input() {
        let mut request = InvocationRequest::default();

        assert_eq!(
            request.apply_pair("verbose"),
            Err(RequestError::MalformedPair("verbose".into()))
        );
        assert_eq!(
            request.apply_pair("verbose=maybe"),
            Err(RequestError::NotABoolean {
                name: "verbose".into(),
                value: "maybe".into(),
            })
        );
        assert_eq!(
            request.apply_pair("colour=red"),
            Err(RequestError::UnknownField("colour".into()))
        );
    }

    #[googletest::test]
    fn deserializes_partial_values_with_defaults() {
        let request: InvocationRequest = serde_json::from_str(
            r#"{"ultrasound4D": "/bin/echo", "oigtlPort": 18945, "verbose": "true", "trackInstrument": true}"#,
        )
        .expect("should parse");

        assert_that!(request.executable.as_str(), eq("/bin/echo"));
        assert_that!(request.oigtl_port.as_str(), eq("18945"));
        assert_that!(request.verbose, eq(true));
        assert_that!(request.track_instrument, eq(true));
        assert_that!(request.reconstruct_volume, eq(true));
        assert_that!(request.video_mode.as_str(), eq("NTSC"));
    }

    #[test]
    fn deserialize_rejects_unknown_keys() {
        let parsed = serde_json::from_str::<InvocationRequest>(r#"{"oigtlSever": "10.0.0.1"}"#);
        assert!(parsed.is_err());
    }
}
