//! The 4D Ultrasound parameter descriptor.
//!
//! [`ULTRASOUND_4D`] is the schema handed to the host application. It can be
//! checked against the schema invariants with [`Descriptor::validate`] and
//! rendered as the host's XML module description, as JSON or as a CSV table.

use crate::models::schema::{
    DefaultValue, Descriptor, FieldKind, ParameterField, ParameterGroup,
};
use regex::Regex;
use serde::Serialize;
use std::{collections::HashSet, fmt::Write as _, io, sync::LazyLock};
use thiserror::Error;

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("Invalid identifier pattern")
});

pub static ULTRASOUND_4D: Descriptor = Descriptor {
    category: "",
    title: "4D Ultrasound",
    description: "Run 4D Ultrasound from within Slicer",
    version: "1.0",
    documentation_url: "",
    license: "",
    contributor: "Jan Gumprecht, Harvard Medical School \nDr. Nobuhiko Hata, Harvard Medical School",
    groups: &[
        ParameterGroup {
            label: "Executable Selection",
            description: "Select executable of 4D Ultrasound to run",
            fields: &[ParameterField {
                name: "ultrasound4D",
                longflag: "ultrasound4D",
                label: "4D Ultrasound",
                description: "4D Ultrasound executable",
                kind: FieldKind::File,
                default: DefaultValue::None,
                elements: &[],
            }],
        },
        ParameterGroup {
            label: "General Parameters",
            description: "Parameters for SynchroGrab",
            fields: &[
                ParameterField {
                    name: "calibrationFile",
                    longflag: "calibrationFile",
                    label: "Calibration File",
                    description: "Calibration File needed to start Synchrograb",
                    kind: FieldKind::File,
                    default: DefaultValue::None,
                    elements: &[],
                },
                ParameterField {
                    name: "reconstructVolume",
                    longflag: "reconstructVolume",
                    label: "Volume Reconstruction",
                    description: "Enable volume reconstruction",
                    kind: FieldKind::Boolean,
                    default: DefaultValue::Bool(true),
                    elements: &[],
                },
                ParameterField {
                    name: "oigtlServer",
                    longflag: "oigtlServer",
                    label: "OpenIGTLink Server IP-Address",
                    description: "IP-Address of OpenIGTLink Server",
                    kind: FieldKind::String,
                    default: DefaultValue::Text("127.0.0.1"),
                    elements: &[],
                },
                ParameterField {
                    name: "oigtlPort",
                    longflag: "oigtlPort",
                    label: "OpenIGTLink Port of Server",
                    description: "OpenIGTLink port of OpenIGTLink Server",
                    kind: FieldKind::String,
                    default: DefaultValue::Text("18944"),
                    elements: &[],
                },
                ParameterField {
                    name: "verbose",
                    longflag: "verbose",
                    label: "Verbose Mode",
                    description: "Print more detailed information",
                    kind: FieldKind::Boolean,
                    default: DefaultValue::Bool(false),
                    elements: &[],
                },
            ],
        },
        ParameterGroup {
            label: "Ultrasound Parameters",
            description: "Parameters of the Ultrasound Device",
            fields: &[
                ParameterField {
                    name: "trackUltrasound",
                    longflag: "trackUltrasound",
                    label: "Track Ultrasound",
                    description: "Enable ultrasound tracking",
                    kind: FieldKind::Boolean,
                    default: DefaultValue::Bool(false),
                    elements: &[],
                },
                ParameterField {
                    name: "scanDepth",
                    longflag: "scanDepth",
                    label: "Scan depth [mm]",
                    description: "Scan depth of ultrasound device",
                    kind: FieldKind::String,
                    default: DefaultValue::Text("70"),
                    elements: &[],
                },
            ],
        },
        ParameterGroup {
            label: "Surgical Instrument Parameters",
            description: "Parameters for surgical Instrument Tracking",
            fields: &[
                ParameterField {
                    name: "trackInstrument",
                    longflag: "trackInstrument",
                    label: "Track surgical Instrument",
                    description: "Enable surgical instrument Tracking",
                    kind: FieldKind::Boolean,
                    default: DefaultValue::Bool(false),
                    elements: &[],
                },
                ParameterField {
                    name: "simulateInstrument",
                    longflag: "simulateInstrument",
                    label: "Simulate surgical Instrument",
                    description: "Enable surgical Instrument Simulation",
                    kind: FieldKind::Boolean,
                    default: DefaultValue::Bool(false),
                    elements: &[],
                },
            ],
        },
        ParameterGroup {
            label: "Video Device Parameters",
            description: "Parameters for the Video Device",
            fields: &[
                ParameterField {
                    name: "fps",
                    longflag: "fps",
                    label: "Frame rate of the video device",
                    description: "Frames per second",
                    kind: FieldKind::String,
                    default: DefaultValue::Text("30"),
                    elements: &[],
                },
                ParameterField {
                    name: "videoSource",
                    longflag: "videoSource",
                    label: "Video Device",
                    description: "Video device for frame grabbing",
                    kind: FieldKind::String,
                    default: DefaultValue::Text("/dev/video0"),
                    elements: &[],
                },
                ParameterField {
                    name: "videoChannel",
                    longflag: "videoChannel",
                    label: "Video Channel",
                    description: "Video channel of frame grabber card",
                    kind: FieldKind::String,
                    default: DefaultValue::Text("3"),
                    elements: &[],
                },
                ParameterField {
                    name: "videoMode",
                    longflag: "videoMode",
                    label: "Video mode",
                    description: "Select Videomode for video device",
                    kind: FieldKind::StringEnumeration,
                    default: DefaultValue::Text("NTSC"),
                    elements: &["NTSC", "PAL"],
                },
            ],
        },
    ],
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("field identifier '{0}' is not a valid identifier")]
    InvalidName(String),
    #[error("flag '{flag}' of field '{field}' is not a valid flag name")]
    InvalidFlag { field: String, flag: String },
    #[error("field identifier '{0}' is declared more than once")]
    DuplicateName(String),
    #[error("flag '{0}' is declared more than once")]
    DuplicateFlag(String),
    #[error("default of field '{field}' does not fit kind '{kind}'")]
    DefaultKindMismatch { field: String, kind: &'static str },
    #[error("enumeration field '{0}' declares no elements")]
    EmptyEnumeration(String),
    #[error("enumeration field '{field}' declares element '{element}' more than once")]
    DuplicateElement { field: String, element: String },
    #[error("default '{default}' of field '{field}' is not one of its elements")]
    DefaultNotAnElement { field: String, default: String },
}

/// One CSV row of [`Descriptor::write_csv`].
#[derive(Serialize)]
struct FieldRow<'a> {
    group: &'a str,
    name: &'a str,
    longflag: &'a str,
    kind: &'a str,
    label: &'a str,
    default: String,
    elements: String,
}

impl Descriptor {
    /// All fields, in declared group and field order.
    pub fn fields(&self) -> impl Iterator<Item = &ParameterField> {
        self.groups.iter().flat_map(|group| group.fields.iter())
    }

    pub fn field(&self, name: &str) -> Option<&ParameterField> {
        self.fields().find(|field| field.name == name)
    }

    /// Checks the schema invariants, reporting the first violation found.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        let mut flags = HashSet::new();

        for field in self.fields() {
            if !IDENTIFIER.is_match(field.name) {
                return Err(SchemaError::InvalidName(field.name.to_string()));
            }
            if !IDENTIFIER.is_match(field.longflag) {
                return Err(SchemaError::InvalidFlag {
                    field: field.name.to_string(),
                    flag: field.longflag.to_string(),
                });
            }
            if !names.insert(field.name) {
                return Err(SchemaError::DuplicateName(field.name.to_string()));
            }
            if !flags.insert(field.longflag) {
                return Err(SchemaError::DuplicateFlag(field.longflag.to_string()));
            }
            if !field.default_matches_kind() {
                return Err(SchemaError::DefaultKindMismatch {
                    field: field.name.to_string(),
                    kind: field.kind.tag(),
                });
            }
            if field.kind == FieldKind::StringEnumeration {
                validate_enumeration(field)?;
            }
        }

        Ok(())
    }

    /// Renders the host's XML module description.
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_xml(&mut xml);
        xml
    }

    fn write_xml(&self, xml: &mut String) -> std::fmt::Result {
        writeln!(xml, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
        writeln!(xml, "<executable>")?;
        write_element(xml, 1, "category", self.category)?;
        write_element(xml, 1, "title", self.title)?;
        write_element(xml, 1, "description", self.description)?;
        write_element(xml, 1, "version", self.version)?;
        write_element(xml, 1, "documentation-url", self.documentation_url)?;
        write_element(xml, 1, "license", self.license)?;
        write_element(xml, 1, "contributor", self.contributor)?;

        for group in self.groups {
            writeln!(xml)?;
            writeln!(xml, "  <parameters>")?;
            write_element(xml, 2, "label", group.label)?;
            write_element(xml, 2, "description", group.description)?;
            for field in group.fields {
                let tag = field.kind.tag();
                writeln!(xml, "    <{}>", tag)?;
                write_element(xml, 3, "name", field.name)?;
                write_element(xml, 3, "longflag", field.longflag)?;
                write_element(xml, 3, "label", field.label)?;
                write_element(xml, 3, "description", field.description)?;
                if field.default != DefaultValue::None {
                    write_element(xml, 3, "default", &field.default.as_text())?;
                }
                for element in field.elements {
                    write_element(xml, 3, "element", element)?;
                }
                writeln!(xml, "    </{}>", tag)?;
            }
            writeln!(xml, "  </parameters>")?;
        }

        writeln!(xml)?;
        writeln!(xml, "</executable>")
    }

    /// Writes one CSV row per field, with a header row.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for group in self.groups {
            for field in group.fields {
                csv_writer.serialize(FieldRow {
                    group: group.label,
                    name: field.name,
                    longflag: field.longflag,
                    kind: field.kind.tag(),
                    label: field.label,
                    default: field.default.as_text(),
                    elements: field.elements.join("|"),
                })?;
            }
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn validate_enumeration(field: &ParameterField) -> Result<(), SchemaError> {
    if field.elements.is_empty() {
        return Err(SchemaError::EmptyEnumeration(field.name.to_string()));
    }

    let mut seen = HashSet::new();
    for element in field.elements {
        if !seen.insert(*element) {
            return Err(SchemaError::DuplicateElement {
                field: field.name.to_string(),
                element: element.to_string(),
            });
        }
    }

    match field.default {
        DefaultValue::Text(default) if field.elements.contains(&default) => Ok(()),
        other => Err(SchemaError::DefaultNotAnElement {
            field: field.name.to_string(),
            default: other.as_text(),
        }),
    }
}

fn write_element(xml: &mut String, depth: usize, tag: &str, text: &str) -> std::fmt::Result {
    if text.is_empty() {
        return writeln!(xml, "{:indent$}<{}></{}>", "", tag, tag, indent = depth * 2);
    }
    writeln!(
        xml,
        "{:indent$}<{}>{}</{}>",
        "",
        tag,
        escape_xml(text),
        tag,
        indent = depth * 2
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
