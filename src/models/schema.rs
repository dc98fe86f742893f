//! Descriptor data types.
//!
//! A [`Descriptor`] is static, declarative data: the host reads it to build a
//! settings form and later calls the dispatcher with one value per field,
//! addressed by the field's `name`.

use super::serde_helpers::no_elements;
use serde::Serialize;

/// The complete parameter schema of one external executable.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub category: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub documentation_url: &'static str,
    pub license: &'static str,
    pub contributor: &'static str,
    pub groups: &'static [ParameterGroup],
}

/// A labelled collection of fields shown together.
#[derive(Debug, Serialize)]
pub struct ParameterGroup {
    pub label: &'static str,
    pub description: &'static str,
    pub fields: &'static [ParameterField],
}

/// One configurable value.
#[derive(Debug, Serialize)]
pub struct ParameterField {
    /// Lookup key used by the host when it calls the dispatcher.
    pub name: &'static str,
    pub longflag: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub kind: FieldKind,
    pub default: DefaultValue,
    /// Allowed values, only meaningful for [`FieldKind::StringEnumeration`].
    #[serde(skip_serializing_if = "no_elements")]
    pub elements: &'static [&'static str],
}

/// Field type, named after the host's XML element for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Boolean,
    String,
    StringEnumeration,
    File,
}

impl FieldKind {
    pub fn tag(self) -> &'static str {
        match self {
            FieldKind::Boolean => "boolean",
            FieldKind::String => "string",
            FieldKind::StringEnumeration => "string-enumeration",
            FieldKind::File => "file",
        }
    }

    pub fn is_boolean(self) -> bool {
        self == FieldKind::Boolean
    }
}

/// Declared default of a field.
///
/// `None` is only valid for file fields, which carry no default path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DefaultValue {
    Bool(bool),
    Text(&'static str),
    None,
}

impl DefaultValue {
    /// Text form as the host would display it, empty when there is no default.
    pub fn as_text(&self) -> String {
        match self {
            DefaultValue::Bool(b) => b.to_string(),
            DefaultValue::Text(s) => s.to_string(),
            DefaultValue::None => String::new(),
        }
    }
}

impl ParameterField {
    /// Whether the declared default fits the declared kind.
    pub fn default_matches_kind(&self) -> bool {
        matches!(
            (self.kind, self.default),
            (FieldKind::Boolean, DefaultValue::Bool(_))
                | (FieldKind::String, DefaultValue::Text(_))
                | (FieldKind::StringEnumeration, DefaultValue::Text(_))
                | (FieldKind::File, DefaultValue::Text(_))
                | (FieldKind::File, DefaultValue::None)
        )
    }
}
