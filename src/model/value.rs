// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use super::ids::Identifier;

/// Store-native property type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// No explicit type: the lexical value is stored as a string.
    Undefined,
    String,
    Binary,
    Long,
    Double,
    Decimal,
    Date,
    Boolean,
    Name,
    Path,
    Reference,
    Uri,
}

impl PropertyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Long => "long",
            Self::Double => "double",
            Self::Decimal => "decimal",
            Self::Date => "date",
            Self::Boolean => "boolean",
            Self::Name => "name",
            Self::Path => "path",
            Self::Reference => "reference",
            Self::Uri => "uri",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = ParsePropertyTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "undefined" => Self::Undefined,
            "string" => Self::String,
            "binary" => Self::Binary,
            "long" => Self::Long,
            "double" => Self::Double,
            "decimal" => Self::Decimal,
            "date" => Self::Date,
            "boolean" => Self::Boolean,
            "name" => Self::Name,
            "path" => Self::Path,
            "reference" => Self::Reference,
            "uri" => Self::Uri,
            _ => return Err(ParsePropertyTypeError { value: s.to_owned() }),
        };
        Ok(ty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePropertyTypeError {
    value: String,
}

impl fmt::Display for ParsePropertyTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown property type {:?}", self.value)
    }
}

impl std::error::Error for ParsePropertyTypeError {}

/// A typed value as held by the content store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    String(String),
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
    Long(i64),
    Double(f64),
    Decimal(String),
    Date(DateTime<FixedOffset>),
    Boolean(bool),
    Name(SmolStr),
    /// Absolute path. Also used as the placeholder for a reference slot whose target does
    /// not exist yet.
    Path(String),
    Reference(Identifier),
    Uri(String),
}

impl Value {
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::String(_) => PropertyType::String,
            Self::Binary(_) => PropertyType::Binary,
            Self::Long(_) => PropertyType::Long,
            Self::Double(_) => PropertyType::Double,
            Self::Decimal(_) => PropertyType::Decimal,
            Self::Date(_) => PropertyType::Date,
            Self::Boolean(_) => PropertyType::Boolean,
            Self::Name(_) => PropertyType::Name,
            Self::Path(_) => PropertyType::Path,
            Self::Reference(_) => PropertyType::Reference,
            Self::Uri(_) => PropertyType::Uri,
        }
    }

    pub fn as_reference(&self) -> Option<&Identifier> {
        match self {
            Self::Reference(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Self::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Decimal(s) | Self::Path(s) | Self::Uri(s) => Some(s.as_str()),
            Self::Name(name) => Some(name.as_str()),
            Self::Reference(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// A property value: one value, or an ordered list for multi-valued properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Single(Value),
    Multi(Vec<Value>),
}

impl PropertyValue {
    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multi(_))
    }

    pub fn single(&self) -> Option<&Value> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(_) => None,
        }
    }

    pub fn values(&self) -> &[Value] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        }
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        Self::Single(value)
    }
}

/// Source-side scalar handed to the importer by a decoder, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Integer(i64),
    DateTime(DateTime<FixedOffset>),
    Float(f64),
    Boolean(bool),
    Binary(Vec<u8>),
    Text(String),
}

impl From<&str> for SourceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for SourceValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for SourceValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for SourceValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// Lexical property input for typed `set_property` calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyInput {
    Single(String),
    Multi(Vec<String>),
}

impl From<&str> for PropertyInput {
    fn from(value: &str) -> Self {
        Self::Single(value.to_owned())
    }
}

impl From<Vec<&str>> for PropertyInput {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_owned).collect())
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw.as_bytes()).map_err(serde::de::Error::custom)
    }
}
