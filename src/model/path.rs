// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Absolute, normalized path of an item (node or property) in the content store.
///
/// Canonical format: `/` for the root, otherwise `/<segment>(/<segment>)*` with no empty,
/// `.` or `..` segments and no trailing slash. Property paths share the node namespace:
/// the property `title` on `/content/page` lives at `/content/page/title`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodePath {
    raw: String,
}

impl NodePath {
    pub fn root() -> Self {
        Self { raw: "/".to_owned() }
    }

    pub fn parse(input: &str) -> Result<Self, ParsePathError> {
        let rest = input.strip_prefix('/').ok_or(ParsePathError::NotAbsolute)?;
        if rest.is_empty() {
            return Ok(Self::root());
        }
        for segment in rest.split('/') {
            validate_segment(segment)?;
        }
        Ok(Self { raw: input.to_owned() })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn is_root(&self) -> bool {
        self.raw.len() == 1
    }

    /// Last segment of the path; empty for the root.
    pub fn name(&self) -> &str {
        match memchr::memrchr(b'/', self.raw.as_bytes()) {
            Some(idx) => &self.raw[idx + 1..],
            None => "",
        }
    }

    pub fn parent(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }
        match memchr::memrchr(b'/', self.raw.as_bytes()) {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self { raw: self.raw[..idx].to_owned() }),
            None => None,
        }
    }

    pub fn join(&self, segment: &str) -> Result<NodePath, ParsePathError> {
        validate_segment(segment)?;
        let mut raw = String::with_capacity(self.raw.len() + segment.len() + 1);
        raw.push_str(&self.raw);
        if !self.is_root() {
            raw.push('/');
        }
        raw.push_str(segment);
        Ok(Self { raw })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('/').filter(|s| !s.is_empty())
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// `true` when `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        if self.is_root() {
            return !other.is_root();
        }
        other
            .raw
            .strip_prefix(self.raw.as_str())
            .is_some_and(|rest| rest.starts_with('/'))
    }

    /// `self` or any descendant of it.
    pub fn contains(&self, other: &NodePath) -> bool {
        self == other || self.is_ancestor_of(other)
    }

    /// Resolves a reference value written relative to `base`.
    ///
    /// `/...` is absolute. Otherwise each leading `../` moves one level up from `base`, and
    /// leading `./` segments are dropped before the remainder is appended.
    pub fn resolve(base: &NodePath, value: &str) -> Result<NodePath, ParsePathError> {
        if value.starts_with('/') {
            return Self::parse(value);
        }

        let mut node = base.clone();
        let mut rest = value;
        while let Some(stripped) = rest.strip_prefix("../") {
            node = node.parent().ok_or(ParsePathError::AboveRoot)?;
            rest = stripped;
        }
        while let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        }
        if rest.is_empty() {
            return Ok(node);
        }

        let mut resolved = node;
        for segment in rest.split('/') {
            resolved = resolved.join(segment)?;
        }
        Ok(resolved)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for NodePath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for NodePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

fn validate_segment(segment: &str) -> Result<(), ParsePathError> {
    if segment.is_empty() {
        return Err(ParsePathError::EmptySegment);
    }
    if segment.contains('/') {
        return Err(ParsePathError::InvalidSegment(segment.to_owned()));
    }
    if segment == "." || segment == ".." {
        return Err(ParsePathError::InvalidSegment(segment.to_owned()));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsePathError {
    NotAbsolute,
    EmptySegment,
    InvalidSegment(String),
    AboveRoot,
}

impl fmt::Display for ParsePathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAbsolute => f.write_str("path must start with '/'"),
            Self::EmptySegment => f.write_str("path must not contain empty segments"),
            Self::InvalidSegment(segment) => write!(f, "invalid path segment {segment:?}"),
            Self::AboveRoot => f.write_str("relative path climbs above the root"),
        }
    }
}

impl std::error::Error for ParsePathError {}
