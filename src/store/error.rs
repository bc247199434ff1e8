// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use crate::model::{NodePath, ParsePathError, PropertyType};

/// Failures raised by a content store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    ItemNotFound {
        path: String,
    },
    ItemExists {
        path: NodePath,
    },
    NoSuchNodeType {
        name: String,
    },
    ConstraintViolation {
        path: NodePath,
        reason: String,
    },
    /// Mutation below a version-controlled node that is checked in.
    CheckedIn {
        path: NodePath,
    },
    NotVersionable {
        path: NodePath,
    },
    Locked {
        path: NodePath,
    },
    ValueFormat {
        value: String,
        expected: PropertyType,
    },
    InvalidPath {
        value: String,
        source: ParsePathError,
    },
    AccessControl {
        path: NodePath,
        reason: String,
    },
}

impl StoreError {
    pub fn not_found(path: impl fmt::Display) -> Self {
        Self::ItemNotFound { path: path.to_string() }
    }

    pub fn invalid_path(value: impl Into<String>, source: ParsePathError) -> Self {
        Self::InvalidPath { value: value.into(), source }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemNotFound { path } => write!(f, "item not found: {path}"),
            Self::ItemExists { path } => write!(f, "item already exists: {path}"),
            Self::NoSuchNodeType { name } => write!(f, "unknown node type {name:?}"),
            Self::ConstraintViolation { path, reason } => {
                write!(f, "constraint violation at {path}: {reason}")
            }
            Self::CheckedIn { path } => {
                write!(f, "cannot modify {path}: versionable node is checked in")
            }
            Self::NotVersionable { path } => write!(f, "node {path} is not versionable"),
            Self::Locked { path } => write!(f, "node {path} is locked"),
            Self::ValueFormat { value, expected } => {
                write!(f, "cannot convert {value:?} to a {expected} value")
            }
            Self::InvalidPath { value, source } => write!(f, "invalid path {value:?}: {source}"),
            Self::AccessControl { path, reason } => {
                write!(f, "access control update failed at {path}: {reason}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidPath { source, .. } => Some(source),
            _ => None,
        }
    }
}
