// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use crate::store::{PrincipalKind, StoreError};

/// Misuse of the node cursor by the driving decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    /// A structural call arrived before `begin` or after `end`.
    NotStarted,
    /// `begin` was called while a pass was still open.
    AlreadyStarted,
    /// Only the top-level node of an import may omit its name.
    UnnamedNodeBelowRoot { depth: usize },
    /// `leave_node` would pop the anchor.
    StackUnderflow,
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => f.write_str("no import pass is active"),
            Self::AlreadyStarted => f.write_str("an import pass is already active"),
            Self::UnnamedNodeBelowRoot { depth } => {
                write!(f, "node needs to have a name (cursor depth {depth})")
            }
            Self::StackUnderflow => f.write_str("cannot leave the import anchor"),
        }
    }
}

impl std::error::Error for StructuralError {}

#[derive(Debug, Clone, PartialEq)]
pub enum ImportError {
    Structural(StructuralError),
    PrincipalTypeConflict { name: String, existing: PrincipalKind },
    PrincipalNotFound { principal_id: String },
    Store(StoreError),
    HashingUnavailable { algorithm: String },
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structural(err) => write!(f, "structural error: {err}"),
            Self::PrincipalTypeConflict { name, existing } => {
                write!(f, "a {existing} already exists with the requested name: {name}")
            }
            Self::PrincipalNotFound { principal_id } => {
                write!(f, "no principal found for id: {principal_id}")
            }
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::HashingUnavailable { algorithm } => {
                write!(f, "unable to hash the path: digest {algorithm:?} is not available")
            }
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Structural(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for ImportError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<StructuralError> for ImportError {
    fn from(err: StructuralError) -> Self {
        Self::Structural(err)
    }
}
