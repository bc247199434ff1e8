// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use smol_str::SmolStr;

use crate::model::{NodePath, PrincipalName, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Group,
}

impl fmt::Display for PrincipalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Group => f.write_str("group"),
        }
    }
}

/// A user or group as seen through the principal directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorizable {
    pub id: PrincipalName,
    pub kind: PrincipalKind,
    pub principal_name: String,
    pub home: NodePath,
}

impl Authorizable {
    pub fn is_group(&self) -> bool {
        self.kind == PrincipalKind::Group
    }
}

/// Placement hint for a (re)written access-control entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AceOrder {
    First,
    Last,
    Before(String),
    After(String),
    Index(usize),
}

impl FromStr for AceOrder {
    type Err = ParseAceOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("first") {
            return Ok(Self::First);
        }
        if trimmed.eq_ignore_ascii_case("last") {
            return Ok(Self::Last);
        }
        if let Some((keyword, principal)) = trimmed.split_once(char::is_whitespace) {
            let principal = principal.trim();
            if !principal.is_empty() {
                if keyword.eq_ignore_ascii_case("before") {
                    return Ok(Self::Before(principal.to_owned()));
                }
                if keyword.eq_ignore_ascii_case("after") {
                    return Ok(Self::After(principal.to_owned()));
                }
            }
        }
        trimmed
            .parse::<usize>()
            .map(Self::Index)
            .map_err(|_| ParseAceOrderError { value: s.to_owned() })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAceOrderError {
    value: String,
}

impl fmt::Display for ParseAceOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal ace order {:?}", self.value)
    }
}

impl std::error::Error for ParseAceOrderError {}

/// Requested change to the entry of one principal on one node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AceUpdate {
    pub principal: String,
    pub granted: Vec<SmolStr>,
    pub denied: Vec<SmolStr>,
    pub order: Option<AceOrder>,
    pub restrictions: BTreeMap<SmolStr, Value>,
    pub mv_restrictions: BTreeMap<SmolStr, Vec<Value>>,
    pub removed_restrictions: BTreeSet<SmolStr>,
}

/// Effective access-control entry for one principal on one node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccessControlEntry {
    pub principal: String,
    pub granted: BTreeSet<SmolStr>,
    pub denied: BTreeSet<SmolStr>,
    pub restrictions: BTreeMap<SmolStr, Vec<Value>>,
}

impl AccessControlEntry {
    /// Folds `update` into this entry: a newly granted privilege is no longer denied and
    /// vice versa, and restrictions not named in the update are kept unless removed.
    pub fn apply(&mut self, update: &AceUpdate) {
        for privilege in &update.granted {
            self.denied.remove(privilege);
            self.granted.insert(privilege.clone());
        }
        for privilege in &update.denied {
            self.granted.remove(privilege);
            self.denied.insert(privilege.clone());
        }
        for name in &update.removed_restrictions {
            self.restrictions.remove(name);
        }
        for (name, value) in &update.restrictions {
            self.restrictions.insert(name.clone(), vec![value.clone()]);
        }
        for (name, values) in &update.mv_restrictions {
            self.restrictions.insert(name.clone(), values.clone());
        }
    }
}
