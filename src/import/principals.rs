// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Users, groups and access-control entries.

use std::collections::{BTreeMap, BTreeSet};

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use smol_str::SmolStr;
use tracing::debug;

use super::{ContentCreator, ImportError};
use crate::coerce::coerce;
use crate::model::{SourceValue, Value};
use crate::store::{
    AceOrder, AceUpdate, Authorizable, ContentStore, PrincipalKind, PrincipalStore, StoreError,
};

/// Extra properties set on a created or updated principal.
pub type PrincipalProperties = BTreeMap<String, SourceValue>;

/// Salt mixed into every principal storage hint, so hints do not follow the names.
const STORAGE_SEED: &str = "6c3c1a5e-4f0b-4b7e-9a53-1d2f0e8c7b91";
const STORAGE_LEVELS: usize = 3;

/// Access-control entry for one principal on the current node.
///
/// Nothing is written unless at least one privilege list is given, even if empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AceRequest {
    pub principal_id: String,
    pub granted: Option<Vec<String>>,
    pub denied: Option<Vec<String>>,
    /// `first`, `last`, `before <principal>`, `after <principal>` or an index.
    pub order: Option<String>,
    pub restrictions: BTreeMap<String, Value>,
    pub mv_restrictions: BTreeMap<String, Vec<Value>>,
    pub removed_restrictions: BTreeSet<String>,
}

impl AceRequest {
    pub fn new(principal_id: impl Into<String>) -> Self {
        Self { principal_id: principal_id.into(), ..Self::default() }
    }

    pub fn granting<I, P>(mut self, privileges: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.granted = Some(privileges.into_iter().map(Into::into).collect());
        self
    }

    pub fn denying<I, P>(mut self, privileges: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.denied = Some(privileges.into_iter().map(Into::into).collect());
        self
    }

    pub fn ordered(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    pub fn with_restriction(mut self, name: impl Into<String>, value: Value) -> Self {
        self.restrictions.insert(name.into(), value);
        self
    }

    pub fn with_mv_restriction(mut self, name: impl Into<String>, values: Vec<Value>) -> Self {
        self.mv_restrictions.insert(name.into(), values);
        self
    }

    pub fn removing_restriction(mut self, name: impl Into<String>) -> Self {
        self.removed_restrictions.insert(name.into());
        self
    }
}

/// Storage location hint for a new principal: three levels of two hex characters taken
/// from a salted digest of `name`, each followed by `/`.
pub fn storage_hint(algorithm: &str, name: &str) -> Result<String, ImportError> {
    let input = format!("{STORAGE_SEED}{name}");
    let digest = match algorithm.to_ascii_lowercase().replace('-', "").as_str() {
        "sha224" => hex::encode(Sha224::digest(input.as_bytes())),
        "sha256" => hex::encode(Sha256::digest(input.as_bytes())),
        "sha384" => hex::encode(Sha384::digest(input.as_bytes())),
        "sha512" => hex::encode(Sha512::digest(input.as_bytes())),
        _ => return Err(ImportError::HashingUnavailable { algorithm: algorithm.to_owned() }),
    };
    let mut hint = String::with_capacity(STORAGE_LEVELS * 3);
    for chunk in digest.as_bytes().chunks(2).take(STORAGE_LEVELS) {
        hint.extend(chunk.iter().map(|byte| char::from(*byte)));
        hint.push('/');
    }
    Ok(hint)
}

impl<S: ContentStore + PrincipalStore> ContentCreator<'_, S> {
    /// Creates group `name`, or reuses it, then adds the known `members` and sets
    /// `properties`. Unknown member names are skipped.
    pub fn create_group(
        &mut self,
        name: &str,
        members: &[&str],
        properties: PrincipalProperties,
    ) -> Result<(), ImportError> {
        self.current()?;
        let group = self.ensure_authorizable(name, PrincipalKind::Group, None)?;
        for member in members {
            if self.session.authorizable(member)?.is_none() {
                debug!(group = %group.id, member, "skipping unknown group member");
                continue;
            }
            self.session.add_member(group.id.as_str(), member)?;
        }
        self.set_principal_properties(&group, properties)
    }

    pub fn create_user(
        &mut self,
        name: &str,
        password: &str,
        properties: PrincipalProperties,
    ) -> Result<(), ImportError> {
        self.current()?;
        let user = self.ensure_authorizable(name, PrincipalKind::User, Some(password))?;
        self.set_principal_properties(&user, properties)
    }

    pub fn create_ace(&mut self, request: AceRequest) -> Result<(), ImportError> {
        let node = self.current()?.clone();
        let principal = match self.session.principal(&request.principal_id)? {
            Some(principal) => principal,
            // The principal lookup only sees principals that were saved; fall back to the
            // directory for ones created earlier in this pass.
            None => self
                .session
                .authorizable(&request.principal_id)?
                .map(|authorizable| authorizable.principal_name)
                .ok_or_else(|| ImportError::PrincipalNotFound {
                    principal_id: request.principal_id.clone(),
                })?,
        };
        if request.granted.is_none() && request.denied.is_none() {
            return Ok(());
        }

        let order = request
            .order
            .as_deref()
            .map(str::parse::<AceOrder>)
            .transpose()
            .map_err(|err| StoreError::AccessControl {
                path: node.clone(),
                reason: err.to_string(),
            })?;
        let privileges = |names: Option<Vec<String>>| {
            names.unwrap_or_default().into_iter().map(SmolStr::from).collect::<Vec<_>>()
        };
        let update = AceUpdate {
            principal,
            granted: privileges(request.granted),
            denied: privileges(request.denied),
            order,
            restrictions: request
                .restrictions
                .into_iter()
                .map(|(name, value)| (SmolStr::from(name), value))
                .collect(),
            mv_restrictions: request
                .mv_restrictions
                .into_iter()
                .map(|(name, values)| (SmolStr::from(name), values))
                .collect(),
            removed_restrictions: request
                .removed_restrictions
                .into_iter()
                .map(SmolStr::from)
                .collect(),
        };
        self.session.replace_access_control_entry(&node, &update)?;
        Ok(())
    }

    fn ensure_authorizable(
        &mut self,
        name: &str,
        kind: PrincipalKind,
        password: Option<&str>,
    ) -> Result<Authorizable, ImportError> {
        if let Some(existing) = self.session.authorizable(name)? {
            if existing.kind != kind {
                return Err(ImportError::PrincipalTypeConflict {
                    name: name.to_owned(),
                    existing: existing.kind,
                });
            }
            return Ok(existing);
        }

        let hint = storage_hint(&self.policy.principal_hash_algorithm, name)?;
        let created = match (kind, password) {
            (PrincipalKind::User, password) => {
                self.session.create_user(name, password.unwrap_or_default(), &hint)?
            }
            (PrincipalKind::Group, _) => self.session.create_group(name, &hint)?,
        };
        debug!(principal = %created.id, kind = %kind, home = %created.home, "created principal");
        Ok(created)
    }

    fn set_principal_properties(
        &mut self,
        authorizable: &Authorizable,
        properties: PrincipalProperties,
    ) -> Result<(), ImportError> {
        for (name, value) in properties {
            self.session.set_authorizable_property(authorizable.id.as_str(), &name, coerce(value))?;
        }
        Ok(())
    }
}
