// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Check-out before writing and check-in at the end of a pass.

use tracing::debug;

use super::{ContentCreator, ImportError};
use crate::model::NodePath;
use crate::store::{ContentStore, PrincipalStore, MIX_VERSIONABLE};

impl<S: ContentStore + PrincipalStore> ContentCreator<'_, S> {
    /// Checks out the nearest version-controlled node at or above `node` when auto checkout
    /// is on. A node that is already checked out is left alone.
    pub(crate) fn checkout_if_necessary(&mut self, node: &NodePath) -> Result<(), ImportError> {
        if !self.policy.auto_checkout {
            return Ok(());
        }
        let Some(versionable) = self.versionable_ancestor(node)? else {
            return Ok(());
        };
        if !self.session.is_checked_out(&versionable)? {
            self.session.checkout(&versionable)?;
            self.listener.on_checkout(&versionable);
        }
        Ok(())
    }

    pub(crate) fn add_versionable(&mut self, node: NodePath) {
        if !self.versionables.contains(&node) {
            self.versionables.push(node);
        }
    }

    /// Checks in every collected node that still exists and is checked out.
    pub(crate) fn check_in_versionables(&mut self) -> Result<Vec<NodePath>, ImportError> {
        let mut checked_in = Vec::new();
        for node in self.versionables.clone() {
            if !self.session.node_exists(&node) {
                continue;
            }
            if !self.session.is_node_type(&node, MIX_VERSIONABLE)? {
                debug!(node = %node, "skipping check-in of a node that is not versionable");
                continue;
            }
            if self.session.is_checked_out(&node)? {
                self.session.checkin(&node)?;
                checked_in.push(node);
            }
        }
        if !checked_in.is_empty() {
            self.session.save()?;
        }
        Ok(checked_in)
    }

    fn versionable_ancestor(&self, node: &NodePath) -> Result<Option<NodePath>, ImportError> {
        let mut current = Some(node.clone());
        while let Some(candidate) = current {
            if self.session.node_exists(&candidate)
                && self.session.is_node_type(&candidate, MIX_VERSIONABLE)?
            {
                return Ok(Some(candidate));
            }
            current = candidate.parent();
        }
        Ok(None)
    }
}
