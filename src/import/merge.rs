// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Reconciliation of the touched tree: stale children at the end of a pass, stale
//! properties whenever a node is left.

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use super::builder::child_path;
use super::{ContentCreator, ImportError};
use crate::model::NodePath;
use crate::store::{ContentStore, PrincipalStore};

/// Nodes created or revisited during one pass, in first-touch order.
#[derive(Debug, Default)]
pub(crate) struct TouchedNodes {
    order: Vec<NodePath>,
    members: HashSet<NodePath>,
}

impl TouchedNodes {
    pub(crate) fn insert(&mut self, node: NodePath) {
        if self.members.insert(node.clone()) {
            self.order.push(node);
        }
    }

    pub(crate) fn contains(&self, node: &NodePath) -> bool {
        self.members.contains(node)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &NodePath> {
        self.order.iter()
    }

    pub(crate) fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}

impl<S: ContentStore + PrincipalStore> ContentCreator<'_, S> {
    /// Removes children of touched nodes that the pass did not touch, when node merge is
    /// on, then forgets the per-pass tracking. Returns the children that could not be
    /// removed.
    pub(crate) fn reconcile(&mut self) -> Vec<NodePath> {
        let mut skipped = Vec::new();
        if self.policy.merge {
            for candidate in self.stale_children() {
                if let Err(err) = self.remove_stale(&candidate) {
                    warn!(node = %candidate, error = %err, "failed to remove unconfirmed node");
                    if let Err(err) = self.session.refresh(&candidate, false) {
                        warn!(node = %candidate, error = %err, "failed to refresh node");
                    }
                    skipped.push(candidate);
                }
            }
        }
        self.touched.clear();
        self.added_properties.clear();
        skipped
    }

    fn stale_children(&self) -> Vec<NodePath> {
        let mut seen = HashSet::new();
        let mut stale = Vec::new();
        for node in self.touched.iter() {
            debug!(node = %node, "finding children");
            let Ok(children) = self.session.children(node) else {
                continue;
            };
            for child in children {
                if !self.touched.contains(&child) && seen.insert(child.clone()) {
                    stale.push(child);
                }
            }
        }
        stale
    }

    fn remove_stale(&mut self, node: &NodePath) -> Result<(), ImportError> {
        if !self.session.node_exists(node) {
            return Ok(());
        }
        self.listener.on_delete(node);
        debug!(node = %node, "removing node not confirmed by the import");
        if let Some(parent) = node.parent() {
            self.checkout_if_necessary(&parent)?;
        }
        self.session.save()?;
        self.session.remove_node(node)?;
        self.session.save()?;
        Ok(())
    }

    /// Strips the properties of `node` that the pass did not assert, keeping the ones the
    /// store maintains itself.
    pub(crate) fn prune_properties(&mut self, node: &NodePath) -> Result<(), ImportError> {
        if !self.policy.property_merge || !self.session.node_exists(node) {
            return Ok(());
        }
        let asserted = self.added_properties.get(node);
        let unasserted = self
            .session
            .property_names(node)?
            .into_iter()
            .filter(|name| !asserted.is_some_and(|names| names.contains(name)))
            .collect::<Vec<_>>();

        for name in unasserted {
            if self.session.property_definition(node, &name)?.is_store_managed() {
                continue;
            }
            let property = child_path(node, &name)?;
            self.checkout_if_necessary(node)?;
            self.session.remove_property(node, &name)?;
            trace!(property = %property, "removed property not asserted by the import");
            self.listener.on_delete(&property);
        }
        Ok(())
    }
}
