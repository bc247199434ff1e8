// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Forward references to nodes that do not exist yet.
//!
//! A reference property naming a missing node is parked here, keyed by the target path,
//! and written once the target has been imported and left.

use std::collections::HashMap;

use smallvec::SmallVec;

use super::{ContentCreator, ImportError};
use crate::model::{Identifier, NodePath, PropertyValue, Value};
use crate::store::{ContentStore, PrincipalStore, MIX_REFERENCEABLE};

/// A property waiting for one target node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PendingReference {
    /// Single-valued reference property.
    Single { property: NodePath },
    /// Slots of a multi-valued reference property; the values live in the batch table.
    Batch { property: NodePath, slots: SmallVec<[usize; 2]> },
}

/// One element of a multi-valued reference property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReferenceSlot {
    Resolved(Identifier),
    Pending(NodePath),
}

impl ReferenceSlot {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Self::Resolved(id) => Value::Reference(id.clone()),
            Self::Pending(path) => Value::Path(path.to_string()),
        }
    }
}

/// What a reference value points at, at the time it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TargetIdentity {
    Referenceable(Identifier),
    Missing,
    NotReferenceable,
}

/// Reference that was still waiting for its target when the pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Absolute target path, or the raw value when it is not a valid path.
    pub target: String,
    pub property: NodePath,
}

#[derive(Debug, Default)]
pub(crate) struct PendingReferences {
    by_target: HashMap<NodePath, Vec<PendingReference>>,
    batches: HashMap<NodePath, Vec<ReferenceSlot>>,
    malformed: Vec<UnresolvedReference>,
}

impl PendingReferences {
    pub(crate) fn record(&mut self, target: NodePath, property: NodePath) {
        let entries = self.by_target.entry(target).or_default();
        let entry = PendingReference::Single { property };
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }

    /// Keeps a value that does not name a path; it can never resolve.
    pub(crate) fn record_malformed(&mut self, raw: &str, property: NodePath) {
        let entry = UnresolvedReference { target: raw.to_owned(), property };
        if !self.malformed.contains(&entry) {
            self.malformed.push(entry);
        }
    }

    /// Stores the slot vector of a multi-valued property and parks every pending slot.
    pub(crate) fn record_batch(&mut self, property: NodePath, slots: Vec<ReferenceSlot>) {
        for (index, slot) in slots.iter().enumerate() {
            let ReferenceSlot::Pending(target) = slot else {
                continue;
            };
            let entries = self.by_target.entry(target.clone()).or_default();
            let existing = entries.iter_mut().find_map(|entry| match entry {
                PendingReference::Batch { property: p, slots } if *p == property => Some(slots),
                _ => None,
            });
            match existing {
                Some(indexes) => indexes.push(index),
                None => entries.push(PendingReference::Batch {
                    property: property.clone(),
                    slots: SmallVec::from_elem(index, 1),
                }),
            }
        }
        self.batches.insert(property, slots);
    }

    pub(crate) fn has_pending(&self, target: &NodePath) -> bool {
        self.by_target.get(target).is_some_and(|entries| !entries.is_empty())
    }

    pub(crate) fn take(&mut self, target: &NodePath) -> Vec<PendingReference> {
        self.by_target.remove(target).unwrap_or_default()
    }

    pub(crate) fn has_batch(&self, property: &NodePath) -> bool {
        self.batches.contains_key(property)
    }

    /// Fills `slots` of the batch for `property` with `identifier` where they still wait for
    /// `target`. Returns the rewritten values and whether every slot is now resolved.
    pub(crate) fn fill_batch(
        &mut self,
        property: &NodePath,
        slots: &[usize],
        target: &NodePath,
        identifier: &Identifier,
    ) -> Option<(Vec<Value>, bool)> {
        let batch = self.batches.get_mut(property)?;
        for &index in slots {
            if let Some(slot) = batch.get_mut(index) {
                if matches!(slot, ReferenceSlot::Pending(path) if path == target) {
                    *slot = ReferenceSlot::Resolved(identifier.clone());
                }
            }
        }
        let complete = batch.iter().all(|slot| matches!(slot, ReferenceSlot::Resolved(_)));
        Some((batch.iter().map(ReferenceSlot::to_value).collect(), complete))
    }

    /// Rewrites every slot of the batch still pointing at `target`.
    fn fill_all_slots(
        &mut self,
        property: &NodePath,
        target: &NodePath,
        identifier: &Identifier,
    ) -> Option<(Vec<Value>, bool)> {
        let len = self.batches.get(property)?.len();
        let all = (0..len).collect::<Vec<_>>();
        self.fill_batch(property, &all, target, identifier)
    }

    pub(crate) fn drop_batch(&mut self, property: &NodePath) {
        self.batches.remove(property);
    }

    pub(crate) fn unresolved(&self) -> Vec<UnresolvedReference> {
        let mut out = self
            .by_target
            .iter()
            .flat_map(|(target, entries)| {
                entries.iter().map(move |entry| {
                    let property = match entry {
                        PendingReference::Single { property }
                        | PendingReference::Batch { property, .. } => property.clone(),
                    };
                    UnresolvedReference { target: target.to_string(), property }
                })
            })
            .chain(self.malformed.iter().cloned())
            .collect::<Vec<_>>();
        out.sort_by(|a, b| a.target.cmp(&b.target).then_with(|| a.property.cmp(&b.property)));
        out
    }

    pub(crate) fn clear(&mut self) {
        self.by_target.clear();
        self.batches.clear();
        self.malformed.clear();
    }
}

impl<S: ContentStore + PrincipalStore> ContentCreator<'_, S> {
    pub(crate) fn target_identity(&self, target: &NodePath) -> Result<TargetIdentity, ImportError> {
        if !self.session.node_exists(target) {
            if self.session.item_exists(target) {
                return Ok(TargetIdentity::NotReferenceable);
            }
            return Ok(TargetIdentity::Missing);
        }
        if !self.session.is_node_type(target, MIX_REFERENCEABLE)? {
            return Ok(TargetIdentity::NotReferenceable);
        }
        Ok(TargetIdentity::Referenceable(self.session.identifier(target)?))
    }

    /// Writes every parked reference that waits for `finished`.
    ///
    /// Targets that are not referenceable keep their entries; they never resolve.
    pub(crate) fn resolve_references(&mut self, finished: &NodePath) -> Result<(), ImportError> {
        if !self.pending.has_pending(finished) {
            return Ok(());
        }
        if !self.session.is_node_type(finished, MIX_REFERENCEABLE)? {
            return Ok(());
        }
        let identifier = self.session.identifier(finished)?;

        for entry in self.pending.take(finished) {
            match entry {
                PendingReference::Single { property } => {
                    self.write_single_reference(&property, finished, &identifier)?;
                }
                PendingReference::Batch { property, slots } => {
                    let filled = self.pending.fill_batch(&property, &slots, finished, &identifier);
                    if let Some((values, complete)) = filled {
                        self.write_batch(&property, values, complete)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn write_single_reference(
        &mut self,
        property: &NodePath,
        target: &NodePath,
        identifier: &Identifier,
    ) -> Result<(), ImportError> {
        let Some(node) = property.parent() else {
            return Ok(());
        };
        if !self.session.node_exists(&node) {
            return Ok(());
        }
        let name = property.name();
        self.checkout_if_necessary(&node)?;

        let existing = self.session.property(&node, name)?;
        let multiple = existing.as_ref().is_some_and(PropertyValue::is_multiple);
        if multiple && self.pending.has_batch(property) {
            if let Some((values, complete)) =
                self.pending.fill_all_slots(property, target, identifier)
            {
                return self.write_batch(property, values, complete);
            }
        }

        let reference = Value::Reference(identifier.clone());
        let value = if multiple {
            PropertyValue::Multi(vec![reference])
        } else {
            PropertyValue::Single(reference)
        };
        self.session.set_property(&node, name, value)?;
        self.notify_property_write(property, existing.is_none());
        Ok(())
    }

    fn write_batch(
        &mut self,
        property: &NodePath,
        values: Vec<Value>,
        complete: bool,
    ) -> Result<(), ImportError> {
        if complete {
            self.pending.drop_batch(property);
        }
        let Some(node) = property.parent() else {
            return Ok(());
        };
        if !self.session.node_exists(&node) {
            return Ok(());
        }
        let name = property.name();
        self.checkout_if_necessary(&node)?;
        let created = self.session.property(&node, name)?.is_none();
        self.session.set_property(&node, name, PropertyValue::Multi(values))?;
        self.notify_property_write(property, created);
        Ok(())
    }
}
