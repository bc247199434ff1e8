// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Node and property creation on top of the cursor stack.

use chrono::Utc;
use tracing::{debug, warn};

use super::references::{ReferenceSlot, TargetIdentity};
use super::{ContentCreator, ImportError, StructuralError};
use crate::coerce::{coerce, date_from_millis, parse_lexical};
use crate::mime::DEFAULT_CONTENT_TYPE;
use crate::model::{NodePath, PropertyInput, PropertyType, PropertyValue, SourceValue, Value};
use crate::store::{
    ContentStore, PrincipalStore, StoreError, JCR_CONTENT, JCR_DATA, JCR_IS_CHECKED_OUT,
    JCR_LAST_MODIFIED, JCR_MIME_TYPE, MIX_VERSIONABLE, NT_FILE, NT_RESOURCE,
};

pub(crate) fn child_path(node: &NodePath, name: &str) -> Result<NodePath, StoreError> {
    node.join(name).map_err(|err| StoreError::invalid_path(name, err))
}

impl<S: ContentStore + PrincipalStore> ContentCreator<'_, S> {
    pub fn enter_node(
        &mut self,
        name: Option<&str>,
        primary_type: Option<&str>,
        mixin_types: &[&str],
    ) -> Result<(), ImportError> {
        let parent = self.current()?.clone();
        let depth = self.stack.len();
        let name = match (name, self.default_name.as_deref()) {
            (Some(name), _) => name.to_owned(),
            (None, _) if depth > 1 => {
                return Err(StructuralError::UnnamedNodeBelowRoot { depth }.into());
            }
            (None, Some(default_name)) => default_name.to_owned(),
            (None, None) => {
                // Importing into the anchor itself: the top-level node is the anchor.
                self.stack.push(parent);
                return Ok(());
            }
        };

        let path = child_path(&parent, &name)?;
        if self.overwrites() && self.session.node_exists(&path) {
            self.checkout_if_necessary(&parent)?;
            self.session.remove_node(&path)?;
        }

        if self.session.node_exists(&path) {
            if let Err(err) = self.session.order_before(&parent, &name, None) {
                warn!(node = %path, error = %err, "failed to reorder existing node");
            }
        } else {
            self.checkout_if_necessary(&parent)?;
            self.session.add_node(&parent, &name, primary_type)?;
            self.record_created(&path);
        }

        for mixin in mixin_types {
            if !self.session.is_node_type(&path, mixin)? {
                self.checkout_if_necessary(&path)?;
                self.session.add_mixin(&path, mixin)?;
            }
        }

        self.touched.insert(path.clone());
        if self.policy.checkin && self.session.is_node_type(&path, MIX_VERSIONABLE)? {
            self.add_versionable(path.clone());
        }
        if self.created_root.is_none() {
            self.created_root = Some(path.clone());
        }
        self.stack.push(path);
        Ok(())
    }

    pub fn leave_node(&mut self) -> Result<(), ImportError> {
        self.current()?;
        if self.stack.len() < 2 {
            return Err(StructuralError::StackUnderflow.into());
        }
        let Some(node) = self.stack.pop() else {
            return Err(StructuralError::StackUnderflow.into());
        };
        self.prune_properties(&node)?;
        self.resolve_references(&node)
    }

    pub fn set_property(
        &mut self,
        name: &str,
        property_type: PropertyType,
        value: PropertyInput,
    ) -> Result<(), ImportError> {
        let node = self.current()?.clone();
        self.property_added(&node, name);
        if self.keeps_existing_property(&node, name)? {
            return Ok(());
        }

        match (property_type, value) {
            (PropertyType::Reference, PropertyInput::Single(raw)) => {
                self.set_reference(&node, name, &raw)
            }
            (PropertyType::Reference, PropertyInput::Multi(raws)) => {
                self.set_references(&node, name, &raws)
            }
            (_, PropertyInput::Single(raw)) if name == JCR_IS_CHECKED_OUT => {
                // Never written; a node imported as checked in is checked in at the end.
                if !raw.trim().eq_ignore_ascii_case("true") {
                    self.add_versionable(node);
                }
                Ok(())
            }
            (ty, PropertyInput::Single(raw)) => {
                let value = parse_lexical(&raw, ty)?;
                self.write_property(&node, name, PropertyValue::Single(value))
            }
            (ty, PropertyInput::Multi(raws)) => {
                let values = raws
                    .iter()
                    .map(|raw| parse_lexical(raw, ty))
                    .collect::<Result<Vec<_>, _>>()?;
                self.write_property(&node, name, PropertyValue::Multi(values))
            }
        }
    }

    pub fn set_value(&mut self, name: &str, value: Option<SourceValue>) -> Result<(), ImportError> {
        let node = self.current()?.clone();
        let value = value.map(|value| PropertyValue::Single(coerce(value)));
        self.put_value(&node, name, value, false)
    }

    pub fn set_values(&mut self, name: &str, values: Vec<SourceValue>) -> Result<(), ImportError> {
        let node = self.current()?.clone();
        let value = if values.is_empty() {
            None
        } else {
            Some(PropertyValue::Multi(values.into_iter().map(coerce).collect()))
        };
        self.put_value(&node, name, value, false)
    }

    pub fn create_file_node(
        &mut self,
        name: &str,
        data: Vec<u8>,
        mime_type: Option<&str>,
        last_modified: i64,
    ) -> Result<(), ImportError> {
        let name = name.rsplit_once('/').map_or(name, |(_, last)| last);
        let parent = self.current()?.clone();
        let file = child_path(&parent, name)?;
        let reused = !self.overwrites() && self.session.node_exists(&file);

        self.enter_node(Some(name), Some(NT_FILE), &[])?;
        self.enter_node(Some(JCR_CONTENT), Some(NT_RESOURCE), &[])?;
        let content = self.current()?.clone();

        if reused {
            let stored = self
                .session
                .property(&content, JCR_LAST_MODIFIED)?
                .and_then(|value| value.single().and_then(Value::as_date).copied())
                .map_or(0, |date| date.timestamp_millis());
            if stored >= last_modified {
                debug!(file = %file, stored, last_modified, "file content is up to date");
                for property in [JCR_MIME_TYPE, JCR_LAST_MODIFIED, JCR_DATA] {
                    self.property_added(&content, property);
                }
                return Ok(());
            }
            debug!(file = %file, stored, last_modified, "updating file content");
        }

        let mime_type = match mime_type {
            Some(mime_type) => mime_type.to_owned(),
            None => self.mime_types.mime_type_for(name).unwrap_or_else(|| {
                debug!(file = %file, "unknown content type, using {DEFAULT_CONTENT_TYPE}");
                DEFAULT_CONTENT_TYPE.to_owned()
            }),
        };
        let modified = Some(last_modified)
            .filter(|millis| *millis > 0)
            .and_then(date_from_millis)
            .unwrap_or_else(|| Utc::now().fixed_offset());

        let single = |value| Some(PropertyValue::Single(value));
        self.put_value(&content, JCR_MIME_TYPE, single(Value::String(mime_type)), true)?;
        self.put_value(&content, JCR_LAST_MODIFIED, single(Value::Date(modified)), true)?;
        self.put_value(&content, JCR_DATA, single(Value::Binary(data)), true)
    }

    pub fn relocate_or_create_path(
        &mut self,
        sub_path: &str,
        new_type: Option<&str>,
    ) -> Result<bool, ImportError> {
        let mut node = self.current()?.clone();
        for segment in sub_path.split('/').filter(|segment| !segment.is_empty()) {
            let next = child_path(&node, segment)?;
            if !self.session.node_exists(&next) {
                let Some(new_type) = new_type else {
                    return Ok(false);
                };
                self.checkout_if_necessary(&node)?;
                self.session.add_node(&node, segment, Some(new_type))?;
                self.record_created(&next);
            }
            node = next;
        }
        self.stack.push(node);
        Ok(true)
    }

    fn overwrites(&self) -> bool {
        self.policy.overwrite && !self.ignore_overwrite
    }

    fn property_added(&mut self, node: &NodePath, name: &str) {
        self.added_properties.entry(node.clone()).or_default().insert(name.into());
    }

    /// An existing property survives a pass that does not allow property overwrite, unless
    /// it was only created during the current save cycle.
    fn keeps_existing_property(&self, node: &NodePath, name: &str) -> Result<bool, ImportError> {
        if self.policy.property_overwrite || self.session.property(node, name)?.is_none() {
            return Ok(false);
        }
        Ok(!self.session.is_new_property(node, name)?)
    }

    fn write_property(
        &mut self,
        node: &NodePath,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), ImportError> {
        let property = child_path(node, name)?;
        self.checkout_if_necessary(node)?;
        let created = self.session.property(node, name)?.is_none();
        self.session.set_property(node, name, value)?;
        self.notify_property_write(&property, created);
        Ok(())
    }

    /// Writes or removes a property from a source value; `forced` writes even over a
    /// property that existed before the pass.
    fn put_value(
        &mut self,
        node: &NodePath,
        name: &str,
        value: Option<PropertyValue>,
        forced: bool,
    ) -> Result<(), ImportError> {
        self.property_added(node, name);
        let exists = self.session.property(node, name)?.is_some();
        if exists && !forced && !self.session.is_new_property(node, name)? {
            return Ok(());
        }
        match value {
            Some(value) => self.write_property(node, name, value),
            None if exists => {
                let property = child_path(node, name)?;
                self.checkout_if_necessary(node)?;
                self.session.remove_property(node, name)?;
                self.listener.on_delete(&property);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn set_reference(&mut self, node: &NodePath, name: &str, raw: &str) -> Result<(), ImportError> {
        let property = child_path(node, name)?;
        let target = match NodePath::resolve(node, raw) {
            Ok(target) => target,
            Err(err) => {
                debug!(property = %property, value = raw, error = %err, "malformed reference");
                self.pending.record_malformed(raw, property);
                return Ok(());
            }
        };
        match self.target_identity(&target)? {
            TargetIdentity::Referenceable(identifier) => {
                self.write_property(node, name, PropertyValue::Single(Value::Reference(identifier)))
            }
            TargetIdentity::Missing => {
                self.pending.record(target, property);
                Ok(())
            }
            TargetIdentity::NotReferenceable => {
                debug!(
                    property = %property,
                    reference_target = %target,
                    "reference target is not referenceable"
                );
                Ok(())
            }
        }
    }

    fn set_references(
        &mut self,
        node: &NodePath,
        name: &str,
        raws: &[String],
    ) -> Result<(), ImportError> {
        let property = child_path(node, name)?;
        let mut slots = Vec::with_capacity(raws.len());
        for raw in raws {
            let target = match NodePath::resolve(node, raw) {
                Ok(target) => target,
                Err(err) => {
                    debug!(property = %property, value = %raw, error = %err, "malformed reference");
                    self.pending.record_malformed(raw, property.clone());
                    continue;
                }
            };
            match self.target_identity(&target)? {
                TargetIdentity::Referenceable(identifier) => {
                    slots.push(ReferenceSlot::Resolved(identifier));
                }
                TargetIdentity::Missing => slots.push(ReferenceSlot::Pending(target)),
                TargetIdentity::NotReferenceable => {
                    debug!(
                        property = %property,
                        reference_target = %target,
                        "dropping reference to a node that is not referenceable"
                    );
                }
            }
        }

        let values = slots.iter().map(ReferenceSlot::to_value).collect();
        self.write_property(node, name, PropertyValue::Multi(values))?;
        if slots.iter().any(|slot| matches!(slot, ReferenceSlot::Pending(_))) {
            self.pending.record_batch(property, slots);
        }
        Ok(())
    }
}
