// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The import engine.
//!
//! [`ContentCreator`] turns a stream of structural calls ([`ContentSink`]) into nodes and
//! properties below an anchor node. It keeps a cursor stack that mirrors the nesting of the
//! decoded content, parks references to nodes that do not exist yet, checks out version
//! controlled ancestors before writing, and reconciles the touched tree at [`ContentCreator::end`].

mod builder;
mod error;
mod merge;
mod principals;
mod references;
mod versioning;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet};

use smol_str::SmolStr;
use tracing::warn;

use crate::listener::{ChangeListener, NoopListener};
use crate::mime::{ExtensionMimeTable, MimeTypeLookup};
use crate::model::{NodePath, PropertyInput, PropertyType, SourceValue};
use crate::policy::ImportPolicy;
use crate::reader::ContentReader;
use crate::store::{ContentStore, PrincipalStore};

pub use error::{ImportError, StructuralError};
pub use principals::{AceRequest, PrincipalProperties};
pub use references::UnresolvedReference;

use merge::TouchedNodes;
use references::PendingReferences;

/// The structural calls a decoder drives an import with.
///
/// Object safe so a [`ContentReader`] can be handed `&mut dyn ContentSink`.
pub trait ContentSink {
    /// Enters (creating if needed) a child of the current node and makes it current.
    ///
    /// `None` names the top-level node of the import after the default name.
    fn enter_node(
        &mut self,
        name: Option<&str>,
        primary_type: Option<&str>,
        mixin_types: &[&str],
    ) -> Result<(), ImportError>;

    /// Finishes the current node and makes its parent current again.
    fn leave_node(&mut self) -> Result<(), ImportError>;

    /// Sets a property of the current node from its lexical form.
    fn set_property(
        &mut self,
        name: &str,
        property_type: PropertyType,
        value: PropertyInput,
    ) -> Result<(), ImportError>;

    /// Sets a property of the current node from a source value; `None` removes it.
    fn set_value(&mut self, name: &str, value: Option<SourceValue>) -> Result<(), ImportError>;

    /// Multi-valued form of [`ContentSink::set_value`]; an empty list removes the property.
    fn set_values(&mut self, name: &str, values: Vec<SourceValue>) -> Result<(), ImportError>;

    /// Creates a file node with its content child. Leaves the cursor on the content node;
    /// the caller leaves twice.
    fn create_file_node(
        &mut self,
        name: &str,
        data: Vec<u8>,
        mime_type: Option<&str>,
        last_modified: i64,
    ) -> Result<(), ImportError>;

    /// Moves the cursor down a relative path, creating missing segments with `new_type`.
    ///
    /// Returns `false` without moving when a segment is missing and `new_type` is `None`.
    fn relocate_or_create_path(
        &mut self,
        sub_path: &str,
        new_type: Option<&str>,
    ) -> Result<bool, ImportError>;

    fn create_group(
        &mut self,
        name: &str,
        members: &[&str],
        properties: PrincipalProperties,
    ) -> Result<(), ImportError>;

    fn create_user(
        &mut self,
        name: &str,
        password: &str,
        properties: PrincipalProperties,
    ) -> Result<(), ImportError>;

    /// Replaces the access-control entry of a principal on the current node.
    fn create_ace(&mut self, request: AceRequest) -> Result<(), ImportError>;
}

/// Outcome of one import pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// First node entered during the pass.
    pub created_root: Option<NodePath>,
    /// Version-controlled nodes checked in at the end of the pass.
    pub checked_in: Vec<NodePath>,
    /// References whose target never showed up.
    pub unresolved_references: Vec<UnresolvedReference>,
    /// Stale children the reconciler failed to remove.
    pub skipped_deletions: Vec<NodePath>,
}

/// Imports content into a store session.
///
/// One creator serves any number of sequential passes (`begin` ... `end`) but must not be
/// shared between threads while a pass is running.
pub struct ContentCreator<'a, S> {
    session: &'a mut S,
    policy: ImportPolicy,
    listener: Box<dyn ChangeListener + 'a>,
    mime_types: Box<dyn MimeTypeLookup + 'a>,
    stack: Vec<NodePath>,
    active: bool,
    default_name: Option<String>,
    created_root: Option<NodePath>,
    created_nodes: Option<Vec<String>>,
    versionables: Vec<NodePath>,
    pending: PendingReferences,
    touched: TouchedNodes,
    added_properties: HashMap<NodePath, HashSet<SmolStr>>,
    ignore_overwrite: bool,
}

impl<'a, S: ContentStore + PrincipalStore> ContentCreator<'a, S> {
    pub fn new(session: &'a mut S, policy: ImportPolicy) -> Self {
        Self {
            session,
            policy,
            listener: Box::new(NoopListener),
            mime_types: Box::new(ExtensionMimeTable::default()),
            stack: Vec::new(),
            active: false,
            default_name: None,
            created_root: None,
            created_nodes: None,
            versionables: Vec::new(),
            pending: PendingReferences::default(),
            touched: TouchedNodes::default(),
            added_properties: HashMap::new(),
            ignore_overwrite: false,
        }
    }

    pub fn with_listener(mut self, listener: impl ChangeListener + 'a) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn with_mime_types(mut self, mime_types: impl MimeTypeLookup + 'a) -> Self {
        self.mime_types = Box::new(mime_types);
        self
    }

    /// Records every created node as `"<workspace>:<path>"`, for later uninstall.
    pub fn with_created_nodes_ledger(mut self) -> Self {
        self.created_nodes = Some(Vec::new());
        self
    }

    pub fn policy(&self) -> &ImportPolicy {
        &self.policy
    }

    pub fn session(&self) -> &S {
        &*self.session
    }

    /// Suspends node overwrite for the following passes, whatever the policy says.
    pub fn set_ignore_overwrite_flag(&mut self, ignore: bool) {
        self.ignore_overwrite = ignore;
    }

    pub fn created_root(&self) -> Option<&NodePath> {
        self.created_root.as_ref()
    }

    pub fn versionables(&self) -> &[NodePath] {
        &self.versionables
    }

    /// Drains the created-nodes ledger. Empty when the ledger is disabled.
    pub fn take_created_nodes(&mut self) -> Vec<String> {
        self.created_nodes.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Number of open nodes, the anchor included; `0` outside a pass.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current_node(&self) -> Option<&NodePath> {
        self.stack.last()
    }

    /// Starts a pass below `anchor`.
    ///
    /// With a `default_name`, an unnamed top-level node is created under that name. Without
    /// one the pass imports into the anchor itself: an unnamed top-level node re-enters the
    /// anchor instead of creating a child.
    ///
    /// Fails with [`StructuralError::AlreadyStarted`] while the previous pass has been
    /// neither ended nor aborted.
    pub fn begin(
        &mut self,
        anchor: NodePath,
        default_name: Option<&str>,
    ) -> Result<(), ImportError> {
        if self.active {
            return Err(StructuralError::AlreadyStarted.into());
        }
        if !self.session.node_exists(&anchor) {
            return Err(crate::store::StoreError::not_found(&anchor).into());
        }
        self.stack.clear();
        self.stack.push(anchor);
        self.active = true;
        self.default_name = default_name.map(str::to_owned);
        self.created_root = None;
        self.versionables.clear();
        self.pending.clear();
        self.touched.clear();
        self.added_properties.clear();
        Ok(())
    }

    /// Finishes the pass: reconciles the touched tree, saves, checks in the collected
    /// versionable nodes and reports references that never resolved.
    pub fn end(&mut self) -> Result<ImportSummary, ImportError> {
        if !self.active {
            return Err(StructuralError::NotStarted.into());
        }
        let skipped_deletions = self.reconcile();
        self.session.save()?;
        let checked_in = self.check_in_versionables()?;

        let unresolved_references = self.pending.unresolved();
        for reference in &unresolved_references {
            warn!(
                target_path = %reference.target,
                property = %reference.property,
                "reference target was never imported"
            );
        }

        self.pending.clear();
        self.stack.clear();
        self.active = false;
        Ok(ImportSummary {
            created_root: self.created_root.clone(),
            checked_in,
            unresolved_references,
            skipped_deletions,
        })
    }

    /// Runs a whole pass: `begin`, the reader over `data`, `end`.
    pub fn import(
        &mut self,
        anchor: NodePath,
        default_name: Option<&str>,
        reader: &dyn ContentReader,
        data: &[u8],
    ) -> Result<ImportSummary, ImportError> {
        self.begin(anchor, default_name)?;
        if let Err(err) = reader.parse(data, self) {
            self.abort();
            return Err(err);
        }
        self.end()
    }

    /// Drops the open pass without reconciling, saving or checking in. Unsaved changes stay
    /// in the session; refreshing it is up to the caller.
    pub fn abort(&mut self) {
        self.stack.clear();
        self.active = false;
        self.pending.clear();
        self.touched.clear();
        self.added_properties.clear();
        self.versionables.clear();
    }

    fn current(&self) -> Result<&NodePath, StructuralError> {
        match self.stack.last() {
            Some(node) if self.active => Ok(node),
            _ => Err(StructuralError::NotStarted),
        }
    }

    fn notify_property_write(&mut self, property: &NodePath, created: bool) {
        if created {
            self.listener.on_create(property);
        } else {
            self.listener.on_modify(property);
        }
    }

    fn record_created(&mut self, node: &NodePath) {
        let workspace = self.session.workspace_name();
        if let Some(ledger) = self.created_nodes.as_mut() {
            ledger.push(format!("{workspace}:{node}"));
        }
        self.listener.on_create(node);
    }
}

impl<S: ContentStore + PrincipalStore> ContentSink for ContentCreator<'_, S> {
    fn enter_node(
        &mut self,
        name: Option<&str>,
        primary_type: Option<&str>,
        mixin_types: &[&str],
    ) -> Result<(), ImportError> {
        ContentCreator::enter_node(self, name, primary_type, mixin_types)
    }

    fn leave_node(&mut self) -> Result<(), ImportError> {
        ContentCreator::leave_node(self)
    }

    fn set_property(
        &mut self,
        name: &str,
        property_type: PropertyType,
        value: PropertyInput,
    ) -> Result<(), ImportError> {
        ContentCreator::set_property(self, name, property_type, value)
    }

    fn set_value(&mut self, name: &str, value: Option<SourceValue>) -> Result<(), ImportError> {
        ContentCreator::set_value(self, name, value)
    }

    fn set_values(&mut self, name: &str, values: Vec<SourceValue>) -> Result<(), ImportError> {
        ContentCreator::set_values(self, name, values)
    }

    fn create_file_node(
        &mut self,
        name: &str,
        data: Vec<u8>,
        mime_type: Option<&str>,
        last_modified: i64,
    ) -> Result<(), ImportError> {
        ContentCreator::create_file_node(self, name, data, mime_type, last_modified)
    }

    fn relocate_or_create_path(
        &mut self,
        sub_path: &str,
        new_type: Option<&str>,
    ) -> Result<bool, ImportError> {
        ContentCreator::relocate_or_create_path(self, sub_path, new_type)
    }

    fn create_group(
        &mut self,
        name: &str,
        members: &[&str],
        properties: PrincipalProperties,
    ) -> Result<(), ImportError> {
        ContentCreator::create_group(self, name, members, properties)
    }

    fn create_user(
        &mut self,
        name: &str,
        password: &str,
        properties: PrincipalProperties,
    ) -> Result<(), ImportError> {
        ContentCreator::create_user(self, name, password, properties)
    }

    fn create_ace(&mut self, request: AceRequest) -> Result<(), ImportError> {
        ContentCreator::create_ace(self, request)
    }
}
