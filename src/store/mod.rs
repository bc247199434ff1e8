// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Content store boundary.
//!
//! The importer only talks to the store through [`ContentStore`] (nodes, properties,
//! versioning, persistence) and [`PrincipalStore`] (users, groups, access control).
//! [`InMemoryStore`] implements both and is what tests and benches run against.

pub mod access;
pub mod error;
pub mod memory;

use smol_str::SmolStr;

use crate::model::{Identifier, NodePath, PropertyValue, Value};

pub use access::{
    AccessControlEntry, AceOrder, AceUpdate, Authorizable, ParseAceOrderError, PrincipalKind,
};
pub use error::StoreError;
pub use memory::{InMemoryStore, NodeTypeDef};

pub const NT_UNSTRUCTURED: &str = "nt:unstructured";
pub const NT_FILE: &str = "nt:file";
pub const NT_RESOURCE: &str = "nt:resource";
pub const MIX_REFERENCEABLE: &str = "mix:referenceable";
pub const MIX_VERSIONABLE: &str = "mix:versionable";

pub const JCR_PRIMARY_TYPE: &str = "jcr:primaryType";
pub const JCR_MIXIN_TYPES: &str = "jcr:mixinTypes";
pub const JCR_UUID: &str = "jcr:uuid";
pub const JCR_IS_CHECKED_OUT: &str = "jcr:isCheckedOut";
pub const JCR_CREATED: &str = "jcr:created";
pub const JCR_CONTENT: &str = "jcr:content";
pub const JCR_DATA: &str = "jcr:data";
pub const JCR_MIME_TYPE: &str = "jcr:mimeType";
pub const JCR_LAST_MODIFIED: &str = "jcr:lastModified";

/// How the node types of a node constrain one of its properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropertyDefinition {
    pub protected: bool,
    pub auto_created: bool,
    pub mandatory: bool,
    pub multiple: bool,
}

impl PropertyDefinition {
    /// Properties the store maintains on its own; imports never strip them.
    pub fn is_store_managed(&self) -> bool {
        self.protected || self.auto_created || self.mandatory
    }
}

/// Transactional access to a hierarchical content workspace.
///
/// Mutations are transient until [`ContentStore::save`]; [`ContentStore::refresh`] without
/// `keep_changes` drops the transient state of one subtree.
pub trait ContentStore {
    fn workspace_name(&self) -> &str;

    fn node_exists(&self, path: &NodePath) -> bool;

    /// `true` when `path` names a node or a property.
    fn item_exists(&self, path: &NodePath) -> bool;

    fn children(&self, path: &NodePath) -> Result<Vec<NodePath>, StoreError>;

    fn primary_type(&self, path: &NodePath) -> Result<SmolStr, StoreError>;

    /// Creates `name` below `parent`. `None` uses the store's default type.
    fn add_node(
        &mut self,
        parent: &NodePath,
        name: &str,
        primary_type: Option<&str>,
    ) -> Result<NodePath, StoreError>;

    fn remove_node(&mut self, path: &NodePath) -> Result<(), StoreError>;

    /// Moves child `name` before sibling `before`, or to the end when `before` is `None`.
    fn order_before(
        &mut self,
        parent: &NodePath,
        name: &str,
        before: Option<&str>,
    ) -> Result<(), StoreError>;

    fn add_mixin(&mut self, path: &NodePath, mixin: &str) -> Result<(), StoreError>;

    fn is_node_type(&self, path: &NodePath, node_type: &str) -> Result<bool, StoreError>;

    fn identifier(&self, path: &NodePath) -> Result<Identifier, StoreError>;

    fn property(&self, node: &NodePath, name: &str) -> Result<Option<PropertyValue>, StoreError>;

    fn property_names(&self, node: &NodePath) -> Result<Vec<SmolStr>, StoreError>;

    fn property_definition(
        &self,
        node: &NodePath,
        name: &str,
    ) -> Result<PropertyDefinition, StoreError>;

    /// `true` while the property was created after the last save.
    fn is_new_property(&self, node: &NodePath, name: &str) -> Result<bool, StoreError>;

    fn set_property(
        &mut self,
        node: &NodePath,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError>;

    fn remove_property(&mut self, node: &NodePath, name: &str) -> Result<(), StoreError>;

    /// Effective check-out state: the state of the nearest version-controlled node at or
    /// above `path`, or `true` when there is none.
    fn is_checked_out(&self, path: &NodePath) -> Result<bool, StoreError>;

    fn checkout(&mut self, path: &NodePath) -> Result<(), StoreError>;

    fn checkin(&mut self, path: &NodePath) -> Result<(), StoreError>;

    fn save(&mut self) -> Result<(), StoreError>;

    fn refresh(&mut self, path: &NodePath, keep_changes: bool) -> Result<(), StoreError>;
}

/// User/group directory plus access-control editing.
pub trait PrincipalStore {
    fn authorizable(&self, id: &str) -> Result<Option<Authorizable>, StoreError>;

    /// Principal lookup service. It may lag behind [`PrincipalStore::authorizable`] for
    /// principals created since the last save.
    fn principal(&self, name: &str) -> Result<Option<String>, StoreError>;

    fn create_user(
        &mut self,
        id: &str,
        password: &str,
        intermediate_path: &str,
    ) -> Result<Authorizable, StoreError>;

    fn create_group(&mut self, id: &str, intermediate_path: &str)
        -> Result<Authorizable, StoreError>;

    /// Returns `false` when `member` already belonged to `group`.
    fn add_member(&mut self, group: &str, member: &str) -> Result<bool, StoreError>;

    fn declared_members(&self, group: &str) -> Result<Vec<String>, StoreError>;

    fn set_authorizable_property(
        &mut self,
        id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), StoreError>;

    fn authorizable_property(&self, id: &str, name: &str) -> Result<Option<Value>, StoreError>;

    fn replace_access_control_entry(
        &mut self,
        path: &NodePath,
        update: &AceUpdate,
    ) -> Result<(), StoreError>;

    fn access_control_entries(&self, path: &NodePath)
        -> Result<Vec<AccessControlEntry>, StoreError>;
}
