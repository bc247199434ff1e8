// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::{BTreeMap, BTreeSet};

use chrono::Utc;
use sha2::{Digest, Sha256};
use smallvec::SmallVec;
use smol_str::SmolStr;

use super::{
    AccessControlEntry, AceOrder, AceUpdate, Authorizable, ContentStore, PrincipalKind,
    PrincipalStore, PropertyDefinition, StoreError, JCR_CREATED, JCR_DATA, JCR_IS_CHECKED_OUT,
    JCR_MIXIN_TYPES, JCR_PRIMARY_TYPE, JCR_UUID, MIX_REFERENCEABLE, MIX_VERSIONABLE, NT_FILE,
    NT_RESOURCE, NT_UNSTRUCTURED,
};
use crate::model::{Identifier, NodePath, PrincipalName, PropertyValue, Value};

const DEFAULT_WORKSPACE: &str = "default";
const USERS_ROOT: &str = "/home/users";
const GROUPS_ROOT: &str = "/home/groups";

const KNOWN_PRIVILEGES: [&str; 13] = [
    "jcr:read",
    "jcr:write",
    "jcr:all",
    "jcr:modifyProperties",
    "jcr:addChildNodes",
    "jcr:removeNode",
    "jcr:removeChildNodes",
    "jcr:readAccessControl",
    "jcr:modifyAccessControl",
    "jcr:versionManagement",
    "jcr:nodeTypeManagement",
    "jcr:lockManagement",
    "rep:write",
];

/// Declaration of a node type understood by [`InMemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTypeDef {
    pub name: SmolStr,
    pub mixin: bool,
    pub supertypes: Vec<SmolStr>,
    pub protected: Vec<SmolStr>,
    pub auto_created: Vec<SmolStr>,
    pub mandatory: Vec<SmolStr>,
}

impl NodeTypeDef {
    pub fn primary(name: &str) -> Self {
        Self {
            name: SmolStr::new(name),
            mixin: false,
            supertypes: vec![SmolStr::new_static("nt:base")],
            protected: Vec::new(),
            auto_created: Vec::new(),
            mandatory: Vec::new(),
        }
    }

    pub fn mixin(name: &str) -> Self {
        Self { mixin: true, supertypes: Vec::new(), ..Self::primary(name) }
    }

    pub fn with_supertype(mut self, supertype: &str) -> Self {
        self.supertypes.push(SmolStr::new(supertype));
        self
    }

    pub fn with_protected(mut self, property: &str) -> Self {
        self.protected.push(SmolStr::new(property));
        self
    }

    pub fn with_auto_created(mut self, property: &str) -> Self {
        self.auto_created.push(SmolStr::new(property));
        self
    }

    pub fn with_mandatory(mut self, property: &str) -> Self {
        self.mandatory.push(SmolStr::new(property));
        self
    }
}

fn builtin_node_types() -> Vec<NodeTypeDef> {
    let base = NodeTypeDef {
        supertypes: Vec::new(),
        ..NodeTypeDef::primary("nt:base")
    }
    .with_protected(JCR_PRIMARY_TYPE)
    .with_protected(JCR_MIXIN_TYPES)
    .with_auto_created(JCR_PRIMARY_TYPE);

    vec![
        base,
        NodeTypeDef::primary(NT_UNSTRUCTURED),
        NodeTypeDef::primary("nt:hierarchyNode")
            .with_protected(JCR_CREATED)
            .with_auto_created(JCR_CREATED),
        NodeTypeDef::primary("nt:folder").with_supertype("nt:hierarchyNode"),
        NodeTypeDef::primary(NT_FILE).with_supertype("nt:hierarchyNode"),
        NodeTypeDef::primary(NT_RESOURCE)
            .with_supertype(MIX_REFERENCEABLE)
            .with_mandatory(JCR_DATA),
        NodeTypeDef::mixin(MIX_REFERENCEABLE)
            .with_protected(JCR_UUID)
            .with_auto_created(JCR_UUID),
        NodeTypeDef::mixin(MIX_VERSIONABLE)
            .with_supertype(MIX_REFERENCEABLE)
            .with_protected(JCR_IS_CHECKED_OUT)
            .with_auto_created(JCR_IS_CHECKED_OUT),
        NodeTypeDef::mixin("mix:lastModified"),
        NodeTypeDef::mixin("mix:title"),
    ]
}

#[derive(Debug, Clone)]
struct NodeRecord {
    identifier: Identifier,
    primary_type: SmolStr,
    mixins: SmallVec<[SmolStr; 2]>,
    properties: BTreeMap<SmolStr, PropertyValue>,
    children: Vec<SmolStr>,
    checked_out: bool,
}

#[derive(Debug, Clone)]
struct AuthorizableRecord {
    kind: PrincipalKind,
    password_sha256: Option<String>,
    home: NodePath,
    members: BTreeSet<String>,
    properties: BTreeMap<SmolStr, Value>,
}

/// In-memory workspace with transient changes, save points, versioning, principals and
/// access control.
///
/// `save` snapshots the node tree; `refresh(path, false)` restores one subtree from the
/// last snapshot. The principal lookup only sees principals that existed at the last save.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    workspace_name: String,
    node_types: BTreeMap<SmolStr, NodeTypeDef>,
    nodes: BTreeMap<NodePath, NodeRecord>,
    saved_nodes: BTreeMap<NodePath, NodeRecord>,
    new_properties: BTreeSet<(NodePath, SmolStr)>,
    locked: BTreeSet<NodePath>,
    authorizables: BTreeMap<String, AuthorizableRecord>,
    indexed_principals: BTreeSet<String>,
    acls: BTreeMap<NodePath, Vec<AccessControlEntry>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_workspace(DEFAULT_WORKSPACE)
    }

    pub fn with_workspace(workspace_name: impl Into<String>) -> Self {
        let node_types = builtin_node_types()
            .into_iter()
            .map(|def| (def.name.clone(), def))
            .collect::<BTreeMap<_, _>>();

        let mut root = NodeRecord {
            identifier: new_identifier(),
            primary_type: SmolStr::new_static("rep:root"),
            mixins: SmallVec::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            checked_out: true,
        };
        root.properties.insert(
            SmolStr::new_static(JCR_PRIMARY_TYPE),
            PropertyValue::Single(Value::Name(SmolStr::new_static("rep:root"))),
        );

        let mut nodes = BTreeMap::new();
        nodes.insert(NodePath::root(), root);

        let mut store = Self {
            workspace_name: workspace_name.into(),
            node_types,
            nodes,
            saved_nodes: BTreeMap::new(),
            new_properties: BTreeSet::new(),
            locked: BTreeSet::new(),
            authorizables: BTreeMap::new(),
            indexed_principals: BTreeSet::new(),
            acls: BTreeMap::new(),
        };
        store.node_types.insert(
            SmolStr::new_static("rep:root"),
            NodeTypeDef::primary("rep:root").with_supertype(NT_UNSTRUCTURED),
        );
        store.saved_nodes = store.nodes.clone();
        store
    }

    pub fn register_node_type(&mut self, def: NodeTypeDef) {
        self.node_types.insert(def.name.clone(), def);
    }

    /// Makes `path` refuse removal until [`InMemoryStore::unlock_node`].
    pub fn lock_node(&mut self, path: &NodePath) {
        self.locked.insert(path.clone());
    }

    pub fn unlock_node(&mut self, path: &NodePath) {
        self.locked.remove(path);
    }

    /// Creates every missing segment of `path` with the default type and saves.
    pub fn ensure_path(&mut self, path: &NodePath) -> Result<(), StoreError> {
        let mut current = NodePath::root();
        for segment in path.segments().map(str::to_owned).collect::<Vec<_>>() {
            let next = current
                .join(&segment)
                .map_err(|err| StoreError::invalid_path(segment.clone(), err))?;
            if !self.nodes.contains_key(&next) {
                self.add_node(&current, &segment, None)?;
            }
            current = next;
        }
        self.save()
    }

    /// JSON dump of the subtree at `path`, for inspection and audit output.
    pub fn export_json(&self, path: &NodePath) -> Result<serde_json::Value, StoreError> {
        let record = self.record(path)?;
        let mut out = serde_json::Map::new();
        for (name, value) in &record.properties {
            let json = serde_json::to_value(value).map_err(|err| {
                StoreError::ConstraintViolation { path: path.clone(), reason: err.to_string() }
            })?;
            out.insert(name.to_string(), json);
        }
        for child in &record.children {
            let child_path =
                path.join(child).map_err(|err| StoreError::invalid_path(child.as_str(), err))?;
            out.insert(child.to_string(), self.export_json(&child_path)?);
        }
        Ok(serde_json::Value::Object(out))
    }

    fn record(&self, path: &NodePath) -> Result<&NodeRecord, StoreError> {
        self.nodes.get(path).ok_or_else(|| StoreError::not_found(path))
    }

    fn record_mut(&mut self, path: &NodePath) -> Result<&mut NodeRecord, StoreError> {
        self.nodes.get_mut(path).ok_or_else(|| StoreError::not_found(path))
    }

    fn node_type(&self, name: &str) -> Result<&NodeTypeDef, StoreError> {
        self.node_types
            .get(name)
            .ok_or_else(|| StoreError::NoSuchNodeType { name: name.to_owned() })
    }

    /// All type names `record` is an instance of, supertypes included.
    fn type_closure(&self, record: &NodeRecord) -> BTreeSet<SmolStr> {
        let mut seen = BTreeSet::new();
        let mut pending = vec![record.primary_type.clone()];
        pending.extend(record.mixins.iter().cloned());
        while let Some(name) = pending.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(def) = self.node_types.get(&name) {
                pending.extend(def.supertypes.iter().cloned());
            }
        }
        seen
    }

    fn definitions_of<'a>(&'a self, record: &NodeRecord) -> Vec<&'a NodeTypeDef> {
        self.type_closure(record).iter().filter_map(|name| self.node_types.get(name)).collect()
    }

    fn is_versionable(&self, record: &NodeRecord) -> bool {
        self.type_closure(record).contains(MIX_VERSIONABLE)
    }

    /// Nearest version-controlled node at or above `path`.
    fn versionable_ancestor(&self, path: &NodePath) -> Option<(&NodePath, &NodeRecord)> {
        let mut current = Some(path.clone());
        while let Some(candidate) = current {
            if let Some((key, record)) = self.nodes.get_key_value(&candidate) {
                if self.is_versionable(record) {
                    return Some((key, record));
                }
            }
            current = candidate.parent();
        }
        None
    }

    fn ensure_writable(&self, path: &NodePath) -> Result<(), StoreError> {
        match self.versionable_ancestor(path) {
            Some((owner, record)) if !record.checked_out => {
                Err(StoreError::CheckedIn { path: owner.clone() })
            }
            _ => Ok(()),
        }
    }

    fn apply_auto_created(&mut self, path: &NodePath) -> Result<(), StoreError> {
        let record = self.record(path)?;
        let mut missing = Vec::new();
        for def in self.definitions_of(record) {
            for name in &def.auto_created {
                if !record.properties.contains_key(name) {
                    missing.push(name.clone());
                }
            }
        }

        let record = self.record_mut(path)?;
        let mut created = Vec::new();
        for name in missing {
            let value = match name.as_str() {
                JCR_PRIMARY_TYPE => Value::Name(record.primary_type.clone()),
                JCR_UUID => Value::String(record.identifier.to_string()),
                JCR_IS_CHECKED_OUT => Value::Boolean(record.checked_out),
                JCR_CREATED => Value::Date(Utc::now().fixed_offset()),
                _ => continue,
            };
            record.properties.insert(name.clone(), PropertyValue::Single(value));
            created.push(name);
        }
        for name in created {
            self.new_properties.insert((path.clone(), name));
        }
        Ok(())
    }

    fn set_checked_out(&mut self, path: &NodePath, checked_out: bool) -> Result<(), StoreError> {
        let record = self.record(path)?;
        if !self.is_versionable(record) {
            return Err(StoreError::NotVersionable { path: path.clone() });
        }
        let record = self.record_mut(path)?;
        record.checked_out = checked_out;
        record.properties.insert(
            SmolStr::new_static(JCR_IS_CHECKED_OUT),
            PropertyValue::Single(Value::Boolean(checked_out)),
        );
        Ok(())
    }

    fn detach_child(&mut self, path: &NodePath) {
        let Some(parent) = path.parent() else {
            return;
        };
        if let Some(record) = self.nodes.get_mut(&parent) {
            record.children.retain(|child| child.as_str() != path.name());
        }
    }

    fn subtree_keys(nodes: &BTreeMap<NodePath, NodeRecord>, path: &NodePath) -> Vec<NodePath> {
        nodes.keys().filter(|key| path.contains(key)).cloned().collect()
    }

    fn create_authorizable(
        &mut self,
        id: &str,
        kind: PrincipalKind,
        password: Option<&str>,
        intermediate_path: &str,
    ) -> Result<Authorizable, StoreError> {
        let root = match kind {
            PrincipalKind::User => USERS_ROOT,
            PrincipalKind::Group => GROUPS_ROOT,
        };
        let raw_home = format!("{root}/{}{id}", intermediate_path.trim_start_matches('/'));
        let home =
            NodePath::parse(&raw_home).map_err(|err| StoreError::invalid_path(raw_home, err))?;
        if self.authorizables.contains_key(id) {
            return Err(StoreError::ItemExists { path: home });
        }
        let principal = PrincipalName::new(id).map_err(|err| StoreError::ConstraintViolation {
            path: home.clone(),
            reason: err.to_string(),
        })?;

        let password_sha256 = password.map(|raw| hex::encode(Sha256::digest(raw.as_bytes())));
        self.authorizables.insert(
            id.to_owned(),
            AuthorizableRecord {
                kind,
                password_sha256,
                home: home.clone(),
                members: BTreeSet::new(),
                properties: BTreeMap::new(),
            },
        );
        Ok(Authorizable { id: principal, kind, principal_name: id.to_owned(), home })
    }

    fn authorizable_record(&self, id: &str) -> Result<&AuthorizableRecord, StoreError> {
        self.authorizables
            .get(id)
            .ok_or_else(|| StoreError::not_found(format!("authorizable {id}")))
    }

    /// `true` when `password` matches the stored credentials of user `id`.
    pub fn verify_password(&self, id: &str, password: &str) -> bool {
        let digest = hex::encode(Sha256::digest(password.as_bytes()));
        self.authorizables
            .get(id)
            .and_then(|record| record.password_sha256.as_deref())
            .is_some_and(|stored| stored == digest)
    }
}

fn new_identifier() -> Identifier {
    let raw = uuid::Uuid::new_v4().to_string();
    match Identifier::new(raw) {
        Ok(id) => id,
        Err(_) => unreachable!("hyphenated uuids are valid identifiers"),
    }
}

impl ContentStore for InMemoryStore {
    fn workspace_name(&self) -> &str {
        &self.workspace_name
    }

    fn node_exists(&self, path: &NodePath) -> bool {
        self.nodes.contains_key(path)
    }

    fn item_exists(&self, path: &NodePath) -> bool {
        if self.nodes.contains_key(path) {
            return true;
        }
        path.parent()
            .and_then(|parent| self.nodes.get(&parent))
            .is_some_and(|record| record.properties.contains_key(path.name()))
    }

    fn children(&self, path: &NodePath) -> Result<Vec<NodePath>, StoreError> {
        let record = self.record(path)?;
        record
            .children
            .iter()
            .map(|child| {
                path.join(child).map_err(|err| StoreError::invalid_path(child.as_str(), err))
            })
            .collect()
    }

    fn primary_type(&self, path: &NodePath) -> Result<SmolStr, StoreError> {
        Ok(self.record(path)?.primary_type.clone())
    }

    fn add_node(
        &mut self,
        parent: &NodePath,
        name: &str,
        primary_type: Option<&str>,
    ) -> Result<NodePath, StoreError> {
        self.record(parent)?;
        self.ensure_writable(parent)?;
        let path = parent.join(name).map_err(|err| StoreError::invalid_path(name, err))?;
        if self.nodes.contains_key(&path) {
            return Err(StoreError::ItemExists { path });
        }

        let type_name = primary_type.unwrap_or(NT_UNSTRUCTURED);
        let def = self.node_type(type_name)?;
        if def.mixin {
            return Err(StoreError::ConstraintViolation {
                path,
                reason: format!("{type_name} is a mixin and cannot be a primary type"),
            });
        }

        let record = NodeRecord {
            identifier: new_identifier(),
            primary_type: def.name.clone(),
            mixins: SmallVec::new(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            checked_out: true,
        };
        self.nodes.insert(path.clone(), record);
        self.record_mut(parent)?.children.push(SmolStr::new(name));
        self.apply_auto_created(&path)?;
        Ok(path)
    }

    fn remove_node(&mut self, path: &NodePath) -> Result<(), StoreError> {
        let Some(parent) = path.parent() else {
            return Err(StoreError::ConstraintViolation {
                path: path.clone(),
                reason: "the root node cannot be removed".to_owned(),
            });
        };
        self.record(path)?;
        self.ensure_writable(&parent)?;
        if let Some(locked) = self.locked.iter().find(|locked| path.contains(locked)) {
            return Err(StoreError::Locked { path: locked.clone() });
        }

        for key in Self::subtree_keys(&self.nodes, path) {
            self.nodes.remove(&key);
            self.acls.remove(&key);
        }
        self.new_properties.retain(|(node, _)| !path.contains(node));
        self.detach_child(path);
        Ok(())
    }

    fn order_before(
        &mut self,
        parent: &NodePath,
        name: &str,
        before: Option<&str>,
    ) -> Result<(), StoreError> {
        self.ensure_writable(parent)?;
        let record = self.record_mut(parent)?;
        let Some(from) = record.children.iter().position(|child| child.as_str() == name) else {
            return Err(StoreError::not_found(format!("{parent}/{name}")));
        };
        let child = record.children.remove(from);
        let to = match before {
            None => record.children.len(),
            Some(sibling) => match record.children.iter().position(|c| c.as_str() == sibling) {
                Some(idx) => idx,
                None => {
                    record.children.insert(from, child);
                    return Err(StoreError::not_found(format!("{parent}/{sibling}")));
                }
            },
        };
        record.children.insert(to, child);
        Ok(())
    }

    fn add_mixin(&mut self, path: &NodePath, mixin: &str) -> Result<(), StoreError> {
        self.ensure_writable(path)?;
        let def = self.node_type(mixin)?;
        if !def.mixin {
            return Err(StoreError::ConstraintViolation {
                path: path.clone(),
                reason: format!("{mixin} is not a mixin type"),
            });
        }
        let name = def.name.clone();
        let record = self.record_mut(path)?;
        if record.mixins.contains(&name) {
            return Ok(());
        }
        record.mixins.push(name);
        let mixins = record.mixins.iter().cloned().map(Value::Name).collect::<Vec<_>>();
        record
            .properties
            .insert(SmolStr::new_static(JCR_MIXIN_TYPES), PropertyValue::Multi(mixins));
        self.apply_auto_created(path)
    }

    fn is_node_type(&self, path: &NodePath, node_type: &str) -> Result<bool, StoreError> {
        let record = self.record(path)?;
        Ok(self.type_closure(record).contains(node_type))
    }

    fn identifier(&self, path: &NodePath) -> Result<Identifier, StoreError> {
        Ok(self.record(path)?.identifier.clone())
    }

    fn property(&self, node: &NodePath, name: &str) -> Result<Option<PropertyValue>, StoreError> {
        Ok(self.record(node)?.properties.get(name).cloned())
    }

    fn property_names(&self, node: &NodePath) -> Result<Vec<SmolStr>, StoreError> {
        Ok(self.record(node)?.properties.keys().cloned().collect())
    }

    fn property_definition(
        &self,
        node: &NodePath,
        name: &str,
    ) -> Result<PropertyDefinition, StoreError> {
        let record = self.record(node)?;
        let mut definition = PropertyDefinition {
            multiple: record.properties.get(name).is_some_and(PropertyValue::is_multiple),
            ..PropertyDefinition::default()
        };
        for def in self.definitions_of(record) {
            definition.protected |= def.protected.iter().any(|p| p.as_str() == name);
            definition.auto_created |= def.auto_created.iter().any(|p| p.as_str() == name);
            definition.mandatory |= def.mandatory.iter().any(|p| p.as_str() == name);
        }
        Ok(definition)
    }

    fn is_new_property(&self, node: &NodePath, name: &str) -> Result<bool, StoreError> {
        self.record(node)?;
        Ok(self.new_properties.contains(&(node.clone(), SmolStr::new(name))))
    }

    fn set_property(
        &mut self,
        node: &NodePath,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), StoreError> {
        self.ensure_writable(node)?;
        if self.property_definition(node, name)?.protected {
            return Err(StoreError::ConstraintViolation {
                path: node.clone(),
                reason: format!("property {name} is protected"),
            });
        }
        let key = SmolStr::new(name);
        let record = self.record_mut(node)?;
        if record.properties.insert(key.clone(), value).is_none() {
            self.new_properties.insert((node.clone(), key));
        }
        Ok(())
    }

    fn remove_property(&mut self, node: &NodePath, name: &str) -> Result<(), StoreError> {
        self.ensure_writable(node)?;
        if self.property_definition(node, name)?.protected {
            return Err(StoreError::ConstraintViolation {
                path: node.clone(),
                reason: format!("property {name} is protected"),
            });
        }
        let record = self.record_mut(node)?;
        if record.properties.remove(name).is_none() {
            return Err(StoreError::not_found(format!("{node}/{name}")));
        }
        self.new_properties.remove(&(node.clone(), SmolStr::new(name)));
        Ok(())
    }

    fn is_checked_out(&self, path: &NodePath) -> Result<bool, StoreError> {
        self.record(path)?;
        Ok(self.versionable_ancestor(path).map_or(true, |(_, record)| record.checked_out))
    }

    fn checkout(&mut self, path: &NodePath) -> Result<(), StoreError> {
        self.set_checked_out(path, true)
    }

    fn checkin(&mut self, path: &NodePath) -> Result<(), StoreError> {
        self.set_checked_out(path, false)
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.saved_nodes = self.nodes.clone();
        self.new_properties.clear();
        self.indexed_principals = self.authorizables.keys().cloned().collect();
        Ok(())
    }

    fn refresh(&mut self, path: &NodePath, keep_changes: bool) -> Result<(), StoreError> {
        if keep_changes {
            return Ok(());
        }

        for key in Self::subtree_keys(&self.nodes, path) {
            self.nodes.remove(&key);
        }
        self.new_properties.retain(|(node, _)| !path.contains(node));

        let restored = Self::subtree_keys(&self.saved_nodes, path);
        if restored.is_empty() {
            self.detach_child(path);
            return Ok(());
        }
        for key in restored {
            if let Some(record) = self.saved_nodes.get(&key) {
                self.nodes.insert(key, record.clone());
            }
        }
        if let Some(parent) = path.parent() {
            if let Some(record) = self.nodes.get_mut(&parent) {
                if !record.children.iter().any(|child| child.as_str() == path.name()) {
                    record.children.push(SmolStr::new(path.name()));
                }
            }
        }
        Ok(())
    }
}

impl PrincipalStore for InMemoryStore {
    fn authorizable(&self, id: &str) -> Result<Option<Authorizable>, StoreError> {
        let Some(record) = self.authorizables.get(id) else {
            return Ok(None);
        };
        let principal = PrincipalName::new(id).map_err(|err| StoreError::ConstraintViolation {
            path: record.home.clone(),
            reason: err.to_string(),
        })?;
        Ok(Some(Authorizable {
            id: principal,
            kind: record.kind,
            principal_name: id.to_owned(),
            home: record.home.clone(),
        }))
    }

    fn principal(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.indexed_principals.get(name).cloned())
    }

    fn create_user(
        &mut self,
        id: &str,
        password: &str,
        intermediate_path: &str,
    ) -> Result<Authorizable, StoreError> {
        self.create_authorizable(id, PrincipalKind::User, Some(password), intermediate_path)
    }

    fn create_group(
        &mut self,
        id: &str,
        intermediate_path: &str,
    ) -> Result<Authorizable, StoreError> {
        self.create_authorizable(id, PrincipalKind::Group, None, intermediate_path)
    }

    fn add_member(&mut self, group: &str, member: &str) -> Result<bool, StoreError> {
        self.authorizable_record(member)?;
        let record = self
            .authorizables
            .get_mut(group)
            .ok_or_else(|| StoreError::not_found(format!("authorizable {group}")))?;
        if record.kind != PrincipalKind::Group {
            return Err(StoreError::ConstraintViolation {
                path: record.home.clone(),
                reason: format!("{group} is not a group"),
            });
        }
        Ok(record.members.insert(member.to_owned()))
    }

    fn declared_members(&self, group: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.authorizable_record(group)?.members.iter().cloned().collect())
    }

    fn set_authorizable_property(
        &mut self,
        id: &str,
        name: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let record = self
            .authorizables
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("authorizable {id}")))?;
        record.properties.insert(SmolStr::new(name), value);
        Ok(())
    }

    fn authorizable_property(&self, id: &str, name: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.authorizable_record(id)?.properties.get(name).cloned())
    }

    fn replace_access_control_entry(
        &mut self,
        path: &NodePath,
        update: &AceUpdate,
    ) -> Result<(), StoreError> {
        self.record(path)?;
        if let Some(unknown) = update
            .granted
            .iter()
            .chain(update.denied.iter())
            .find(|privilege| !KNOWN_PRIVILEGES.contains(&privilege.as_str()))
        {
            return Err(StoreError::AccessControl {
                path: path.clone(),
                reason: format!("unknown privilege {unknown}"),
            });
        }

        let entries = self.acls.entry(path.clone()).or_default();
        let existing = entries.iter().position(|entry| entry.principal == update.principal);
        let mut entry = match existing {
            Some(idx) => entries.remove(idx),
            None => AccessControlEntry {
                principal: update.principal.clone(),
                ..AccessControlEntry::default()
            },
        };
        entry.apply(update);

        let position_of = |entries: &[AccessControlEntry], principal: &str| {
            entries.iter().position(|entry| entry.principal == principal).ok_or_else(|| {
                StoreError::AccessControl {
                    path: path.clone(),
                    reason: format!("no entry for principal {principal} to order against"),
                }
            })
        };
        let index = match &update.order {
            None => existing.unwrap_or(entries.len()).min(entries.len()),
            Some(AceOrder::First) => 0,
            Some(AceOrder::Last) => entries.len(),
            Some(AceOrder::Before(principal)) => match position_of(entries, principal) {
                Ok(idx) => idx,
                Err(err) => {
                    entries.insert(existing.unwrap_or(entries.len()).min(entries.len()), entry);
                    return Err(err);
                }
            },
            Some(AceOrder::After(principal)) => match position_of(entries, principal) {
                Ok(idx) => idx + 1,
                Err(err) => {
                    entries.insert(existing.unwrap_or(entries.len()).min(entries.len()), entry);
                    return Err(err);
                }
            },
            Some(AceOrder::Index(idx)) => (*idx).min(entries.len()),
        };
        entries.insert(index, entry);
        Ok(())
    }

    fn access_control_entries(
        &self,
        path: &NodePath,
    ) -> Result<Vec<AccessControlEntry>, StoreError> {
        self.record(path)?;
        Ok(self.acls.get(path).cloned().unwrap_or_default())
    }
}
