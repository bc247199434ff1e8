// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Change notifications emitted while an import runs.
//!
//! Events arrive in the order the store was mutated, so a recorded stream can drive an
//! audit log or an uninstall/rollback pass.

use serde::{Deserialize, Serialize};

use crate::model::NodePath;

pub trait ChangeListener {
    fn on_create(&mut self, path: &NodePath);

    fn on_modify(&mut self, path: &NodePath);

    fn on_delete(&mut self, path: &NodePath);

    fn on_checkout(&mut self, path: &NodePath);
}

impl<L: ChangeListener + ?Sized> ChangeListener for &mut L {
    fn on_create(&mut self, path: &NodePath) {
        (**self).on_create(path);
    }

    fn on_modify(&mut self, path: &NodePath) {
        (**self).on_modify(path);
    }

    fn on_delete(&mut self, path: &NodePath) {
        (**self).on_delete(path);
    }

    fn on_checkout(&mut self, path: &NodePath) {
        (**self).on_checkout(path);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl ChangeListener for NoopListener {
    fn on_create(&mut self, _path: &NodePath) {}

    fn on_modify(&mut self, _path: &NodePath) {}

    fn on_delete(&mut self, _path: &NodePath) {}

    fn on_checkout(&mut self, _path: &NodePath) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "path", rename_all = "lowercase")]
pub enum ChangeEvent {
    Create(NodePath),
    Modify(NodePath),
    Delete(NodePath),
    Checkout(NodePath),
}

impl ChangeEvent {
    pub fn path(&self) -> &NodePath {
        match self {
            Self::Create(path) | Self::Modify(path) | Self::Delete(path) | Self::Checkout(path) => {
                path
            }
        }
    }
}

/// Keeps every event in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RecordingListener {
    events: Vec<ChangeEvent>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ChangeEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.events)
    }
}

impl ChangeListener for RecordingListener {
    fn on_create(&mut self, path: &NodePath) {
        self.events.push(ChangeEvent::Create(path.clone()));
    }

    fn on_modify(&mut self, path: &NodePath) {
        self.events.push(ChangeEvent::Modify(path.clone()));
    }

    fn on_delete(&mut self, path: &NodePath) {
        self.events.push(ChangeEvent::Delete(path.clone()));
    }

    fn on_checkout(&mut self, path: &NodePath) {
        self.events.push(ChangeEvent::Checkout(path.clone()));
    }
}
