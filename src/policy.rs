// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const DEFAULT_PRINCIPAL_HASH_ALGORITHM: &str = "sha256";

/// Switches controlling one import pass.
///
/// Resolved once when the pass starts; the importer keeps its own copy, so changing a
/// policy value never affects a pass that is already running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct ImportPolicy {
    /// Replace an existing same-named node instead of reusing it.
    pub overwrite: bool,
    /// Rewrite properties that already exist on a revisited node.
    pub property_overwrite: bool,
    /// Strip properties of a revisited node that the import does not assert again.
    pub property_merge: bool,
    /// Delete children of touched nodes that the import does not confirm again.
    pub merge: bool,
    /// Check out the nearest version-controlled ancestor before writing.
    pub auto_checkout: bool,
    /// Check in every touched version-controlled node at the end of the pass.
    pub checkin: bool,
    /// File extensions whose content readers must not be used.
    pub ignored_import_providers: Vec<String>,
    /// Digest used to derive principal storage hints (`sha224`, `sha256`, `sha384`, `sha512`).
    pub principal_hash_algorithm: String,
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self {
            overwrite: false,
            property_overwrite: false,
            property_merge: false,
            merge: false,
            auto_checkout: true,
            checkin: false,
            ignored_import_providers: Vec::new(),
            principal_hash_algorithm: DEFAULT_PRINCIPAL_HASH_ALGORITHM.to_owned(),
        }
    }
}

impl ImportPolicy {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn json_schema() -> serde_json::Value {
        schemars::schema_for!(ImportPolicy).to_value()
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn with_property_overwrite(mut self, property_overwrite: bool) -> Self {
        self.property_overwrite = property_overwrite;
        self
    }

    pub fn with_property_merge(mut self, property_merge: bool) -> Self {
        self.property_merge = property_merge;
        self
    }

    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    pub fn with_auto_checkout(mut self, auto_checkout: bool) -> Self {
        self.auto_checkout = auto_checkout;
        self
    }

    pub fn with_checkin(mut self, checkin: bool) -> Self {
        self.checkin = checkin;
        self
    }

    pub fn with_ignored_import_provider(mut self, extension: &str) -> Self {
        self.ignored_import_providers.push(extension.to_owned());
        self
    }

    pub fn is_ignored_import_provider(&self, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        self.ignored_import_providers
            .iter()
            .any(|ignored| ignored.trim_start_matches('.').eq_ignore_ascii_case(extension))
    }
}
