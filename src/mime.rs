// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub trait MimeTypeLookup {
    fn mime_type_for(&self, name: &str) -> Option<String>;
}

/// Extension based lookup with a built-in table of common web content types.
#[derive(Debug, Clone)]
pub struct ExtensionMimeTable {
    by_extension: BTreeMap<String, String>,
}

impl Default for ExtensionMimeTable {
    fn default() -> Self {
        let mut by_extension = BTreeMap::new();
        for (ext, mime) in [
            ("txt", "text/plain"),
            ("html", "text/html"),
            ("htm", "text/html"),
            ("css", "text/css"),
            ("js", "application/javascript"),
            ("json", "application/json"),
            ("xml", "application/xml"),
            ("svg", "image/svg+xml"),
            ("png", "image/png"),
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("gif", "image/gif"),
            ("pdf", "application/pdf"),
            ("zip", "application/zip"),
            ("jar", "application/java-archive"),
            ("md", "text/markdown"),
        ] {
            by_extension.insert(ext.to_owned(), mime.to_owned());
        }
        Self { by_extension }
    }
}

impl ExtensionMimeTable {
    pub fn with_mapping(mut self, extension: &str, mime_type: &str) -> Self {
        self.by_extension.insert(extension.to_ascii_lowercase(), mime_type.to_owned());
        self
    }
}

impl MimeTypeLookup for ExtensionMimeTable {
    fn mime_type_for(&self, name: &str) -> Option<String> {
        let (_, ext) = name.rsplit_once('.')?;
        self.by_extension.get(&ext.to_ascii_lowercase()).cloned()
    }
}
