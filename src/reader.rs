// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Decoder boundary: content readers and the registry that picks one per file name.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::import::{ContentSink, ImportError};
use crate::policy::ImportPolicy;

/// Decodes one content format into structural calls on a [`ContentSink`].
pub trait ContentReader: Send + Sync {
    fn parse(&self, data: &[u8], sink: &mut dyn ContentSink) -> Result<(), ImportError>;
}

/// Content readers keyed by file extension (without the leading dot).
#[derive(Clone, Default)]
pub struct ReaderRegistry {
    readers: BTreeMap<String, Arc<dyn ContentReader>>,
}

impl fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderRegistry").field("extensions", &self.readers.keys()).finish()
    }
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: &str, reader: Arc<dyn ContentReader>) {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        self.readers.insert(extension, reader);
    }

    pub fn with_reader(mut self, extension: &str, reader: Arc<dyn ContentReader>) -> Self {
        self.register(extension, reader);
        self
    }

    pub fn get(&self, extension: &str) -> Option<&Arc<dyn ContentReader>> {
        self.readers.get(&extension.to_ascii_lowercase())
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.readers.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Readers not excluded by the policy's ignored providers.
    pub fn active(&self, policy: &ImportPolicy) -> Self {
        let readers = self
            .readers
            .iter()
            .filter(|(extension, _)| !policy.is_ignored_import_provider(extension))
            .map(|(extension, reader)| (extension.clone(), Arc::clone(reader)))
            .collect();
        Self { readers }
    }

    /// Reader for `file_name`, matched on the longest registered extension suffix.
    ///
    /// Returns the name with the extension stripped, which is the default node name for
    /// the imported content.
    pub fn reader_for<'n>(&self, file_name: &'n str) -> Option<(&'n str, &Arc<dyn ContentReader>)> {
        let lowered = file_name.to_ascii_lowercase();
        self.readers
            .iter()
            .filter(|(extension, _)| {
                lowered.len() > extension.len() + 1
                    && lowered.ends_with(extension.as_str())
                    && lowered.as_bytes()[lowered.len() - extension.len() - 1] == b'.'
            })
            .max_by_key(|(extension, _)| extension.len())
            .map(|(extension, reader)| {
                (&file_name[..file_name.len() - extension.len() - 1], reader)
            })
    }
}
