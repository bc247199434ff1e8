// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Content loader: imports externally described content trees into a hierarchical
//! content store.
//!
//! A decoder ([`reader::ContentReader`]) drives an [`import::ContentCreator`] through
//! structural calls; the creator builds nodes and properties below an anchor node, resolves
//! forward references, checks version-controlled nodes out and in, and reconciles the
//! imported tree with what already existed.

pub mod coerce;
pub mod import;
pub mod listener;
pub mod mime;
pub mod model;
pub mod policy;
pub mod reader;
pub mod store;

pub use import::{ContentCreator, ContentSink, ImportError, ImportSummary};
pub use policy::ImportPolicy;
