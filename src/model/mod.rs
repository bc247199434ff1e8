// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-ContentLoader-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of content-loader and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: paths, identities, and typed property values.

pub mod ids;
pub mod path;
pub mod value;

pub use ids::{Id, IdError, Identifier, PrincipalName};
pub use path::{NodePath, ParsePathError};
pub use value::{
    ParsePropertyTypeError, PropertyInput, PropertyType, PropertyValue, SourceValue, Value,
};
