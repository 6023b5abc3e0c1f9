//! Foundation types for the clientgen projection.
//!
//! This module provides fundamental types used throughout the crate:
//! - Arena ids ([`TypeDeclId`], [`PropertyId`], [`OperationId`], [`ContainerId`], [`SdkTypeId`])
//! - [`DeclRef`] for addressing any input declaration
//! - [`UsageFlags`], [`Access`], [`InitializedBy`]
//! - Casing and singularization helpers
//!
//! This module has NO dependencies on other clientgen modules.

mod flags;
mod ids;
pub mod text_utils;

pub use flags::{Access, InitializedBy, UsageFlags};
pub use ids::{ContainerId, DeclRef, OperationId, PropertyId, SdkTypeId, TypeDeclId};
