//! # xamlscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from
//! the xamlscope library. Import this module to get quick access to the essential
//! types for markup type resolution.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all xamlscope operations
pub use crate::Error;

/// The result type used throughout xamlscope
pub use crate::Result;

// ================================================================================================
// Resolution Entry Points
// ================================================================================================

/// The shared caching resolution service
pub use crate::schema::XamlSchemaContext;

/// The thin per-consumer resolution handle
pub use crate::schema::MetadataProvider;

// ================================================================================================
// Descriptors
// ================================================================================================

/// Resolved type descriptors
pub use crate::schema::{CollectionKind, XamlType, XamlTypeRc};

/// Resolved member descriptors
pub use crate::schema::{XamlMember, XamlMemberRc};

// ================================================================================================
// Host Object Model
// ================================================================================================

/// Host registration and metadata
pub use crate::host::{
    EnumWidth, HostAttribute, HostTypeBuilder, HostTypeRc, HostUniverse, TypeHandle,
};

/// Boxed values and live instances
pub use crate::host::{Instance, InstanceRc, Value};
