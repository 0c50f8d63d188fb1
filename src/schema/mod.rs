//! The reflection/type-resolution core.
//!
//! This module maps between the markup type system (textual type names, members,
//! attached properties, collections, generic instantiations) and the host object
//! model in [`crate::host`], producing resolvable descriptors for code generation
//! and live markup loading.
//!
//! # Key Components
//!
//! - [`XamlSchemaContext`] / [`MetadataProvider`]: The caching resolution entry point
//! - [`XamlType`]: One resolvable type, classification flags plus lazy queries
//! - [`XamlMember`]: One resolvable property, instance or attachable
//! - [`naming`]: The pure name transforms between the two naming conventions
//!
//! # Resolution Layers
//!
//! Leaves first: the normalizer is stateless string work; member discovery runs a
//! one-shot convention scan over host metadata; the type descriptor computes its
//! classification once and defers everything else; the context memoizes so each
//! distinct type and member is materialized exactly once per process.
//!
//! # Examples
//!
//! ```rust
//! use xamlscope::host::HostUniverse;
//! use xamlscope::schema::{MetadataProvider, XamlSchemaContext};
//!
//! let universe = HostUniverse::new();
//! let provider = MetadataProvider::new(&XamlSchemaContext::new(&universe));
//!
//! let boolean = provider.resolve_name("Boolean")?.unwrap();
//! assert!(boolean.is_constructible());
//! # Ok::<(), xamlscope::Error>(())
//! ```

pub mod known;
pub mod naming;

mod context;
mod member;
mod xamltype;

pub use context::{
    AssemblySearchSet, MetadataProvider, SchemaDiagnostic, SchemaOptions, XamlSchemaContext,
};
pub use member::{XamlMember, XamlMemberRc};
pub use xamltype::{CollectionKind, Deprecation, XamlType, XamlTypeRc};
