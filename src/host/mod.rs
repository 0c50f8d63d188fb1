//! The registration-based host object model.
//!
//! The resolution core in [`crate::schema`] maps markup type names onto a host object
//! model it can only see through a reflection-like surface: enumerate a type's
//! properties, fields, methods, constructors, interfaces and custom attributes;
//! invoke a method with boxed arguments; run a class initializer; look up an enum's
//! named values. In the original object model that surface is discovered at runtime;
//! here it is supplied up front as a metadata table, registered through
//! [`HostTypeBuilder`] and owned by a [`HostUniverse`].
//!
//! # Key Components
//!
//! - [`HostUniverse`]: Owner of all registered types, assemblies and constructed shapes
//! - [`HostTypeBuilder`]: Fluent registration API
//! - [`HostType`]: One registered type
//! - [`Value`] / [`Instance`]: Boxed values and live object storage
//!
//! # Example
//!
//! ```rust
//! use xamlscope::host::{HostTypeBuilder, HostUniverse};
//!
//! let universe = HostUniverse::new();
//! let assembly = universe.register_assembly("App");
//! let core = universe.core();
//! HostTypeBuilder::new(&universe, &assembly, "App", "Badge")
//!     .property("Label", &core.string)
//!     .default_ctor()
//!     .register();
//! assert!(assembly.get_type("App.Badge").is_some());
//! ```

mod builder;
mod types;
mod universe;
mod value;

pub use builder::HostTypeBuilder;
pub use types::{
    EnumWidth, HostAttribute, HostCtor, HostField, HostMethod, HostProperty, HostType,
    HostTypeFlags, HostTypeRc, HostTypeRef, MethodBody, TypeHandle,
};
pub use universe::{
    enumerate_modules, CoreTypes, HostAssembly, HostAssemblyRc, HostUniverse, ModuleFileIdentity,
    Primitive, CORE_ASSEMBLY, MODULE_EXTENSIONS,
};
pub use value::{Instance, InstanceRc, Value};
