// Copyright 2026 the xamlscope contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # xamlscope
//!
//! A reflection and type-resolution core for XAML markup compilation. `xamlscope`
//! maps between a declarative markup type system (textual type names, members,
//! attached properties, collections, generic instantiations) and a host object
//! model reachable only through a reflection-like surface, producing resolvable
//! type and member descriptors for code generation and live markup loading.
//!
//! ## Features
//!
//! - **🗂 Registration-based host model** - Types describe themselves once through a
//!   fluent builder; the core discovers members from that metadata, never per access
//! - **🔍 Convention-driven discovery** - Attachable `Get*`/`Set*` accessor pairs,
//!   `*Property` dependency-property markers and attribute contracts matched by name
//! - **⚡ Memoized resolution** - Each distinct type and member is materialized
//!   exactly once; descriptors compare by reference
//! - **🧬 Generic-name grammar** - Nested generic instantiations parse through an
//!   explicit two-stack scan (`Dictionary<String, List<Int32>>`)
//! - **🛡️ Quiet misses, loud contract breaks** - Speculative probes return absent
//!   results; writing a read-only member or activating a non-constructible type fails
//!
//! ## Quick Start
//!
//! ```rust
//! use xamlscope::prelude::*;
//!
//! // Describe the object model once.
//! let universe = HostUniverse::new();
//! let assembly = universe.register_assembly("App");
//! HostTypeBuilder::new(&universe, &assembly, "App.Controls", "Badge")
//!     .property("Label", &universe.core().string)
//!     .default_ctor()
//!     .register();
//!
//! // Resolve through a provider.
//! let provider = MetadataProvider::new(&XamlSchemaContext::new(&universe));
//! let badge = provider.resolve_name("App.Controls.Badge")?.unwrap();
//! let label = badge.get_member("Label").unwrap();
//!
//! let instance = badge.activate()?;
//! label.set(&instance, Value::String("hello".into()))?;
//! assert_eq!(label.get(&instance)?, Value::String("hello".into()));
//! # Ok::<(), xamlscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `xamlscope` is organized into two layers:
//!
//! - [`host`] - The registration-based host object model: types, members, boxed
//!   values, assemblies and the universe that owns them
//! - [`schema`] - The resolution core: name normalization, member discovery, the
//!   type descriptor and the caching schema context
//! - [`prelude`] - Convenient re-exports of commonly used types
//!
//! The schema layer only sees the host through its reflection-like surface, so the
//! host model can be swapped for any object model able to supply the same metadata.

#[macro_use]
pub(crate) mod error;

pub mod host;
pub mod prelude;
pub mod schema;

pub use error::Error;

/// Convenience alias for `Result<T, xamlscope::Error>`
pub type Result<T> = std::result::Result<T, Error>;
