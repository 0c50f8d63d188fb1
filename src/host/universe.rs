//! The host type universe: registration, handle allocation and generic instantiation.
//!
//! [`HostUniverse`] owns every registered type and assembly. It hands out opaque
//! [`TypeHandle`]s from an atomic counter, memoizes generic instantiations and array
//! shapes so structurally identical constructions always come back as the same handle,
//! and pre-registers the core runtime assembly with the primitive set, the well-known
//! collection interfaces and the nullable/reference wrapper definitions.
//!
//! # Key Components
//!
//! - [`HostUniverse`]: Owner of all registered metadata
//! - [`HostAssembly`]: One registered module, indexed by reflection full name
//! - [`CoreTypes`]: Strong references to the well-known core registrations
//! - [`Primitive`]: The fixed primitive set, each with a native parse body
//! - [`enumerate_modules`]: The on-disk module enumeration collaborator
//!
//! # Identity
//!
//! Structural identity is enforced at this layer: the same `(definition, arguments)`
//! pair always yields the same instantiation handle. The descriptor caches upstream
//! rely on this to keep reference identity for constructed generics.

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use strum::{EnumIter, IntoEnumIterator};
use walkdir::WalkDir;

use crate::host::types::{
    HostAttribute, HostCtor, HostMethod, HostType, HostTypeFlags, HostTypeRc, HostTypeRef,
    MethodBody, TypeHandle,
};
use crate::host::value::{Instance, Value};
use crate::schema::known::{KnownMembers, KnownTypes};
use crate::{Error, Result};

/// Reference to a `HostAssembly`
pub type HostAssemblyRc = Arc<HostAssembly>;

/// Display identity of the core runtime assembly, always registered and always
/// first in the assembly search order.
pub const CORE_ASSEMBLY: &str = "Windows.Foundation";

/// The three binary-module file extensions the search-set enumeration accepts.
pub const MODULE_EXTENSIONS: [&str; 3] = ["winmd", "dll", "exe"];

/// Display identity of one candidate binary module discovered on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFileIdentity {
    /// Display name (the file stem)
    pub name: String,
    /// Path the identity was recorded from, absent for synthesized entries
    pub path: Option<PathBuf>,
}

impl ModuleFileIdentity {
    /// An identity with no backing file, used for assemblies registered in memory
    #[must_use]
    pub fn synthesized(name: &str) -> Self {
        ModuleFileIdentity {
            name: name.to_string(),
            path: None,
        }
    }
}

/// Recursively enumerate candidate binary modules under a root storage folder.
///
/// Files are matched by extension against [`MODULE_EXTENSIONS`] (case-insensitively)
/// and recorded with their file stem as display identity. Results are sorted by path
/// and de-duplicated by display name, first occurrence winning.
#[must_use]
pub fn enumerate_modules(root: &Path) -> Vec<ModuleFileIdentity> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    MODULE_EXTENSIONS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext))
                })
        })
        .collect();
    paths.sort();

    let mut seen = std::collections::HashSet::new();
    let mut modules = Vec::new();
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if seen.insert(stem.to_string()) {
            modules.push(ModuleFileIdentity {
                name: stem.to_string(),
                path: Some(path),
            });
        }
    }
    log::debug!("enumerated {} candidate modules", modules.len());
    modules
}

/// One registered module: a named bag of types indexed by reflection full name.
pub struct HostAssembly {
    /// Display identity
    pub name: String,
    types: DashMap<String, HostTypeRc>,
    /// Generic definitions additionally indexed by arity-stripped full name.
    /// First registration wins when several arities share a stripped name.
    generic_defs: DashMap<String, HostTypeRc>,
}

impl HostAssembly {
    fn new(name: &str) -> Self {
        HostAssembly {
            name: name.to_string(),
            types: DashMap::new(),
            generic_defs: DashMap::new(),
        }
    }

    /// Look up a type by its reflection full name
    #[must_use]
    pub fn get_type(&self, full_name: &str) -> Option<HostTypeRc> {
        self.types.get(full_name).map(|entry| entry.clone())
    }

    /// Look up a generic definition by arity-stripped full name
    #[must_use]
    pub fn generic_definition(&self, stripped: &str) -> Option<HostTypeRc> {
        self.generic_defs.get(stripped).map(|entry| entry.clone())
    }

    /// Look up a generic definition by arity-stripped full name and exact arity
    #[must_use]
    pub fn generic_definition_with_arity(&self, stripped: &str, arity: usize) -> Option<HostTypeRc> {
        self.get_type(&format!("{stripped}`{arity}"))
    }

    /// Number of types registered in this assembly
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether this assembly has no registrations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn insert(&self, host: &HostTypeRc) {
        let full_name = host.full_name();
        if host.is_generic_definition() {
            if let Some(stripped) = full_name.split('`').next() {
                self.generic_defs
                    .entry(stripped.to_string())
                    .or_insert_with(|| host.clone());
            }
        }
        self.types.entry(full_name).or_insert_with(|| host.clone());
    }
}

/// Memoization key for constructed types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstructedKey {
    /// Generic instantiation: definition handle plus argument handles
    Instance(u32, Vec<u32>),
    /// Array over an element handle
    Array(u32),
    /// Generic-parameter placeholder by position
    Param(usize),
}

/// Strong references to the well-known core registrations.
///
/// Kept on the universe so neither the resolution core nor registered method bodies
/// ever have to re-look these up by name.
pub struct CoreTypes {
    /// `System.Object`
    pub object: HostTypeRc,
    /// `System.String`
    pub string: HostTypeRc,
    /// `System.Boolean`
    pub boolean: HostTypeRc,
    /// `System.ValueType`
    pub value_type: HostTypeRc,
    /// `System.Enum`, the opaque enum base
    pub enum_base: HostTypeRc,
    /// The dependency-property marker field type
    pub dependency_property: HostTypeRc,
    /// The markup-extension root type
    pub markup_extension: HostTypeRc,
    /// `` System.Nullable`1 ``
    pub nullable_def: HostTypeRc,
    /// `` Windows.Foundation.IReference`1 ``
    pub ireference_def: HostTypeRc,
    /// Non-generic `System.Collections.IEnumerable`
    pub ienumerable: HostTypeRc,
    /// Non-generic `System.Collections.IList`
    pub ilist: HostTypeRc,
    /// Non-generic `System.Collections.IDictionary`
    pub idictionary: HostTypeRc,
    /// `` System.Collections.Generic.ICollection`1 ``
    pub icollection_def: HostTypeRc,
    /// `` System.Collections.Generic.IList`1 ``
    pub ilist_def: HostTypeRc,
    /// `` Windows.Foundation.Collections.IVector`1 ``
    pub ivector_def: HostTypeRc,
    /// `` Windows.Foundation.Collections.IIterable`1 ``
    pub iiterable_def: HostTypeRc,
    /// `` System.Collections.Generic.IDictionary`2 ``
    pub idictionary_def: HostTypeRc,
    /// `` Windows.Foundation.Collections.IMap`2 ``
    pub imap_def: HostTypeRc,
}

/// The fixed primitive set registered with the core runtime assembly.
///
/// Each primitive carries the standard (markup-facing) spelling of its name; the
/// reflection spelling lives under `System`. Primitives with a sensible textual
/// form also carry a native `Parse` method surfaced through the create-from-string
/// attribute contract, so literals parse through the same path user types use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
#[allow(missing_docs)]
pub enum Primitive {
    Object,
    String,
    Boolean,
    Char16,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Guid,
    TimeSpan,
}

impl Primitive {
    /// Reflection-facing simple name under the `System` namespace
    #[must_use]
    pub fn host_name(&self) -> &'static str {
        match self {
            Primitive::Object => "Object",
            Primitive::String => "String",
            Primitive::Boolean => "Boolean",
            Primitive::Char16 => "Char",
            Primitive::Int8 => "SByte",
            Primitive::UInt8 => "Byte",
            Primitive::Int16 => "Int16",
            Primitive::UInt16 => "UInt16",
            Primitive::Int32 => "Int32",
            Primitive::UInt32 => "UInt32",
            Primitive::Int64 => "Int64",
            Primitive::UInt64 => "UInt64",
            Primitive::Single => "Single",
            Primitive::Double => "Double",
            Primitive::Guid => "Guid",
            Primitive::TimeSpan => "TimeSpan",
        }
    }

    /// Whether the primitive is a value type
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        !matches!(self, Primitive::Object | Primitive::String)
    }

    /// Whether the primitive carries a native parse body
    #[must_use]
    pub fn has_parse(&self) -> bool {
        !matches!(self, Primitive::Object | Primitive::Guid | Primitive::TimeSpan)
    }

    /// Default value produced by the primitive's zero-argument constructor
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Primitive::Object => Value::Null,
            Primitive::String => Value::String(String::new()),
            Primitive::Boolean => Value::Boolean(false),
            Primitive::Char16 => Value::Char('\0'),
            Primitive::Int8 => Value::I1(0),
            Primitive::UInt8 => Value::U1(0),
            Primitive::Int16 => Value::I2(0),
            Primitive::UInt16 => Value::U2(0),
            Primitive::Int32 => Value::I4(0),
            Primitive::UInt32 => Value::U4(0),
            Primitive::Int64 => Value::I8(0),
            Primitive::UInt64 => Value::U8(0),
            Primitive::Single => Value::R4(0.0),
            Primitive::Double => Value::R8(0.0),
            Primitive::Guid => Value::String(String::new()),
            Primitive::TimeSpan => Value::I8(0),
        }
    }

    fn parse(&self, type_name: &str, text: &str) -> Result<Value> {
        let trimmed = text.trim();
        let fail = || Error::NoStringConversion {
            type_name: type_name.to_string(),
            value: text.to_string(),
        };
        match self {
            Primitive::Boolean => match trimmed {
                _ if trimmed.eq_ignore_ascii_case("true") => Ok(Value::Boolean(true)),
                _ if trimmed.eq_ignore_ascii_case("false") => Ok(Value::Boolean(false)),
                _ => Err(fail()),
            },
            Primitive::Char16 => {
                let mut chars = trimmed.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Value::Char(c)),
                    _ => Err(fail()),
                }
            }
            Primitive::Int8 => trimmed.parse().map(Value::I1).map_err(|_| fail()),
            Primitive::UInt8 => trimmed.parse().map(Value::U1).map_err(|_| fail()),
            Primitive::Int16 => trimmed.parse().map(Value::I2).map_err(|_| fail()),
            Primitive::UInt16 => trimmed.parse().map(Value::U2).map_err(|_| fail()),
            Primitive::Int32 => trimmed.parse().map(Value::I4).map_err(|_| fail()),
            Primitive::UInt32 => trimmed.parse().map(Value::U4).map_err(|_| fail()),
            Primitive::Int64 => trimmed.parse().map(Value::I8).map_err(|_| fail()),
            Primitive::UInt64 => trimmed.parse().map(Value::U8).map_err(|_| fail()),
            Primitive::Single => trimmed.parse().map(Value::R4).map_err(|_| fail()),
            Primitive::Double => trimmed.parse().map(Value::R8).map_err(|_| fail()),
            Primitive::String => Ok(Value::String(text.to_string())),
            Primitive::Object | Primitive::Guid | Primitive::TimeSpan => Err(fail()),
        }
    }
}

/// Owner of all registered host metadata.
///
/// # Thread Safety
///
/// All collections are concurrent; registration and lookup are safe from any thread.
/// Handle allocation is a relaxed atomic increment, and constructed-type memoization
/// uses insert-if-absent so races construct at most one winner.
pub struct HostUniverse {
    /// Primary type storage indexed by handle
    types: SkipMap<TypeHandle, HostTypeRc>,
    /// Registered assemblies by display identity
    assemblies: DashMap<String, HostAssemblyRc>,
    /// Registration order of assemblies, for deterministic search snapshots
    assembly_order: std::sync::Mutex<Vec<String>>,
    /// Memoized constructed types (generic instantiations, arrays, placeholders)
    constructed: DashMap<ConstructedKey, HostTypeRc>,
    /// Next handle value
    next_handle: AtomicU32,
    /// Well-known core registrations
    core: CoreTypes,
}

impl HostUniverse {
    /// Create a universe with the core runtime assembly pre-registered.
    #[must_use]
    pub fn new() -> Arc<Self> {
        let types = SkipMap::new();
        let assemblies = DashMap::new();
        let next_handle = AtomicU32::new(0x0000_0020);

        let core_assembly = Arc::new(HostAssembly::new(CORE_ASSEMBLY));
        assemblies.insert(CORE_ASSEMBLY.to_string(), core_assembly.clone());

        let core = register_core(&types, &next_handle, &core_assembly);

        let universe = Arc::new(HostUniverse {
            types,
            assemblies,
            assembly_order: std::sync::Mutex::new(vec![CORE_ASSEMBLY.to_string()]),
            constructed: DashMap::new(),
            next_handle,
            core,
        });
        universe.wire_core_generics();
        universe
    }

    /// Attach the declarations that need constructed placeholder types: the
    /// boxing constructors of the wrapper definitions and the add-operation
    /// declarations of the collection interfaces.
    fn wire_core_generics(self: &Arc<Self>) {
        let t0 = self.generic_param_type(0, "T");
        let t1 = self.generic_param_type(1, "V");

        let identity_body: MethodBody = Arc::new(|args| Ok(args.first().cloned().unwrap_or_default()));
        for wrapper in [&self.core.nullable_def, &self.core.ireference_def] {
            wrapper.constructors.push(Arc::new(HostCtor {
                params: vec![t0.clone()],
                body: Some(identity_body.clone()),
            }));
        }

        let declare = |def: &HostTypeRc, name: &str, params: Vec<HostTypeRc>| {
            def.methods.push(Arc::new(HostMethod {
                name: name.to_string(),
                is_static: false,
                is_public: true,
                params,
                return_type: None,
                body: None,
            }));
        };
        declare(&self.core.icollection_def, KnownMembers::ADD, vec![t0.clone()]);
        declare(&self.core.ilist_def, KnownMembers::ADD, vec![t0.clone()]);
        declare(&self.core.ivector_def, KnownMembers::APPEND, vec![t0.clone()]);
        declare(
            &self.core.idictionary_def,
            KnownMembers::ADD,
            vec![t0.clone(), t1.clone()],
        );
        declare(
            &self.core.imap_def,
            KnownMembers::INSERT,
            vec![t0.clone(), t1.clone()],
        );
        declare(&self.core.ilist, KnownMembers::ADD, vec![self.core.object.clone()]);
        declare(
            &self.core.idictionary,
            KnownMembers::ADD,
            vec![self.core.object.clone(), self.core.object.clone()],
        );
    }

    /// The well-known core registrations
    #[must_use]
    pub fn core(&self) -> &CoreTypes {
        &self.core
    }

    /// Get or create an assembly with the given display identity
    pub fn register_assembly(&self, name: &str) -> HostAssemblyRc {
        if let Some(existing) = self.assemblies.get(name) {
            return existing.clone();
        }
        let assembly = Arc::new(HostAssembly::new(name));
        let entry = self
            .assemblies
            .entry(name.to_string())
            .or_insert_with(|| assembly.clone())
            .clone();
        if Arc::ptr_eq(&entry, &assembly) {
            if let Ok(mut order) = self.assembly_order.lock() {
                order.push(name.to_string());
            }
        }
        entry
    }

    /// Look up an assembly by display identity
    #[must_use]
    pub fn assembly(&self, name: &str) -> Option<HostAssemblyRc> {
        self.assemblies.get(name).map(|entry| entry.clone())
    }

    /// Registered assembly identities in registration order
    #[must_use]
    pub fn assembly_names(&self) -> Vec<String> {
        self.assembly_order
            .lock()
            .map(|order| order.clone())
            .unwrap_or_default()
    }

    /// Look up a type by handle
    #[must_use]
    pub fn get(&self, handle: TypeHandle) -> Option<HostTypeRc> {
        self.types.get(&handle).map(|entry| entry.value().clone())
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the universe holds no types
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn allocate_handle(&self) -> TypeHandle {
        TypeHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }

    /// Insert a freshly built type into the primary store and its assembly indices.
    pub(crate) fn register_type(&self, assembly: &HostAssemblyRc, host: HostType) -> HostTypeRc {
        let host = Arc::new(host);
        self.types.insert(host.handle, host.clone());
        assembly.insert(&host);
        host
    }

    /// The memoized generic-parameter placeholder for a definition position
    #[must_use]
    pub fn generic_param_type(&self, index: usize, name: &str) -> HostTypeRc {
        if let Some(existing) = self.constructed.get(&ConstructedKey::Param(index)) {
            return existing.clone();
        }
        let mut placeholder = HostType::new(
            self.allocate_handle(),
            String::new(),
            name.to_string(),
            CORE_ASSEMBLY.to_string(),
            HostTypeFlags::empty(),
            None,
        );
        placeholder.generic_param = Some(index);
        let placeholder = Arc::new(placeholder);
        let entry = self
            .constructed
            .entry(ConstructedKey::Param(index))
            .or_insert_with(|| placeholder.clone())
            .clone();
        self.types.insert(entry.handle, entry.clone());
        entry
    }

    /// Construct (or fetch) the generic instantiation of `def` over `args`.
    ///
    /// Structural identity is preserved: the same definition and argument handles
    /// always return the same instantiation. Members and interfaces are copied from
    /// the definition with generic-parameter placeholders substituted by position;
    /// method bodies are shared, since registered bodies are generic-agnostic.
    #[must_use]
    pub fn make_generic(&self, def: &HostTypeRc, args: &[HostTypeRc]) -> HostTypeRc {
        let key = ConstructedKey::Instance(
            def.handle.value(),
            args.iter().map(|arg| arg.handle.value()).collect(),
        );
        if let Some(existing) = self.constructed.get(&key) {
            return existing.clone();
        }

        let mut instance = HostType::new(
            self.allocate_handle(),
            def.namespace.clone(),
            def.name.clone(),
            def.assembly.clone(),
            def.flags,
            None,
        );
        instance.generic_def = Some(def.clone());
        instance.generic_args = args.to_vec();
        let instance = Arc::new(instance);

        // The instantiation is filled completely before it is published, so a racing
        // construction never observes partial member lists. Losers are discarded.
        if let Some(base) = def.base() {
            let _ = instance.base.set(HostTypeRef::new(&base));
        }
        for (_, iface) in def.interfaces.iter() {
            instance.interfaces.push(self.substitute(iface, args));
        }
        for (_, property) in def.properties.iter() {
            instance.properties.push(Arc::new(super::types::HostProperty {
                name: property.name.clone(),
                property_type: self.substitute(&property.property_type, args),
                has_setter: property.has_setter,
                is_static: property.is_static,
            }));
        }
        for (_, method) in def.methods.iter() {
            instance.methods.push(Arc::new(HostMethod {
                name: method.name.clone(),
                is_static: method.is_static,
                is_public: method.is_public,
                params: method
                    .params
                    .iter()
                    .map(|param| self.substitute(param, args))
                    .collect(),
                return_type: method
                    .return_type
                    .as_ref()
                    .map(|ret| self.substitute(ret, args)),
                body: method.body.clone(),
            }));
        }
        for (_, ctor) in def.constructors.iter() {
            instance.constructors.push(Arc::new(HostCtor {
                params: ctor
                    .params
                    .iter()
                    .map(|param| self.substitute(param, args))
                    .collect(),
                body: ctor.body.clone(),
            }));
        }
        for (_, attribute) in def.attributes.iter() {
            instance.attributes.push(attribute.clone());
        }

        let winner = self
            .constructed
            .entry(key)
            .or_insert_with(|| instance.clone())
            .clone();
        if !Arc::ptr_eq(&winner, &instance) {
            return winner;
        }

        self.types.insert(instance.handle, instance.clone());
        if let Some(assembly) = self.assembly(&def.assembly) {
            assembly.insert(&instance);
        }
        instance
    }

    /// Construct (or fetch) the array type over an element
    #[must_use]
    pub fn make_array(&self, element: &HostTypeRc) -> HostTypeRc {
        let key = ConstructedKey::Array(element.handle.value());
        if let Some(existing) = self.constructed.get(&key) {
            return existing.clone();
        }
        let mut array = HostType::new(
            self.allocate_handle(),
            element.namespace.clone(),
            format!("{}[]", element.name),
            element.assembly.clone(),
            HostTypeFlags::PUBLIC | HostTypeFlags::ARRAY,
            None,
        );
        array.element_type = Some(element.clone());
        let array = Arc::new(array);
        let winner = self
            .constructed
            .entry(key)
            .or_insert_with(|| array.clone())
            .clone();
        self.types.insert(winner.handle, winner.clone());
        winner
    }

    /// Substitute generic-parameter placeholders in `ty` by position from `args`
    fn substitute(&self, ty: &HostTypeRc, args: &[HostTypeRc]) -> HostTypeRc {
        if let Some(index) = ty.generic_param {
            return args.get(index).cloned().unwrap_or_else(|| ty.clone());
        }
        if let Some(def) = &ty.generic_def {
            let mapped: Vec<HostTypeRc> = ty
                .generic_args
                .iter()
                .map(|arg| self.substitute(arg, args))
                .collect();
            return self.make_generic(def, &mapped);
        }
        ty.clone()
    }
}

/// Register the core runtime assembly: primitives, the well-known bases, the
/// collection interfaces and the wrapper definitions.
fn register_core(
    types: &SkipMap<TypeHandle, HostTypeRc>,
    next_handle: &AtomicU32,
    core_assembly: &HostAssemblyRc,
) -> CoreTypes {
    let allocate = || TypeHandle::new(next_handle.fetch_add(1, Ordering::Relaxed));

    let register = |host: HostType| -> HostTypeRc {
        let host = Arc::new(host);
        types.insert(host.handle, host.clone());
        core_assembly.insert(&host);
        host
    };

    let class = |handle, namespace: &str, name: &str, flags| {
        HostType::new(
            handle,
            namespace.to_string(),
            name.to_string(),
            CORE_ASSEMBLY.to_string(),
            flags,
            None,
        )
    };

    let object = register(class(allocate(), "System", "Object", HostTypeFlags::PUBLIC));
    let value_type = register(class(allocate(), "System", "ValueType", HostTypeFlags::PUBLIC));
    let _ = value_type.base.set(HostTypeRef::new(&object));
    let enum_base = register(class(
        allocate(),
        "System",
        "Enum",
        HostTypeFlags::PUBLIC | HostTypeFlags::VALUE_TYPE,
    ));
    let _ = enum_base.base.set(HostTypeRef::new(&value_type));

    // Primitives, each with a default constructor and (where sensible) a native
    // Parse method surfaced through the create-from-string attribute contract.
    let mut string_type: Option<HostTypeRc> = None;
    let mut primitives: Vec<(Primitive, HostTypeRc)> = Vec::new();
    for primitive in Primitive::iter() {
        let mut flags = HostTypeFlags::PUBLIC;
        if primitive.is_value_type() {
            flags |= HostTypeFlags::VALUE_TYPE;
        }
        if primitive == Primitive::Object {
            primitives.push((primitive, object.clone()));
            continue;
        }
        let host = register(class(allocate(), "System", primitive.host_name(), flags));
        let base = if primitive.is_value_type() {
            &value_type
        } else {
            &object
        };
        let _ = host.base.set(HostTypeRef::new(base));
        if primitive == Primitive::String {
            string_type = Some(host.clone());
        }
        primitives.push((primitive, host));
    }

    let string = match string_type {
        Some(string) => string,
        // Primitive::iter always yields String; keep a harmless fallback anyway.
        None => object.clone(),
    };

    for (primitive, host) in &primitives {
        let default = primitive.default_value();
        let host_for_ctor = host.clone();
        let ctor_body: MethodBody = if *primitive == Primitive::Object {
            Arc::new(move |_args| Ok(Value::Object(Instance::new(host_for_ctor.clone()))))
        } else {
            Arc::new(move |_args| Ok(default.clone()))
        };
        host.constructors.push(Arc::new(HostCtor {
            params: Vec::new(),
            body: Some(ctor_body),
        }));

        if primitive.has_parse() {
            let kind = *primitive;
            let type_name = host.full_name();
            let parse_body: MethodBody = Arc::new(move |args| {
                let text = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidTarget("string argument".to_string()))?;
                kind.parse(&type_name, text)
            });
            host.methods.push(Arc::new(HostMethod {
                name: "Parse".to_string(),
                is_static: true,
                is_public: true,
                params: vec![string.clone()],
                return_type: Some(host.clone()),
                body: Some(parse_body),
            }));
            host.attributes.push(HostAttribute {
                type_name: KnownTypes::CREATE_FROM_STRING_ATTRIBUTE.to_string(),
                positional: Vec::new(),
                named: vec![(
                    KnownMembers::METHOD_NAME.to_string(),
                    Value::String("Parse".to_string()),
                )],
            });
        }
    }

    let boolean = primitives
        .iter()
        .find(|(primitive, _)| *primitive == Primitive::Boolean)
        .map(|(_, host)| host.clone())
        .unwrap_or_else(|| object.clone());

    let dependency_property = register(class(
        allocate(),
        "Microsoft.UI.Xaml",
        "DependencyProperty",
        HostTypeFlags::PUBLIC,
    ));
    let _ = dependency_property.base.set(HostTypeRef::new(&object));
    let markup_extension = register(class(
        allocate(),
        "Microsoft.UI.Xaml.Markup",
        "MarkupExtension",
        HostTypeFlags::PUBLIC,
    ));
    let _ = markup_extension.base.set(HostTypeRef::new(&object));

    let generic = |handle, namespace: &str, name: &str, flags, params: &[&str]| {
        let mut def = HostType::new(
            handle,
            namespace.to_string(),
            name.to_string(),
            CORE_ASSEMBLY.to_string(),
            flags,
            None,
        );
        def.generic_params = params.iter().map(|param| (*param).to_string()).collect();
        def
    };

    let iface = HostTypeFlags::PUBLIC | HostTypeFlags::INTERFACE;
    let nullable_def = register(generic(
        allocate(),
        "System",
        "Nullable`1",
        HostTypeFlags::PUBLIC | HostTypeFlags::VALUE_TYPE,
        &["T"],
    ));
    let ireference_def = register(generic(
        allocate(),
        "Windows.Foundation",
        "IReference`1",
        iface,
        &["T"],
    ));
    let ienumerable = register(class(
        allocate(),
        "System.Collections",
        "IEnumerable",
        iface,
    ));
    let ilist = register(class(allocate(), "System.Collections", "IList", iface));
    let idictionary = register(class(
        allocate(),
        "System.Collections",
        "IDictionary",
        iface,
    ));
    let icollection_def = register(generic(
        allocate(),
        "System.Collections.Generic",
        "ICollection`1",
        iface,
        &["T"],
    ));
    let ilist_def = register(generic(
        allocate(),
        "System.Collections.Generic",
        "IList`1",
        iface,
        &["T"],
    ));
    let ivector_def = register(generic(
        allocate(),
        "Windows.Foundation.Collections",
        "IVector`1",
        iface,
        &["T"],
    ));
    let iiterable_def = register(generic(
        allocate(),
        "Windows.Foundation.Collections",
        "IIterable`1",
        iface,
        &["T"],
    ));
    let idictionary_def = register(generic(
        allocate(),
        "System.Collections.Generic",
        "IDictionary`2",
        iface,
        &["K", "V"],
    ));
    let imap_def = register(generic(
        allocate(),
        "Windows.Foundation.Collections",
        "IMap`2",
        iface,
        &["K", "V"],
    ));

    CoreTypes {
        object,
        string,
        boolean,
        value_type,
        enum_base,
        dependency_property,
        markup_extension,
        nullable_def,
        ireference_def,
        ienumerable,
        ilist,
        idictionary,
        icollection_def,
        ilist_def,
        ivector_def,
        iiterable_def,
        idictionary_def,
        imap_def,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_registrations() {
        let universe = HostUniverse::new();
        let core = universe.core();
        assert_eq!(core.object.full_name(), "System.Object");
        assert_eq!(core.string.full_name(), "System.String");
        assert_eq!(core.nullable_def.full_name(), "System.Nullable`1");
        assert!(core.icollection_def.is_generic_definition());

        let assembly = universe.assembly(CORE_ASSEMBLY).unwrap();
        assert!(assembly.get_type("System.Boolean").is_some());
        assert!(assembly.generic_definition("System.Nullable").is_some());
    }

    #[test]
    fn test_primitive_base_chain() {
        let universe = HostUniverse::new();
        let assembly = universe.assembly(CORE_ASSEMBLY).unwrap();
        let int32 = assembly.get_type("System.Int32").unwrap();
        let base = int32.base().unwrap();
        assert_eq!(base.full_name(), "System.ValueType");
        assert_eq!(base.base().unwrap().full_name(), "System.Object");
    }

    #[test]
    fn test_generic_instantiation_identity() {
        let universe = HostUniverse::new();
        let core = universe.core();
        let a = universe.make_generic(&core.nullable_def, &[core.boolean.clone()]);
        let b = universe.make_generic(&core.nullable_def, &[core.boolean.clone()]);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.full_name(), "System.Nullable`1[System.Boolean]");
    }

    #[test]
    fn test_array_identity() {
        let universe = HostUniverse::new();
        let core = universe.core();
        let a = universe.make_array(&core.string);
        let b = universe.make_array(&core.string);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(a.is_array());
        assert_eq!(a.full_name(), "System.String[]");
    }

    #[test]
    fn test_module_enumeration_filters_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("App.winmd"), b"").unwrap();
        std::fs::write(dir.path().join("nested/Lib.DLL"), b"").unwrap();
        std::fs::write(dir.path().join("Tool.exe"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let modules = enumerate_modules(dir.path());
        let mut names: Vec<&str> = modules.iter().map(|module| module.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["App", "Lib", "Tool"]);
    }
}
