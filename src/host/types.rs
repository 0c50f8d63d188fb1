//! Registered type metadata for the host object model.
//!
//! Rust has no runtime reflection, so the host object model is a registration-based
//! metadata table: every type the resolution core can see is a [`HostType`] assembled
//! at registration time, carrying its members, attributes, generic shape and an
//! optional class initializer. The core never mutates these records; it only reads
//! them, once, while building descriptors.
//!
//! # Key Components
//!
//! - [`HostType`]: One registered type, with properties, fields, methods and attributes
//! - [`HostTypeRef`]: Weak reference to a type, used for base links to avoid cycles
//! - [`TypeHandle`]: Opaque identity assigned at registration, the by-handle cache key
//! - [`HostMethod`] / [`HostCtor`]: Invocable members carrying optional boxed-value bodies
//! - [`EnumWidth`]: The eight underlying integer widths an enum can declare

use std::fmt;
use std::sync::{Arc, Once, OnceLock, Weak};

use bitflags::bitflags;
use strum::EnumIter;

use crate::host::value::Value;
use crate::Result;

/// Reference to a `HostType`
pub type HostTypeRc = Arc<HostType>;

/// Invocable body of a registered method or constructor.
///
/// Static methods receive their declared parameters; instance methods receive the
/// target instance first, then the declared parameters.
pub type MethodBody = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Opaque identity of a registered host type.
///
/// Handles are assigned by the universe at registration time and never reused. They
/// are the key of the by-handle descriptor cache, so everything downstream compares
/// types by handle rather than by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeHandle(u32);

impl TypeHandle {
    /// Create a handle from its raw value
    #[must_use]
    pub const fn new(value: u32) -> Self {
        TypeHandle(value)
    }

    /// The raw handle value
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

bitflags! {
    /// Attribute flags of a registered host type
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct HostTypeFlags: u32 {
        /// Type is publicly visible
        const PUBLIC = 0x0001;
        /// Type is an interface
        const INTERFACE = 0x0002;
        /// Type is a value type
        const VALUE_TYPE = 0x0004;
        /// Type is an enum
        const ENUM = 0x0008;
        /// Type is an array
        const ARRAY = 0x0010;
    }
}

/// The underlying integer width of an enum, one of eight signed/unsigned kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum EnumWidth {
    /// 8-bit signed
    I1,
    /// 8-bit unsigned
    U1,
    /// 16-bit signed
    I2,
    /// 16-bit unsigned
    U2,
    /// 32-bit signed
    I4,
    /// 32-bit unsigned
    U4,
    /// 64-bit signed
    I8,
    /// 64-bit unsigned
    U8,
}

impl EnumWidth {
    /// Whether this width accumulates through the signed 64-bit path
    #[must_use]
    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            EnumWidth::I1 | EnumWidth::I2 | EnumWidth::I4 | EnumWidth::I8
        )
    }
}

/// An instance property declared on a host type.
#[derive(Debug)]
pub struct HostProperty {
    /// Property name
    pub name: String,
    /// The type of values this property holds
    pub property_type: HostTypeRc,
    /// Whether a setter exists; absent setter makes the property read-only
    pub has_setter: bool,
    /// Whether the property is static
    pub is_static: bool,
}

/// A field declared on a host type. Only static fields matter to the resolution
/// core (the dependency-property marker convention).
#[derive(Debug)]
pub struct HostField {
    /// Field name
    pub name: String,
    /// Declared field type
    pub field_type: HostTypeRc,
    /// Whether the field is static
    pub is_static: bool,
}

/// A method declared on a host type.
pub struct HostMethod {
    /// Method name
    pub name: String,
    /// Whether the method is static
    pub is_static: bool,
    /// Whether the method is publicly visible
    pub is_public: bool,
    /// Declared parameter types, excluding any instance receiver
    pub params: Vec<HostTypeRc>,
    /// Declared return type; `None` renders as void
    pub return_type: Option<HostTypeRc>,
    /// Optional invocable body
    pub body: Option<MethodBody>,
}

impl HostMethod {
    /// Invoke the method body with boxed arguments.
    ///
    /// ## Arguments
    /// * `declaring` - Full name of the declaring type, for error reporting
    /// * `args` - Boxed arguments; instance methods expect the receiver first
    ///
    /// # Errors
    /// Returns [`crate::Error::MethodNotInvokable`] if no body was registered.
    pub fn invoke(&self, declaring: &str, args: &[Value]) -> Result<Value> {
        match &self.body {
            Some(body) => body(args),
            None => Err(crate::Error::MethodNotInvokable {
                type_name: declaring.to_string(),
                method: self.name.clone(),
            }),
        }
    }
}

impl fmt::Debug for HostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMethod")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

/// A constructor declared on a host type.
pub struct HostCtor {
    /// Declared parameter types
    pub params: Vec<HostTypeRc>,
    /// Invocable body producing the new instance value
    pub body: Option<MethodBody>,
}

impl fmt::Debug for HostCtor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostCtor")
            .field("params", &self.params.len())
            .finish_non_exhaustive()
    }
}

/// Custom attribute data attached to a host type.
///
/// Attributes are consumed by name, not by compiled reference: the resolution core
/// compares `type_name` against well-known attribute names and never resolves the
/// attribute type itself.
#[derive(Debug, Clone)]
pub struct HostAttribute {
    /// Full name of the attribute type
    pub type_name: String,
    /// Positional constructor arguments
    pub positional: Vec<Value>,
    /// Named arguments
    pub named: Vec<(String, Value)>,
}

impl HostAttribute {
    /// Look up a named argument, case-insensitively.
    #[must_use]
    pub fn named_arg(&self, name: &str) -> Option<&Value> {
        self.named
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Look up a positional argument by index.
    #[must_use]
    pub fn positional_arg(&self, index: usize) -> Option<&Value> {
        self.positional.get(index)
    }
}

/// Weak reference to a [`HostType`].
///
/// Base links use weak references so that inheritance chains never keep a dropped
/// universe alive; the universe itself owns every type strongly.
#[derive(Debug, Clone)]
pub struct HostTypeRef {
    weak_ref: Weak<HostType>,
}

impl HostTypeRef {
    /// Create a new `HostTypeRef` from a strong reference
    #[must_use]
    pub fn new(strong_ref: &HostTypeRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the type, returning None if the type has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<HostTypeRc> {
        self.weak_ref.upgrade()
    }
}

impl From<HostTypeRc> for HostTypeRef {
    fn from(strong_ref: HostTypeRc) -> Self {
        HostTypeRef::new(&strong_ref)
    }
}

/// One registered type in the host object model.
///
/// All structural data is immutable after registration; the only late-bound pieces
/// are the base link (set while the registering assembly wires its hierarchy) and
/// the nested-type list, both append/set-once.
pub struct HostType {
    /// Opaque registration identity
    pub handle: TypeHandle,
    /// Namespace (can be empty)
    pub namespace: String,
    /// Reflection-style name; generic definitions carry their `` `N `` arity suffix,
    /// nested types their `+`-joined path
    pub name: String,
    /// Display identity of the owning assembly
    pub assembly: String,
    /// Attribute flags
    pub flags: HostTypeFlags,
    /// This type's base, set once during registration
    pub(crate) base: OnceLock<HostTypeRef>,
    /// Implemented interfaces
    pub interfaces: boxcar::Vec<HostTypeRc>,
    /// Declared instance and static properties
    pub properties: boxcar::Vec<Arc<HostProperty>>,
    /// Declared fields
    pub fields: boxcar::Vec<Arc<HostField>>,
    /// Declared methods
    pub methods: boxcar::Vec<Arc<HostMethod>>,
    /// Declared constructors
    pub constructors: boxcar::Vec<Arc<HostCtor>>,
    /// Custom attributes
    pub attributes: boxcar::Vec<HostAttribute>,
    /// Types nested inside this one
    pub nested_types: boxcar::Vec<HostTypeRc>,
    /// Generic parameter names, non-empty only for generic definitions
    pub generic_params: Vec<String>,
    /// The generic definition this instantiation was constructed from
    pub generic_def: Option<HostTypeRc>,
    /// Generic arguments of an instantiation
    pub generic_args: Vec<HostTypeRc>,
    /// Element type of an array
    pub element_type: Option<HostTypeRc>,
    /// Named constants of an enum, raw values sign-extended to 64 bits
    pub enum_values: Vec<(String, i64)>,
    /// Declared underlying width of an enum; `None` when unknown
    pub enum_width: Option<EnumWidth>,
    /// Position of this type when it is a generic-parameter placeholder
    pub generic_param: Option<usize>,
    /// Class initializer, run at most once before member lookups
    pub(crate) class_init: Option<Box<dyn Fn() + Send + Sync>>,
    class_init_once: Once,
}

impl HostType {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        handle: TypeHandle,
        namespace: String,
        name: String,
        assembly: String,
        flags: HostTypeFlags,
        class_init: Option<Box<dyn Fn() + Send + Sync>>,
    ) -> Self {
        HostType {
            handle,
            namespace,
            name,
            assembly,
            flags,
            base: OnceLock::new(),
            interfaces: boxcar::Vec::new(),
            properties: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
            methods: boxcar::Vec::new(),
            constructors: boxcar::Vec::new(),
            attributes: boxcar::Vec::new(),
            nested_types: boxcar::Vec::new(),
            generic_params: Vec::new(),
            generic_def: None,
            generic_args: Vec::new(),
            element_type: None,
            enum_values: Vec::new(),
            enum_width: None,
            generic_param: None,
            class_init,
            class_init_once: Once::new(),
        }
    }

    /// The reflection-facing full name of this type.
    ///
    /// Generic instantiations render in the host's bracket syntax
    /// (`` System.Nullable`1[System.Boolean] ``), arrays with a `[]` suffix.
    #[must_use]
    pub fn full_name(&self) -> String {
        if let Some(element) = &self.element_type {
            return format!("{}[]", element.full_name());
        }
        if let Some(def) = &self.generic_def {
            let args = self
                .generic_args
                .iter()
                .map(|arg| arg.full_name())
                .collect::<Vec<_>>()
                .join(",");
            return format!("{}[{}]", def.full_name(), args);
        }
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// The base of this type, if one was registered and is still alive
    #[must_use]
    pub fn base(&self) -> Option<HostTypeRc> {
        self.base.get().and_then(HostTypeRef::upgrade)
    }

    /// `true` if this type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flags.contains(HostTypeFlags::INTERFACE)
    }

    /// `true` if this type is an enum
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.flags.contains(HostTypeFlags::ENUM)
    }

    /// `true` if this type is an array
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.flags.contains(HostTypeFlags::ARRAY)
    }

    /// `true` if this type is a value type
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        self.flags.contains(HostTypeFlags::VALUE_TYPE)
    }

    /// `true` for an open generic definition (declares parameters, has no arguments)
    #[must_use]
    pub fn is_generic_definition(&self) -> bool {
        !self.generic_params.is_empty() && self.generic_def.is_none()
    }

    /// `true` for a constructed generic instantiation
    #[must_use]
    pub fn is_generic_instance(&self) -> bool {
        self.generic_def.is_some()
    }

    /// Run the class initializer if one was registered and it has not run yet.
    ///
    /// Initializers must not resolve types through a schema context; descriptor
    /// construction holds the context's build lock while running them.
    pub fn run_class_initializer(&self) {
        if let Some(init) = &self.class_init {
            self.class_init_once.call_once(|| init());
        }
    }

    /// Every type in the inheritance chain, starting with self
    #[must_use]
    pub fn ancestry(self: &HostTypeRc) -> Vec<HostTypeRc> {
        let mut chain = vec![self.clone()];
        let mut current = self.base();
        while let Some(base) = current {
            current = base.base();
            chain.push(base);
        }
        chain
    }

    /// Find a property by name, walking the inheritance chain
    #[must_use]
    pub fn find_property(self: &HostTypeRc, name: &str) -> Option<Arc<HostProperty>> {
        for host in self.ancestry() {
            for (_, property) in host.properties.iter() {
                if property.name == name && !property.is_static {
                    return Some(property.clone());
                }
            }
        }
        None
    }

    /// Find a static field by name, walking the inheritance chain
    #[must_use]
    pub fn find_static_field(self: &HostTypeRc, name: &str) -> Option<Arc<HostField>> {
        for host in self.ancestry() {
            for (_, field) in host.fields.iter() {
                if field.name == name && field.is_static {
                    return Some(field.clone());
                }
            }
        }
        None
    }

    /// Find a static property by name, walking the inheritance chain
    #[must_use]
    pub fn find_static_property(self: &HostTypeRc, name: &str) -> Option<Arc<HostProperty>> {
        for host in self.ancestry() {
            for (_, property) in host.properties.iter() {
                if property.name == name && property.is_static {
                    return Some(property.clone());
                }
            }
        }
        None
    }

    /// All public static methods, inherited ones after declared ones
    #[must_use]
    pub fn public_static_methods(self: &HostTypeRc) -> Vec<Arc<HostMethod>> {
        let mut methods = Vec::new();
        for host in self.ancestry() {
            for (_, method) in host.methods.iter() {
                if method.is_static && method.is_public {
                    methods.push(method.clone());
                }
            }
        }
        methods
    }

    /// Find a declared instance method by name and arity.
    ///
    /// Reports whether more than one candidate matched, so callers can surface an
    /// ambiguity diagnostic while keeping the first.
    #[must_use]
    pub fn find_instance_method(
        self: &HostTypeRc,
        name: &str,
        arity: usize,
    ) -> (Option<Arc<HostMethod>>, bool) {
        let mut found: Option<Arc<HostMethod>> = None;
        for host in self.ancestry() {
            for (_, method) in host.methods.iter() {
                if method.is_static
                    || !method.is_public
                    || method.name != name
                    || method.params.len() != arity
                {
                    continue;
                }
                if found.is_some() {
                    return (found, true);
                }
                found = Some(method.clone());
            }
            if found.is_some() {
                // A declared method shadows base declarations of the same shape.
                return (found, false);
            }
        }
        (found, false)
    }

    /// Find a custom attribute by attribute type name.
    ///
    /// ## Arguments
    /// * `type_name` - Full name of the attribute type
    /// * `inherited` - Whether to walk the inheritance chain
    #[must_use]
    pub fn find_attribute(
        self: &HostTypeRc,
        type_name: &str,
        inherited: bool,
    ) -> Option<HostAttribute> {
        let chain = if inherited {
            self.ancestry()
        } else {
            vec![self.clone()]
        };
        for host in chain {
            for (_, attribute) in host.attributes.iter() {
                if attribute.type_name == type_name {
                    return Some(attribute.clone());
                }
            }
        }
        None
    }

    /// Whether this type is, or derives from, the named type
    #[must_use]
    pub fn derives_from(self: &HostTypeRc, full_name: &str) -> bool {
        self.ancestry()
            .iter()
            .any(|host| host.full_name() == full_name)
    }

    /// Whether this type or any of its ancestors declares the named interface.
    ///
    /// Matches against the interface's full reflection name; for instantiated
    /// generic interfaces the definition's name is consulted as well.
    #[must_use]
    pub fn implements(self: &HostTypeRc, full_name: &str) -> bool {
        if self.full_name() == full_name {
            return true;
        }
        for host in self.ancestry() {
            for (_, iface) in host.interfaces.iter() {
                if iface.full_name() == full_name {
                    return true;
                }
                if let Some(def) = &iface.generic_def {
                    if def.full_name() == full_name {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Look up a nested type by its simple name (the last `+` segment)
    #[must_use]
    pub fn nested_named(&self, simple: &str) -> Option<HostTypeRc> {
        for (_, nested) in self.nested_types.iter() {
            let last = nested.name.rsplit('+').next().unwrap_or(&nested.name);
            if last == simple {
                return Some(nested.clone());
            }
        }
        None
    }

    /// Look up a named enum constant, returning its raw value
    #[must_use]
    pub fn enum_value(&self, name: &str) -> Option<i64> {
        self.enum_values
            .iter()
            .find(|(variant, _)| variant == name)
            .map(|(_, raw)| *raw)
    }
}

impl fmt::Debug for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostType")
            .field("handle", &self.handle)
            .field("full_name", &self.full_name())
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_enum_width_signedness() {
        let signed: Vec<_> = EnumWidth::iter().filter(EnumWidth::is_signed).collect();
        assert_eq!(
            signed,
            vec![EnumWidth::I1, EnumWidth::I2, EnumWidth::I4, EnumWidth::I8]
        );
    }

    #[test]
    fn test_handle_display() {
        assert_eq!(TypeHandle::new(0x20).to_string(), "0x00000020");
    }

    #[test]
    fn test_attribute_named_arg_is_case_insensitive() {
        let attribute = HostAttribute {
            type_name: "Test.Attribute".to_string(),
            positional: vec![],
            named: vec![("MethodName".to_string(), Value::String("Parse".to_string()))],
        };
        assert_eq!(
            attribute.named_arg("methodname"),
            Some(&Value::String("Parse".to_string()))
        );
        assert!(attribute.named_arg("Other").is_none());
    }
}
