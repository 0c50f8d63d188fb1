//! The resolved type descriptor.
//!
//! [`XamlType`] wraps one host type behind a uniform descriptor: canonical full name,
//! base type, collection/dictionary/array classification with item and key types,
//! constructibility, markup-extension-ness, bindability, boxed-type unwrapping, enum
//! parsing and string-to-value construction. Classification flags are computed once
//! at construction; everything that needs further resolution (base, boxed type,
//! content property, the create-from-string method, the enum width) is computed
//! lazily and cached on the descriptor.
//!
//! Descriptors are only ever created by the schema context, which guarantees one
//! descriptor per distinct host type. Downstream code relies on that and compares
//! descriptors by reference.

use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;

use crate::host::{
    EnumWidth, HostMethod, HostTypeRc, HostTypeRef, TypeHandle, Value,
};
use crate::schema::context::{SchemaDiagnostic, XamlSchemaContext};
use crate::schema::known::{KnownMembers, KnownStrings, KnownTypes};
use crate::schema::member::{self, XamlMemberRc};
use crate::schema::naming;
use crate::{Error, Result};

/// Reference to a resolved `XamlType`
pub type XamlTypeRc = Arc<XamlType>;

/// Collection classification of a type; at most one of the non-`None` kinds applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    /// Not a collection shape
    None,
    /// Accepts items through a 1-arity add operation
    Collection,
    /// Accepts keyed entries through a 2-arity add operation
    Dictionary,
    /// Array over an element type
    Array,
}

/// Deprecation metadata read from the host type's attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deprecation {
    /// Human-readable deprecation message
    pub message: String,
    /// Whether the deprecation is hard (use is an error, not a warning)
    pub hard: bool,
}

/// One resolvable type.
pub struct XamlType {
    full_name: String,
    handle: TypeHandle,
    host: HostTypeRef,
    context: Weak<XamlSchemaContext>,
    collection_kind: CollectionKind,
    add_method: Option<Arc<HostMethod>>,
    is_markup_extension: bool,
    is_bindable: bool,
    is_constructible: bool,
    item_type: OnceLock<Option<XamlTypeRc>>,
    key_type: OnceLock<Option<XamlTypeRc>>,
    base_type: OnceLock<Option<XamlTypeRc>>,
    boxed_type: OnceLock<Option<XamlTypeRc>>,
    content_property: OnceLock<Option<XamlMemberRc>>,
    create_method: OnceLock<Option<Arc<HostMethod>>>,
    enum_width: OnceLock<EnumWidth>,
    members: DashMap<String, Option<XamlMemberRc>>,
    deprecation: OnceLock<Option<Deprecation>>,
    experimental: OnceLock<bool>,
}

/// Result of the one-shot construction pass, carrying the host-side item/key types
/// the context must resolve eagerly right after inserting the descriptor.
pub(crate) struct BuiltType {
    pub descriptor: XamlTypeRc,
    pub item_host: Option<HostTypeRc>,
    pub key_host: Option<HostTypeRc>,
}

impl XamlType {
    /// Construct the descriptor for `host`. Only the schema context calls this,
    /// under its build lock; the forced class-initializer run happens here so
    /// dependency-property marker fields exist before any member lookup.
    pub(crate) fn build(context: &Arc<XamlSchemaContext>, host: &HostTypeRc) -> BuiltType {
        host.run_class_initializer();

        let full_name = naming::canonical_full_name(host);
        let (collection_kind, add_method, item_host, key_host) = classify(context, host);

        let is_markup_extension = host.derives_from(KnownTypes::MARKUP_EXTENSION);
        let is_bindable = host
            .find_attribute(KnownTypes::BINDABLE_ATTRIBUTE, false)
            .is_some();
        let is_constructible = host
            .constructors
            .iter()
            .any(|(_, ctor)| ctor.params.is_empty());

        log::trace!("built descriptor for '{full_name}' ({:?})", collection_kind);

        let descriptor = Arc::new(XamlType {
            full_name,
            handle: host.handle,
            host: HostTypeRef::new(host),
            context: Arc::downgrade(context),
            collection_kind,
            add_method,
            is_markup_extension,
            is_bindable,
            is_constructible,
            item_type: OnceLock::new(),
            key_type: OnceLock::new(),
            base_type: OnceLock::new(),
            boxed_type: OnceLock::new(),
            content_property: OnceLock::new(),
            create_method: OnceLock::new(),
            enum_width: OnceLock::new(),
            members: DashMap::new(),
            deprecation: OnceLock::new(),
            experimental: OnceLock::new(),
        });

        BuiltType {
            descriptor,
            item_host,
            key_host,
        }
    }

    pub(crate) fn seal_item_types(&self, item: Option<XamlTypeRc>, key: Option<XamlTypeRc>) {
        let _ = self.item_type.set(item);
        let _ = self.key_type.set(key);
    }

    /// The canonical, compiler-facing full name
    #[must_use]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The handle of the underlying host type
    #[must_use]
    pub fn handle(&self) -> TypeHandle {
        self.handle
    }

    /// The underlying host type, if the host runtime still owns it
    #[must_use]
    pub fn host(&self) -> Option<HostTypeRc> {
        self.host.upgrade()
    }

    fn context(&self) -> Option<Arc<XamlSchemaContext>> {
        self.context.upgrade()
    }

    /// The collection classification computed at construction
    #[must_use]
    pub fn collection_kind(&self) -> CollectionKind {
        self.collection_kind
    }

    /// `true` when classified as a collection
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.collection_kind == CollectionKind::Collection
    }

    /// `true` when classified as a dictionary
    #[must_use]
    pub fn is_dictionary(&self) -> bool {
        self.collection_kind == CollectionKind::Dictionary
    }

    /// `true` when the host type is an array
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.collection_kind == CollectionKind::Array
    }

    /// `true` when the host type derives from the markup-extension root
    #[must_use]
    pub fn is_markup_extension(&self) -> bool {
        self.is_markup_extension
    }

    /// `true` when the declarative bindable marker is present
    #[must_use]
    pub fn is_bindable(&self) -> bool {
        self.is_bindable
    }

    /// `true` when a public zero-argument constructor exists
    #[must_use]
    pub fn is_constructible(&self) -> bool {
        self.is_constructible
    }

    /// `true` when the host type is an enum
    #[must_use]
    pub fn is_enum(&self) -> bool {
        self.host().map_or(false, |host| host.is_enum())
    }

    /// Names of the declared enum constants, `None` for non-enums
    #[must_use]
    pub fn enum_names(&self) -> Option<Vec<String>> {
        let host = self.host()?;
        if !host.is_enum() {
            return None;
        }
        Some(
            host.enum_values
                .iter()
                .map(|(name, _)| name.clone())
                .collect(),
        )
    }

    /// Types the markup compiler cannot emit code against: the signed-char
    /// primitive and the opaque enum base.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.host().map_or(false, |host| {
            let name = host.full_name();
            name == KnownTypes::SBYTE || name == KnownTypes::INT8 || name == KnownTypes::ENUM_BASE
        })
    }

    /// The name of the cached add operation, for collection and dictionary types
    #[must_use]
    pub fn add_method_name(&self) -> Option<&str> {
        if self.is_collection() || self.is_dictionary() {
            return Some(
                self.add_method
                    .as_ref()
                    .map_or(KnownMembers::ADD, |method| method.name.as_str()),
            );
        }
        None
    }

    /// The item type of a collection or dictionary, resolved at construction
    #[must_use]
    pub fn item_type(&self) -> Option<XamlTypeRc> {
        self.item_type.get().cloned().flatten()
    }

    /// The key type of a dictionary, resolved at construction
    #[must_use]
    pub fn key_type(&self) -> Option<XamlTypeRc> {
        self.key_type.get().cloned().flatten()
    }

    /// The base type descriptor.
    ///
    /// An absent base, or a base equal to one of the opaque native-interop
    /// sentinels, reads as `Object`. Only `Object` itself has no base.
    #[must_use]
    pub fn base_type(&self) -> Option<XamlTypeRc> {
        self.base_type.get_or_init(|| self.compute_base()).clone()
    }

    fn compute_base(&self) -> Option<XamlTypeRc> {
        let host = self.host()?;
        if host.full_name() == KnownTypes::OBJECT {
            return None;
        }
        let context = self.context()?;
        let object = context.universe().core().object.clone();
        let base = match host.base() {
            Some(base) => {
                let name = base.full_name();
                if name == KnownTypes::COM_OBJECT || name == KnownTypes::RUNTIME_CLASS {
                    object
                } else {
                    base
                }
            }
            None => object,
        };
        context.resolve(base.handle)
    }

    /// The unwrapped type when this descriptor is a nullable/reference wrapper.
    #[must_use]
    pub fn boxed_type(&self) -> Option<XamlTypeRc> {
        self.boxed_type.get_or_init(|| self.compute_boxed()).clone()
    }

    fn compute_boxed(&self) -> Option<XamlTypeRc> {
        let nullable_prefix = format!("{}<", KnownTypes::NULLABLE);
        let reference_prefix = format!("{}<", KnownTypes::IREFERENCE);
        if !self.full_name.starts_with(&nullable_prefix)
            && !self.full_name.starts_with(&reference_prefix)
        {
            return None;
        }
        let host = self.host()?;
        let inner = host.generic_args.first()?;
        self.context()?.resolve(inner.handle)
    }

    /// The member pointed to by the declarative content-property annotation
    #[must_use]
    pub fn content_property(self: &Arc<Self>) -> Option<XamlMemberRc> {
        self.content_property
            .get_or_init(|| {
                let host = self.host()?;
                let attribute =
                    host.find_attribute(KnownTypes::CONTENT_PROPERTY_ATTRIBUTE, true)?;
                let name = attribute.named_arg(KnownMembers::NAME)?.as_str()?.to_string();
                self.get_member(&name)
            })
            .clone()
    }

    /// Resolve a member by name, caching hits and misses per descriptor.
    #[must_use]
    pub fn get_member(self: &Arc<Self>, name: &str) -> Option<XamlMemberRc> {
        if let Some(cached) = self.members.get(name) {
            return cached.clone();
        }
        let context = self.context()?;
        let resolved = member::resolve_member(&context, self, name);
        self.members
            .entry(name.to_string())
            .or_insert_with(|| resolved)
            .clone()
    }

    /// Whether a member with this name resolves on this type
    #[must_use]
    pub fn has_member(self: &Arc<Self>, name: &str) -> bool {
        self.get_member(name).is_some()
    }

    /// Resolve every attachable member discoverable through the static accessor
    /// convention, in first-seen order.
    #[must_use]
    pub fn attachable_members(self: &Arc<Self>) -> Vec<XamlMemberRc> {
        let Some(host) = self.host() else {
            return Vec::new();
        };
        member::attachable_member_names(&host)
            .iter()
            .filter_map(|name| self.get_member(name))
            .filter(|resolved| resolved.is_attachable())
            .collect()
    }

    /// Whether the host type or one of its ancestors declares the named interface
    #[must_use]
    pub fn implements(&self, full_name: &str) -> bool {
        self.host()
            .map_or(false, |host| host.implements(full_name))
    }

    /// Deprecation metadata, if the host type carries a deprecation attribute
    #[must_use]
    pub fn deprecation(&self) -> Option<Deprecation> {
        self.deprecation
            .get_or_init(|| self.compute_deprecation())
            .clone()
    }

    fn compute_deprecation(&self) -> Option<Deprecation> {
        let host = self.host()?;
        if let Some(attribute) = host.find_attribute(KnownTypes::DEPRECATED_ATTRIBUTE, true) {
            let message = attribute
                .positional_arg(0)
                .and_then(Value::as_str)
                .filter(|message| !message.trim().is_empty())
                .unwrap_or(KnownStrings::DEPRECATED_DEFAULT_MESSAGE)
                .to_string();
            let hard = attribute
                .positional_arg(1)
                .and_then(Value::as_i64)
                .map_or(false, |level| level != 0);
            return Some(Deprecation { message, hard });
        }
        let attribute = host.find_attribute(KnownTypes::OBSOLETE_ATTRIBUTE, true)?;
        let message = attribute
            .positional_arg(0)
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(KnownStrings::DEPRECATED_DEFAULT_MESSAGE)
            .to_string();
        Some(Deprecation {
            message,
            hard: false,
        })
    }

    /// `true` when a deprecation attribute is present
    #[must_use]
    pub fn is_deprecated(&self) -> bool {
        self.deprecation().is_some()
    }

    /// `true` when the deprecation level marks use as an error
    #[must_use]
    pub fn is_hard_deprecated(&self) -> bool {
        self.deprecation().map_or(false, |deprecation| deprecation.hard)
    }

    /// `true` when the experimental marker attribute is present
    #[must_use]
    pub fn is_experimental(&self) -> bool {
        *self.experimental.get_or_init(|| {
            self.host().map_or(false, |host| {
                host.find_attribute(KnownTypes::EXPERIMENTAL_ATTRIBUTE, true)
                    .is_some()
            })
        })
    }

    /// The enum's underlying width, defaulting defensively to 32-bit signed
    fn enum_width(&self) -> EnumWidth {
        *self.enum_width.get_or_init(|| {
            self.host()
                .and_then(|host| host.enum_width)
                .unwrap_or(EnumWidth::I4)
        })
    }

    /// Invoke the default constructor.
    ///
    /// # Errors
    /// Returns [`Error::NotConstructible`] when no public zero-argument constructor
    /// exists; callers are expected to check `is_constructible` first.
    pub fn activate(&self) -> Result<Value> {
        if !self.is_constructible {
            return Err(Error::NotConstructible(self.full_name.clone()));
        }
        let host = self
            .host()
            .ok_or_else(|| internal_error!("host type dropped for '{}'", self.full_name))?;
        for (_, ctor) in host.constructors.iter() {
            if ctor.params.is_empty() {
                return match &ctor.body {
                    Some(body) => body(&[]),
                    None => Err(Error::MethodNotInvokable {
                        type_name: self.full_name.clone(),
                        method: ".ctor".to_string(),
                    }),
                };
            }
        }
        Err(Error::NotConstructible(self.full_name.clone()))
    }

    /// Append an item through the cached add operation.
    ///
    /// # Errors
    /// Returns [`Error::NotACollection`] when this type was never classified as a
    /// collection.
    pub fn add_item(&self, instance: &Value, value: Value) -> Result<()> {
        if !self.is_collection() {
            return Err(Error::NotACollection(self.full_name.clone()));
        }
        let method = self
            .add_method
            .as_ref()
            .ok_or_else(|| internal_error!("collection '{}' lost its add method", self.full_name))?;
        method.invoke(&self.full_name, &[instance.clone(), value])?;
        Ok(())
    }

    /// Append a keyed entry through the cached add operation.
    ///
    /// # Errors
    /// Returns [`Error::NotADictionary`] when this type was never classified as a
    /// dictionary.
    pub fn add_entry(&self, instance: &Value, key: Value, value: Value) -> Result<()> {
        if !self.is_dictionary() {
            return Err(Error::NotADictionary(self.full_name.clone()));
        }
        let method = self
            .add_method
            .as_ref()
            .ok_or_else(|| internal_error!("dictionary '{}' lost its add method", self.full_name))?;
        method.invoke(&self.full_name, &[instance.clone(), key, value])?;
        Ok(())
    }

    /// Parse a textual literal into an instance of this type.
    ///
    /// Boxed wrappers parse through their unwrapped type and box the result; types
    /// with a create-from-string annotation invoke the named method; enums parse as
    /// comma-delimited flag sets. Everything else has no parse path.
    ///
    /// # Errors
    /// Returns [`Error::NoStringConversion`] when no parse path exists or a segment
    /// fails to parse, and [`Error::NoBoxingConstructor`] when a wrapper lacks a
    /// suitable one-argument constructor.
    pub fn create_from_string(self: &Arc<Self>, text: &str) -> Result<Value> {
        if let Some(inner) = self.boxed_type() {
            let value = inner.create_from_string(text)?;
            return self.box_value(&inner, value);
        }

        if let Some(method) = self.create_method(self) {
            return method.invoke(&self.full_name, &[Value::String(text.to_string())]);
        }

        let host = self
            .host()
            .ok_or_else(|| internal_error!("host type dropped for '{}'", self.full_name))?;
        if host.is_enum() {
            return self.parse_enum_flags(&host, text);
        }

        Err(Error::NoStringConversion {
            type_name: self.full_name.clone(),
            value: text.to_string(),
        })
    }

    /// Box a parsed inner value by invoking the wrapper constructor whose single
    /// parameter matches the unwrapped type.
    fn box_value(&self, inner: &XamlTypeRc, value: Value) -> Result<Value> {
        let host = self
            .host()
            .ok_or_else(|| internal_error!("host type dropped for '{}'", self.full_name))?;
        for (_, ctor) in host.constructors.iter() {
            if ctor.params.len() == 1 && ctor.params[0].handle == inner.handle() {
                return match &ctor.body {
                    Some(body) => body(&[value]),
                    None => Err(Error::MethodNotInvokable {
                        type_name: self.full_name.clone(),
                        method: ".ctor".to_string(),
                    }),
                };
            }
        }
        Err(Error::NoBoxingConstructor(self.full_name.clone()))
    }

    /// The method named by the create-from-string annotation, resolved once.
    ///
    /// Supports plain names (a method on this type), dotted qualification and the
    /// `+`-delimited nested-class grammar. An annotation that fails to resolve
    /// reads as "no method", leaving the remaining parse paths to run.
    fn create_method(&self, this: &Arc<Self>) -> Option<Arc<HostMethod>> {
        self.create_method
            .get_or_init(|| this.resolve_create_method())
            .clone()
    }

    fn resolve_create_method(self: &Arc<Self>) -> Option<Arc<HostMethod>> {
        let host = self.host()?;
        let attribute = host.find_attribute(KnownTypes::CREATE_FROM_STRING_ATTRIBUTE, false)?;
        let name = attribute
            .named_arg(KnownMembers::METHOD_NAME)?
            .as_str()?
            .to_string();

        let (declaring, method_name) = match name.rfind('.') {
            None => (host, name),
            Some(split) => {
                let declaring = self.resolve_host_by_path(&name[..split])?;
                (declaring, name[split + 1..].to_string())
            }
        };
        if method_name.is_empty() {
            return None;
        }

        declaring
            .public_static_methods()
            .into_iter()
            .find(|candidate| {
                candidate.name.eq_ignore_ascii_case(&method_name)
                    && candidate.params.len() == 1
                    && candidate.params[0].full_name() == KnownTypes::STRING
            })
    }

    /// Resolve a possibly `+`-qualified type path: the head segment goes through
    /// ordinary name resolution, the remaining segments walk nested types.
    fn resolve_host_by_path(&self, path: &str) -> Option<HostTypeRc> {
        let context = self.context()?;
        let mut segments = path.split('+');
        let head = segments.next()?;
        let head_type = context.resolve_name(head).ok().flatten()?;
        let mut host = head_type.host()?;
        for segment in segments {
            host = host.nested_named(segment)?;
        }
        Some(host)
    }

    /// Parse a possibly comma-delimited set of flag names, accumulating through a
    /// 64-bit path matching the enum's signedness, then narrowing to the declared
    /// width.
    fn parse_enum_flags(&self, host: &HostTypeRc, text: &str) -> Result<Value> {
        let width = self.enum_width();
        let mut signed: i64 = 0;
        let mut unsigned: u64 = 0;

        for segment in text.split(',') {
            let segment = segment.trim();
            let raw = host
                .enum_value(segment)
                .ok_or_else(|| Error::NoStringConversion {
                    type_name: self.full_name.clone(),
                    value: segment.to_string(),
                })?;
            if width.is_signed() {
                signed |= raw;
            } else {
                unsigned |= raw as u64;
            }
        }

        Ok(match width {
            EnumWidth::I1 => Value::I1(signed as i8),
            EnumWidth::I2 => Value::I2(signed as i16),
            EnumWidth::I4 => Value::I4(signed as i32),
            EnumWidth::I8 => Value::I8(signed),
            EnumWidth::U1 => Value::U1(unsigned as u8),
            EnumWidth::U2 => Value::U2(unsigned as u16),
            EnumWidth::U4 => Value::U4(unsigned as u32),
            EnumWidth::U8 => Value::U8(unsigned),
        })
    }
}

impl std::fmt::Debug for XamlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XamlType")
            .field("full_name", &self.full_name)
            .field("handle", &self.handle)
            .field("collection_kind", &self.collection_kind)
            .finish_non_exhaustive()
    }
}

/// Kind, add-method name and arity of one matched collection interface shape
struct InterfaceShape {
    kind: CollectionKind,
    add_name: &'static str,
    arity: usize,
    item_args: Option<(Option<HostTypeRc>, Option<HostTypeRc>)>,
}

/// Match one candidate interface against the well-known collection shapes.
/// Dictionaries are matched by the caller before collections.
fn match_interface(candidate: &HostTypeRc, dictionaries: bool) -> Option<InterfaceShape> {
    let (def_name, args) = match &candidate.generic_def {
        Some(def) => (def.full_name(), Some(&candidate.generic_args)),
        None => (candidate.full_name(), None),
    };

    let generic_item = |position: usize| {
        args.and_then(|args| args.get(position).cloned())
    };

    if dictionaries {
        return match def_name.as_str() {
            KnownTypes::IDICTIONARY_GENERIC => Some(InterfaceShape {
                kind: CollectionKind::Dictionary,
                add_name: KnownMembers::ADD,
                arity: 2,
                item_args: Some((generic_item(0), generic_item(1))),
            }),
            KnownTypes::IMAP => Some(InterfaceShape {
                kind: CollectionKind::Dictionary,
                add_name: KnownMembers::INSERT,
                arity: 2,
                item_args: Some((generic_item(0), generic_item(1))),
            }),
            KnownTypes::IDICTIONARY => Some(InterfaceShape {
                kind: CollectionKind::Dictionary,
                add_name: KnownMembers::ADD,
                arity: 2,
                item_args: None,
            }),
            _ => None,
        };
    }

    match def_name.as_str() {
        KnownTypes::ICOLLECTION_GENERIC | KnownTypes::ILIST_GENERIC => Some(InterfaceShape {
            kind: CollectionKind::Collection,
            add_name: KnownMembers::ADD,
            arity: 1,
            item_args: Some((None, generic_item(0))),
        }),
        KnownTypes::IVECTOR => Some(InterfaceShape {
            kind: CollectionKind::Collection,
            add_name: KnownMembers::APPEND,
            arity: 1,
            item_args: Some((None, generic_item(0))),
        }),
        KnownTypes::ILIST => Some(InterfaceShape {
            kind: CollectionKind::Collection,
            add_name: KnownMembers::ADD,
            arity: 1,
            item_args: None,
        }),
        _ => None,
    }
}

/// Every interface candidate visible on `host`: the type itself when it is an
/// interface, then the declared interface closure across the inheritance chain.
fn interface_candidates(host: &HostTypeRc) -> Vec<HostTypeRc> {
    let mut candidates = Vec::new();
    if host.is_interface() {
        candidates.push(host.clone());
    }
    for ancestor in host.ancestry() {
        for (_, iface) in ancestor.interfaces.iter() {
            candidates.push(iface.clone());
        }
    }
    candidates
}

/// The one-shot collection classification waterfall.
///
/// Walks the interface candidates once looking for dictionary shapes, then
/// collection shapes; falls back to the enumerable-plus-`Add` heuristic with the
/// 2-arity check first so dictionary classification wins when both signatures are
/// simultaneously discoverable. The discovered add handle is cached on the
/// descriptor; a method declared on the concrete type wins over the interface's.
fn classify(
    context: &Arc<XamlSchemaContext>,
    host: &HostTypeRc,
) -> (
    CollectionKind,
    Option<Arc<HostMethod>>,
    Option<HostTypeRc>,
    Option<HostTypeRc>,
) {
    if host.is_array() {
        return (
            CollectionKind::Array,
            None,
            host.element_type.clone(),
            None,
        );
    }

    let candidates = interface_candidates(host);
    for dictionaries in [true, false] {
        for candidate in &candidates {
            let Some(shape) = match_interface(candidate, dictionaries) else {
                continue;
            };
            let Some(add_method) = find_add_method(context, host, candidate, &shape) else {
                continue;
            };
            let (key, item) = item_and_key(&shape, &add_method);
            return (shape.kind, Some(add_method), item, key);
        }
    }

    // No well-known interface matched; fall back to "enumerable with a public Add".
    if host.implements(KnownTypes::IENUMERABLE) || host.implements(KnownTypes::IITERABLE) {
        for (kind, arity) in [
            (CollectionKind::Dictionary, 2_usize),
            (CollectionKind::Collection, 1_usize),
        ] {
            let (found, ambiguous) = host.find_instance_method(KnownMembers::ADD, arity);
            if ambiguous {
                context.report_diagnostic(SchemaDiagnostic::AmbiguousCollectionAdd {
                    type_name: host.full_name(),
                    method: KnownMembers::ADD.to_string(),
                    arity,
                });
            }
            if let Some(add_method) = found {
                let item = add_method.params.last().cloned();
                let key = if arity == 2 {
                    add_method.params.first().cloned()
                } else {
                    None
                };
                return (kind, Some(add_method), item, key);
            }
        }
    }

    (CollectionKind::None, None, None, None)
}

/// Locate the add operation for a matched interface shape: the concrete type's own
/// declaration wins; the interface's declaration is the fallback.
fn find_add_method(
    context: &Arc<XamlSchemaContext>,
    host: &HostTypeRc,
    candidate: &HostTypeRc,
    shape: &InterfaceShape,
) -> Option<Arc<HostMethod>> {
    let (found, ambiguous) = host.find_instance_method(shape.add_name, shape.arity);
    if ambiguous {
        context.report_diagnostic(SchemaDiagnostic::AmbiguousCollectionAdd {
            type_name: host.full_name(),
            method: shape.add_name.to_string(),
            arity: shape.arity,
        });
    }
    if found.is_some() {
        return found;
    }
    let (from_interface, _) = candidate.find_instance_method(shape.add_name, shape.arity);
    from_interface
}

/// Item/key host types for a matched shape: generic interface arguments when
/// available, the add operation's parameters otherwise.
fn item_and_key(
    shape: &InterfaceShape,
    add_method: &Arc<HostMethod>,
) -> (Option<HostTypeRc>, Option<HostTypeRc>) {
    match (&shape.item_args, shape.kind) {
        (Some((key, item)), _) if item.is_some() => (key.clone(), item.clone()),
        (_, CollectionKind::Dictionary) => (
            add_method.params.first().cloned(),
            add_method.params.get(1).cloned(),
        ),
        _ => (None, add_method.params.first().cloned()),
    }
}
