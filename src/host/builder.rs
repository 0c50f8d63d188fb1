//! Fluent registration builder for host types.
//!
//! [`HostTypeBuilder`] is how an object model describes itself to the universe: a
//! chain of declarations ending in [`HostTypeBuilder::register`], which allocates the
//! handle, inserts the type into its assembly and wires up the member bodies that
//! need a reference back to the finished type (default constructors, attached
//! accessor storage, collection `Add` bodies).
//!
//! # Example
//!
//! ```rust
//! use xamlscope::host::{HostTypeBuilder, HostUniverse};
//!
//! let universe = HostUniverse::new();
//! let assembly = universe.register_assembly("App");
//! let widget = HostTypeBuilder::new(&universe, &assembly, "App.Controls", "Widget")
//!     .property("Title", &universe.core().string)
//!     .default_ctor()
//!     .register();
//! assert_eq!(widget.full_name(), "App.Controls.Widget");
//! ```

use std::sync::Arc;

use crate::host::types::{
    EnumWidth, HostAttribute, HostCtor, HostField, HostMethod, HostProperty, HostType,
    HostTypeFlags, HostTypeRc, HostTypeRef, MethodBody,
};
use crate::host::universe::{HostAssemblyRc, HostUniverse};
use crate::host::value::{Instance, Value};
use crate::schema::known::{KnownMembers, KnownStrings, KnownTypes};
use crate::Error;

type PostStep = Box<dyn FnOnce(&Arc<HostUniverse>, &HostTypeRc)>;

/// Provides a fluent API for registering host types
pub struct HostTypeBuilder {
    universe: Arc<HostUniverse>,
    assembly: HostAssemblyRc,
    namespace: String,
    name: String,
    flags: HostTypeFlags,
    base: Option<HostTypeRc>,
    generic_params: Vec<String>,
    enum_width: Option<EnumWidth>,
    enum_values: Vec<(String, i64)>,
    class_init: Option<Box<dyn Fn() + Send + Sync>>,
    interfaces: Vec<HostTypeRc>,
    properties: Vec<HostProperty>,
    fields: Vec<HostField>,
    attributes: Vec<HostAttribute>,
    methods: Vec<HostMethod>,
    ctors: Vec<HostCtor>,
    post: Vec<PostStep>,
}

impl HostTypeBuilder {
    /// Start a builder for a type in the given assembly
    #[must_use]
    pub fn new(
        universe: &Arc<HostUniverse>,
        assembly: &HostAssemblyRc,
        namespace: &str,
        name: &str,
    ) -> Self {
        HostTypeBuilder {
            universe: universe.clone(),
            assembly: assembly.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
            flags: HostTypeFlags::PUBLIC,
            base: None,
            generic_params: Vec::new(),
            enum_width: None,
            enum_values: Vec::new(),
            class_init: None,
            interfaces: Vec::new(),
            properties: Vec::new(),
            fields: Vec::new(),
            attributes: Vec::new(),
            methods: Vec::new(),
            ctors: Vec::new(),
            post: Vec::new(),
        }
    }

    /// Set the base type; defaults to `System.Object` for classes
    #[must_use]
    pub fn base(mut self, base: &HostTypeRc) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Mark the type as a value type
    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.flags |= HostTypeFlags::VALUE_TYPE;
        self
    }

    /// Mark the type as an interface (interfaces get no implicit base)
    #[must_use]
    pub fn interface(mut self) -> Self {
        self.flags |= HostTypeFlags::INTERFACE;
        self
    }

    /// Declare an implemented interface
    #[must_use]
    pub fn implements(mut self, iface: &HostTypeRc) -> Self {
        self.interfaces.push(iface.clone());
        self
    }

    /// Declare generic parameters, turning the registration into an open definition.
    /// The type name must already carry the matching `` `N `` arity suffix.
    #[must_use]
    pub fn generic_params(mut self, params: &[&str]) -> Self {
        self.generic_params = params.iter().map(|param| (*param).to_string()).collect();
        self
    }

    /// The placeholder type standing for the generic parameter at `index`
    #[must_use]
    pub fn generic_param(&self, index: usize) -> HostTypeRc {
        let name = self
            .generic_params
            .get(index)
            .map_or("T", String::as_str)
            .to_string();
        self.universe.generic_param_type(index, &name)
    }

    /// Attach a class initializer, run once before the first member lookup.
    ///
    /// Initializers must not resolve types through a schema context.
    #[must_use]
    pub fn class_initializer(mut self, init: impl Fn() + Send + Sync + 'static) -> Self {
        self.class_init = Some(Box::new(init));
        self
    }

    /// Declare a writable instance property
    #[must_use]
    pub fn property(mut self, name: &str, property_type: &HostTypeRc) -> Self {
        self.properties.push(HostProperty {
            name: name.to_string(),
            property_type: property_type.clone(),
            has_setter: true,
            is_static: false,
        });
        self
    }

    /// Declare a read-only instance property
    #[must_use]
    pub fn readonly_property(mut self, name: &str, property_type: &HostTypeRc) -> Self {
        self.properties.push(HostProperty {
            name: name.to_string(),
            property_type: property_type.clone(),
            has_setter: false,
            is_static: false,
        });
        self
    }

    /// Declare a static property
    #[must_use]
    pub fn static_property(mut self, name: &str, property_type: &HostTypeRc) -> Self {
        self.properties.push(HostProperty {
            name: name.to_string(),
            property_type: property_type.clone(),
            has_setter: true,
            is_static: true,
        });
        self
    }

    /// Declare a static field
    #[must_use]
    pub fn static_field(mut self, name: &str, field_type: &HostTypeRc) -> Self {
        self.fields.push(HostField {
            name: name.to_string(),
            field_type: field_type.clone(),
            is_static: true,
        });
        self
    }

    /// Declare the `<name>Property` dependency-property marker field
    #[must_use]
    pub fn dependency_property(self, name: &str) -> Self {
        let marker = self.universe.core().dependency_property.clone();
        let field = format!("{name}{}", KnownStrings::PROPERTY_SUFFIX);
        self.static_field(&field, &marker)
    }

    /// Attach a raw custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: HostAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Attach the content-property attribute naming `member`
    #[must_use]
    pub fn content_property(self, member: &str) -> Self {
        self.attribute(HostAttribute {
            type_name: KnownTypes::CONTENT_PROPERTY_ATTRIBUTE.to_string(),
            positional: Vec::new(),
            named: vec![(
                KnownMembers::NAME.to_string(),
                Value::String(member.to_string()),
            )],
        })
    }

    /// Attach the bindable marker attribute
    #[must_use]
    pub fn bindable(self) -> Self {
        self.attribute(HostAttribute {
            type_name: KnownTypes::BINDABLE_ATTRIBUTE.to_string(),
            positional: Vec::new(),
            named: Vec::new(),
        })
    }

    /// Attach the create-from-string attribute naming `method`
    #[must_use]
    pub fn create_from_string(self, method: &str) -> Self {
        self.attribute(HostAttribute {
            type_name: KnownTypes::CREATE_FROM_STRING_ATTRIBUTE.to_string(),
            positional: Vec::new(),
            named: vec![(
                KnownMembers::METHOD_NAME.to_string(),
                Value::String(method.to_string()),
            )],
        })
    }

    /// Attach the deprecation attribute with a message and hard level
    #[must_use]
    pub fn deprecated(self, message: &str, hard: bool) -> Self {
        self.attribute(HostAttribute {
            type_name: KnownTypes::DEPRECATED_ATTRIBUTE.to_string(),
            positional: vec![
                Value::String(message.to_string()),
                Value::I4(i32::from(hard)),
            ],
            named: Vec::new(),
        })
    }

    /// Attach the experimental marker attribute
    #[must_use]
    pub fn experimental(self) -> Self {
        self.attribute(HostAttribute {
            type_name: KnownTypes::EXPERIMENTAL_ATTRIBUTE.to_string(),
            positional: Vec::new(),
            named: Vec::new(),
        })
    }

    /// Declare a raw method
    #[must_use]
    pub fn method(mut self, method: HostMethod) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare a public static method
    #[must_use]
    pub fn static_method(
        mut self,
        name: &str,
        params: &[&HostTypeRc],
        return_type: Option<&HostTypeRc>,
        body: Option<MethodBody>,
    ) -> Self {
        self.methods.push(HostMethod {
            name: name.to_string(),
            is_static: true,
            is_public: true,
            params: params.iter().map(|param| (*param).clone()).collect(),
            return_type: return_type.cloned(),
            body,
        });
        self
    }

    /// Declare an attached property accessor pair (`Get<name>`/`Set<name>`) backed
    /// by the target instance's attached storage
    #[must_use]
    pub fn attached(self, name: &str, target: &HostTypeRc, value_type: &HostTypeRc) -> Self {
        self.attached_inner(name, target, value_type, true)
    }

    /// Declare a getter-only attached property (`Get<name>` without a setter)
    #[must_use]
    pub fn attached_readonly(
        self,
        name: &str,
        target: &HostTypeRc,
        value_type: &HostTypeRc,
    ) -> Self {
        self.attached_inner(name, target, value_type, false)
    }

    fn attached_inner(
        mut self,
        name: &str,
        target: &HostTypeRc,
        value_type: &HostTypeRc,
        with_setter: bool,
    ) -> Self {
        let owner = if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        };
        let key = format!("{owner}.{name}");

        let getter_key = key.clone();
        let getter_body: MethodBody = Arc::new(move |args| {
            let instance = args
                .first()
                .and_then(Value::as_instance)
                .ok_or_else(|| Error::InvalidTarget("attached getter target".to_string()))?;
            Ok(instance
                .attached
                .get(&getter_key)
                .map(|entry| entry.clone())
                .unwrap_or_default())
        });
        self.methods.push(HostMethod {
            name: format!("{}{name}", KnownStrings::GET_PREFIX),
            is_static: true,
            is_public: true,
            params: vec![target.clone()],
            return_type: Some(value_type.clone()),
            body: Some(getter_body),
        });

        if with_setter {
            let setter_key = key;
            let setter_body: MethodBody = Arc::new(move |args| {
                let instance = args
                    .first()
                    .and_then(Value::as_instance)
                    .ok_or_else(|| Error::InvalidTarget("attached setter target".to_string()))?;
                let value = args.get(1).cloned().unwrap_or_default();
                instance.attached.insert(setter_key.clone(), value);
                Ok(Value::Null)
            });
            self.methods.push(HostMethod {
                name: format!("{}{name}", KnownStrings::SET_PREFIX),
                is_static: true,
                is_public: true,
                params: vec![target.clone(), value_type.clone()],
                return_type: None,
                body: Some(setter_body),
            });
        }
        self
    }

    /// Declare a public zero-argument constructor producing a fresh instance
    #[must_use]
    pub fn default_ctor(mut self) -> Self {
        self.post.push(Box::new(|_, host| {
            let class = host.clone();
            let body: MethodBody =
                Arc::new(move |_args| Ok(Value::Object(Instance::new(class.clone()))));
            host.constructors.push(Arc::new(HostCtor {
                params: Vec::new(),
                body: Some(body),
            }));
        }));
        self
    }

    /// Declare a raw constructor
    #[must_use]
    pub fn ctor(mut self, params: &[&HostTypeRc], body: Option<MethodBody>) -> Self {
        self.ctors.push(HostCtor {
            params: params.iter().map(|param| (*param).clone()).collect(),
            body,
        });
        self
    }

    /// Shape the type as a collection of `item`: implements `` ICollection`1<item> ``,
    /// declares an `Add(item)` body appending to the instance item store, and gets a
    /// default constructor
    #[must_use]
    pub fn collection_of(mut self, item: &HostTypeRc) -> Self {
        let icollection = {
            let def = self.universe.core().icollection_def.clone();
            self.universe.make_generic(&def, &[item.clone()])
        };
        self.interfaces.push(icollection);
        self.methods.push(HostMethod {
            name: KnownMembers::ADD.to_string(),
            is_static: false,
            is_public: true,
            params: vec![item.clone()],
            return_type: None,
            body: Some(collection_add_body()),
        });
        self.default_ctor()
    }

    /// Shape the type as a dictionary from `key` to `value`: implements
    /// `` IDictionary`2<key, value> ``, declares an `Add(key, value)` body appending
    /// to the instance entry store, and gets a default constructor
    #[must_use]
    pub fn dictionary_of(mut self, key: &HostTypeRc, value: &HostTypeRc) -> Self {
        let idictionary = {
            let def = self.universe.core().idictionary_def.clone();
            self.universe.make_generic(&def, &[key.clone(), value.clone()])
        };
        self.interfaces.push(idictionary);
        self.methods.push(HostMethod {
            name: KnownMembers::ADD.to_string(),
            is_static: false,
            is_public: true,
            params: vec![key.clone(), value.clone()],
            return_type: None,
            body: Some(dictionary_add_body()),
        });
        self.default_ctor()
    }

    /// Shape the type as an enum with the given underlying width and named constants
    #[must_use]
    pub fn enumeration(mut self, width: EnumWidth, values: &[(&str, i64)]) -> Self {
        self.flags |= HostTypeFlags::ENUM | HostTypeFlags::VALUE_TYPE;
        self.enum_width = Some(width);
        self.enum_values = values
            .iter()
            .map(|(name, raw)| ((*name).to_string(), *raw))
            .collect();
        let enum_base = self.universe.core().enum_base.clone();
        self.base = Some(enum_base);
        self
    }

    /// Shape the type as an enum whose underlying width is not declared
    #[must_use]
    pub fn enumeration_unknown_width(mut self, values: &[(&str, i64)]) -> Self {
        self = self.enumeration(EnumWidth::I4, values);
        self.enum_width = None;
        self
    }

    /// Allocate the handle, insert the type and apply all deferred registrations.
    #[must_use]
    pub fn register(self) -> HostTypeRc {
        let mut host = HostType::new(
            self.universe.allocate_handle(),
            self.namespace,
            self.name,
            self.assembly.name.clone(),
            self.flags,
            self.class_init,
        );
        host.generic_params = self.generic_params;
        host.enum_width = self.enum_width;
        host.enum_values = self.enum_values;

        let host = self.universe.register_type(&self.assembly, host);

        let base = match self.base {
            Some(base) => Some(base),
            None if host.is_interface() || host.is_generic_definition() => None,
            None => Some(self.universe.core().object.clone()),
        };
        if let Some(base) = base {
            let _ = host.base.set(HostTypeRef::new(&base));
        }

        for iface in self.interfaces {
            host.interfaces.push(iface);
        }
        for property in self.properties {
            host.properties.push(Arc::new(property));
        }
        for field in self.fields {
            host.fields.push(Arc::new(field));
        }
        for attribute in self.attributes {
            host.attributes.push(attribute);
        }
        for method in self.methods {
            host.methods.push(Arc::new(method));
        }
        for ctor in self.ctors {
            host.constructors.push(Arc::new(ctor));
        }
        for step in self.post {
            step(&self.universe, &host);
        }
        host
    }

    /// Register this type as nested inside `parent`.
    ///
    /// The registered name becomes the `+`-joined nested path.
    #[must_use]
    pub fn register_nested(mut self, parent: &HostTypeRc) -> HostTypeRc {
        self.namespace = parent.namespace.clone();
        self.name = format!("{}+{}", parent.name, self.name);
        let host = self.register();
        parent.nested_types.push(host.clone());
        host
    }
}

fn collection_add_body() -> MethodBody {
    Arc::new(|args| {
        let instance = args
            .first()
            .and_then(Value::as_instance)
            .ok_or_else(|| Error::InvalidTarget("collection Add receiver".to_string()))?;
        let value = args.get(1).cloned().unwrap_or_default();
        let mut items = instance
            .items
            .lock()
            .map_err(|_| internal_error!("collection item store poisoned"))?;
        items.push(value);
        Ok(Value::Null)
    })
}

fn dictionary_add_body() -> MethodBody {
    Arc::new(|args| {
        let instance = args
            .first()
            .and_then(Value::as_instance)
            .ok_or_else(|| Error::InvalidTarget("dictionary Add receiver".to_string()))?;
        let key = args.get(1).cloned().unwrap_or_default();
        let value = args.get(2).cloned().unwrap_or_default();
        let mut entries = instance
            .entries
            .lock()
            .map_err(|_| internal_error!("dictionary entry store poisoned"))?;
        entries.push((key, value));
        Ok(Value::Null)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_registers_members() {
        let universe = HostUniverse::new();
        let assembly = universe.register_assembly("App");
        let widget = HostTypeBuilder::new(&universe, &assembly, "App", "Widget")
            .property("Title", &universe.core().string)
            .dependency_property("Title")
            .default_ctor()
            .register();

        assert_eq!(widget.full_name(), "App.Widget");
        assert!(widget.find_property("Title").is_some());
        assert!(widget.find_static_field("TitleProperty").is_some());
        assert_eq!(widget.constructors.count(), 1);
        assert_eq!(
            widget.base().map(|base| base.full_name()),
            Some("System.Object".to_string())
        );
        assert!(assembly.get_type("App.Widget").is_some());
    }

    #[test]
    fn test_attached_pair_round_trip() {
        let universe = HostUniverse::new();
        let assembly = universe.register_assembly("App");
        let target = HostTypeBuilder::new(&universe, &assembly, "App", "Panel")
            .default_ctor()
            .register();
        let owner = HostTypeBuilder::new(&universe, &assembly, "App", "Grid")
            .attached("Row", &target, &universe.core().boolean)
            .register();

        let instance = Instance::new(target.clone());
        let boxed = Value::Object(instance);
        let (setter, _) = {
            let mut found = None;
            for (_, method) in owner.methods.iter() {
                if method.name == "SetRow" {
                    found = Some(method.clone());
                }
            }
            (found.unwrap(), ())
        };
        setter
            .invoke("App.Grid", &[boxed.clone(), Value::Boolean(true)])
            .unwrap();
        let getter = owner
            .methods
            .iter()
            .find(|(_, method)| method.name == "GetRow")
            .map(|(_, method)| method.clone())
            .unwrap();
        assert_eq!(
            getter.invoke("App.Grid", &[boxed]).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_nested_registration() {
        let universe = HostUniverse::new();
        let assembly = universe.register_assembly("App");
        let outer = HostTypeBuilder::new(&universe, &assembly, "App", "Outer").register();
        let inner = HostTypeBuilder::new(&universe, &assembly, "App", "Inner")
            .register_nested(&outer);

        assert_eq!(inner.full_name(), "App.Outer+Inner");
        assert!(outer.nested_named("Inner").is_some());
        assert!(assembly.get_type("App.Outer+Inner").is_some());
    }
}
