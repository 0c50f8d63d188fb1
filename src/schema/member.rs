//! Member discovery and the resolved member descriptor.
//!
//! Given a declaring type and a textual member name, discovery answers three
//! orthogonal questions in one pass: is there a plain instance property of that
//! name, is the name backed by a `<name>Property` dependency-property marker, and
//! does the declaring type expose a static attachable accessor pair
//! (`Set<name>`/`Get<name>`)? The result is an immutable [`XamlMember`] cached per
//! declaring type, so the convention scan runs once per distinct member, never per
//! access.
//!
//! Discovery never fails: malformed or partially declared accessor pairs are
//! silently treated as "not found" so speculative lookups against malformed markup
//! stay cheap. Writing through a member that was resolved as read-only is a caller
//! contract violation and fails with
//! [`ReadOnlyMemberWrite`](crate::Error::ReadOnlyMemberWrite).

use std::sync::{Arc, Weak};

use crate::host::{HostMethod, HostProperty, HostTypeRc, Value};
use crate::schema::context::XamlSchemaContext;
use crate::schema::known::KnownStrings;
use crate::schema::xamltype::{XamlType, XamlTypeRc};
use crate::{Error, Result};

/// Reference to a resolved `XamlMember`
pub type XamlMemberRc = Arc<XamlMember>;

/// One resolvable property, instance or attachable.
pub struct XamlMember {
    name: String,
    declaring_name: String,
    declaring: Weak<XamlType>,
    value_type: XamlTypeRc,
    target_type: Option<XamlTypeRc>,
    is_attachable: bool,
    is_dependency_property: bool,
    is_read_only: bool,
    plain: Option<Arc<HostProperty>>,
    getter: Option<Arc<HostMethod>>,
    setter: Option<Arc<HostMethod>>,
}

impl XamlMember {
    /// The member name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declaring type, if its descriptor is still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<XamlTypeRc> {
        self.declaring.upgrade()
    }

    /// The type of values this member holds
    #[must_use]
    pub fn value_type(&self) -> &XamlTypeRc {
        &self.value_type
    }

    /// For attachable members, the type instances must be to accept this member
    #[must_use]
    pub fn target_type(&self) -> Option<&XamlTypeRc> {
        self.target_type.as_ref()
    }

    /// Whether the member was discovered through the attachable accessor convention
    #[must_use]
    pub fn is_attachable(&self) -> bool {
        self.is_attachable
    }

    /// Whether a `<name>Property` dependency-property marker was found.
    ///
    /// Orthogonal to the plain-property and attachable classifications; a regular
    /// property may well be backed by a dependency property.
    #[must_use]
    pub fn is_dependency_property(&self) -> bool {
        self.is_dependency_property
    }

    /// Whether no usable setter was discovered
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.is_read_only
    }

    /// Read this member's value from an instance.
    ///
    /// # Errors
    /// Returns [`Error::InvalidTarget`] if `instance` is not an object, or
    /// [`Error::MethodNotInvokable`] for a write-only attachable member.
    pub fn get(&self, instance: &Value) -> Result<Value> {
        if self.plain.is_some() {
            let target = instance
                .as_instance()
                .ok_or_else(|| Error::InvalidTarget(format!("get of '{}'", self.name)))?;
            return Ok(target
                .properties
                .get(&self.name)
                .map(|entry| entry.clone())
                .unwrap_or_default());
        }
        match &self.getter {
            Some(getter) => getter.invoke(&self.declaring_name, &[instance.clone()]),
            None => Err(Error::MethodNotInvokable {
                type_name: self.declaring_name.clone(),
                method: format!("{}{}", KnownStrings::GET_PREFIX, self.name),
            }),
        }
    }

    /// Write a value through this member.
    ///
    /// # Errors
    /// Returns [`Error::ReadOnlyMemberWrite`] if the member was resolved as
    /// read-only; the caller had `is_read_only` available and chose not to check.
    pub fn set(&self, instance: &Value, value: Value) -> Result<()> {
        if self.is_read_only {
            return Err(Error::ReadOnlyMemberWrite {
                type_name: self.declaring_name.clone(),
                member: self.name.clone(),
            });
        }
        if let Some(plain) = &self.plain {
            if plain.has_setter {
                let target = instance
                    .as_instance()
                    .ok_or_else(|| Error::InvalidTarget(format!("set of '{}'", self.name)))?;
                target.properties.insert(self.name.clone(), value);
                return Ok(());
            }
        }
        match &self.setter {
            Some(setter) => {
                setter.invoke(&self.declaring_name, &[instance.clone(), value])?;
                Ok(())
            }
            // Unreachable while the read-only invariant holds; keep the contract
            // error rather than panicking if it ever breaks.
            None => Err(Error::ReadOnlyMemberWrite {
                type_name: self.declaring_name.clone(),
                member: self.name.clone(),
            }),
        }
    }
}

impl std::fmt::Debug for XamlMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XamlMember")
            .field("name", &self.name)
            .field("declaring", &self.declaring_name)
            .field("is_attachable", &self.is_attachable)
            .field("is_read_only", &self.is_read_only)
            .finish_non_exhaustive()
    }
}

/// `true` when the method matches the attachable setter shape for `name`:
/// static, public, arity 2, no generic parameter leaking into the signature.
fn is_attachable_setter(method: &HostMethod, name: &str) -> bool {
    method.name.strip_prefix(KnownStrings::SET_PREFIX) == Some(name)
        && method.params.len() == 2
        && method.params.iter().all(|param| param.generic_param.is_none())
}

/// `true` when the method matches the attachable getter shape for `name`:
/// static, public, arity 1, non-void return.
fn is_attachable_getter(method: &HostMethod, name: &str) -> bool {
    method.name.strip_prefix(KnownStrings::GET_PREFIX) == Some(name)
        && method.params.len() == 1
        && method.return_type.is_some()
        && method.params.iter().all(|param| param.generic_param.is_none())
        && method
            .return_type
            .as_ref()
            .map_or(true, |ret| ret.generic_param.is_none())
}

/// Discover a member on `declaring` by name.
///
/// Returns `None` for every "not found" shape, including accessor pairs with the
/// wrong arity and names for which no value type could be determined.
pub(crate) fn resolve_member(
    context: &Arc<XamlSchemaContext>,
    declaring: &XamlTypeRc,
    name: &str,
) -> Option<XamlMemberRc> {
    let host = declaring.host()?;

    let plain = host.find_property(name);

    let marker = format!("{name}{}", KnownStrings::PROPERTY_SUFFIX);
    let is_dependency_property =
        host.find_static_field(&marker).is_some() || host.find_static_property(&marker).is_some();

    let mut getter: Option<Arc<HostMethod>> = None;
    let mut setter: Option<Arc<HostMethod>> = None;
    for method in host.public_static_methods() {
        if setter.is_none() && is_attachable_setter(&method, name) {
            setter = Some(method.clone());
        } else if getter.is_none() && is_attachable_getter(&method, name) {
            getter = Some(method.clone());
        }
        if getter.is_some() && setter.is_some() {
            break;
        }
    }
    let is_attachable = getter.is_some() || setter.is_some();

    let value_host: HostTypeRc = match &plain {
        Some(plain) => plain.property_type.clone(),
        None => match (&setter, &getter) {
            (Some(setter), _) => setter.params.get(1)?.clone(),
            (None, Some(getter)) => getter.return_type.clone()?,
            (None, None) => return None,
        },
    };

    // Getter is ground truth for the target type when both accessors exist.
    let target_host: Option<HostTypeRc> = if is_attachable {
        match (&getter, &setter) {
            (Some(getter), _) => getter.params.first().cloned(),
            (None, Some(setter)) => setter.params.first().cloned(),
            (None, None) => None,
        }
    } else {
        None
    };

    let value_type = context.resolve(value_host.handle)?;
    let target_type = match target_host {
        Some(target) => Some(context.resolve(target.handle)?),
        None => None,
    };

    let has_any_setter = plain.as_ref().is_some_and(|p| p.has_setter) || setter.is_some();

    Some(Arc::new(XamlMember {
        name: name.to_string(),
        declaring_name: declaring.full_name().to_string(),
        declaring: Arc::downgrade(declaring),
        value_type,
        target_type,
        is_attachable,
        is_dependency_property,
        is_read_only: !has_any_setter,
        plain,
        getter,
        setter,
    }))
}

/// Enumerate the names of every attachable member discoverable on `host`,
/// in first-seen order.
pub(crate) fn attachable_member_names(host: &HostTypeRc) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for method in host.public_static_methods() {
        let candidate = if method.params.len() == 2 {
            method.name.strip_prefix(KnownStrings::SET_PREFIX)
        } else if method.params.len() == 1 && method.return_type.is_some() {
            method.name.strip_prefix(KnownStrings::GET_PREFIX)
        } else {
            None
        };
        if let Some(candidate) = candidate {
            if !candidate.is_empty() && !names.iter().any(|existing| existing == candidate) {
                names.push(candidate.to_string());
            }
        }
    }
    names
}
