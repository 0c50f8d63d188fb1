//! Boxed runtime values and object instances for the host object model.
//!
//! The resolution core invokes host methods with boxed arguments and reads boxed results
//! back, so every value that crosses the host boundary is represented as a [`Value`].
//! [`Instance`] is the backing store for one live object: per-property storage, attached
//! property storage, and the collection/dictionary stores that registered `Add` bodies
//! append into.

use std::sync::{Arc, Mutex};

use dashmap::DashMap;

use crate::host::types::HostTypeRc;

/// Reference to a live object [`Instance`]
pub type InstanceRc = Arc<Instance>;

/// A boxed runtime value crossing the host reflection boundary.
///
/// Mirrors the eight integer widths the enum machinery distinguishes, plus the
/// usual scalar and reference shapes. Two `Object` values compare equal only when
/// they are the same instance.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent / null reference
    #[default]
    Null,
    /// Boolean value
    Boolean(bool),
    /// UTF-16 code unit
    Char(char),
    /// 8-bit signed integer
    I1(i8),
    /// 8-bit unsigned integer
    U1(u8),
    /// 16-bit signed integer
    I2(i16),
    /// 16-bit unsigned integer
    U2(u16),
    /// 32-bit signed integer
    I4(i32),
    /// 32-bit unsigned integer
    U4(u32),
    /// 64-bit signed integer
    I8(i64),
    /// 64-bit unsigned integer
    U8(u64),
    /// 32-bit floating point
    R4(f32),
    /// 64-bit floating point
    R8(f64),
    /// String value
    String(String),
    /// A live object instance
    Object(InstanceRc),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I1(a), Value::I1(b)) => a == b,
            (Value::U1(a), Value::U1(b)) => a == b,
            (Value::I2(a), Value::I2(b)) => a == b,
            (Value::U2(a), Value::U2(b)) => a == b,
            (Value::I4(a), Value::I4(b)) => a == b,
            (Value::U4(a), Value::U4(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::R4(a), Value::R4(b)) => a == b,
            (Value::R8(a), Value::R8(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// Try to read as a boolean
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to read as a 64-bit signed integer, widening smaller integer shapes
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I1(value) => Some(i64::from(*value)),
            Value::U1(value) => Some(i64::from(*value)),
            Value::I2(value) => Some(i64::from(*value)),
            Value::U2(value) => Some(i64::from(*value)),
            Value::I4(value) => Some(i64::from(*value)),
            Value::U4(value) => Some(i64::from(*value)),
            Value::I8(value) => Some(*value),
            Value::U8(value) => i64::try_from(*value).ok(),
            _ => None,
        }
    }

    /// Try to read as a string slice
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Try to read as an object instance
    #[must_use]
    pub fn as_instance(&self) -> Option<&InstanceRc> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    /// `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Backing store for one live object created through the host object model.
///
/// Registered method bodies manipulate this store: plain property accessors read and
/// write `properties`, attached accessor pairs use `attached` (keyed by the declaring
/// type's full name plus the member name), and collection/dictionary `Add` bodies
/// append into `items`/`entries`.
pub struct Instance {
    /// The host type this instance was activated from
    pub class: HostTypeRc,
    /// Per-property value storage, keyed by property name
    pub properties: DashMap<String, Value>,
    /// Attached property storage, keyed by `Owner.Member`
    pub attached: DashMap<String, Value>,
    /// Item store for collection types
    pub items: Mutex<Vec<Value>>,
    /// Entry store for dictionary types
    pub entries: Mutex<Vec<(Value, Value)>>,
}

impl Instance {
    /// Create a fresh instance of the given host type with empty storage
    #[must_use]
    pub fn new(class: HostTypeRc) -> InstanceRc {
        Arc::new(Instance {
            class,
            properties: DashMap::new(),
            attached: DashMap::new(),
            items: Mutex::new(Vec::new()),
            entries: Mutex::new(Vec::new()),
        })
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.full_name())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::I4(5), Value::I4(5));
        assert_ne!(Value::I4(5), Value::I8(5));
        assert_ne!(Value::I4(5), Value::Null);
        assert_eq!(Value::Null, Value::Null);
        assert_eq!(
            Value::String("abc".to_string()),
            Value::String("abc".to_string())
        );
    }

    #[test]
    fn test_integer_widening() {
        assert_eq!(Value::I1(-3).as_i64(), Some(-3));
        assert_eq!(Value::U8(u64::MAX).as_i64(), None);
        assert_eq!(Value::Boolean(true).as_i64(), None);
    }
}
