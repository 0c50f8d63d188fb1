//! Type-name normalization between the compiler and host reflection conventions.
//!
//! Two textual conventions coexist: the host reflection surface renders generic
//! arguments in bracket syntax (`` System.Nullable`1[System.Boolean] ``) and spells
//! primitives under `System`, while the compiler-facing canonical form uses angle
//! brackets with the open-generic arity suffix stripped (`Nullable<Boolean>`) and the
//! standard primitive spellings. The transforms here are pure and total: names not
//! covered by the alias table pass through unchanged, and nothing in this module can
//! fail.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::host::HostType;

/// The fixed primitive alias table: `(standard, reflection)` spellings.
///
/// Lookup misses pass through unchanged, so the table only needs the names the two
/// conventions actually disagree on plus the common primitive set.
const ALIASES: &[(&str, &str)] = &[
    ("Object", "System.Object"),
    ("String", "System.String"),
    ("Boolean", "System.Boolean"),
    ("Char16", "System.Char"),
    ("Int8", "System.SByte"),
    ("UInt8", "System.Byte"),
    ("Int16", "System.Int16"),
    ("UInt16", "System.UInt16"),
    ("Int32", "System.Int32"),
    ("UInt32", "System.UInt32"),
    ("Int64", "System.Int64"),
    ("UInt64", "System.UInt64"),
    ("Single", "System.Single"),
    ("Double", "System.Double"),
    ("Guid", "System.Guid"),
    ("TimeSpan", "System.TimeSpan"),
    ("DateTime", "System.DateTimeOffset"),
    ("Uri", "System.Uri"),
    ("Void", "System.Void"),
];

fn standard_by_reflection() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        ALIASES
            .iter()
            .map(|(standard, reflection)| (*reflection, *standard))
            .collect()
    })
}

fn reflection_by_standard() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| ALIASES.iter().copied().collect())
}

/// Replace the host reflection generic-argument delimiters with compiler delimiters.
///
/// No validation is performed; well-formed input is assumed.
#[must_use]
pub fn to_compiler_syntax(reflection_name: &str) -> String {
    reflection_name.replace('[', "<").replace(']', ">")
}

/// Map a reflection-style name to its standard spelling, passing unknown names
/// through unchanged.
#[must_use]
pub fn standard_name(name: &str) -> String {
    standard_by_reflection()
        .get(name)
        .map_or_else(|| name.to_string(), |standard| (*standard).to_string())
}

/// Map a standard spelling to its reflection-style name, passing unknown names
/// through unchanged.
#[must_use]
pub fn csharp_style_name(name: &str) -> String {
    reflection_by_standard()
        .get(name)
        .map_or_else(|| name.to_string(), |reflection| (*reflection).to_string())
}

/// Strip the `` `N `` open-generic arity suffix from a name
#[must_use]
pub fn strip_arity(name: &str) -> &str {
    name.split('`').next().unwrap_or(name)
}

/// Render the canonical (compiler-facing) full name of a host type.
///
/// Generic instantiations recurse over their arguments, joining with compiler
/// delimiters after stripping the definition's arity suffix; arrays render with a
/// `[]` suffix over the element's canonical name; everything else is the
/// standard-spelled reflection name.
#[must_use]
pub fn canonical_full_name(host: &HostType) -> String {
    if let Some(element) = &host.element_type {
        return format!("{}[]", canonical_full_name(element));
    }
    if let Some(def) = &host.generic_def {
        let definition = standard_name(&def.full_name());
        let args = host
            .generic_args
            .iter()
            .map(|arg| canonical_full_name(arg))
            .collect::<Vec<_>>()
            .join(", ");
        return format!("{}<{}>", strip_arity(&definition), args);
    }
    standard_name(&host.full_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_syntax_delimiters() {
        assert_eq!(
            to_compiler_syntax("System.Nullable`1[System.Boolean]"),
            "System.Nullable`1<System.Boolean>"
        );
        assert_eq!(to_compiler_syntax("Plain.Name"), "Plain.Name");
    }

    #[test]
    fn test_alias_round_trip_is_idempotent() {
        for (standard, reflection) in ALIASES {
            let once = standard_name(reflection);
            assert_eq!(once, *standard);
            let thrice = standard_name(&csharp_style_name(&standard_name(reflection)));
            assert_eq!(thrice, once);
        }
    }

    #[test]
    fn test_unknown_names_pass_through() {
        assert_eq!(standard_name("App.Widget"), "App.Widget");
        assert_eq!(csharp_style_name("App.Widget"), "App.Widget");
    }

    #[test]
    fn test_strip_arity() {
        assert_eq!(strip_arity("System.Nullable`1"), "System.Nullable");
        assert_eq!(strip_arity("Plain"), "Plain");
    }
}
