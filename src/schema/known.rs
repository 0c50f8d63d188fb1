//! Well-known names consumed by the resolution core.
//!
//! Everything here is matched **by name**: attribute contracts, interface shapes and
//! naming conventions are compared textually against the host's reflection names,
//! never through compiled references.

/// Full names of well-known types and attribute contracts
#[allow(non_snake_case, missing_docs)]
pub mod KnownTypes {
    pub const OBJECT: &str = "System.Object";
    pub const STRING: &str = "System.String";
    pub const ENUM_BASE: &str = "System.Enum";
    pub const SBYTE: &str = "System.SByte";
    pub const INT8: &str = "System.Int8";

    /// Opaque interop sentinels; a base of this shape reads as `System.Object`
    pub const COM_OBJECT: &str = "System.__ComObject";
    pub const RUNTIME_CLASS: &str = "System.Runtime.InteropServices.WindowsRuntime.RuntimeClass";

    pub const MARKUP_EXTENSION: &str = "Microsoft.UI.Xaml.Markup.MarkupExtension";

    /// Boxed wrapper definitions; a full name starting with one of these (in
    /// compiler syntax) marks a boxed type
    pub const NULLABLE: &str = "System.Nullable";
    pub const IREFERENCE: &str = "Windows.Foundation.IReference";

    pub const IENUMERABLE: &str = "System.Collections.IEnumerable";
    pub const ILIST: &str = "System.Collections.IList";
    pub const IDICTIONARY: &str = "System.Collections.IDictionary";
    pub const ICOLLECTION_GENERIC: &str = "System.Collections.Generic.ICollection`1";
    pub const ILIST_GENERIC: &str = "System.Collections.Generic.IList`1";
    pub const IVECTOR: &str = "Windows.Foundation.Collections.IVector`1";
    pub const IITERABLE: &str = "Windows.Foundation.Collections.IIterable`1";
    pub const IDICTIONARY_GENERIC: &str = "System.Collections.Generic.IDictionary`2";
    pub const IMAP: &str = "Windows.Foundation.Collections.IMap`2";

    pub const CONTENT_PROPERTY_ATTRIBUTE: &str =
        "Microsoft.UI.Xaml.Markup.ContentPropertyAttribute";
    pub const BINDABLE_ATTRIBUTE: &str = "Microsoft.UI.Xaml.Data.BindableAttribute";
    pub const CREATE_FROM_STRING_ATTRIBUTE: &str =
        "Windows.Foundation.Metadata.CreateFromStringAttribute";
    pub const DEPRECATED_ATTRIBUTE: &str = "Windows.Foundation.Metadata.DeprecatedAttribute";
    pub const OBSOLETE_ATTRIBUTE: &str = "System.ObsoleteAttribute";
    pub const EXPERIMENTAL_ATTRIBUTE: &str = "Windows.Foundation.Metadata.ExperimentalAttribute";
}

/// Well-known member names
#[allow(non_snake_case, missing_docs)]
pub mod KnownMembers {
    pub const ADD: &str = "Add";
    pub const INSERT: &str = "Insert";
    pub const APPEND: &str = "Append";
    /// Named argument carrying a content-property name
    pub const NAME: &str = "Name";
    /// Named argument carrying a create-from-string method name
    pub const METHOD_NAME: &str = "MethodName";
}

/// Naming-convention fragments
#[allow(non_snake_case, missing_docs)]
pub mod KnownStrings {
    /// Prefix of attachable property getters
    pub const GET_PREFIX: &str = "Get";
    /// Prefix of attachable property setters
    pub const SET_PREFIX: &str = "Set";
    /// Suffix of dependency-property marker fields
    pub const PROPERTY_SUFFIX: &str = "Property";
    /// Fallback when a deprecation attribute carries no usable message
    pub const DEPRECATED_DEFAULT_MESSAGE: &str = "This type is deprecated";
}
