use thiserror::Error;

macro_rules! internal_error {
    // Single string version
    ($msg:expr) => {
        $crate::Error::Internal {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        $crate::Error::Internal {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// The error surface follows a strict taxonomy. Ordinary misses (a type or member that simply
/// does not exist, an unresolved segment inside a generic name) are **not** errors: every lookup
/// API models them as an absent `Option` so that speculative probes against malformed markup stay
/// cheap and silent. What remains falls into two groups:
///
/// # Contract Violations
///
/// The caller had the means to check first and chose not to. These fail loudly and are never
/// retried by this crate:
/// - [`Error::ReadOnlyMemberWrite`] - Writing through a member already known to be read-only
/// - [`Error::NotConstructible`] - Activating a type without a default constructor
/// - [`Error::NotACollection`] / [`Error::NotADictionary`] - Add-operations on a type never
///   classified as such
/// - [`Error::NoStringConversion`] - No parse path exists for a textual literal
/// - [`Error::NoBoxingConstructor`] - A wrapper type without a suitable one-argument constructor
/// - [`Error::MethodNotInvokable`] - A discovered method handle carries no invocable body
/// - [`Error::InvalidTarget`] - A value of the wrong shape passed where an object was required
///
/// # Internal Invariant Breaks
///
/// A bug in the normalizer/resolver pairing, not a caller or data problem:
/// - [`Error::MalformedTypeName`] - The generic-name scan ended with a malformed stack
/// - [`Error::NameMismatchAfterResolve`] - A freshly resolved type disagrees with the name used
///   to find it
/// - [`Error::Internal`] - Catch-all for impossible states, with source location attached
#[derive(Error, Debug)]
pub enum Error {
    /// A write was attempted through a member that was resolved as read-only.
    ///
    /// Member discovery reports `is_read_only` up front; writing anyway is a caller
    /// contract violation, not a data condition.
    #[error("Member '{member}' on '{type_name}' is read-only")]
    ReadOnlyMemberWrite {
        /// Full name of the declaring type
        type_name: String,
        /// Name of the member that was written to
        member: String,
    },

    /// `activate` was called on a type with no public zero-argument constructor.
    ///
    /// Callers are expected to consult `is_constructible` before activating.
    #[error("Type '{0}' has no default constructor")]
    NotConstructible(String),

    /// An add-item operation was invoked on a type never classified as a collection.
    #[error("Type '{0}' is not a collection")]
    NotACollection(String),

    /// An add-entry operation was invoked on a type never classified as a dictionary.
    #[error("Type '{0}' is not a dictionary")]
    NotADictionary(String),

    /// No parse path exists to turn a textual literal into an instance of this type.
    ///
    /// A type can be created from a string when it is a boxed wrapper over a parseable
    /// type, carries a create-from-string attribute, or is an enum. Anything else
    /// ends up here.
    #[error("No conversion from string '{value}' to type '{type_name}'")]
    NoStringConversion {
        /// Full name of the type that was asked to parse
        type_name: String,
        /// The literal that could not be converted
        value: String,
    },

    /// A boxed wrapper type has no one-argument constructor accepting its inner type.
    #[error("Wrapper type '{0}' has no boxing constructor")]
    NoBoxingConstructor(String),

    /// A resolved method handle has no invocable body registered with the host.
    #[error("Method '{method}' on '{type_name}' has no registered body")]
    MethodNotInvokable {
        /// Full name of the declaring type
        type_name: String,
        /// Name of the method
        method: String,
    },

    /// A value of the wrong shape was passed where an object instance was required.
    #[error("Expected an object instance, got {0}")]
    InvalidTarget(String),

    /// The generic-name construction scan finished with a malformed stack.
    ///
    /// This indicates broken input structure (unbalanced delimiters, trailing text) and is
    /// distinct from an ordinary unresolved-type miss, which propagates as an absent result.
    #[error("Malformed generic type name '{0}'")]
    MalformedTypeName(String),

    /// A freshly resolved type's canonical name disagrees with the requested name.
    ///
    /// The normalizer and the resolver are out of step; this is a bug in this crate,
    /// not in the caller's input.
    #[error("Resolved '{resolved}' for requested name '{requested}'")]
    NameMismatchAfterResolve {
        /// The name the caller asked for, post-normalization
        requested: String,
        /// The canonical name the resolved descriptor rendered
        resolved: String,
    },

    /// Internal invariant break, with the source location where it was detected.
    #[error("Internal - {file}:{line}: {message}")]
    Internal {
        /// The message to be printed for the internal error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },
}
