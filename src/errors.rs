//! An error type for misuse of schemas and validators.
//!
//! Nothing in this module describes an instance failing validation. Those
//! outcomes are reported as [`ValidationError`](../results/struct.ValidationError.html)
//! records. A `JsvError` means the schema graph, a schema document, or the
//! validator configuration is broken.

use failure::Fail;

/// An enum of possible errors that can emerge from this crate.
#[derive(Debug, Fail, PartialEq, Clone, Eq, Hash)]
pub enum JsvError {
    /// A schema document used a keyword in a way the parser cannot accept.
    ///
    /// The reason names the keyword and what was expected of it.
    #[fail(display = "invalid schema: {}", reason)]
    InvalidSchema { reason: String },

    /// A regular expression in `pattern` or `patternProperties` failed to
    /// compile.
    ///
    /// Patterns are compiled with the `regex` crate, which guarantees
    /// linear-time matching and so does not support look-around or
    /// back-references.
    #[fail(display = "invalid pattern {:?}: {}", pattern, reason)]
    InvalidPattern { pattern: String, reason: String },

    /// A subschema handle was used with a `Schema` that did not create it.
    #[fail(display = "subschema does not belong to this schema")]
    ForeignSubschema,

    /// Constraints cannot be attached to the shared empty subschema.
    #[fail(display = "the empty subschema cannot be modified")]
    EmptySubschemaImmutable,

    /// A JSON Reference could not be followed.
    #[fail(display = "cannot resolve reference {:?}: {}", reference, reason)]
    UnresolvedReference { reference: String, reason: String },

    /// A JSON Reference pointed into another document, but no function to
    /// fetch documents was supplied.
    #[fail(display = "no document fetcher available for {}", uri)]
    FetchUnavailable { uri: String },

    /// A JSON Reference resolved, directly or through other references, to
    /// itself.
    #[fail(display = "reference {:?} refers only to itself", reference)]
    CyclicReference { reference: String },

    /// The maximum depth during evaluation was exceeded.
    ///
    /// This likely means that your configured `max_depth` is too small, or
    /// that the schema graph contains a cycle that does not consume any of
    /// the instance, such as `{"allOf": [{"$ref": "#"}]}`.
    #[fail(display = "maximum depth exceeded during validation")]
    MaxDepthExceeded,

    /// A `multipleOf` constraint with a zero divisor was evaluated.
    #[fail(display = "multipleOf divisor must be non-zero")]
    InvalidDivisor,
}

impl JsvError {
    pub(crate) fn invalid_schema<S: Into<String>>(reason: S) -> Self {
        JsvError::InvalidSchema {
            reason: reason.into(),
        }
    }
}
