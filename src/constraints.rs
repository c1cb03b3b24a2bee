//! The constraints that can be attached to a subschema.
//!
//! Each [`Constraint`](enum.Constraint.html) is an immutable value holding
//! only plain data and handles to other subschemas of the same
//! [`Schema`](../schema/struct.Schema.html). Constraints never own
//! subschemas.

use crate::adapter::FrozenValue;
use crate::errors::JsvError;
use crate::results::{Segment, ValidationResults};
use crate::schema::SubschemaId;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single validation rule.
#[derive(Clone, Debug)]
pub enum Constraint {
    /// The instance must satisfy every subschema.
    AllOf(Vec<SubschemaId>),

    /// The instance must satisfy at least one subschema.
    AnyOf(Vec<SubschemaId>),

    /// The instance must satisfy exactly one subschema.
    OneOf(Vec<SubschemaId>),

    /// The instance must not satisfy the subschema.
    Not(SubschemaId),

    /// `if`/`then`/`else`.
    Conditional(ConditionalConstraint),

    /// The instance must equal the value.
    Const(FrozenValue),

    /// At least one array element must satisfy the subschema.
    Contains(SubschemaId),

    /// Properties that require other properties, or the whole object to
    /// satisfy a subschema, when present.
    Dependencies(DependenciesConstraint),

    /// The instance must equal one of the values.
    Enum(Vec<FrozenValue>),

    /// A semantic string format such as `date-time`.
    Format(Format),

    /// `items` given as an array of subschemas, plus `additionalItems`.
    LinearItems(LinearItemsConstraint),

    /// `items` given as a single subschema for every element.
    SingularItems(SubschemaId),

    Maximum(Bound),
    Minimum(Bound),
    MultipleOf(MultipleOf),

    MaxItems(u64),
    MaxLength(u64),
    MaxProperties(u64),
    MinItems(u64),
    MinLength(u64),
    MinProperties(u64),

    /// Strings must contain a match of the pattern.
    Pattern(Pattern),

    /// `properties`, `patternProperties` and `additionalProperties`.
    Properties(PropertiesConstraint),

    /// Every member name must satisfy the subschema.
    PropertyNames(SubschemaId),

    /// The instance must be an object with all of these members.
    Required(BTreeSet<String>),

    Type(TypeConstraint),

    /// Array elements must be pairwise distinct.
    UniqueItems,

    /// A user-supplied rule. See [`CustomConstraint`](trait.CustomConstraint.html).
    Custom(Box<dyn CustomConstraint>),
}

impl Constraint {
    /// The schema keyword this constraint most closely corresponds to.
    pub fn keyword(&self) -> &'static str {
        match self {
            Constraint::AllOf(_) => "allOf",
            Constraint::AnyOf(_) => "anyOf",
            Constraint::OneOf(_) => "oneOf",
            Constraint::Not(_) => "not",
            Constraint::Conditional(_) => "if",
            Constraint::Const(_) => "const",
            Constraint::Contains(_) => "contains",
            Constraint::Dependencies(_) => "dependencies",
            Constraint::Enum(_) => "enum",
            Constraint::Format(_) => "format",
            Constraint::LinearItems(_) | Constraint::SingularItems(_) => "items",
            Constraint::Maximum(_) => "maximum",
            Constraint::Minimum(_) => "minimum",
            Constraint::MultipleOf(_) => "multipleOf",
            Constraint::MaxItems(_) => "maxItems",
            Constraint::MaxLength(_) => "maxLength",
            Constraint::MaxProperties(_) => "maxProperties",
            Constraint::MinItems(_) => "minItems",
            Constraint::MinLength(_) => "minLength",
            Constraint::MinProperties(_) => "minProperties",
            Constraint::Pattern(_) => "pattern",
            Constraint::Properties(_) => "properties",
            Constraint::PropertyNames(_) => "propertyNames",
            Constraint::Required(_) => "required",
            Constraint::Type(_) => "type",
            Constraint::UniqueItems => "uniqueItems",
            Constraint::Custom(_) => "custom",
        }
    }

    /// Build a `required` constraint from property names.
    pub fn required<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Constraint::Required(names.into_iter().map(Into::into).collect())
    }
}

/// Data for `if`/`then`/`else`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConditionalConstraint {
    /// The `if` subschema. Its errors are never reported.
    pub condition: SubschemaId,
    /// Applies when the condition holds.
    pub then_branch: Option<SubschemaId>,
    /// Applies when it does not.
    pub else_branch: Option<SubschemaId>,
}

/// Data for `dependencies`.
///
/// A property name may have property dependencies, a schema dependency, or
/// both.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependenciesConstraint {
    properties: BTreeMap<String, BTreeSet<String>>,
    schemas: BTreeMap<String, SubschemaId>,
}

impl DependenciesConstraint {
    /// A constraint with no dependencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `dependency` whenever `property` is present.
    pub fn add_property_dependency<S: Into<String>, T: Into<String>>(
        &mut self,
        property: S,
        dependency: T,
    ) -> &mut Self {
        self.properties
            .entry(property.into())
            .or_default()
            .insert(dependency.into());
        self
    }

    /// Require every name in `dependencies` whenever `property` is present.
    pub fn add_property_dependencies<S, I, T>(&mut self, property: S, dependencies: I) -> &mut Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.properties
            .entry(property.into())
            .or_default()
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    /// Require the whole object to satisfy `subschema` whenever `property` is
    /// present. A property may have only one dependent schema.
    pub fn add_schema_dependency<S: Into<String>>(
        &mut self,
        property: S,
        subschema: SubschemaId,
    ) -> Result<&mut Self, JsvError> {
        let property = property.into();
        if self.schemas.contains_key(&property) {
            return Err(JsvError::invalid_schema(format!(
                "dependencies already contain a dependent schema for property {:?}",
                property
            )));
        }
        self.schemas.insert(property, subschema);
        Ok(self)
    }

    /// Properties that must be present alongside `property`.
    pub fn property_dependencies(&self, property: &str) -> Option<&BTreeSet<String>> {
        self.properties.get(property)
    }

    /// The subschema the whole object must satisfy when `property` is present.
    pub fn schema_dependency(&self, property: &str) -> Option<SubschemaId> {
        self.schemas.get(property).copied()
    }
}

/// Semantic formats understood by the `format` keyword.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Format {
    /// RFC 3339 `date-time`.
    DateTime,
    /// RFC 3339 `full-date`.
    Date,
    /// RFC 3339 `full-time`.
    Time,
    /// Any other format name. These are annotations only and always pass.
    Other(String),
}

impl Format {
    /// The format named by a `format` keyword.
    pub fn from_name(name: &str) -> Self {
        match name {
            "date-time" => Format::DateTime,
            "date" => Format::Date,
            "time" => Format::Time,
            other => Format::Other(other.to_owned()),
        }
    }
}

/// Data for `items` given as an array.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearItemsConstraint {
    /// One subschema per array position.
    pub items: Vec<SubschemaId>,

    /// Applies to positions past the end of `items`. `None` prohibits them.
    pub additional_items: Option<SubschemaId>,
}

/// A numeric bound for `maximum` or `minimum`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bound {
    pub limit: Limit,
    pub exclusive: bool,
}

impl Bound {
    /// A bound the limit itself satisfies.
    pub fn inclusive<L: Into<Limit>>(limit: L) -> Self {
        Bound {
            limit: limit.into(),
            exclusive: false,
        }
    }

    /// A bound the limit itself violates.
    pub fn exclusive<L: Into<Limit>>(limit: L) -> Self {
        Bound {
            limit: limit.into(),
            exclusive: true,
        }
    }
}

/// The value of a `maximum` or `minimum` keyword.
///
/// Integral limits are kept as integers so that integral instances compare
/// exactly, even past 2^53.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Limit {
    /// A limit written as an integer.
    Integer(i64),
    /// Any other limit.
    Double(f64),
}

impl From<i64> for Limit {
    fn from(limit: i64) -> Self {
        Limit::Integer(limit)
    }
}

impl From<f64> for Limit {
    fn from(limit: f64) -> Self {
        Limit::Double(limit)
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Limit::Integer(limit) => write!(f, "{}", limit),
            Limit::Double(limit) => write!(f, "{}", limit),
        }
    }
}

/// The divisor of a `multipleOf` constraint.
///
/// Integral divisors are kept as integers so that integral instances can be
/// checked without floating-point division.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MultipleOf {
    /// A positive integral divisor.
    Integer(i64),
    /// A positive fractional divisor.
    Double(f64),
}

/// A compiled regular expression, matched with search semantics.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compile `source`, which must be valid for the `regex` crate.
    pub fn new<S: Into<String>>(source: S) -> Result<Self, JsvError> {
        let source = source.into();
        match Regex::new(&source) {
            Ok(regex) => Ok(Pattern { source, regex }),
            Err(err) => Err(JsvError::InvalidPattern {
                pattern: source,
                reason: err.to_string(),
            }),
        }
    }

    /// The pattern as written in the schema.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Does `haystack` contain a match anywhere?
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Data for `properties`, `patternProperties` and `additionalProperties`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertiesConstraint {
    /// Subschemas for members by exact name.
    pub properties: BTreeMap<String, SubschemaId>,
    /// Subschemas for members whose names match, in document order.
    pub pattern_properties: Vec<(Pattern, SubschemaId)>,

    /// Applies to members matched by neither of the above. `None` prohibits
    /// them; the empty subschema allows anything.
    pub additional_properties: Option<SubschemaId>,
}

impl PropertiesConstraint {
    /// A constraint that allows no members at all until it is filled in.
    pub fn new() -> Self {
        Self::default()
    }
}

/// The names the `type` keyword may check for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JsonType {
    /// Draft 3 only. Matches every instance.
    Any,
    Array,
    Boolean,
    Integer,
    Null,
    Number,
    Object,
    String,
}

impl JsonType {
    /// The type called `name` in a `type` keyword, if there is one.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "any" => Some(JsonType::Any),
            "array" => Some(JsonType::Array),
            "boolean" => Some(JsonType::Boolean),
            "integer" => Some(JsonType::Integer),
            "null" => Some(JsonType::Null),
            "number" => Some(JsonType::Number),
            "object" => Some(JsonType::Object),
            "string" => Some(JsonType::String),
            _ => None,
        }
    }
}

/// Data for `type`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeConstraint {
    /// Named types, any of which is accepted.
    pub types: BTreeSet<JsonType>,

    /// Draft 3 schema alternatives, tried after the named types.
    pub schemas: Vec<SubschemaId>,
}

impl TypeConstraint {
    /// A constraint no value satisfies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept values of any of `types`.
    pub fn of(types: &[JsonType]) -> Self {
        TypeConstraint {
            types: types.iter().copied().collect(),
            schemas: vec![],
        }
    }
}

/// A validation rule supplied from outside this crate.
///
/// Custom constraints are evaluated against a frozen copy of the target. They
/// receive a [`CustomContext`](struct.CustomContext.html) describing where
/// the target is and giving access to the whole document. When `results` is
/// present, failures should be reported through it.
pub trait CustomConstraint: fmt::Debug + Send + Sync {
    /// Check `target`, returning whether it is valid.
    fn validate(
        &self,
        target: &FrozenValue,
        context: &CustomContext<'_>,
        results: Option<&mut ValidationResults>,
    ) -> bool;

    /// Clone this constraint into a new box.
    fn box_clone(&self) -> Box<dyn CustomConstraint>;
}

impl Clone for Box<dyn CustomConstraint> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// What a custom constraint knows about the value it is validating.
#[derive(Debug)]
pub struct CustomContext<'a> {
    pub(crate) path: &'a [Segment],
    pub(crate) root: &'a FrozenValue,
    pub(crate) strict_types: bool,
}

impl<'a> CustomContext<'a> {
    /// The location of the target within the document.
    pub fn path(&self) -> &'a [Segment] {
        self.path
    }

    /// The document being validated.
    pub fn root(&self) -> &'a FrozenValue {
        self.root
    }

    /// Whether the validator is running with strict type checks.
    pub fn strict_types(&self) -> bool {
        self.strict_types
    }
}
