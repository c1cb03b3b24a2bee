//! Validate input data against schemas.
//!
//! This module contains logic related to *validation*, the process of taking a
//! piece of input data (called a "target") and checking if it's valid
//! according to a schema.
//!
//! See the docs for [`Validator`](struct.Validator.html) for more.

use crate::adapter::{Adapter, ValueAdapter};
use crate::results::ValidationResults;
use crate::schema::Schema;
use crate::vm::validate;
use failure::Error;
use serde_json::Value;

/// Validates targets against schemas.
///
/// A validator holds nothing but its configuration. The same validator can be
/// used with any number of schemas, and a schema can be used by any number of
/// validators at once.
#[derive(Debug, Default, Eq, PartialEq, Clone, Hash)]
pub struct Validator {
    config: Config,
}

impl Validator {
    /// Constructs a new validator using the default configuration.
    pub fn new() -> Self {
        Self::new_with_config(Config::default())
    }

    /// Constructs a new validator using a configuration.
    pub fn new_with_config(config: Config) -> Self {
        Self { config }
    }

    /// The configuration this validator runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate a target against a schema.
    ///
    /// When `results` is `None`, validation stops at the first failure. When
    /// a `ValidationResults` is given, every constraint is evaluated and each
    /// failure is appended to it, in the order the failures were found. The
    /// verdict is the same either way.
    ///
    /// Despite having "Error" in their name, validation errors are not Rust
    /// errors. An `Err` is only returned if validation could not be carried
    /// out at all: when the maximum depth is exceeded (see
    /// [`Config::max_depth`](struct.Config.html#method.max_depth)), or when
    /// the schema is malformed.
    pub fn validate<A: Adapter>(
        &self,
        schema: &Schema,
        target: &A,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, Error> {
        Ok(validate(&self.config, schema, target, results)?)
    }

    /// Validate a `serde_json::Value` against a schema.
    pub fn validate_value(
        &self,
        schema: &Schema,
        target: &Value,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, Error> {
        self.validate(schema, &ValueAdapter::new(target), results)
    }
}

/// How `format: date-time` strings are checked.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum DateTimeMode {
    /// Require a full RFC 3339 timestamp, including an offset.
    Strict,

    /// Also accept timestamps without an offset.
    Permissive,
}

/// What a failed `oneOf` reports.
#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash)]
pub enum OneOfErrors {
    /// The errors of every rejected alternative, then a summary.
    Flatten,

    /// Just the summary.
    SummaryOnly,
}

/// Configuration for how validation should proceed.
#[derive(Debug, Eq, PartialEq, Clone, Hash)]
pub struct Config {
    pub(crate) strict_types: bool,
    pub(crate) max_depth: usize,
    pub(crate) date_time_mode: DateTimeMode,
    pub(crate) one_of_errors: OneOfErrors,
}

impl Config {
    /// Create a new, default `Config`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether type checks are strict. The default is strict.
    ///
    /// With strict types, a value only has the type the adapter reports for
    /// it. Otherwise, values which the adapter can coerce also count: the
    /// string `"10"` is a number, `"true"` is a boolean, and so on.
    pub fn strict_types(&mut self, strict_types: bool) -> &mut Self {
        self.strict_types = strict_types;
        self
    }

    /// Sets the maximum subschema nesting depth before aborting evaluation.
    /// The default is 512.
    ///
    /// When evaluation is aborted because of this maximum depth, validation
    /// returns an error rather than a verdict.
    ///
    /// This functionality exists to support detecting infinite loops in
    /// schemas, for example in circularly-defined schemas.
    pub fn max_depth(&mut self, max_depth: usize) -> &mut Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets how `date-time` formats are checked. The default is
    /// [`DateTimeMode::Strict`](enum.DateTimeMode.html#variant.Strict).
    pub fn date_time_mode(&mut self, date_time_mode: DateTimeMode) -> &mut Self {
        self.date_time_mode = date_time_mode;
        self
    }

    /// Sets what a failed `oneOf` reports. The default is
    /// [`OneOfErrors::Flatten`](enum.OneOfErrors.html#variant.Flatten).
    pub fn one_of_errors(&mut self, one_of_errors: OneOfErrors) -> &mut Self {
        self.one_of_errors = one_of_errors;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict_types: true,
            max_depth: 512,
            date_time_mode: DateTimeMode::Strict,
            one_of_errors: OneOfErrors::Flatten,
        }
    }
}
