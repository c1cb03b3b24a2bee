use crate::adapter::{Adapter, FrozenValue, ValueAdapter};
use crate::constraints::{
    Bound, ConditionalConstraint, Constraint, CustomConstraint, CustomContext,
    DependenciesConstraint, Format, JsonType, Limit, LinearItemsConstraint, MultipleOf, Pattern,
    PropertiesConstraint, TypeConstraint,
};
use crate::errors::JsvError;
use crate::results::{Path, Segment, ValidationResults};
use crate::schema::{Schema, SubschemaId};
use crate::validator::{Config, DateTimeMode, OneOfErrors};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::borrow::Cow;
use std::cell::OnceCell;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, trace, warn};

/// Validate `root` against the root subschema of `schema`.
pub fn validate<R: Adapter>(
    config: &Config,
    schema: &Schema,
    root: &R,
    results: Option<&mut ValidationResults>,
) -> Result<bool, JsvError> {
    debug!(
        strict_types = config.strict_types,
        collect_all = results.is_some(),
        "validating document"
    );

    let mut vm = Vm {
        config,
        schema,
        root,
        frozen_root: OnceCell::new(),
        path: vec![],
        depth: 0,
    };

    vm.validate_schema(root, schema.root(), results)
}

struct Vm<'a, R> {
    config: &'a Config,
    schema: &'a Schema,
    root: &'a R,
    frozen_root: OnceCell<FrozenValue>,
    path: Path,
    depth: usize,
}

impl<'a, R: Adapter> Vm<'a, R> {
    /// Evaluate every constraint of a subschema against `target`.
    ///
    /// Without a results sink, evaluation stops at the first failing
    /// constraint. With one, every constraint is evaluated.
    fn validate_schema<A: Adapter>(
        &mut self,
        target: &A,
        id: SubschemaId,
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        let schema = self.schema;
        let subschema = schema.subschema(id)?;

        if self.depth == self.config.max_depth {
            warn!(max_depth = self.config.max_depth, "validation depth limit reached");
            return Err(JsvError::MaxDepthExceeded);
        }

        self.depth += 1;
        trace!(
            depth = self.depth,
            constraints = subschema.constraints().len(),
            "evaluating subschema"
        );

        let collect = results.is_some();
        let mut validated = true;
        for constraint in subschema.constraints() {
            if !self.visit(target, constraint, results.as_deref_mut())? {
                validated = false;
                if !collect {
                    break;
                }
            }
        }

        self.depth -= 1;
        Ok(validated)
    }

    fn validate_child<A: Adapter>(
        &mut self,
        target: &A,
        segment: Segment,
        id: SubschemaId,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        self.path.push(segment);
        let validated = self.validate_schema(target, id, results)?;
        self.path.pop();
        Ok(validated)
    }

    fn visit<A: Adapter>(
        &mut self,
        target: &A,
        constraint: &Constraint,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        match constraint {
            Constraint::AllOf(ids) => self.visit_all_of(target, ids, results),
            Constraint::AnyOf(ids) => self.visit_any_of(target, ids, results),
            Constraint::OneOf(ids) => self.visit_one_of(target, ids, results),
            Constraint::Not(id) => self.visit_not(target, *id, results),
            Constraint::Conditional(conditional) => {
                self.visit_conditional(target, conditional, results)
            }
            Constraint::Const(value) => {
                if value.equal_to(target, true) {
                    return Ok(true);
                }
                self.report(results, || {
                    "Failed to match expected value set by 'const' constraint.".to_owned()
                });
                Ok(false)
            }
            Constraint::Contains(id) => self.visit_contains(target, *id, results),
            Constraint::Dependencies(dependencies) => {
                self.visit_dependencies(target, dependencies, results)
            }
            Constraint::Enum(values) => {
                if values.iter().any(|value| value.equal_to(target, true)) {
                    return Ok(true);
                }
                self.report(results, || "Failed to match against any enum values.".to_owned());
                Ok(false)
            }
            Constraint::Format(format) => Ok(self.visit_format(target, format, results)),
            Constraint::LinearItems(items) => self.visit_linear_items(target, items, results),
            Constraint::SingularItems(id) => self.visit_singular_items(target, *id, results),
            Constraint::Maximum(bound) => Ok(self.visit_maximum(target, *bound, results)),
            Constraint::Minimum(bound) => Ok(self.visit_minimum(target, *bound, results)),
            Constraint::MultipleOf(divisor) => self.visit_multiple_of(target, *divisor, results),
            Constraint::MaxItems(max) => {
                let len = self.array_len(target);
                Ok(self.check(len.map_or(true, |len| len <= *max), results, || {
                    format!("Array should contain no more than {} elements.", max)
                }))
            }
            Constraint::MinItems(min) => {
                let len = self.array_len(target);
                Ok(self.check(len.map_or(true, |len| len >= *min), results, || {
                    format!("Array should contain no fewer than {} elements.", min)
                }))
            }
            Constraint::MaxLength(max) => {
                let len = self.string_len(target);
                Ok(self.check(len.map_or(true, |len| len <= *max), results, || {
                    format!("String should be no more than {} characters in length.", max)
                }))
            }
            Constraint::MinLength(min) => {
                let len = self.string_len(target);
                Ok(self.check(len.map_or(true, |len| len >= *min), results, || {
                    format!("String should be no fewer than {} characters in length.", min)
                }))
            }
            Constraint::MaxProperties(max) => {
                let len = self.object_len(target);
                Ok(self.check(len.map_or(true, |len| len <= *max), results, || {
                    format!("Object should have no more than {} properties.", max)
                }))
            }
            Constraint::MinProperties(min) => {
                let len = self.object_len(target);
                Ok(self.check(len.map_or(true, |len| len >= *min), results, || {
                    format!("Object should have no fewer than {} properties.", min)
                }))
            }
            Constraint::Pattern(pattern) => Ok(self.visit_pattern(target, pattern, results)),
            Constraint::Properties(properties) => {
                self.visit_properties(target, properties, results)
            }
            Constraint::PropertyNames(id) => self.visit_property_names(target, *id, results),
            Constraint::Required(names) => Ok(self.visit_required(target, names, results)),
            Constraint::Type(typ) => self.visit_type(target, typ, results),
            Constraint::UniqueItems => Ok(self.visit_unique_items(target, results)),
            Constraint::Custom(custom) => Ok(self.visit_custom(target, custom.as_ref(), results)),
        }
    }

    fn visit_all_of<A: Adapter>(
        &mut self,
        target: &A,
        ids: &[SubschemaId],
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        let mut validated = true;
        for (index, &id) in ids.iter().enumerate() {
            if !self.validate_schema(target, id, results.as_deref_mut())? {
                validated = false;
                if !self.fail(results.as_deref_mut(), || {
                    format!("Failed to validate against child schema #{}.", index)
                }) {
                    return Ok(false);
                }
            }
        }

        if !validated {
            self.report(results, || {
                "Failed to validate against all child schemas of allOf constraint.".to_owned()
            });
        }

        Ok(validated)
    }

    fn visit_any_of<A: Adapter>(
        &mut self,
        target: &A,
        ids: &[SubschemaId],
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        for &id in ids {
            if self.validate_schema(target, id, None)? {
                return Ok(true);
            }
        }

        self.report(results, || {
            "Failed to validate against any child schemas allowed by anyOf constraint.".to_owned()
        });
        Ok(false)
    }

    fn visit_one_of<A: Adapter>(
        &mut self,
        target: &A,
        ids: &[SubschemaId],
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        // Rejected alternatives report into a private sink, so that nothing
        // reaches the caller unless the constraint as a whole fails.
        let collect = results.is_some();
        let mut child_results = ValidationResults::new();
        let mut matched = 0;

        for (index, &id) in ids.iter().enumerate() {
            let local = if collect {
                Some(&mut child_results)
            } else {
                None
            };

            if self.validate_schema(target, id, local)? {
                matched += 1;
                if !collect && matched > 1 {
                    break;
                }
            } else if collect {
                child_results.push_error(
                    &self.path,
                    format!("Failed to validate against child schema #{}.", index),
                );
            }
        }

        match matched {
            1 => Ok(true),
            0 => {
                if let Some(results) = results {
                    if self.config.one_of_errors == OneOfErrors::Flatten {
                        for error in child_results {
                            results.push(error);
                        }
                    }
                    results.push_error(
                        &self.path,
                        "Failed to validate against any child schemas allowed by oneOf constraint.",
                    );
                }
                Ok(false)
            }
            _ => {
                self.report(results, || {
                    "Failed to validate against exactly one child schema.".to_owned()
                });
                Ok(false)
            }
        }
    }

    fn visit_not<A: Adapter>(
        &mut self,
        target: &A,
        id: SubschemaId,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.validate_schema(target, id, None)? {
            return Ok(true);
        }

        self.report(results, || {
            "Target should not validate against schema specified in 'not' constraint.".to_owned()
        });
        Ok(false)
    }

    fn visit_conditional<A: Adapter>(
        &mut self,
        target: &A,
        conditional: &ConditionalConstraint,
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        let (branch, name) = if self.validate_schema(target, conditional.condition, None)? {
            (conditional.then_branch, "then")
        } else {
            (conditional.else_branch, "else")
        };

        let id = match branch {
            Some(id) => id,
            None => return Ok(true),
        };

        if self.validate_schema(target, id, results.as_deref_mut())? {
            return Ok(true);
        }

        self.report(results, || {
            format!("Failed to validate against '{}' subschema.", name)
        });
        Ok(false)
    }

    fn visit_contains<A: Adapter>(
        &mut self,
        target: &A,
        id: SubschemaId,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.is_array(target) {
            return Ok(true);
        }

        for item in target.as_array().unwrap_or_default() {
            if self.validate_schema(&item, id, None)? {
                return Ok(true);
            }
        }

        self.report(results, || {
            "Failed to validate any array items against subschema in 'contains' constraint."
                .to_owned()
        });
        Ok(false)
    }

    fn visit_dependencies<A: Adapter>(
        &mut self,
        target: &A,
        dependencies: &DependenciesConstraint,
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.is_object(target) {
            return Ok(true);
        }

        let members = target.as_object().unwrap_or_default();
        let mut validated = true;

        for (name, _) in &members {
            if let Some(required) = dependencies.property_dependencies(name) {
                for dependency in required {
                    if !has_member(&members, dependency) {
                        validated = false;
                        if !self.fail(results.as_deref_mut(), || {
                            format!("Missing dependency '{}'.", dependency)
                        }) {
                            return Ok(false);
                        }
                    }
                }
            }

            if let Some(id) = dependencies.schema_dependency(name) {
                if !self.validate_schema(target, id, results.as_deref_mut())? {
                    validated = false;
                    if !self.fail(results.as_deref_mut(), || {
                        "Failed to validate against dependent schema.".to_owned()
                    }) {
                        return Ok(false);
                    }
                }
            }
        }

        Ok(validated)
    }

    fn visit_format<A: Adapter>(
        &self,
        target: &A,
        format: &Format,
        results: Option<&mut ValidationResults>,
    ) -> bool {
        if !self.is_string(target) {
            return true;
        }

        let s = match target.as_string() {
            Some(s) => s,
            None => return true,
        };

        let (valid, name) = match format {
            Format::DateTime => {
                let valid = DateTime::parse_from_rfc3339(&s).is_ok()
                    || (self.config.date_time_mode == DateTimeMode::Permissive
                        && NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
                (valid, "date-time")
            }
            Format::Date => (NaiveDate::parse_from_str(&s, "%Y-%m-%d").is_ok(), "date"),
            Format::Time => {
                let stamp = format!("1970-01-01T{}", s);
                (DateTime::parse_from_rfc3339(&stamp).is_ok(), "time")
            }
            Format::Other(_) => return true,
        };

        self.check(valid, results, || {
            format!("String does not conform to '{}' format.", name)
        })
    }

    fn visit_linear_items<A: Adapter>(
        &mut self,
        target: &A,
        constraint: &LinearItemsConstraint,
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.is_array(target) {
            return Ok(true);
        }

        let items = target.as_array().unwrap_or_default();
        let mut validated = true;

        if constraint.additional_items.is_none() && items.len() > constraint.items.len() {
            validated = false;
            if !self.fail(results.as_deref_mut(), || {
                "Array contains more items than allowed by items constraint.".to_owned()
            }) {
                return Ok(false);
            }
        }

        for (index, item) in items.iter().enumerate() {
            if let Some(&id) = constraint.items.get(index) {
                if !self.validate_child(item, Segment::index(index), id, results.as_deref_mut())? {
                    validated = false;
                    if !self.fail(results.as_deref_mut(), || {
                        format!(
                            "Failed to validate item #{} against corresponding item schema.",
                            index
                        )
                    }) {
                        return Ok(false);
                    }
                }
            } else if let Some(id) = constraint.additional_items {
                if !self.validate_child(item, Segment::index(index), id, results.as_deref_mut())? {
                    validated = false;
                    if !self.fail(results.as_deref_mut(), || {
                        format!(
                            "Failed to validate item #{} against additional items schema.",
                            index
                        )
                    }) {
                        return Ok(false);
                    }
                }
            } else {
                validated = false;
                if !self.fail(results.as_deref_mut(), || {
                    format!("Cannot validate item #{} in array due to missing schema.", index)
                }) {
                    return Ok(false);
                }
            }
        }

        Ok(validated)
    }

    fn visit_singular_items<A: Adapter>(
        &mut self,
        target: &A,
        id: SubschemaId,
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.is_array(target) {
            return Ok(true);
        }

        let mut validated = true;
        for (index, item) in target.as_array().unwrap_or_default().iter().enumerate() {
            if !self.validate_child(item, Segment::index(index), id, results.as_deref_mut())? {
                validated = false;
                if !self.fail(results.as_deref_mut(), || {
                    format!("Failed to validate item #{} in array.", index)
                }) {
                    return Ok(false);
                }
            }
        }

        Ok(validated)
    }

    fn visit_maximum<A: Adapter>(
        &self,
        target: &A,
        bound: Bound,
        results: Option<&mut ValidationResults>,
    ) -> bool {
        let ordering = match self.compare_to_limit(target, bound.limit) {
            Some(ordering) => ordering,
            None => return true,
        };

        if bound.exclusive {
            self.check(ordering == Ordering::Less, results, || {
                format!("Expected number less than {}", bound.limit)
            })
        } else {
            self.check(ordering != Ordering::Greater, results, || {
                format!("Expected number less than or equal to {}", bound.limit)
            })
        }
    }

    fn visit_minimum<A: Adapter>(
        &self,
        target: &A,
        bound: Bound,
        results: Option<&mut ValidationResults>,
    ) -> bool {
        let ordering = match self.compare_to_limit(target, bound.limit) {
            Some(ordering) => ordering,
            None => return true,
        };

        if bound.exclusive {
            self.check(ordering == Ordering::Greater, results, || {
                format!("Expected number greater than {}", bound.limit)
            })
        } else {
            self.check(ordering != Ordering::Less, results, || {
                format!("Expected number greater than or equal to {}", bound.limit)
            })
        }
    }

    fn visit_multiple_of<A: Adapter>(
        &self,
        target: &A,
        divisor: MultipleOf,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.is_number(target) {
            return Ok(true);
        }

        let valid = match divisor {
            MultipleOf::Integer(0) => return Err(JsvError::InvalidDivisor),
            MultipleOf::Integer(divisor) => match target.as_integer() {
                // checked_rem only fails for i64::MIN % -1, which is zero.
                Some(i) => i.checked_rem(divisor).map_or(true, |r| r == 0),
                None => match target.as_double() {
                    Some(d) => d.fract() == 0.0 && is_multiple(d, divisor as f64),
                    None => return Ok(true),
                },
            },
            MultipleOf::Double(divisor) if divisor == 0.0 => {
                return Err(JsvError::InvalidDivisor)
            }
            MultipleOf::Double(divisor) => match target.as_double() {
                Some(d) => is_multiple(d, divisor),
                None => return Ok(true),
            },
        };

        Ok(self.check(valid, results, || match divisor {
            MultipleOf::Integer(divisor) => format!("Value should be a multiple of {}", divisor),
            MultipleOf::Double(divisor) => format!("Value should be a multiple of {}", divisor),
        }))
    }

    fn visit_pattern<A: Adapter>(
        &self,
        target: &A,
        pattern: &Pattern,
        results: Option<&mut ValidationResults>,
    ) -> bool {
        if !self.is_string(target) {
            return true;
        }

        let matched = target
            .as_string()
            .map_or(true, |s| pattern.is_match(&s));
        self.check(matched, results, || {
            "Failed to match regex specified by 'pattern' constraint.".to_owned()
        })
    }

    fn visit_properties<A: Adapter>(
        &mut self,
        target: &A,
        constraint: &PropertiesConstraint,
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.is_object(target) {
            return Ok(true);
        }

        let mut validated = true;
        for (name, value) in target.as_object().unwrap_or_default() {
            let name: &str = &name;
            let mut matched = false;

            if let Some(&id) = constraint.properties.get(name) {
                matched = true;
                if !self.validate_child(&value, Segment::key(name), id, results.as_deref_mut())? {
                    validated = false;
                    if !self.fail(results.as_deref_mut(), || {
                        format!(
                            "Failed to validate against schema associated with property name '{}'.",
                            name
                        )
                    }) {
                        return Ok(false);
                    }
                }
            }

            for (pattern, id) in &constraint.pattern_properties {
                if !pattern.is_match(name) {
                    continue;
                }

                matched = true;
                if !self.validate_child(&value, Segment::key(name), *id, results.as_deref_mut())? {
                    validated = false;
                    if !self.fail(results.as_deref_mut(), || {
                        format!(
                            "Failed to validate against schema associated with pattern '{}'.",
                            pattern.source()
                        )
                    }) {
                        return Ok(false);
                    }
                }
            }

            if matched {
                continue;
            }

            match constraint.additional_properties {
                Some(id) => {
                    if !self.validate_child(&value, Segment::key(name), id, results.as_deref_mut())? {
                        validated = false;
                        if !self.fail(results.as_deref_mut(), || {
                            "Failed to validate against additional properties schema.".to_owned()
                        }) {
                            return Ok(false);
                        }
                    }
                }
                None => {
                    validated = false;
                    if !self.fail(results.as_deref_mut(), || {
                        format!(
                            "Failed to match property name '{}' to any names in 'properties' or regexes in 'patternProperties'.",
                            name
                        )
                    }) {
                        return Ok(false);
                    }
                }
            }
        }

        Ok(validated)
    }

    fn visit_property_names<A: Adapter>(
        &mut self,
        target: &A,
        id: SubschemaId,
        mut results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if !self.is_object(target) {
            return Ok(true);
        }

        let mut validated = true;
        for (name, _) in target.as_object().unwrap_or_default() {
            let value = Value::String(name.to_string());
            let adapter = ValueAdapter::new(&value);
            if !self.validate_child(&adapter, Segment::key(&*name), id, results.as_deref_mut())? {
                validated = false;
                if !self.fail(results.as_deref_mut(), || {
                    format!(
                        "Failed to validate property name '{}' against 'propertyNames' subschema.",
                        name
                    )
                }) {
                    return Ok(false);
                }
            }
        }

        Ok(validated)
    }

    fn visit_required<A: Adapter>(
        &self,
        target: &A,
        names: &BTreeSet<String>,
        mut results: Option<&mut ValidationResults>,
    ) -> bool {
        if !self.is_object(target) {
            self.report(results, || {
                "Object required to validate 'required' properties.".to_owned()
            });
            return false;
        }

        let members = target.as_object().unwrap_or_default();
        let mut validated = true;
        for name in names {
            if !has_member(&members, name) {
                validated = false;
                if !self.fail(results.as_deref_mut(), || {
                    format!("Missing required property '{}'.", name)
                }) {
                    return false;
                }
            }
        }

        validated
    }

    fn visit_type<A: Adapter>(
        &mut self,
        target: &A,
        constraint: &TypeConstraint,
        results: Option<&mut ValidationResults>,
    ) -> Result<bool, JsvError> {
        if constraint
            .types
            .iter()
            .any(|&typ| self.has_type(target, typ))
        {
            return Ok(true);
        }

        for &id in &constraint.schemas {
            if self.validate_schema(target, id, None)? {
                return Ok(true);
            }
        }

        self.report(results, || {
            "Value type not permitted by 'type' constraint.".to_owned()
        });
        Ok(false)
    }

    fn visit_unique_items<A: Adapter>(
        &self,
        target: &A,
        mut results: Option<&mut ValidationResults>,
    ) -> bool {
        if !self.is_array(target) {
            return true;
        }

        let items = target.as_array().unwrap_or_default();
        let mut validated = true;
        for (i, a) in items.iter().enumerate() {
            for (j, b) in items.iter().enumerate().skip(i + 1) {
                if a.equal_to(b, true) {
                    validated = false;
                    if !self.fail(results.as_deref_mut(), || {
                        format!(
                            "Elements at indexes #{} and #{} violate uniqueness constraint.",
                            i, j
                        )
                    }) {
                        return false;
                    }
                }
            }
        }

        validated
    }

    fn visit_custom<A: Adapter>(
        &self,
        target: &A,
        custom: &dyn CustomConstraint,
        results: Option<&mut ValidationResults>,
    ) -> bool {
        let root = self.frozen_root.get_or_init(|| self.root.freeze());
        let context = CustomContext {
            path: &self.path,
            root,
            strict_types: self.config.strict_types,
        };
        custom.validate(&target.freeze(), &context, results)
    }

    fn has_type<A: Adapter>(&self, target: &A, typ: JsonType) -> bool {
        match typ {
            JsonType::Any => true,
            JsonType::Array => self.is_array(target),
            JsonType::Boolean => target.is_bool() || (!self.config.strict_types && target.maybe_bool()),
            JsonType::Integer => {
                target.is_integer() || (!self.config.strict_types && target.maybe_integer())
            }
            JsonType::Null => target.is_null() || (!self.config.strict_types && target.maybe_null()),
            JsonType::Number => self.is_number(target),
            JsonType::Object => self.is_object(target),
            JsonType::String => self.is_string(target),
        }
    }

    fn is_array<A: Adapter>(&self, target: &A) -> bool {
        target.is_array() || (!self.config.strict_types && target.maybe_array())
    }

    fn is_number<A: Adapter>(&self, target: &A) -> bool {
        target.is_number() || (!self.config.strict_types && target.maybe_double())
    }

    fn is_object<A: Adapter>(&self, target: &A) -> bool {
        target.is_object() || (!self.config.strict_types && target.maybe_object())
    }

    fn is_string<A: Adapter>(&self, target: &A) -> bool {
        target.is_string() || (!self.config.strict_types && target.maybe_string())
    }

    /// Integers are compared with integral limits exactly.
    fn compare_to_limit<A: Adapter>(&self, target: &A, limit: Limit) -> Option<Ordering> {
        if !self.is_number(target) {
            return None;
        }

        match limit {
            Limit::Integer(limit) => match target.as_integer() {
                Some(i) => Some(i.cmp(&limit)),
                None => target.as_double()?.partial_cmp(&(limit as f64)),
            },
            Limit::Double(limit) => target.as_double()?.partial_cmp(&limit),
        }
    }

    fn array_len<A: Adapter>(&self, target: &A) -> Option<u64> {
        if self.is_array(target) {
            target.as_array().map(|items| items.len() as u64)
        } else {
            None
        }
    }

    fn object_len<A: Adapter>(&self, target: &A) -> Option<u64> {
        if self.is_object(target) {
            target.as_object().map(|members| members.len() as u64)
        } else {
            None
        }
    }

    /// Length in Unicode code points, not bytes.
    fn string_len<A: Adapter>(&self, target: &A) -> Option<u64> {
        if self.is_string(target) {
            target.as_string().map(|s| s.chars().count() as u64)
        } else {
            None
        }
    }

    /// Report a failure if `valid` is false, and pass `valid` through.
    fn check<F: FnOnce() -> String>(
        &self,
        valid: bool,
        results: Option<&mut ValidationResults>,
        description: F,
    ) -> bool {
        if !valid {
            self.report(results, description);
        }
        valid
    }

    fn report<F: FnOnce() -> String>(&self, results: Option<&mut ValidationResults>, description: F) {
        if let Some(results) = results {
            results.push_error(&self.path, description());
        }
    }

    /// Report a failure. Returns whether evaluation should carry on, which
    /// is only the case when errors are being collected.
    fn fail<F: FnOnce() -> String>(&self, results: Option<&mut ValidationResults>, description: F) -> bool {
        match results {
            Some(results) => {
                results.push_error(&self.path, description());
                true
            }
            None => false,
        }
    }
}

fn has_member<A>(members: &[(Cow<'_, str>, A)], name: &str) -> bool {
    members.iter().any(|(key, _)| key == name)
}

/// Tolerant floating-point divisibility. The remainder is compared against
/// an epsilon scaled to the magnitude of the operands, since neither the
/// target nor the divisor is usually exactly representable.
fn is_multiple(d: f64, divisor: f64) -> bool {
    if d == 0.0 {
        return true;
    }

    let quotient = (d / divisor).round();
    let remainder = (-quotient).mul_add(divisor, d);
    remainder.abs() <= f64::EPSILON * d.abs().max(divisor.abs())
}
