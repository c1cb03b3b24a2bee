use failure::{err_msg, Error};
use jsv::validator::Config;
use jsv::{
    Constraint, ConstraintBuilder, CustomConstraint, CustomContext, FrozenValue, JsvError, Schema,
    SchemaParser, StringAdapter, ValidationResults, Validator, ValueAdapter, Version,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use url::Url;

fn parse(version: Version, document: Value) -> Result<Schema, Error> {
    let mut schema = Schema::new();
    SchemaParser::new(version).populate_schema(&ValueAdapter::new(&document), &mut schema)?;
    Ok(schema)
}

fn collect(schema: &Schema, target: &Value) -> Result<(bool, Vec<(String, String)>), Error> {
    let mut results = ValidationResults::new();
    let valid = Validator::new().validate_value(schema, target, Some(&mut results))?;
    let errors = results
        .into_iter()
        .map(|error| (error.json_pointer(), error.description().to_owned()))
        .collect();
    Ok((valid, errors))
}

fn pairs(errors: &[(&str, &str)]) -> Vec<(String, String)> {
    errors
        .iter()
        .map(|(pointer, description)| (pointer.to_string(), description.to_string()))
        .collect()
}

#[test]
fn nested_minimum_and_parent_summary() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({
            "type": "object",
            "properties": {
                "foo": { "type": "integer", "minimum": 0 },
            },
            "required": ["foo"],
        }),
    )?;

    let (valid, errors) = collect(&schema, &json!({ "foo": -10 }))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("/foo", "Expected number greater than or equal to 0"),
            (
                "",
                "Failed to validate against schema associated with property name 'foo'."
            ),
        ])
    );
    Ok(())
}

#[test]
fn additional_items_prohibited() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({
            "type": "array",
            "items": [{ "type": "string" }],
            "additionalItems": false,
        }),
    )?;

    let (valid, errors) = collect(&schema, &json!(["a", "b"]))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("", "Array contains more items than allowed by items constraint."),
            ("", "Cannot validate item #1 in array due to missing schema."),
        ])
    );
    Ok(())
}

#[test]
fn unique_items_names_both_indexes() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "uniqueItems": true }))?;

    let (valid, errors) = collect(&schema, &json!([1, 2, 1]))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[(
            "",
            "Elements at indexes #0 and #2 violate uniqueness constraint."
        )])
    );
    Ok(())
}

#[test]
fn unique_items_reports_every_pair() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "uniqueItems": true }))?;

    let (valid, errors) = collect(&schema, &json!([1, 1, 1]))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("", "Elements at indexes #0 and #1 violate uniqueness constraint."),
            ("", "Elements at indexes #0 and #2 violate uniqueness constraint."),
            ("", "Elements at indexes #1 and #2 violate uniqueness constraint."),
        ])
    );
    Ok(())
}

#[test]
fn each_missing_required_property_is_reported() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "required": ["a", "b"] }))?;

    let (valid, errors) = collect(&schema, &json!({}))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("", "Missing required property 'a'."),
            ("", "Missing required property 'b'."),
        ])
    );
    Ok(())
}

#[test]
fn each_missing_dependency_is_reported() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "dependencies": { "a": ["b", "c"] } }))?;

    let (valid, errors) = collect(&schema, &json!({ "a": 1 }))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[("", "Missing dependency 'b'."), ("", "Missing dependency 'c'.")])
    );

    assert!(Validator::new().validate_value(&schema, &json!({ "a": 1, "b": 2, "c": 3 }), None)?);
    Ok(())
}

#[test]
fn every_matching_pattern_property_applies() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({
            "patternProperties": {
                "^f": { "type": "integer" },
                "o$": { "minimum": 5 },
            },
        }),
    )?;

    let (valid, errors) = collect(&schema, &json!({ "foo": "x" }))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("/foo", "Value type not permitted by 'type' constraint."),
            (
                "",
                "Failed to validate against schema associated with pattern '^f'."
            ),
        ])
    );

    let (valid, errors) = collect(&schema, &json!({ "foo": 2.5 }))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("/foo", "Value type not permitted by 'type' constraint."),
            (
                "",
                "Failed to validate against schema associated with pattern '^f'."
            ),
            ("/foo", "Expected number greater than or equal to 5"),
            (
                "",
                "Failed to validate against schema associated with pattern 'o$'."
            ),
        ])
    );

    assert!(Validator::new().validate_value(&schema, &json!({ "foo": 7, "bar": "x" }), None)?);
    Ok(())
}

#[test]
fn integer_bounds_are_exact() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "maximum": 9007199254740992i64 }))?;

    let (valid, errors) = collect(&schema, &json!(9007199254740993i64))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[("", "Expected number less than or equal to 9007199254740992")])
    );
    assert!(Validator::new().validate_value(&schema, &json!(9007199254740992i64), None)?);

    let schema = parse(
        Version::Draft4,
        json!({ "minimum": 9007199254740993i64, "exclusiveMinimum": true }),
    )?;
    assert!(!Validator::new().validate_value(&schema, &json!(9007199254740993i64), None)?);
    assert!(Validator::new().validate_value(&schema, &json!(9007199254740994i64), None)?);

    let schema = parse(Version::Draft7, json!({ "exclusiveMaximum": 2.5 }))?;
    assert!(Validator::new().validate_value(&schema, &json!(2), None)?);
    assert!(!Validator::new().validate_value(&schema, &json!(2.5), None)?);
    Ok(())
}

#[test]
fn tolerant_multiple_of() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "multipleOf": 0.01 }))?;
    assert!(Validator::new().validate_value(&schema, &json!(19.99), None)?);
    Ok(())
}

#[test]
fn one_of_exactness() -> Result<(), Error> {
    let validator = Validator::new();
    let schema = parse(
        Version::Draft4,
        json!({ "oneOf": [{ "type": "string" }, { "type": "number" }] }),
    )?;

    assert!(validator.validate_value(&schema, &json!("x"), None)?);
    assert!(validator.validate_value(&schema, &json!(5), None)?);
    assert!(!validator.validate_value(&schema, &json!(true), None)?);

    let overlapping = parse(
        Version::Draft4,
        json!({ "oneOf": [{ "type": "number" }, { "minimum": 0 }] }),
    )?;
    let (valid, errors) = collect(&overlapping, &json!(5))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[("", "Failed to validate against exactly one child schema.")])
    );
    Ok(())
}

#[test]
fn one_of_flattens_rejected_alternatives() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({ "oneOf": [{ "type": "string" }, { "type": "number" }] }),
    )?;

    let (_, errors) = collect(&schema, &json!(true))?;
    assert_eq!(
        errors,
        pairs(&[
            ("", "Value type not permitted by 'type' constraint."),
            ("", "Failed to validate against child schema #0."),
            ("", "Value type not permitted by 'type' constraint."),
            ("", "Failed to validate against child schema #1."),
            (
                "",
                "Failed to validate against any child schemas allowed by oneOf constraint."
            ),
        ])
    );
    Ok(())
}

#[test]
fn all_of_errors_are_depth_first() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({
            "allOf": [
                { "type": "string" },
                { "type": "array", "items": { "type": "integer" } },
            ],
        }),
    )?;

    let (valid, errors) = collect(&schema, &json!(["x"]))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("", "Value type not permitted by 'type' constraint."),
            ("", "Failed to validate against child schema #0."),
            ("/0", "Value type not permitted by 'type' constraint."),
            ("", "Failed to validate item #0 in array."),
            ("", "Failed to validate against child schema #1."),
            (
                "",
                "Failed to validate against all child schemas of allOf constraint."
            ),
        ])
    );
    Ok(())
}

#[test]
fn any_of_reports_only_summary() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({ "anyOf": [{ "type": "string" }, { "minimum": 10 }] }),
    )?;

    let (valid, errors) = collect(&schema, &json!(3))?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[(
            "",
            "Failed to validate against any child schemas allowed by anyOf constraint."
        )])
    );
    Ok(())
}

#[test]
fn inapplicable_constraints_pass() -> Result<(), Error> {
    let cases = vec![
        (json!({ "maxLength": 1 }), json!(12345)),
        (json!({ "minLength": 10 }), json!(null)),
        (json!({ "pattern": "^x$" }), json!([1])),
        (json!({ "minimum": 5 }), json!("1")),
        (json!({ "maximum": 5 }), json!({})),
        (json!({ "multipleOf": 3 }), json!("4")),
        (json!({ "maxItems": 0 }), json!("abc")),
        (json!({ "minItems": 3 }), json!(true)),
        (json!({ "maxProperties": 0 }), json!([1, 2])),
        (json!({ "minProperties": 3 }), json!(1.5)),
        (json!({ "uniqueItems": true }), json!({ "a": 1, "b": 1 })),
        (json!({ "format": "date" }), json!(19630619)),
    ];

    let validator = Validator::new();
    for (document, target) in cases {
        let schema = parse(Version::Draft4, document.clone())?;
        let mut results = ValidationResults::new();
        assert!(
            validator.validate_value(&schema, &target, Some(&mut results))?,
            "{} should ignore {}",
            document,
            target
        );
        assert!(results.is_empty());
    }
    Ok(())
}

#[test]
fn code_point_lengths() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "minLength": 2, "maxLength": 2 }))?;
    let validator = Validator::new();

    assert!(validator.validate_value(&schema, &json!("\u{00e9}\u{00e9}"), None)?);
    assert!(validator.validate_value(&schema, &json!("💩💩"), None)?);
    assert!(!validator.validate_value(&schema, &json!("💩"), None)?);
    Ok(())
}

#[test]
fn pointers_agree_with_context() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({
            "properties": {
                "a/b": {
                    "items": {
                        "properties": { "c~d": { "type": "string" } },
                    },
                },
            },
        }),
    )?;

    let mut results = ValidationResults::new();
    Validator::new().validate_value(
        &schema,
        &json!({ "a/b": [{ "c~d": 1 }] }),
        Some(&mut results),
    )?;
    assert!(!results.is_empty());

    for error in &results {
        let from_pointer: Vec<String> = error
            .json_pointer()
            .split('/')
            .skip(1)
            .map(|token| token.replace("~1", "/").replace("~0", "~"))
            .collect();

        let context = error.context();
        assert_eq!(context[0], "<root>");
        let from_context: Vec<String> = context[1..]
            .iter()
            .map(|segment| {
                segment
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .trim_matches('"')
                    .to_owned()
            })
            .collect();

        assert_eq!(from_pointer, from_context);
    }

    assert_eq!(
        results.iter().next().map(|error| error.json_pointer()),
        Some("/a~1b/0/c~0d".to_owned())
    );
    Ok(())
}

#[test]
fn errors_serialize_with_both_addresses() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({ "properties": { "foo": { "type": "string" } } }),
    )?;

    let mut results = ValidationResults::new();
    Validator::new().validate_value(&schema, &json!({ "foo": 1 }), Some(&mut results))?;

    let first = results.pop_error().unwrap();
    assert_eq!(
        serde_json::to_value(&first)?,
        json!({
            "context": ["<root>", "[\"foo\"]"],
            "description": "Value type not permitted by 'type' constraint.",
            "jsonPointer": "/foo",
        })
    );
    Ok(())
}

#[test]
fn loose_types_with_string_adapter() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "type": "integer", "minimum": 5 }))?;

    let strict = Validator::new();
    assert!(!strict.validate(&schema, &StringAdapter::new("10"), None)?);

    let mut config = Config::new();
    config.strict_types(false);
    let loose = Validator::new_with_config(config);
    assert!(loose.validate(&schema, &StringAdapter::new("10"), None)?);
    assert!(!loose.validate(&schema, &StringAdapter::new("3"), None)?);
    assert!(!loose.validate(&schema, &StringAdapter::new("ten"), None)?);
    Ok(())
}

#[test]
fn loose_types_with_value_adapter() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({
            "properties": {
                "n": { "type": "number", "maximum": 10 },
                "flag": { "type": "boolean" },
            },
        }),
    )?;

    let mut config = Config::new();
    config.strict_types(false);
    let loose = Validator::new_with_config(config);

    let target = json!({ "n": "5", "flag": "true" });
    assert!(loose.validate_value(&schema, &target, None)?);
    assert!(!Validator::new().validate_value(&schema, &target, None)?);
    assert!(!loose.validate_value(&schema, &json!({ "n": "50" }), None)?);
    Ok(())
}

#[test]
fn permissive_date_times() -> Result<(), Error> {
    let schema = parse(Version::Draft7, json!({ "format": "date-time" }))?;
    let target = json!("2018-11-13T20:20:39");

    assert!(!Validator::new().validate_value(&schema, &target, None)?);

    let mut config = Config::new();
    config.date_time_mode(jsv::validator::DateTimeMode::Permissive);
    assert!(Validator::new_with_config(config).validate_value(&schema, &target, None)?);
    Ok(())
}

#[test]
fn self_referencing_schema_exceeds_depth() -> Result<(), Error> {
    let schema = parse(Version::Draft4, json!({ "allOf": [{ "$ref": "#" }] }))?;

    let mut config = Config::new();
    config.max_depth(64);

    let error = Validator::new_with_config(config)
        .validate_value(&schema, &json!(1), None)
        .unwrap_err();
    assert_eq!(
        error.downcast::<JsvError>().unwrap(),
        JsvError::MaxDepthExceeded
    );
    Ok(())
}

#[test]
fn remote_references_are_fetched() -> Result<(), Error> {
    let document = json!({
        "properties": {
            "name": { "$ref": "http://example.com/definitions.json#/name" },
        },
    });

    let mut schema = Schema::new();
    SchemaParser::new(Version::Draft4).populate_schema_with_fetcher(
        &ValueAdapter::new(&document),
        &mut schema,
        |uri: &Url| match uri.as_str() {
            "http://example.com/definitions.json" => Ok(json!({
                "name": { "type": "string", "minLength": 1 },
            })),
            other => Err(err_msg(format!("unknown document {}", other))),
        },
    )?;

    let validator = Validator::new();
    assert!(validator.validate_value(&schema, &json!({ "name": "Jane" }), None)?);
    assert!(!validator.validate_value(&schema, &json!({ "name": "" }), None)?);
    Ok(())
}

/// Requires the target to appear in an array elsewhere in the document.
#[derive(Clone, Debug)]
struct ExistsIn {
    pointer: String,
}

impl CustomConstraint for ExistsIn {
    fn validate(
        &self,
        target: &FrozenValue,
        context: &CustomContext<'_>,
        results: Option<&mut ValidationResults>,
    ) -> bool {
        let found = context
            .root()
            .as_value()
            .pointer(&self.pointer)
            .and_then(Value::as_array)
            .map_or(false, |items| items.contains(target.as_value()));

        if !found {
            if let Some(results) = results {
                results.push_error(
                    context.path(),
                    format!("Value not found in '{}'.", self.pointer),
                );
            }
        }
        found
    }

    fn box_clone(&self) -> Box<dyn CustomConstraint> {
        Box::new(self.clone())
    }
}

struct ExistsInBuilder;

impl ConstraintBuilder for ExistsInBuilder {
    fn make(&self, value: &Value) -> Result<Constraint, Error> {
        let pointer = value
            .as_str()
            .ok_or_else(|| err_msg("exists_in must be a JSON Pointer"))?;
        Ok(Constraint::Custom(Box::new(ExistsIn {
            pointer: pointer.to_owned(),
        })))
    }
}

#[test]
fn custom_constraint_sees_document_root() -> Result<(), Error> {
    let document = json!({
        "properties": {
            "employee": { "type": "string", "exists_in": "/elist" },
            "elist": { "type": "array", "items": { "type": "string" } },
        },
    });

    let mut parser = SchemaParser::new(Version::Draft4);
    parser.add_constraint_builder("exists_in", Box::new(ExistsInBuilder));
    let mut schema = Schema::new();
    parser.populate_schema(&ValueAdapter::new(&document), &mut schema)?;

    let (valid, errors) = collect(
        &schema,
        &json!({ "employee": "Jane", "elist": ["John", "Mary"] }),
    )?;
    assert!(!valid);
    assert_eq!(
        errors,
        pairs(&[
            ("/employee", "Value not found in '/elist'."),
            (
                "",
                "Failed to validate against schema associated with property name 'employee'."
            ),
        ])
    );

    assert!(Validator::new().validate_value(
        &schema,
        &json!({ "employee": "John", "elist": ["John", "Mary"] }),
        None
    )?);
    Ok(())
}

#[test]
fn schemas_are_shared_across_threads() -> Result<(), Error> {
    let schema = parse(
        Version::Draft4,
        json!({ "type": "array", "items": { "type": "integer" } }),
    )?;

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let schema = &schema;
                scope.spawn(move || {
                    Validator::new()
                        .validate_value(schema, &json!([i, i + 1]), None)
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    });
    Ok(())
}
