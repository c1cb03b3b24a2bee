use failure::Error;
use jsv::{Schema, SchemaParser, ValidationResults, Validator, ValueAdapter, Version};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::Value;
use std::fs;

#[derive(Deserialize)]
struct TestGroup {
    description: String,
    schema: Value,
    tests: Vec<TestCase>,
}

#[derive(Deserialize)]
struct TestCase {
    description: String,
    data: Value,
    valid: bool,
}

fn run_suite(dir: &str, version: Version) -> Result<(), Error> {
    let mut paths = fs::read_dir(dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();

    let validator = Validator::new();
    for path in paths {
        println!("{:?}", &path);
        let file = fs::read(&path)?;
        let groups: Vec<TestGroup> = serde_json::from_slice(&file)?;

        for (i, group) in groups.into_iter().enumerate() {
            println!("{}: {}", i, group.description);

            let mut schema = Schema::new();
            SchemaParser::new(version)
                .populate_schema(&ValueAdapter::new(&group.schema), &mut schema)?;

            for (j, test_case) in group.tests.iter().enumerate() {
                println!("{}/{}: {}", i, j, test_case.description);

                let fail_fast = validator.validate_value(&schema, &test_case.data, None)?;
                assert_eq!(test_case.valid, fail_fast);

                let mut results = ValidationResults::new();
                let collected =
                    validator.validate_value(&schema, &test_case.data, Some(&mut results))?;
                assert_eq!(test_case.valid, collected);
                assert_eq!(test_case.valid, results.is_empty());

                // Validation has no side effects on the schema.
                let mut again = ValidationResults::new();
                validator.validate_value(&schema, &test_case.data, Some(&mut again))?;
                assert_eq!(results, again);
            }
        }
    }

    Ok(())
}

#[test]
fn draft3() -> Result<(), Error> {
    run_suite("tests/suite/draft3", Version::Draft3)
}

#[test]
fn draft4() -> Result<(), Error> {
    run_suite("tests/suite/draft4", Version::Draft4)
}

#[test]
fn draft7() -> Result<(), Error> {
    run_suite("tests/suite/draft7", Version::Draft7)
}
