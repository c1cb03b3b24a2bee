//! `jsv` validates JSON documents against [JSON Schema][json-schema], drafts
//! 3, 4 and 7.
//!
//! Validation happens in two steps. First, a schema document is read by a
//! [`SchemaParser`](parser/struct.SchemaParser.html) into a
//! [`Schema`](schema/struct.Schema.html), an immutable graph of constraints.
//! Then a [`Validator`](validator/struct.Validator.html) evaluates targets
//! against that schema. A schema can be built once and reused for any number
//! of targets.
//!
//! # Validating data
//!
//! ```
//! use serde_json::json;
//! use jsv::{SchemaParser, Schema, Validator, ValidationResults, ValueAdapter, Version};
//! use failure::Error;
//!
//! fn main() -> Result<(), Error> {
//!     let schema_document = json!({
//!         "type": "object",
//!         "required": ["name"],
//!         "properties": {
//!             "name": { "type": "string" },
//!             "age": { "type": "integer", "minimum": 0 },
//!             "phones": {
//!                 "items": { "type": "string" }
//!             }
//!         }
//!     });
//!
//!     let mut schema = Schema::new();
//!     SchemaParser::new(Version::Draft4)
//!         .populate_schema(&ValueAdapter::new(&schema_document), &mut schema)?;
//!
//!     let validator = Validator::new();
//!     let input_ok = json!({
//!         "name": "John Doe",
//!         "age": 43,
//!         "phones": ["+44 1234567", "+44 2345678"]
//!     });
//!     assert!(validator.validate_value(&schema, &input_ok, None)?);
//!
//!     // Without a ValidationResults, validation stops at the first failure
//!     // and only the verdict is returned.
//!     let input_bad = json!({
//!         "age": "43",
//!         "phones": ["+44 1234567", 442345678]
//!     });
//!     assert!(!validator.validate_value(&schema, &input_bad, None)?);
//!
//!     // With one, every failure is recorded, deepest first.
//!     let mut results = ValidationResults::new();
//!     assert!(!validator.validate_value(&schema, &input_bad, Some(&mut results))?);
//!     assert_eq!(results.len(), 6);
//!
//!     let error = results.pop_error().unwrap();
//!     assert_eq!(error.json_pointer(), "/age");
//!     assert_eq!(error.context(), vec!["<root>", "[\"age\"]"]);
//!     assert_eq!(error.description(), "Value type not permitted by 'type' constraint.");
//!
//!     let pointers: Vec<String> = results.iter().map(|e| e.json_pointer()).collect();
//!     assert_eq!(pointers, vec!["", "/phones/1", "/phones", "", ""]);
//!
//!     Ok(())
//! }
//! ```
//!
//! Each [`ValidationError`](results/struct.ValidationError.html) can render
//! the location of the offending value two ways: as a list of context
//! segments beginning with `"<root>"`, and as an RFC 6901 JSON Pointer. Both
//! are derived from the same path, so they always agree.
//!
//! # Targets other than `serde_json`
//!
//! Validation is generic over the [`Adapter`](adapter/trait.Adapter.html)
//! trait, which describes how to inspect a document. Adapters are provided
//! for `serde_json::Value` and for bare strings. Adapters can also report
//! values that could be *coerced* to other types; with
//! [`Config::strict_types`](validator/struct.Config.html#method.strict_types)
//! turned off, the validator accepts those values too.
//!
//! # Custom keywords
//!
//! Keywords beyond the standard ones can be added with
//! [`SchemaParser::add_constraint_builder`](parser/struct.SchemaParser.html#method.add_constraint_builder),
//! which maps the keyword to a
//! [`CustomConstraint`](constraints/trait.CustomConstraint.html).
//!
//! [json-schema]: https://json-schema.org

mod vm;

pub mod adapter;
pub mod constraints;
pub mod errors;
pub mod parser;
pub mod results;
pub mod schema;
pub mod validator;

pub use crate::adapter::{Adapter, FrozenValue, StringAdapter, ValueAdapter};
pub use crate::constraints::{Constraint, CustomConstraint, CustomContext};
pub use crate::errors::JsvError;
pub use crate::parser::{ConstraintBuilder, SchemaParser, Version};
pub use crate::results::{Segment, ValidationError, ValidationResults};
pub use crate::schema::{Schema, Subschema, SubschemaId};
pub use crate::validator::{Config, Validator};
