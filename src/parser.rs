//! Populate schemas from JSON Schema documents.
//!
//! A [`SchemaParser`](struct.SchemaParser.html) reads a schema document
//! written against draft 3, 4 or 7 and fills a
//! [`Schema`](../schema/struct.Schema.html) with the equivalent constraints.
//!
//! JSON References are followed as they are found. Every referenced location
//! is parsed at most once and then shared by handle, so a recursive schema
//! becomes a cyclic graph of subschemas rather than an infinite tree.

use crate::adapter::{Adapter, FrozenValue};
use crate::constraints::{
    Bound, ConditionalConstraint, Constraint, DependenciesConstraint, Format, JsonType, Limit,
    LinearItemsConstraint, MultipleOf, Pattern, PropertiesConstraint, TypeConstraint,
};
use crate::errors::JsvError;
use crate::schema::{Schema, SubschemaId};
use failure::Error;
use json_pointer::{JsonPointer, ParseError};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};
use url::Url;

/// The URI given to a root document that does not declare its own id.
const DEFAULT_BASE: &str = "jsv://localhost/schema.json";

type SizeConstraint = fn(u64) -> Constraint;

const MAX_SIZES: [(&str, SizeConstraint); 3] = [
    ("maxItems", Constraint::MaxItems),
    ("maxLength", Constraint::MaxLength),
    ("maxProperties", Constraint::MaxProperties),
];

const MIN_SIZES: [(&str, SizeConstraint); 3] = [
    ("minItems", Constraint::MinItems),
    ("minLength", Constraint::MinLength),
    ("minProperties", Constraint::MinProperties),
];

/// The draft of JSON Schema a document is written against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Version {
    Draft3,
    Draft4,
    Draft7,
}

impl Default for Version {
    fn default() -> Self {
        Version::Draft4
    }
}

/// Makes a constraint from the value of a custom keyword.
///
/// Builders are registered with
/// [`SchemaParser::add_constraint_builder`](struct.SchemaParser.html#method.add_constraint_builder).
/// Whenever a schema object contains the keyword, the builder is handed the
/// keyword's value, and the constraint it returns is added to the subschema.
pub trait ConstraintBuilder {
    fn make(&self, value: &Value) -> Result<Constraint, Error>;
}

/// Fetches the schema document at a URI.
pub type Fetcher<'f> = dyn FnMut(&Url) -> Result<Value, Error> + 'f;

/// Reads schema documents into `Schema`s.
pub struct SchemaParser {
    version: Version,
    builders: BTreeMap<String, Box<dyn ConstraintBuilder>>,
}

impl SchemaParser {
    /// A parser for schemas written against `version`.
    pub fn new(version: Version) -> Self {
        SchemaParser {
            version,
            builders: BTreeMap::new(),
        }
    }

    /// The draft this parser reads.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Handle `keyword` with a custom builder.
    ///
    /// Registering a keyword twice replaces the earlier builder.
    pub fn add_constraint_builder<S: Into<String>>(
        &mut self,
        keyword: S,
        builder: Box<dyn ConstraintBuilder>,
    ) -> &mut Self {
        self.builders.insert(keyword.into(), builder);
        self
    }

    /// Populate `schema` from a schema document.
    ///
    /// References to other documents cannot be followed, and produce a
    /// [`JsvError::FetchUnavailable`](../errors/enum.JsvError.html#variant.FetchUnavailable).
    pub fn populate_schema<A: Adapter>(&self, node: &A, schema: &mut Schema) -> Result<(), Error> {
        self.populate(node, schema, None)
    }

    /// Populate `schema` from a schema document, calling `fetch` to retrieve
    /// any other documents it refers to.
    ///
    /// Each document is fetched at most once.
    pub fn populate_schema_with_fetcher<A, F>(
        &self,
        node: &A,
        schema: &mut Schema,
        mut fetch: F,
    ) -> Result<(), Error>
    where
        A: Adapter,
        F: FnMut(&Url) -> Result<Value, Error>,
    {
        self.populate(node, schema, Some(&mut fetch))
    }

    fn populate<'f, A: Adapter>(
        &self,
        node: &A,
        schema: &mut Schema,
        fetch: Option<&'f mut Fetcher<'f>>,
    ) -> Result<(), Error> {
        let document = Rc::new(node.freeze().into_value());
        let base = Url::parse(DEFAULT_BASE)?;
        let scope = match self.id_of(&document) {
            Some(id) => base.join(id).map_err(|err| {
                JsvError::invalid_schema(format!("id {:?} is not a valid URI: {}", id, err))
            })?,
            None => base,
        };
        let uri = document_uri(&scope);

        let root = schema.root();
        let mut state = State {
            parser: self,
            schema,
            fetch,
            documents: HashMap::new(),
            ids: HashMap::new(),
            subschemas: HashMap::new(),
            resolving: HashSet::new(),
        };

        let location = Location::document(&uri);
        state.subschemas.insert(location.key(), root);
        state.add_document(uri, Rc::clone(&document));

        debug!(version = ?self.version, "populating schema");
        match state.reference(&document)? {
            Some(reference) => {
                let target = state.resolve(reference, &scope)?;
                if target != root {
                    state
                        .schema
                        .add_constraint(Constraint::AllOf(vec![target]))?;
                }
                Ok(())
            }
            None => state.populate(&document, root, &scope, &location),
        }
    }

    fn id_of<'v>(&self, node: &'v Value) -> Option<&'v str> {
        let keyword = match self.version {
            Version::Draft7 => "$id",
            Version::Draft3 | Version::Draft4 => "id",
        };
        node.as_object()?.get(keyword)?.as_str()
    }
}

impl Default for SchemaParser {
    fn default() -> Self {
        Self::new(Version::default())
    }
}

/// A position within a schema document.
#[derive(Clone, Debug)]
struct Location {
    document: String,
    tokens: Vec<String>,
}

impl Location {
    fn document(uri: &str) -> Self {
        Location {
            document: uri.to_owned(),
            tokens: vec![],
        }
    }

    fn child<S: Into<String>>(&self, token: S) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token.into());
        Location {
            document: self.document.clone(),
            tokens,
        }
    }

    /// Uniquely names this location, in URI form.
    fn key(&self) -> String {
        format!(
            "{}#{}",
            self.document,
            JsonPointer::new(self.tokens.clone())
        )
    }
}

struct State<'p, 's, 'f> {
    parser: &'p SchemaParser,
    schema: &'s mut Schema,
    fetch: Option<&'f mut Fetcher<'f>>,

    /// Schema documents by URI.
    documents: HashMap<String, Rc<Value>>,

    /// Locations of subschemas that declare an id, by resolved id.
    ids: HashMap<String, Location>,

    /// Subschemas already created, by location key.
    subschemas: HashMap<String, SubschemaId>,

    /// Locations on the current chain of references.
    resolving: HashSet<String>,
}

impl<'p, 's, 'f> State<'p, 's, 'f> {
    fn version(&self) -> Version {
        self.parser.version
    }

    fn reference<'v>(&self, node: &'v Value) -> Result<Option<&'v str>, Error> {
        match node.as_object().and_then(|object| object.get("$ref")) {
            None => Ok(None),
            Some(Value::String(reference)) => Ok(Some(reference.as_str())),
            Some(_) => invalid("$ref must be a string"),
        }
    }

    fn add_document(&mut self, uri: String, document: Rc<Value>) {
        let scope = Url::parse(&uri).ok();
        self.documents.insert(uri.clone(), Rc::clone(&document));
        if let Some(scope) = scope {
            self.index_ids(&document, &scope, Location::document(&uri));
        }
    }

    /// Record the location of every subschema with an id, so that references
    /// to those ids can be resolved without fetching anything.
    fn index_ids(&mut self, node: &Value, scope: &Url, location: Location) {
        match node {
            Value::Object(object) => {
                let mut scope = scope.clone();
                if let Some(id) = self.parser.id_of(node) {
                    if let Ok(joined) = scope.join(id) {
                        scope = normalize(joined);
                        self.ids
                            .entry(scope.as_str().to_owned())
                            .or_insert_with(|| location.clone());
                    }
                }

                for (key, child) in object {
                    // Values, not schemas.
                    if key == "enum" || key == "const" {
                        continue;
                    }
                    self.index_ids(child, &scope, location.child(key.as_str()));
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.index_ids(item, scope, location.child(index.to_string()));
                }
            }
            _ => {}
        }
    }

    fn load_document(&mut self, uri: &Url) -> Result<(), Error> {
        if self.documents.contains_key(uri.as_str()) {
            return Ok(());
        }

        let fetch = match self.fetch.as_mut() {
            Some(fetch) => fetch,
            None => {
                return Err(JsvError::FetchUnavailable {
                    uri: uri.to_string(),
                }
                .into())
            }
        };

        debug!(uri = %uri, "fetching schema document");
        let document = fetch(uri)?;
        self.add_document(uri.as_str().to_owned(), Rc::new(document));
        Ok(())
    }

    fn locate(&mut self, target: &Url, reference: &str) -> Result<Location, Error> {
        if let Some(location) = self.ids.get(target.as_str()) {
            return Ok(location.clone());
        }

        let mut base = target.clone();
        base.set_fragment(None);

        let mut location = match self.ids.get(base.as_str()) {
            Some(location) => location.clone(),
            None => {
                self.load_document(&base)?;
                Location::document(base.as_str())
            }
        };

        let tokens = fragment_tokens(target.fragment().unwrap_or("")).map_err(|err| {
            JsvError::UnresolvedReference {
                reference: reference.to_owned(),
                reason: format!("fragment is not a JSON Pointer: {:?}", err),
            }
        })?;
        location.tokens.extend(tokens);
        Ok(location)
    }

    /// Resolve a JSON Reference, parsing its target if it has not been seen
    /// before.
    fn resolve(&mut self, reference: &str, scope: &Url) -> Result<SubschemaId, Error> {
        debug!(reference, scope = %scope, "resolving reference");

        let target = scope
            .join(reference)
            .map_err(|err| JsvError::UnresolvedReference {
                reference: reference.to_owned(),
                reason: err.to_string(),
            })?;
        let target = normalize(target);
        let location = self.locate(&target, reference)?;
        let key = location.key();

        if let Some(&id) = self.subschemas.get(&key) {
            return Ok(id);
        }

        if !self.resolving.insert(key.clone()) {
            return Err(JsvError::CyclicReference {
                reference: reference.to_owned(),
            }
            .into());
        }

        let document = match self.documents.get(&location.document) {
            Some(document) => Rc::clone(document),
            None => {
                return Err(JsvError::UnresolvedReference {
                    reference: reference.to_owned(),
                    reason: "document was never loaded".to_owned(),
                }
                .into())
            }
        };

        let node = JsonPointer::new(location.tokens.clone())
            .get(&document)
            .map_err(|err| JsvError::UnresolvedReference {
                reference: reference.to_owned(),
                reason: format!("{:?}", err),
            })?;
        let node_scope = self.scope_at(&document, &location)?;

        let id = self.subschema(node, &node_scope, location)?;
        self.resolving.remove(&key);
        Ok(id)
    }

    /// The resolution scope in effect for the value at `location`, not
    /// counting any id on the value itself.
    fn scope_at(&self, document: &Value, location: &Location) -> Result<Url, Error> {
        let mut scope = Url::parse(&location.document)?;
        let mut node = document;
        for token in &location.tokens {
            if let Some(id) = self.parser.id_of(node) {
                if let Ok(joined) = scope.join(id) {
                    scope = joined;
                }
            }

            node = match node {
                Value::Object(object) => object.get(token),
                Value::Array(items) => token.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            }
            .ok_or_else(|| JsvError::UnresolvedReference {
                reference: location.key(),
                reason: format!("no value at token {:?}", token),
            })?;
        }
        Ok(scope)
    }

    /// Get the subschema for a schema value, creating and populating it if
    /// need be.
    fn subschema(
        &mut self,
        node: &Value,
        scope: &Url,
        location: Location,
    ) -> Result<SubschemaId, Error> {
        if let Value::Bool(true) = node {
            if self.version() == Version::Draft7 {
                return Ok(self.schema.empty_subschema());
            }
        }

        if let Some(reference) = self.reference(node)? {
            return self.resolve(reference, scope);
        }

        let key = location.key();
        if let Some(&id) = self.subschemas.get(&key) {
            return Ok(id);
        }

        let id = self.schema.create_subschema();
        self.subschemas.insert(key, id);
        self.populate(node, id, scope, &location)?;
        Ok(id)
    }

    fn optional_subschema(
        &mut self,
        keyword: &str,
        node: Option<&Value>,
        scope: &Url,
        location: &Location,
    ) -> Result<Option<SubschemaId>, Error> {
        match node {
            None | Some(Value::Bool(true)) => Ok(Some(self.schema.empty_subschema())),
            Some(Value::Bool(false)) => Ok(None),
            Some(node @ Value::Object(_)) => self
                .subschema(node, scope, location.child(keyword))
                .map(Some),
            Some(_) => invalid(format!("{} must be a boolean or a schema", keyword)),
        }
    }

    fn subschema_array(
        &mut self,
        keyword: &str,
        node: &Value,
        scope: &Url,
        location: &Location,
    ) -> Result<Vec<SubschemaId>, Error> {
        let items = match node {
            Value::Array(items) => items,
            _ => return invalid(format!("{} must be an array of schemas", keyword)),
        };

        let location = location.child(keyword);
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                self.check_schema(keyword, item)?;
                self.subschema(item, scope, location.child(index.to_string()))
            })
            .collect()
    }

    fn check_schema(&self, keyword: &str, node: &Value) -> Result<(), Error> {
        match node {
            Value::Object(_) => Ok(()),
            Value::Bool(_) if self.version() == Version::Draft7 => Ok(()),
            _ => invalid(format!("{} must contain schemas", keyword)),
        }
    }

    fn populate(
        &mut self,
        node: &Value,
        id: SubschemaId,
        scope: &Url,
        location: &Location,
    ) -> Result<(), Error> {
        let object = match node {
            Value::Object(object) => object,
            Value::Bool(false) if self.version() == Version::Draft7 => {
                let empty = self.schema.empty_subschema();
                self.schema
                    .add_constraint_to_subschema(Constraint::Not(empty), id)?;
                return Ok(());
            }
            Value::Bool(true) if self.version() == Version::Draft7 => return Ok(()),
            _ => return invalid("schema must be an object"),
        };

        let version = self.version();
        let mut scope = scope.clone();
        if let Some(schema_id) = self.parser.id_of(node) {
            self.schema.set_subschema_id(id, schema_id)?;
            if let Ok(joined) = scope.join(schema_id) {
                scope = joined;
            }
        }
        let scope = &scope;

        trace!(keywords = object.len(), "populating subschema");

        let mut constraints = vec![];

        if let Some(node) = object.get("allOf") {
            constraints.push(Constraint::AllOf(
                self.subschema_array("allOf", node, scope, location)?,
            ));
        }

        if let Some(node) = object.get("anyOf") {
            constraints.push(Constraint::AnyOf(
                self.subschema_array("anyOf", node, scope, location)?,
            ));
        }

        if version == Version::Draft7 {
            if let Some(node) = object.get("const") {
                constraints.push(Constraint::Const(FrozenValue::new(node.clone())));
            }

            if let Some(node) = object.get("contains") {
                self.check_schema("contains", node)?;
                constraints.push(Constraint::Contains(self.subschema(
                    node,
                    scope,
                    location.child("contains"),
                )?));
            }
        }

        if let Some(node) = object.get("dependencies") {
            constraints.push(Constraint::Dependencies(
                self.dependencies(node, scope, location)?,
            ));
        }

        if let Some(node) = object.get("description") {
            match node {
                Value::String(description) => {
                    self.schema.set_subschema_description(id, description.as_str())?
                }
                _ => return invalid("description must be a string"),
            }
        }

        if version == Version::Draft3 {
            if let Some(node) = object.get("divisibleBy") {
                constraints.push(Constraint::MultipleOf(divisor("divisibleBy", node)?));
            }
        }

        if let Some(node) = object.get("enum") {
            match node {
                Value::Array(values) => constraints.push(Constraint::Enum(
                    values.iter().cloned().map(FrozenValue::new).collect(),
                )),
                _ => return invalid("enum must be an array"),
            }
        }

        if let Some(node) = object.get("format") {
            match node {
                Value::String(name) => constraints.push(Constraint::Format(Format::from_name(name))),
                _ => return invalid("format must be a string"),
            }
        }

        if version == Version::Draft7 {
            if let Some(node) = object.get("if") {
                self.check_schema("if", node)?;
                let condition = self.subschema(node, scope, location.child("if"))?;
                let then_branch = self.branch("then", object, scope, location)?;
                let else_branch = self.branch("else", object, scope, location)?;
                constraints.push(Constraint::Conditional(ConditionalConstraint {
                    condition,
                    then_branch,
                    else_branch,
                }));
            }
        }

        if let Some(node) = object.get("items") {
            match node {
                Value::Array(_) => {
                    let items = self.subschema_array("items", node, scope, location)?;
                    let additional_items = self.optional_subschema(
                        "additionalItems",
                        object.get("additionalItems"),
                        scope,
                        location,
                    )?;
                    constraints.push(Constraint::LinearItems(LinearItemsConstraint {
                        items,
                        additional_items,
                    }));
                }
                _ => {
                    self.check_schema("items", node)?;
                    constraints.push(Constraint::SingularItems(self.subschema(
                        node,
                        scope,
                        location.child("items"),
                    )?));
                }
            }
        }

        constraints.extend(bounds(
            version,
            object,
            "maximum",
            "exclusiveMaximum",
            Constraint::Maximum,
        )?);

        for &(keyword, make) in &MAX_SIZES {
            if let Some(node) = object.get(keyword) {
                constraints.push(make(non_negative_integer(keyword, node)?));
            }
        }

        constraints.extend(bounds(
            version,
            object,
            "minimum",
            "exclusiveMinimum",
            Constraint::Minimum,
        )?);

        for &(keyword, make) in &MIN_SIZES {
            if let Some(node) = object.get(keyword) {
                constraints.push(make(non_negative_integer(keyword, node)?));
            }
        }

        if version != Version::Draft3 {
            if let Some(node) = object.get("multipleOf") {
                constraints.push(Constraint::MultipleOf(divisor("multipleOf", node)?));
            }
        }

        if let Some(node) = object.get("not") {
            self.check_schema("not", node)?;
            constraints.push(Constraint::Not(self.subschema(
                node,
                scope,
                location.child("not"),
            )?));
        }

        if let Some(node) = object.get("oneOf") {
            constraints.push(Constraint::OneOf(
                self.subschema_array("oneOf", node, scope, location)?,
            ));
        }

        if let Some(node) = object.get("pattern") {
            match node {
                Value::String(pattern) => {
                    constraints.push(Constraint::Pattern(Pattern::new(pattern.as_str())?))
                }
                _ => return invalid("pattern must be a string"),
            }
        }

        for (keyword, builder) in &self.parser.builders {
            if let Some(node) = object.get(keyword) {
                trace!(keyword = keyword.as_str(), "building custom constraint");
                constraints.push(builder.make(node)?);
            }
        }

        if object.contains_key("properties")
            || object.contains_key("patternProperties")
            || object.contains_key("additionalProperties")
        {
            constraints.push(Constraint::Properties(
                self.properties(object, scope, location)?,
            ));

            if version == Version::Draft3 {
                let required = draft3_required(object);
                if !required.is_empty() {
                    constraints.push(Constraint::Required(required));
                }
            }
        }

        if version == Version::Draft7 {
            if let Some(node) = object.get("propertyNames") {
                self.check_schema("propertyNames", node)?;
                constraints.push(Constraint::PropertyNames(self.subschema(
                    node,
                    scope,
                    location.child("propertyNames"),
                )?));
            }
        }

        if let Some(node) = object.get("required") {
            match (version, node) {
                (Version::Draft3, Value::Bool(_)) => {}
                (Version::Draft3, _) => return invalid("required must be a boolean"),
                (_, Value::Array(names)) => {
                    let names = names
                        .iter()
                        .map(|name| name.as_str())
                        .collect::<Option<BTreeSet<&str>>>()
                        .ok_or_else(|| {
                            JsvError::invalid_schema("required must be an array of strings")
                        })?;
                    constraints.push(Constraint::required(names));
                }
                _ => return invalid("required must be an array of strings"),
            }
        }

        if let Some(node) = object.get("title") {
            match node {
                Value::String(title) => self.schema.set_subschema_title(id, title.as_str())?,
                _ => return invalid("title must be a string"),
            }
        }

        if let Some(node) = object.get("type") {
            constraints.push(Constraint::Type(self.types(node, scope, location)?));
        }

        if let Some(node) = object.get("uniqueItems") {
            match node {
                Value::Bool(true) => constraints.push(Constraint::UniqueItems),
                Value::Bool(false) => {}
                _ => return invalid("uniqueItems must be a boolean"),
            }
        }

        for constraint in constraints {
            self.schema.add_constraint_to_subschema(constraint, id)?;
        }

        Ok(())
    }

    fn branch(
        &mut self,
        keyword: &str,
        object: &Map<String, Value>,
        scope: &Url,
        location: &Location,
    ) -> Result<Option<SubschemaId>, Error> {
        match object.get(keyword) {
            None => Ok(None),
            Some(node) => {
                self.check_schema(keyword, node)?;
                self.subschema(node, scope, location.child(keyword)).map(Some)
            }
        }
    }

    fn dependencies(
        &mut self,
        node: &Value,
        scope: &Url,
        location: &Location,
    ) -> Result<DependenciesConstraint, Error> {
        let object = match node {
            Value::Object(object) => object,
            _ => return invalid("dependencies must be an object"),
        };

        let location = location.child("dependencies");
        let mut dependencies = DependenciesConstraint::new();
        for (property, dependency) in object {
            match dependency {
                Value::Array(names) => {
                    let names = names
                        .iter()
                        .map(|name| name.as_str())
                        .collect::<Option<Vec<&str>>>()
                        .ok_or_else(|| {
                            JsvError::invalid_schema(format!(
                                "dependencies of {:?} must be strings",
                                property
                            ))
                        })?;
                    dependencies.add_property_dependencies(property.as_str(), names);
                }
                Value::String(name) if self.version() == Version::Draft3 => {
                    dependencies.add_property_dependency(property.as_str(), name.as_str());
                }
                _ => {
                    self.check_schema("dependencies", dependency)?;
                    let id = self.subschema(dependency, scope, location.child(property.as_str()))?;
                    dependencies.add_schema_dependency(property.as_str(), id)?;
                }
            }
        }

        Ok(dependencies)
    }

    fn properties(
        &mut self,
        object: &Map<String, Value>,
        scope: &Url,
        location: &Location,
    ) -> Result<PropertiesConstraint, Error> {
        let mut constraint = PropertiesConstraint::new();

        if let Some(node) = object.get("properties") {
            let properties = match node {
                Value::Object(properties) => properties,
                _ => return invalid("properties must be an object"),
            };

            let location = location.child("properties");
            for (name, node) in properties {
                self.check_schema("properties", node)?;
                let id = self.subschema(node, scope, location.child(name.as_str()))?;
                constraint.properties.insert(name.clone(), id);
            }
        }

        if let Some(node) = object.get("patternProperties") {
            let patterns = match node {
                Value::Object(patterns) => patterns,
                _ => return invalid("patternProperties must be an object"),
            };

            let location = location.child("patternProperties");
            for (source, node) in patterns {
                self.check_schema("patternProperties", node)?;
                let pattern = Pattern::new(source.as_str())?;
                let id = self.subschema(node, scope, location.child(source.as_str()))?;
                constraint.pattern_properties.push((pattern, id));
            }
        }

        constraint.additional_properties = self.optional_subschema(
            "additionalProperties",
            object.get("additionalProperties"),
            scope,
            location,
        )?;

        Ok(constraint)
    }

    fn types(
        &mut self,
        node: &Value,
        scope: &Url,
        location: &Location,
    ) -> Result<TypeConstraint, Error> {
        let mut constraint = TypeConstraint::new();
        match node {
            Value::String(name) => {
                constraint.types.insert(self.type_name(name)?);
            }
            Value::Array(items) => {
                let location = location.child("type");
                for (index, item) in items.iter().enumerate() {
                    match item {
                        Value::String(name) => {
                            constraint.types.insert(self.type_name(name)?);
                        }
                        Value::Object(_) if self.version() == Version::Draft3 => {
                            let id = self.subschema(item, scope, location.child(index.to_string()))?;
                            constraint.schemas.push(id);
                        }
                        _ => return invalid("type must contain only type names"),
                    }
                }
            }
            _ => return invalid("type must be a string or an array"),
        }

        Ok(constraint)
    }

    fn type_name(&self, name: &str) -> Result<JsonType, Error> {
        match JsonType::from_name(name) {
            Some(JsonType::Any) if self.version() != Version::Draft3 => {
                invalid("type 'any' is only supported by draft 3")
            }
            Some(typ) => Ok(typ),
            None => invalid(format!("unknown type {:?}", name)),
        }
    }
}

/// The `maximum`/`minimum` constraints of a schema object, along with their
/// exclusive counterparts.
fn bounds(
    version: Version,
    object: &Map<String, Value>,
    keyword: &str,
    exclusive_keyword: &str,
    make: fn(Bound) -> Constraint,
) -> Result<Vec<Constraint>, Error> {
    let limit = match object.get(keyword) {
        Some(node) => Some(number_limit(keyword, node)?),
        None => None,
    };

    let exclusive = object.get(exclusive_keyword);
    match version {
        Version::Draft3 | Version::Draft4 => {
            let exclusive = match exclusive {
                None => false,
                Some(Value::Bool(exclusive)) => *exclusive,
                Some(_) => return invalid(format!("{} must be a boolean", exclusive_keyword)),
            };

            match limit {
                Some(limit) if exclusive => Ok(vec![make(Bound::exclusive(limit))]),
                Some(limit) => Ok(vec![make(Bound::inclusive(limit))]),
                None if exclusive || object.contains_key(exclusive_keyword) => invalid(format!(
                    "{} cannot be used without {}",
                    exclusive_keyword, keyword
                )),
                None => Ok(vec![]),
            }
        }
        Version::Draft7 => {
            let mut constraints = vec![];
            if let Some(limit) = limit {
                constraints.push(make(Bound::inclusive(limit)));
            }
            if let Some(node) = exclusive {
                constraints.push(make(Bound::exclusive(number_limit(exclusive_keyword, node)?)));
            }
            Ok(constraints)
        }
    }
}

fn number_limit(keyword: &str, node: &Value) -> Result<Limit, Error> {
    match (node.as_i64(), node.as_f64()) {
        (Some(i), _) => Ok(Limit::Integer(i)),
        (None, Some(d)) => Ok(Limit::Double(d)),
        _ => invalid(format!("{} must be a number", keyword)),
    }
}

fn divisor(keyword: &str, node: &Value) -> Result<MultipleOf, Error> {
    let divisor = match (node.as_i64(), node.as_f64()) {
        (Some(i), _) if i > 0 => MultipleOf::Integer(i),
        (None, Some(d)) if d > 0.0 => MultipleOf::Double(d),
        _ => return invalid(format!("{} must be a number greater than zero", keyword)),
    };
    Ok(divisor)
}

fn non_negative_integer(keyword: &str, node: &Value) -> Result<u64, Error> {
    if let Some(n) = node.as_u64() {
        return Ok(n);
    }

    match node.as_f64() {
        Some(d) if d >= 0.0 && d.fract() == 0.0 && d < u64::MAX as f64 => Ok(d as u64),
        _ => invalid(format!("{} must be a non-negative integer", keyword)),
    }
}

/// Names of draft 3 properties marked `"required": true`.
fn draft3_required(object: &Map<String, Value>) -> BTreeSet<String> {
    object
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter(|(_, node)| node.get("required") == Some(&Value::Bool(true)))
        .map(|(name, _)| name.clone())
        .collect()
}

/// The URI of the document a scope lies within.
fn document_uri(scope: &Url) -> String {
    let mut uri = scope.clone();
    uri.set_fragment(None);
    uri.into()
}

/// An empty fragment names the same thing as no fragment.
fn normalize(mut url: Url) -> Url {
    if url.fragment() == Some("") {
        url.set_fragment(None);
    }
    url
}

/// Unescaped reference tokens of a URI fragment holding a JSON Pointer.
fn fragment_tokens(fragment: &str) -> Result<Vec<String>, ParseError> {
    let mut pointer: JsonPointer<String, Vec<String>> = format!("#{}", fragment).parse()?;

    // Tokens are only handed out from the end.
    let mut tokens = vec![];
    while let Some(token) = pointer.pop() {
        tokens.push(token);
    }
    tokens.reverse();
    Ok(tokens)
}

fn invalid<T, S: Into<String>>(reason: S) -> Result<T, Error> {
    Err(JsvError::invalid_schema(reason).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ValueAdapter;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(version: Version, document: Value) -> Result<Schema, Error> {
        let mut schema = Schema::new();
        SchemaParser::new(version).populate_schema(&ValueAdapter::new(&document), &mut schema)?;
        Ok(schema)
    }

    fn root_keywords(schema: &Schema) -> Vec<&'static str> {
        schema
            .root_subschema()
            .constraints()
            .iter()
            .map(Constraint::keyword)
            .collect()
    }

    #[test]
    fn keyword_order() -> Result<(), Error> {
        let schema = parse(
            Version::Draft4,
            json!({
                "uniqueItems": true,
                "type": "array",
                "minItems": 1,
                "maximum": 3,
                "allOf": [{}],
                "title": "ordered",
            }),
        )?;

        assert_eq!(
            root_keywords(&schema),
            vec!["allOf", "maximum", "minItems", "type", "uniqueItems"]
        );
        assert_eq!(schema.root_subschema().title(), Some("ordered"));
        Ok(())
    }

    #[test]
    fn recursive_reference_is_shared() -> Result<(), Error> {
        let schema = parse(
            Version::Draft4,
            json!({
                "definitions": {
                    "node": {
                        "type": "object",
                        "properties": {
                            "next": { "$ref": "#/definitions/node" },
                        },
                    },
                },
                "properties": {
                    "head": { "$ref": "#/definitions/node" },
                },
            }),
        )?;

        // root, empty, node
        assert_eq!(schema.subschema_count(), 3);
        Ok(())
    }

    #[test]
    fn self_reference_is_cyclic() {
        let error = parse(
            Version::Draft4,
            json!({
                "definitions": { "a": { "$ref": "#/definitions/a" } },
                "properties": { "x": { "$ref": "#/definitions/a" } },
            }),
        )
        .unwrap_err();

        assert_eq!(
            error.downcast::<JsvError>().unwrap(),
            JsvError::CyclicReference {
                reference: "#/definitions/a".to_owned()
            }
        );
    }

    #[test]
    fn remote_reference_needs_fetcher() {
        let error = parse(
            Version::Draft4,
            json!({ "$ref": "http://example.com/item.json" }),
        )
        .unwrap_err();

        assert_eq!(
            error.downcast::<JsvError>().unwrap(),
            JsvError::FetchUnavailable {
                uri: "http://example.com/item.json".to_owned()
            }
        );
    }

    #[test]
    fn fetches_each_document_once() -> Result<(), Error> {
        let document = json!({
            "properties": {
                "a": { "$ref": "http://example.com/item.json#/definitions/a" },
                "b": { "$ref": "http://example.com/item.json#/definitions/b" },
            },
        });

        let mut fetched = vec![];
        let mut schema = Schema::new();
        SchemaParser::default().populate_schema_with_fetcher(
            &ValueAdapter::new(&document),
            &mut schema,
            |uri: &Url| {
                fetched.push(uri.to_string());
                Ok(json!({
                    "definitions": {
                        "a": { "type": "string" },
                        "b": { "type": "integer" },
                    },
                }))
            },
        )?;

        assert_eq!(fetched, vec!["http://example.com/item.json"]);
        Ok(())
    }

    #[test]
    fn id_scopes_references() -> Result<(), Error> {
        let document = json!({
            "id": "http://example.com/root.json",
            "definitions": {
                "b": { "id": "b.json", "type": "integer" },
            },
            "properties": {
                "x": { "$ref": "b.json" },
            },
        });

        let mut schema = Schema::new();
        SchemaParser::default().populate_schema(&ValueAdapter::new(&document), &mut schema)?;
        assert_eq!(schema.subschema_count(), 3);
        Ok(())
    }

    #[test]
    fn draft4_exclusive_bound_requires_bound() {
        assert!(parse(Version::Draft4, json!({ "exclusiveMinimum": true })).is_err());
        assert!(parse(Version::Draft7, json!({ "exclusiveMinimum": 3 })).is_ok());
    }

    #[test]
    fn any_type_is_draft3_only() {
        assert!(parse(Version::Draft3, json!({ "type": "any" })).is_ok());
        assert!(parse(Version::Draft4, json!({ "type": "any" })).is_err());
    }

    #[test]
    fn draft3_required_lands_on_parent() -> Result<(), Error> {
        let schema = parse(
            Version::Draft3,
            json!({
                "properties": {
                    "a": { "required": true },
                    "b": { "required": false },
                },
            }),
        )?;

        assert_eq!(root_keywords(&schema), vec!["properties", "required"]);
        match &schema.root_subschema().constraints()[1] {
            Constraint::Required(names) => {
                assert_eq!(names.iter().collect::<Vec<_>>(), vec!["a"]);
            }
            other => panic!("unexpected constraint {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn draft7_boolean_schemas() -> Result<(), Error> {
        let schema = parse(Version::Draft7, json!(false))?;
        assert_eq!(root_keywords(&schema), vec!["not"]);

        let schema = parse(Version::Draft7, json!({ "items": true }))?;
        assert_eq!(schema.subschema_count(), 2);
        Ok(())
    }

    #[test]
    fn invalid_pattern() {
        let error = parse(Version::Draft4, json!({ "pattern": "(?=x)" })).unwrap_err();
        match error.downcast::<JsvError>().unwrap() {
            JsvError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "(?=x)"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn fragments() {
        assert_eq!(fragment_tokens("").unwrap(), Vec::<String>::new());
        assert_eq!(
            fragment_tokens("/a~1b/c~0d").unwrap(),
            vec!["a/b".to_owned(), "c~d".to_owned()]
        );
        assert_eq!(
            fragment_tokens("/definitions/a%20b").unwrap(),
            vec!["definitions".to_owned(), "a b".to_owned()]
        );
        assert!(fragment_tokens("foo").is_err());
        assert!(fragment_tokens("/%2").is_err());
    }

    #[test]
    fn escaped_fragment_references() -> Result<(), Error> {
        let schema = parse(
            Version::Draft4,
            json!({
                "definitions": {
                    "a b": { "type": "integer" },
                    "x/y": { "type": "string" }
                },
                "properties": {
                    "p": { "$ref": "#/definitions/a%20b" },
                    "q": { "$ref": "#/definitions/x~1y" }
                }
            }),
        )?;

        let validator = crate::Validator::new();
        assert!(validator.validate_value(&schema, &json!({ "p": 1, "q": "s" }), None)?);
        assert!(!validator.validate_value(&schema, &json!({ "p": "x" }), None)?);
        assert!(!validator.validate_value(&schema, &json!({ "q": 1 }), None)?);
        Ok(())
    }
}
