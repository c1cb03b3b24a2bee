//! Schema representations.
//!
//! A [`Schema`](struct.Schema.html) is an arena of
//! [`Subschema`](struct.Subschema.html) nodes. Constraints refer to other
//! subschemas through [`SubschemaId`](struct.SubschemaId.html) handles, which
//! are only meaningful to the schema that vended them. The schema is the sole
//! owner of every subschema, so shared and even cyclic references between
//! subschemas need no reference counting.

use crate::constraints::Constraint;
use crate::errors::JsvError;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_SCHEMA: AtomicUsize = AtomicUsize::new(0);

const ROOT_INDEX: usize = 0;
const EMPTY_INDEX: usize = 1;

/// A handle to a subschema owned by a particular `Schema`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubschemaId {
    schema: usize,
    index: usize,
}

/// A node of validation rules within a schema.
///
/// Constraints are evaluated in the order they were added.
#[derive(Clone, Debug, Default)]
pub struct Subschema {
    constraints: Vec<Constraint>,
    description: Option<String>,
    id: Option<String>,
    title: Option<String>,
}

impl Subschema {
    /// Get the constraints of this subschema, in evaluation order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Get the description of this subschema.
    ///
    /// Descriptions play no part in validation.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Get the id of this subschema, as written in the schema document.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Get the title of this subschema.
    ///
    /// Titles play no part in validation.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

/// The root of a schema graph, and the arena owning all of its subschemas.
///
/// Every schema starts out with two subschemas: the root, and a shared empty
/// subschema which accepts everything. Further subschemas are made with
/// [`create_subschema`](#method.create_subschema) and populated with
/// [`add_constraint_to_subschema`](#method.add_constraint_to_subschema).
///
/// Once populated, a schema is only ever read by validation, so it may be
/// shared between threads.
#[derive(Debug)]
pub struct Schema {
    id: usize,
    subschemas: Vec<Subschema>,
}

impl Schema {
    /// Construct a new schema whose root has no constraints.
    pub fn new() -> Self {
        Schema {
            id: NEXT_SCHEMA.fetch_add(1, Ordering::Relaxed),
            subschemas: vec![Subschema::default(), Subschema::default()],
        }
    }

    /// The handle of the root subschema.
    pub fn root(&self) -> SubschemaId {
        self.handle(ROOT_INDEX)
    }

    /// The handle of the shared subschema with no constraints.
    ///
    /// Note the difference between this and no subschema at all: an absent
    /// `additionalProperties` subschema prohibits additional properties, while
    /// the empty subschema allows them.
    pub fn empty_subschema(&self) -> SubschemaId {
        self.handle(EMPTY_INDEX)
    }

    /// Allocate a new subschema with no constraints.
    pub fn create_subschema(&mut self) -> SubschemaId {
        self.subschemas.push(Subschema::default());
        self.handle(self.subschemas.len() - 1)
    }

    /// The number of subschemas in this schema, including the root and the
    /// empty subschema.
    pub fn subschema_count(&self) -> usize {
        self.subschemas.len()
    }

    /// Get a subschema of this schema.
    ///
    /// Returns an error if the handle was created by a different schema.
    pub fn subschema(&self, id: SubschemaId) -> Result<&Subschema, JsvError> {
        if id.schema != self.id {
            return Err(JsvError::ForeignSubschema);
        }
        self.subschemas
            .get(id.index)
            .ok_or(JsvError::ForeignSubschema)
    }

    /// Get the root subschema.
    pub fn root_subschema(&self) -> &Subschema {
        &self.subschemas[ROOT_INDEX]
    }

    /// Append a constraint to the root subschema.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), JsvError> {
        let root = self.root();
        self.add_constraint_to_subschema(constraint, root)
    }

    /// Append a constraint to a subschema of this schema.
    pub fn add_constraint_to_subschema(
        &mut self,
        constraint: Constraint,
        id: SubschemaId,
    ) -> Result<(), JsvError> {
        self.subschema_mut(id)?.constraints.push(constraint);
        Ok(())
    }

    /// Set the `description` annotation of a subschema.
    pub fn set_subschema_description<S: Into<String>>(
        &mut self,
        id: SubschemaId,
        description: S,
    ) -> Result<(), JsvError> {
        self.subschema_mut(id)?.description = Some(description.into());
        Ok(())
    }

    /// Set the `id` annotation of a subschema.
    pub fn set_subschema_id<S: Into<String>>(
        &mut self,
        id: SubschemaId,
        subschema_id: S,
    ) -> Result<(), JsvError> {
        self.subschema_mut(id)?.id = Some(subschema_id.into());
        Ok(())
    }

    /// Set the `title` annotation of a subschema.
    pub fn set_subschema_title<S: Into<String>>(
        &mut self,
        id: SubschemaId,
        title: S,
    ) -> Result<(), JsvError> {
        self.subschema_mut(id)?.title = Some(title.into());
        Ok(())
    }

    fn handle(&self, index: usize) -> SubschemaId {
        SubschemaId {
            schema: self.id,
            index,
        }
    }

    fn subschema_mut(&mut self, id: SubschemaId) -> Result<&mut Subschema, JsvError> {
        if id.schema != self.id {
            return Err(JsvError::ForeignSubschema);
        }
        if id.index == EMPTY_INDEX {
            return Err(JsvError::EmptySubschemaImmutable);
        }
        self.subschemas
            .get_mut(id.index)
            .ok_or(JsvError::ForeignSubschema)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
