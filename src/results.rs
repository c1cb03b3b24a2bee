//! Accumulation of validation errors.
//!
//! See the docs for [`ValidationResults`](struct.ValidationResults.html) for
//! more.

use json_pointer::JsonPointer;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::vec_deque::{self, VecDeque};

/// Marker at the front of every legacy context.
pub const ROOT_CONTEXT: &str = "<root>";

/// Whether a path segment traverses into an array or an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Array,
    Object,
}

/// One step from a value into one of its children.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Segment {
    kind: SegmentKind,
    name: String,
}

impl Segment {
    /// A step into the array element at `index`.
    pub fn index(index: usize) -> Self {
        Segment {
            kind: SegmentKind::Array,
            name: index.to_string(),
        }
    }

    /// A step into the object member called `name`.
    pub fn key<S: Into<String>>(name: S) -> Self {
        Segment {
            kind: SegmentKind::Object,
            name: name.into(),
        }
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// The member name, or the decimal array index.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The location of a value within the instance, from the root down.
pub type Path = Vec<Segment>;

/// A single problem with an instance when evaluated against a schema.
///
/// Note that, despite its name, `ValidationError` is not an error in the usual
/// Rust sense. It is an ordinary struct describing why some part of the
/// instance was unsatisfactory.
///
/// Only the [`Path`](type.Path.html) is stored. The legacy context and the
/// JSON Pointer are both rendered from it on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationError {
    path: Path,
    description: String,
}

impl ValidationError {
    /// An error for the value at `path`.
    pub fn new<S: Into<String>>(path: Path, description: S) -> Self {
        ValidationError {
            path,
            description: description.into(),
        }
    }

    /// The canonical location of the value that failed validation.
    pub fn path(&self) -> &[Segment] {
        &self.path
    }

    /// A human-readable explanation of the failure.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The legacy path to the value that failed validation.
    ///
    /// The first entry is always `"<root>"`, followed by `["name"]` for each
    /// object member and `[index]` for each array element.
    pub fn context(&self) -> Vec<String> {
        let mut context = Vec::with_capacity(self.path.len() + 1);
        context.push(ROOT_CONTEXT.to_owned());
        for segment in &self.path {
            context.push(match segment.kind {
                SegmentKind::Object => format!("[\"{}\"]", segment.name),
                SegmentKind::Array => format!("[{}]", segment.name),
            });
        }
        context
    }

    /// An RFC 6901 JSON Pointer to the value that failed validation.
    ///
    /// The empty string refers to the whole document.
    pub fn json_pointer(&self) -> String {
        let tokens: Vec<&str> = self.path.iter().map(Segment::name).collect();
        JsonPointer::new(tokens).to_string()
    }
}

impl Serialize for ValidationError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ValidationError", 3)?;
        state.serialize_field("context", &self.context())?;
        state.serialize_field("description", &self.description)?;
        state.serialize_field("jsonPointer", &self.json_pointer())?;
        state.end()
    }
}

/// A FIFO queue of the errors reported during validation.
///
/// Errors are pushed on to the back of the queue and popped from the front.
/// They are never reordered or deduplicated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationResults {
    errors: VecDeque<ValidationError>,
}

impl ValidationResults {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure of the value at `path`.
    pub fn push_error<S: Into<String>>(&mut self, path: &[Segment], description: S) {
        self.errors
            .push_back(ValidationError::new(path.to_vec(), description));
    }

    /// Append an existing error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push_back(error);
    }

    /// Remove and return the oldest error, if any.
    pub fn pop_error(&mut self) -> Option<ValidationError> {
        self.errors.pop_front()
    }

    /// The number of errors recorded.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Whether no errors were recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The errors from oldest to newest.
    pub fn iter(&self) -> vec_deque::Iter<'_, ValidationError> {
        self.errors.iter()
    }
}

impl IntoIterator for ValidationResults {
    type Item = ValidationError;
    type IntoIter = vec_deque::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationResults {
    type Item = &'a ValidationError;
    type IntoIter = vec_deque::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
