//! Sample-driven type inference.
//!
//! A single example document is turned into a [`TypeSpec`] tree. The rules
//! are heuristics and are kept stable on purpose, generated code depends on
//! them:
//!
//! - arrays are typed from their **first element only**;
//! - an empty array is `List(dynamic)`;
//! - an empty object is still a concrete zero-field class;
//! - `null` is `dynamic`.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::error::DomainError;

/// A sample document as read from disk.
pub type SampleValue = Value;

static DATE_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d{4}-\d{2}-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)?(?:Z|[+-]\d{2}:?\d{2})?$",
    )
    .expect("date-time pattern is valid")
});

/// Leaf types a sample value can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Int,
    Double,
    Bool,
    String,
    DateTime,
    Dynamic,
}

impl Primitive {
    /// Dart spelling of the type.
    pub const fn dart(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Double => "double",
            Self::Bool => "bool",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dart())
    }
}

/// Ordered field set of an object node. Field names are unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectShape {
    fields: Vec<(String, TypeSpec)>,
}

impl ObjectShape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing the type of an existing field with the same
    /// name in place so the original position is kept.
    pub fn insert(&mut self, name: impl Into<String>, spec: TypeSpec) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = spec,
            None => self.fields.push((name, spec)),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, spec: TypeSpec) -> Self {
        self.insert(name, spec);
        self
    }

    pub fn get(&self, name: &str) -> Option<&TypeSpec> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &TypeSpec)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of object nodes in this tree, the root included.
    pub fn object_count(&self) -> usize {
        1 + self
            .fields
            .iter()
            .map(|(_, spec)| spec.object_count())
            .sum::<usize>()
    }
}

/// Inferred type of one sample node.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSpec {
    Primitive(Primitive),
    Object(ObjectShape),
    List(Box<TypeSpec>),
}

impl TypeSpec {
    pub const DYNAMIC: TypeSpec = TypeSpec::Primitive(Primitive::Dynamic);

    pub fn list_of(element: TypeSpec) -> Self {
        Self::List(Box::new(element))
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Primitive(Primitive::Dynamic))
    }

    /// The object shape at the bottom of any list nesting, if there is one.
    pub fn innermost_object(&self) -> Option<&ObjectShape> {
        match self {
            Self::Object(shape) => Some(shape),
            Self::List(element) => element.innermost_object(),
            Self::Primitive(_) => None,
        }
    }

    fn object_count(&self) -> usize {
        match self {
            Self::Primitive(_) => 0,
            Self::Object(shape) => shape.object_count(),
            Self::List(element) => element.object_count(),
        }
    }
}

/// Infer the type of one sample value.
pub fn infer(sample: &SampleValue) -> TypeSpec {
    match sample {
        Value::Null => TypeSpec::DYNAMIC,
        Value::Bool(_) => TypeSpec::Primitive(Primitive::Bool),
        Value::Number(n) if n.is_i64() || n.is_u64() => TypeSpec::Primitive(Primitive::Int),
        Value::Number(_) => TypeSpec::Primitive(Primitive::Double),
        Value::String(s) if is_date_time(s) => TypeSpec::Primitive(Primitive::DateTime),
        Value::String(_) => TypeSpec::Primitive(Primitive::String),
        Value::Array(items) => match items.first() {
            Some(first) => TypeSpec::list_of(infer(first)),
            None => TypeSpec::list_of(TypeSpec::DYNAMIC),
        },
        Value::Object(map) => {
            let mut shape = ObjectShape::new();
            for (key, value) in map {
                shape.insert(key.as_str(), infer(value));
            }
            TypeSpec::Object(shape)
        }
    }
}

/// Infer the root shape of a whole sample document.
///
/// The root must be an object, or an array whose first element is an
/// object. An empty root array gives an empty shape.
pub fn infer_document(sample: &SampleValue, origin: &Path) -> Result<ObjectShape, DomainError> {
    let root = match sample {
        Value::Array(items) => match items.first() {
            None => return Ok(ObjectShape::new()),
            Some(first) => first,
        },
        other => other,
    };

    match infer(root) {
        TypeSpec::Object(shape) => Ok(shape),
        other => Err(DomainError::SampleFormat {
            path: origin.to_path_buf(),
            reason: format!("expected a JSON object at the root, found {}", describe(&other)),
        }),
    }
}

/// Root shape of a sample document, and whether the document was a
/// collection of such objects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SampleDocument {
    pub shape: ObjectShape,
    pub many: bool,
}

/// Like [`infer_document`], remembering whether the root was an array.
pub fn infer_sample(sample: &SampleValue, origin: &Path) -> Result<SampleDocument, DomainError> {
    Ok(SampleDocument {
        shape: infer_document(sample, origin)?,
        many: sample.is_array(),
    })
}

/// Whether a string looks like an ISO-8601 date or date-time.
pub fn is_date_time(value: &str) -> bool {
    DATE_TIME.is_match(value)
}

fn describe(spec: &TypeSpec) -> &'static str {
    match spec {
        TypeSpec::Primitive(Primitive::Dynamic) => "null",
        TypeSpec::Primitive(Primitive::Bool) => "a boolean",
        TypeSpec::Primitive(Primitive::Int | Primitive::Double) => "a number",
        TypeSpec::Primitive(_) => "a string",
        TypeSpec::List(_) => "an array",
        TypeSpec::Object(_) => "an object",
    }
}
