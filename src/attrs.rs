//! Dataset attributes: an ordered `string -> (string | number)` map.

/// The value of a single attribute.
///
/// Per DESIGN.md, numeric attributes are treated as first-class: they carry a real dtype and
/// round-trip to the same value, rather than being stringified.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    /// A UTF-8 string value.
    Str(String),
    /// A `float64` value.
    F64(f64),
    /// An `int64` value.
    I64(i64),
}

/// An ordered collection of named attributes attached to a dataset.
///
/// Insertion order is preserved and is the order attributes are emitted in the object header.
#[derive(Clone, Debug, Default)]
pub struct Attributes {
    entries: Vec<(String, AttrValue)>,
}

impl Attributes {
    /// An empty attribute set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an attribute, replacing any existing value with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: AttrValue) -> &mut Self {
        let name = name.into();
        if let Some(existing) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.entries.push((name, value));
        }
        self
    }

    /// Builder-style variant of [`Self::insert`].
    pub fn with(mut self, name: impl Into<String>, value: AttrValue) -> Self {
        self.insert(name, value);
        self
    }

    /// Iterates attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(String, AttrValue)> {
        self.entries.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
