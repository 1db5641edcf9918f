//! Lookup over ordered name/value lists, such as message headers.

use serde::{Deserialize, Serialize};

/// A named value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property<V> {
    /// Entry name.
    pub name: String,
    /// Entry value.
    pub value: V,
}

impl<V> Property<V> {
    /// Creates a property.
    pub fn new(name: impl Into<String>, value: V) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Anything with a name and a value.
pub trait NamedValue {
    /// Value type.
    type Value;

    /// Entry name.
    fn name(&self) -> &str;

    /// Entry value.
    fn value(&self) -> &Self::Value;
}

impl<V> NamedValue for Property<V> {
    type Value = V;

    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> &V {
        &self.value
    }
}

impl<K: AsRef<str>, V> NamedValue for (K, V) {
    type Value = V;

    fn name(&self) -> &str {
        self.0.as_ref()
    }

    fn value(&self) -> &V {
        &self.1
    }
}

/// Returns the value of the first entry named exactly `name`.
pub fn find_property<'a, T, I>(list: I, name: &str) -> Option<&'a T::Value>
where
    T: NamedValue + 'a,
    I: IntoIterator<Item = &'a T>,
{
    list.into_iter()
        .find(|entry| entry.name() == name)
        .map(NamedValue::value)
}
