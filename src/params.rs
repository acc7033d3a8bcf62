use std::ops::Index;

/// A single URL parameter, consisting of a key and a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub key: String,
    pub value: String,
}

/// The parameters captured while routing a request.
///
/// Parameters are kept in the order they were captured. A nested router that
/// captures a key already present replaces its value in place, so the deepest
/// match wins.
/// ```rust
/// use nestrouter::Params;
///
/// let mut params = Params::default();
/// params.insert("id", "1");
/// params.insert("id", "42");
///
/// assert_eq!(params.get("id"), Some("42"));
/// assert_eq!(params.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<Param>);

impl Params {
    /// Returns the value of the parameter registered under the given key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        let key = key.as_ref();
        self.0
            .iter()
            .find(|param| param.key == key)
            .map(|param| param.value.as_str())
    }

    /// Inserts a parameter, overwriting the value of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|param| param.key == key) {
            Some(param) => param.value = value,
            None => self.0.push(Param { key, value }),
        }
    }

    /// Merges another set of parameters into this one, `other` winning on
    /// colliding keys.
    pub fn merge(&mut self, other: Params) {
        for Param { key, value } in other.0 {
            self.insert(key, value);
        }
    }

    /// Returns an iterator over the keys and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|param| (param.key.as_str(), param.value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<usize> for Params {
    type Output = Param;

    fn index(&self, i: usize) -> &Self::Output {
        &self.0[i]
    }
}
