use std::fmt::{self, Debug, Formatter};
use std::slice;
use std::sync::Arc;

/// A single captured path parameter.
///
/// For the route `/user/:name` and the request path `/user/ray`, the key is `name` and the value is `ray`.
#[derive(Clone, PartialEq, Eq)]
pub struct Param {
    key: Arc<str>,
    value: String,
}

impl Param {
    pub(crate) fn new(key: Arc<str>, value: impl Into<String>) -> Param {
        Param {
            key,
            value: value.into(),
        }
    }

    /// The parameter name, as declared in the route path without the leading `:`.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The path segment captured for this parameter.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl Debug for Param {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.key, self.value)
    }
}

/// The parameters captured by one route match, in the order their segments were matched.
///
/// Keys are not required to be unique; [`get`](Params::get) returns the first match.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: Vec<Param>,
}

impl Params {
    /// Creates an empty parameter list.
    pub fn new() -> Params {
        Params::default()
    }

    /// Returns the value of the first parameter named `key`.
    ///
    /// # Examples
    ///
    /// ```
    /// use trellis::{handler_fn, Context, Params, Tree};
    ///
    /// let mut tree = Tree::new();
    /// tree.add_route("/users/:user/books/:book", Vec::new(), handler_fn(|_: &mut Context| {})).unwrap();
    ///
    /// let matched = tree.find_route("/users/alice/books/dune").unwrap();
    /// let params: Params = matched.params.unwrap();
    /// assert_eq!(params.get("user"), Some("alice"));
    /// assert_eq!(params.get("book"), Some("dune"));
    /// assert_eq!(params.get("page"), None);
    /// ```
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.iter().find(|p| p.key() == key).map(Param::value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Param> {
        self.inner.iter()
    }

    pub(crate) fn push(&mut self, param: Param) {
        self.inner.push(param);
    }

    // Keeps the backing storage so a pooled context can reuse it.
    pub(crate) fn clear(&mut self) {
        self.inner.clear();
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.inner.truncate(len);
    }

    #[cfg(test)]
    pub(crate) fn capacity(&self) -> usize {
        self.inner.capacity()
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Into<Arc<str>>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params {
            inner: iter.into_iter().map(|(k, v)| Param::new(k.into(), v)).collect(),
        }
    }
}

impl Debug for Params {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.iter()).finish()
    }
}
