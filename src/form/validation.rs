use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::Serialize;
use tracing::trace;

use super::key::{FieldKey, PathSegment};

/// A single failure reported by a [`Schema`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Issue {
    pub path: Vec<PathSegment>,
    pub message: String,
}

impl Issue {
    pub fn new<P, S>(path: P, message: impl Into<String>) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }

    /// Issue raised against the value as a whole.
    pub fn root(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// Re-roots the issue below `segment`, as an object-level check on a
    /// nested value would report it.
    pub fn within(mut self, segment: impl Into<PathSegment>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    pub fn key(&self) -> FieldKey {
        FieldKey::from_path(&self.path)
    }
}

impl Display for Issue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let key = self.key();
        if key.is_root() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{key}: {}", self.message)
        }
    }
}

/// The validation capability a form is bound to.
///
/// Rules live entirely behind this trait; the controller only consumes the
/// ordered issue list.
pub trait Schema<T>: Send + Sync {
    fn validate(&self, value: &T) -> Result<(), Vec<Issue>>;
}

impl<T, F> Schema<T> for F
where
    F: Fn(&T) -> Result<(), Vec<Issue>> + Send + Sync,
{
    fn validate(&self, value: &T) -> Result<(), Vec<Issue>> {
        (self)(value)
    }
}

/// Two schemas run in sequence; issues from `first` come before `second`'s.
#[derive(Clone, Debug)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<T, A, B> Schema<T> for Chain<A, B>
where
    A: Schema<T>,
    B: Schema<T>,
{
    fn validate(&self, value: &T) -> Result<(), Vec<Issue>> {
        let mut issues = self.first.validate(value).err().unwrap_or_default();
        if let Err(more) = self.second.validate(value) {
            issues.extend(more);
        }
        if issues.is_empty() { Ok(()) } else { Err(issues) }
    }
}

pub trait SchemaExt<T>: Schema<T> + Sized {
    /// Adds checks that run after this schema, e.g. cross-field rules a
    /// declarative schema cannot express.
    fn and_then<S>(self, next: S) -> Chain<Self, S>
    where
        S: Schema<T>,
    {
        Chain {
            first: self,
            second: next,
        }
    }
}

impl<T, S> SchemaExt<T> for S where S: Schema<T> {}

/// Models with typed field-key accessors, usually derived.
pub trait FormModel: Sized {
    type Fields;

    fn fields_under(prefix: Option<FieldKey>) -> Self::Fields;

    fn fields() -> Self::Fields {
        Self::fields_under(None)
    }
}

/// Field key to message, one entry per key.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ErrorMap(BTreeMap<FieldKey, String>);

impl ErrorMap {
    pub fn get(&self, key: impl AsRef<str>) -> Option<&str> {
        self.0.get(key.as_ref()).map(String::as_str)
    }

    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.0.contains_key(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &str)> {
        self.0.iter().map(|(key, message)| (key, message.as_str()))
    }

    pub fn into_inner(self) -> BTreeMap<FieldKey, String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ErrorMap {
    type Item = (&'a FieldKey, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, FieldKey, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Projects schema issues onto the flat key space.
///
/// Issues are applied in reported order, so when several issues share a key
/// the last one wins. Keys outside `restrict_to` are dropped. An empty result
/// is reported as `None`.
pub(super) fn project_issues(
    issues: Vec<Issue>,
    restrict_to: Option<&[FieldKey]>,
) -> Option<ErrorMap> {
    let reported = issues.len();
    let mut errors = BTreeMap::new();
    for issue in issues {
        let key = issue.key();
        if restrict_to.is_some_and(|keys| !keys.contains(&key)) {
            continue;
        }
        errors.insert(key, issue.message);
    }
    trace!(reported, visible = errors.len(), "projected schema issues");
    (!errors.is_empty()).then_some(ErrorMap(errors))
}
