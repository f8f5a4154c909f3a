use std::borrow::{Borrow, Cow};
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Dotted address of a field inside the form model.
///
/// Keys are built by joining issue path segments with `.`. Array positions
/// are written as bare integers, so the first entry of `others.c` is
/// `others.c.0`. A root-level issue maps to the empty key.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldKey(Cow<'static, str>);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(Cow::Borrowed(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Key of `segment` below `prefix`, or `segment` itself at the root.
    pub fn under(prefix: Option<&FieldKey>, segment: &'static str) -> Self {
        match prefix {
            Some(prefix) if !prefix.is_root() => prefix.child(segment),
            _ => Self::new(segment),
        }
    }

    pub fn child(&self, segment: impl Display) -> Self {
        if self.is_root() {
            return Self(Cow::Owned(segment.to_string()));
        }
        Self(Cow::Owned(format!("{}.{segment}", self.0)))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(index)
    }

    pub fn from_path(path: &[PathSegment]) -> Self {
        let mut joined = String::new();
        for (position, segment) in path.iter().enumerate() {
            if position > 0 {
                joined.push('.');
            }
            match segment {
                PathSegment::Key(key) => joined.push_str(key),
                PathSegment::Index(index) => joined.push_str(&index.to_string()),
            }
        }
        Self(Cow::Owned(joined))
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FieldKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for FieldKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for FieldKey {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FieldKey {
    fn from(value: String) -> Self {
        Self(Cow::Owned(value))
    }
}

impl From<&FieldKey> for FieldKey {
    fn from(value: &FieldKey) -> Self {
        value.clone()
    }
}

impl PartialEq<str> for FieldKey {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for FieldKey {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// One step of an issue path: an object key or an array position.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(value: &str) -> Self {
        Self::Key(value.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(value: String) -> Self {
        Self::Key(value)
    }
}

impl From<usize> for PathSegment {
    fn from(value: usize) -> Self {
        Self::Index(value)
    }
}
