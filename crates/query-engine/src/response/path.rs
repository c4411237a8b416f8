use std::fmt;

use query_value::Name;
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Location of a value inside the response, `["user", "friends", 0, "name"]`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Default)]
pub struct ErrorPath(Vec<ErrorPathSegment>);

impl std::ops::Deref for ErrorPath {
    type Target = Vec<ErrorPathSegment>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::ops::DerefMut for ErrorPath {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub enum ErrorPathSegment {
    Field(Name),
    Index(usize),
}

impl ErrorPath {
    /// A new path with `segment` appended.
    #[must_use]
    pub fn child(&self, segment: impl Into<ErrorPathSegment>) -> ErrorPath {
        let mut path = ErrorPath(Vec::with_capacity(self.0.len() + 1));
        path.0.extend(self.0.iter().cloned());
        path.0.push(segment.into());
        path
    }
}

impl From<Name> for ErrorPathSegment {
    fn from(name: Name) -> Self {
        ErrorPathSegment::Field(name)
    }
}

impl From<&str> for ErrorPathSegment {
    fn from(name: &str) -> Self {
        ErrorPathSegment::Field(Name::new(name))
    }
}

impl From<usize> for ErrorPathSegment {
    fn from(index: usize) -> Self {
        ErrorPathSegment::Index(index)
    }
}

impl<T: Into<ErrorPathSegment>> FromIterator<T> for ErrorPath {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        ErrorPath(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ErrorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            match segment {
                ErrorPathSegment::Field(name) => f.write_str(name)?,
                ErrorPathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

impl Serialize for ErrorPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for segment in &self.0 {
            match segment {
                ErrorPathSegment::Field(name) => seq.serialize_element(name.as_str())?,
                ErrorPathSegment::Index(index) => seq.serialize_element(index)?,
            }
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_serialize() {
        let path = ErrorPath::default().child("user").child("friends").child(0_usize).child("name");
        assert_eq!(path.to_string(), "user.friends.0.name");
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            serde_json::json!(["user", "friends", 0, "name"])
        );
    }
}
