use std::{
    borrow::Borrow,
    fmt::{self, Display, Formatter},
    ops::Deref,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// A GraphQL name.
///
/// Names are shared across the document, the schema and the response, so cloning one only
/// bumps a reference count.
///
/// [Reference](https://spec.graphql.org/October2021/#Name).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a new name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().into())
    }

    /// Get the name as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the string is a valid GraphQL name: `/[_A-Za-z][_0-9A-Za-z]*/`.
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
            && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for Name {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl PartialEq<String> for Name {
    fn eq(&self, other: &String) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<Name> for str {
    fn eq(&self, other: &Name) -> bool {
        other == self
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Self(name.into())
    }
}

impl From<Name> for String {
    fn from(name: Name) -> Self {
        name.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::Name;

    #[test]
    fn valid_names() {
        assert!(Name::is_valid("user"));
        assert!(Name::is_valid("_private2"));
        assert!(Name::is_valid("__typename"));
        assert!(!Name::is_valid(""));
        assert!(!Name::is_valid("2fast"));
        assert!(!Name::is_valid("kebab-case"));
    }

    #[test]
    fn compares_with_strings() {
        let name = Name::new("user");
        assert_eq!(name, "user");
        assert_eq!(name, String::from("user"));
        assert_eq!(name.to_string(), "user");
    }
}
