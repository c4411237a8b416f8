//! GraphQL types.
//!
//! The root type is [`ExecutableDocument`], representing an executable GraphQL query.
//!
//! This follows the [October 2021 edition of the GraphQL spec](https://spec.graphql.org/October2021/).

mod executable;

use std::fmt::{self, Display, Formatter, Write};

pub use executable::*;
use query_value::{Name, Value};
use serde::{Deserialize, Serialize};

use crate::pos::Positioned;

/// The type of an operation; `query`, `mutation` or `subscription`.
///
/// [Reference](https://spec.graphql.org/October2021/#OperationType).
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// A query.
    Query,
    /// A mutation.
    Mutation,
    /// A subscription.
    Subscription,
}

impl OperationType {
    /// Operation type as str
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }

    /// Returns `true` if the operation type is [`Mutation`].
    ///
    /// [`Mutation`]: OperationType::Mutation
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        matches!(self, Self::Mutation)
    }
}

impl AsRef<str> for OperationType {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// A GraphQL type, for example `String` or `[String!]!`.
///
/// [Reference](https://spec.graphql.org/October2021/#Type).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Type {
    /// The base type.
    pub base: BaseType,
    /// Whether the type is nullable.
    pub nullable: bool,
}

impl Type {
    /// Create a type from the type string.
    #[must_use]
    pub fn new(ty: &str) -> Option<Self> {
        let (nullable, ty) = ty.strip_suffix('!').map_or((true, ty), |rest| (false, rest));

        Some(Self {
            base: if let Some(ty) = ty.strip_prefix('[') {
                BaseType::List(Box::new(Self::new(ty.strip_suffix(']')?)?))
            } else {
                if !Name::is_valid(ty) {
                    return None;
                }
                BaseType::Named(Name::new(ty))
            },
            nullable,
        })
    }

    /// Create a required Type
    pub fn required(base: BaseType) -> Self {
        Type { base, nullable: false }
    }

    /// Create a nullable Type
    pub fn nullable(base: BaseType) -> Self {
        Type { base, nullable: true }
    }

    /// The innermost named type, `User` for `[User!]!`.
    pub fn named_type(&self) -> &Name {
        self.base.named_type()
    }

    /// The type of the items if this is a list type.
    pub fn list_item(&self) -> Option<&Type> {
        match &self.base {
            BaseType::List(item) => Some(item),
            BaseType::Named(_) => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.base.fmt(f)?;
        if !self.nullable {
            f.write_char('!')?;
        }
        Ok(())
    }
}

impl From<Type> for String {
    fn from(val: Type) -> Self {
        format!("{val}")
    }
}

/// A GraphQL base type, for example `String` or `[String!]`. This does not include whether the
/// type is nullable; for that see [Type](struct.Type.html).
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum BaseType {
    /// A named type, such as `String`.
    Named(Name),
    /// A list type, such as `[String]`.
    List(Box<Type>),
}

impl BaseType {
    /// Create a new named BaseType
    pub fn named(name: &str) -> BaseType {
        BaseType::Named(Name::new(name))
    }

    /// Create a new list BaseType
    pub fn list(ty: Type) -> BaseType {
        BaseType::List(Box::new(ty))
    }

    /// Check the base type is a list
    pub fn is_list(&self) -> bool {
        matches!(self, BaseType::List(_))
    }

    fn named_type(&self) -> &Name {
        match self {
            BaseType::Named(name) => name,
            BaseType::List(item) => item.base.named_type(),
        }
    }
}

impl Display for BaseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::List(ty) => write!(f, "[{ty}]"),
        }
    }
}

/// A GraphQL directive, such as `@skip(if: $hidden)`.
///
/// [Reference](https://spec.graphql.org/October2021/#Directive).
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    /// The name of the directive.
    pub name: Positioned<Name>,
    /// The arguments to the directive.
    pub arguments: Vec<(Positioned<Name>, Positioned<Value>)>,
}

impl Directive {
    /// Get the argument with the given name.
    #[must_use]
    pub fn get_argument(&self, name: &str) -> Option<&Positioned<Value>> {
        self.arguments
            .iter()
            .find(|item| item.0.node == name)
            .map(|item| &item.1)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn type_from_str() {
        let ty = Type::new("[User!]!").unwrap();
        assert_eq!(ty, Type::required(BaseType::list(Type::required(BaseType::named("User")))));
        assert_eq!(ty.to_string(), "[User!]!");
        assert_eq!(ty.named_type(), "User");
        assert_eq!(ty.list_item().map(ToString::to_string), Some("User!".to_string()));

        assert_eq!(Type::new("[User"), None);
        assert_eq!(Type::new("Us-er"), None);
    }
}
