use std::fmt::{self, Display, Formatter, Write};

use indexmap::IndexMap;

use crate::Name;

/// A resolved value, without any variable reference.
///
/// Besides the GraphQL literal kinds, [`ConstValue::Map`] holds key/value collections whose keys
/// are arbitrary values. Resolvers and custom scalars may produce those, the parser never does.
/// The response formatter is responsible for turning them into something JSON can carry, same
/// for non-finite floats.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ConstValue {
    /// `null`.
    #[default]
    Null,
    /// An integer.
    Int(i64),
    /// A float, possibly not finite.
    Float(f64),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value.
    Enum(Name),
    /// A list of values.
    List(Vec<ConstValue>),
    /// An object, keys are kept in insertion order.
    Object(IndexMap<Name, ConstValue>),
    /// An opaque map with keys that aren't necessarily names.
    Map(Vec<(ConstValue, ConstValue)>),
}

impl ConstValue {
    /// Returns `true` for [`ConstValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The fields, if this is an object.
    pub fn as_object(&self) -> Option<&IndexMap<Name, ConstValue>> {
        match self {
            Self::Object(fields) => Some(fields),
            _ => None,
        }
    }

    /// Look up a key of an object, or a string key of an opaque map.
    pub fn get(&self, key: &str) -> Option<&ConstValue> {
        match self {
            Self::Object(fields) => fields.get(key),
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::String(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// A short description of the kind of value, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int(_) => "an integer",
            Self::Float(_) => "a float",
            Self::String(_) => "a string",
            Self::Boolean(_) => "a boolean",
            Self::Enum(_) => "an enum value",
            Self::List(_) => "a list",
            Self::Object(_) => "an object",
            Self::Map(_) => "a map",
        }
    }

    /// Build an object from `(key, value)` pairs.
    pub fn object<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Name>,
        V: Into<ConstValue>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Converts a JSON value.
    ///
    /// Integers that don't fit into an `i64` become floats.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(n) => Self::Int(n),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            serde_json::Value::Object(fields) => Self::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (Name::new(key), Self::from_json(value)))
                    .collect(),
            ),
        }
    }

    /// Convert into a [`Value`]. Opaque maps become objects if all their keys are strings,
    /// lists of `[key, value]` pairs otherwise.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Int(n) => Value::Int(n),
            Self::Float(n) => Value::Float(n),
            Self::String(s) => Value::String(s),
            Self::Boolean(b) => Value::Boolean(b),
            Self::Enum(name) => Value::Enum(name),
            Self::List(items) => Value::List(items.into_iter().map(Self::into_value).collect()),
            Self::Object(fields) => Value::Object(fields.into_iter().map(|(k, v)| (k, v.into_value())).collect()),
            Self::Map(entries) => {
                if entries.iter().all(|(key, _)| matches!(key, Self::String(_))) {
                    Value::Object(
                        entries
                            .into_iter()
                            .map(|(key, value)| (Name::new(key.as_str().unwrap_or_default()), value.into_value()))
                            .collect(),
                    )
                } else {
                    Value::List(
                        entries
                            .into_iter()
                            .map(|(key, value)| Value::List(vec![key.into_value(), value.into_value()]))
                            .collect(),
                    )
                }
            }
        }
    }
}

impl From<()> for ConstValue {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl From<bool> for ConstValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i32> for ConstValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for ConstValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ConstValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConstValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConstValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<ConstValue>> From<Vec<T>> for ConstValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ConstValue>> From<Option<T>> for ConstValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

impl From<serde_json::Value> for ConstValue {
    fn from(value: serde_json::Value) -> Self {
        Self::from_json(value)
    }
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write_float(f, *n),
            Self::String(s) => write_quoted(f, s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Enum(name) => f.write_str(name),
            Self::List(items) => write_list(f, items),
            Self::Object(fields) => write_object(f, fields.iter()),
            Self::Map(entries) => {
                f.write_char('{')?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_char('}')
            }
        }
    }
}

/// A literal as found in a document: like [`ConstValue`] but it may reference variables.
///
/// [Reference](https://spec.graphql.org/October2021/#Value).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A variable reference, without the `$`.
    Variable(Name),
    /// `null`.
    Null,
    /// An integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum value.
    Enum(Name),
    /// A list of values.
    List(Vec<Value>),
    /// An object.
    Object(IndexMap<Name, Value>),
}

impl Value {
    /// Attempt to convert the value into a const value, failing on the first variable.
    pub fn into_const(self) -> Option<ConstValue> {
        self.into_const_with(|_| Err(())).ok()
    }

    /// Convert the value into a const value, resolving variables with `f`.
    pub fn into_const_with<E>(self, mut f: impl FnMut(Name) -> Result<ConstValue, E>) -> Result<ConstValue, E> {
        self.into_const_with_mut(&mut f)
    }

    fn into_const_with_mut<E>(self, f: &mut impl FnMut(Name) -> Result<ConstValue, E>) -> Result<ConstValue, E> {
        Ok(match self {
            Self::Variable(name) => f(name)?,
            Self::Null => ConstValue::Null,
            Self::Int(n) => ConstValue::Int(n),
            Self::Float(n) => ConstValue::Float(n),
            Self::String(s) => ConstValue::String(s),
            Self::Boolean(b) => ConstValue::Boolean(b),
            Self::Enum(name) => ConstValue::Enum(name),
            Self::List(items) => ConstValue::List(
                items
                    .into_iter()
                    .map(|item| item.into_const_with_mut(f))
                    .collect::<Result<_, _>>()?,
            ),
            Self::Object(fields) => ConstValue::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| Ok((key, value.into_const_with_mut(f)?)))
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// All the variables referenced by this value, in order of appearance.
    pub fn referenced_variables(&self) -> Vec<&Name> {
        let mut vars = Vec::new();
        referenced_variables_to_vec(self, &mut vars);
        vars
    }

    /// Returns `true` if the value doesn't reference any variable.
    pub fn is_const(&self) -> bool {
        match self {
            Self::Variable(_) => false,
            Self::List(items) => items.iter().all(Self::is_const),
            Self::Object(fields) => fields.values().all(Self::is_const),
            _ => true,
        }
    }
}

fn referenced_variables_to_vec<'a>(value: &'a Value, vars: &mut Vec<&'a Name>) {
    match value {
        Value::Variable(name) => vars.push(name),
        Value::List(values) => values.iter().for_each(|value| referenced_variables_to_vec(value, vars)),
        Value::Object(obj) => obj.values().for_each(|value| referenced_variables_to_vec(value, vars)),
        _ => {}
    }
}

impl From<ConstValue> for Value {
    fn from(value: ConstValue) -> Self {
        value.into_value()
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable(name) => write!(f, "${name}"),
            Self::Null => f.write_str("null"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write_float(f, *n),
            Self::String(s) => write_quoted(f, s),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Enum(name) => f.write_str(name),
            Self::List(items) => write_list(f, items),
            Self::Object(fields) => write_object(f, fields.iter()),
        }
    }
}

fn write_float(f: &mut Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
        write!(f, "{n:.1}")
    } else {
        write!(f, "{n}")
    }
}

fn write_quoted(f: &mut Formatter<'_>, s: &str) -> fmt::Result {
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '\r' => f.write_str("\\r"),
            '\n' => f.write_str("\\n"),
            '\t' => f.write_str("\\t"),
            '"' => f.write_str("\\\""),
            '\\' => f.write_str("\\\\"),
            c if c.is_control() => write!(f, "\\u{:04X}", c as u32),
            c => f.write_char(c),
        }?;
    }
    f.write_char('"')
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_char('[')?;
    for (i, item) in items.iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        item.fmt(f)?;
    }
    f.write_char(']')
}

fn write_object<'a, T: Display + 'a>(
    f: &mut Formatter<'_>,
    fields: impl Iterator<Item = (&'a Name, &'a T)>,
) -> fmt::Result {
    f.write_char('{')?;
    for (i, (name, value)) in fields.enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        write!(f, "{name}: {value}")?;
    }
    f.write_char('}')
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_uses_graphql_syntax() {
        let value = ConstValue::object([
            ("name", ConstValue::from("Ada \"Countess\"")),
            ("age", ConstValue::from(36)),
            ("score", ConstValue::from(2.0)),
            ("role", ConstValue::Enum(Name::new("ADMIN"))),
            ("tags", ConstValue::from(vec!["a", "b"])),
        ]);

        assert_eq!(
            value.to_string(),
            r#"{name: "Ada \"Countess\"", age: 36, score: 2.0, role: ADMIN, tags: ["a", "b"]}"#
        );
    }

    #[test]
    fn into_const_fails_on_variables() {
        let value = Value::List(vec![Value::Int(1), Value::Variable(Name::new("x"))]);
        assert!(!value.is_const());
        assert_eq!(value.referenced_variables(), vec![&Name::new("x")]);
        assert_eq!(value.into_const(), None);
    }

    #[test]
    fn into_const_with_substitutes_variables() {
        let value = Value::Object([(Name::new("id"), Value::Variable(Name::new("id")))].into_iter().collect());
        let value = value
            .into_const_with(|name| Ok::<_, ()>(ConstValue::String(format!("value of {name}"))))
            .unwrap();

        assert_eq!(value, ConstValue::object([("id", "value of id")]));
    }

    #[test]
    fn from_json_keeps_field_order() {
        let json = serde_json::json!({"z": 1, "a": [true, null, 1.5], "m": {"k": "v"}});
        let value = ConstValue::from_json(json);

        assert_eq!(
            value,
            ConstValue::object([
                ("z", ConstValue::Int(1)),
                (
                    "a",
                    ConstValue::List(vec![ConstValue::Boolean(true), ConstValue::Null, ConstValue::Float(1.5)])
                ),
                ("m", ConstValue::object([("k", "v")])),
            ])
        );
    }

    #[test]
    fn map_lookup_only_matches_string_keys() {
        let map = ConstValue::Map(vec![
            (ConstValue::Int(1), ConstValue::from("one")),
            (ConstValue::from("two"), ConstValue::from(2)),
        ]);

        assert_eq!(map.get("two"), Some(&ConstValue::Int(2)));
        assert_eq!(map.get("1"), None);
    }
}
