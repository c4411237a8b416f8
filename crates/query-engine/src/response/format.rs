//! Conversion of responses into JSON.
//!
//! Formatting never fails: values JSON has no representation for are rewritten. Non-finite
//! floats become the strings `"NaN"`, `"Infinity"` and `"-Infinity"`, and opaque maps become
//! objects with stringified keys, the first occurrence of a key winning.

use query_value::ConstValue;
use serde_json::{Map, Number, Value};

use super::{GraphqlError, Response};

impl Response {
    /// The response envelope, `{"data": ..., "errors": [...]}`.
    ///
    /// `data` is left out when the request failed before execution and `errors` when there
    /// are none.
    pub fn to_json(&self) -> Value {
        let mut envelope = Map::new();
        if let Some(data) = &self.data {
            envelope.insert("data".into(), value_to_json(data));
        }
        if !self.errors.is_empty() {
            envelope.insert(
                "errors".into(),
                Value::Array(
                    self.errors
                        .iter()
                        .map(|error| error_to_json(error, self.include_error_codes))
                        .collect(),
                ),
            );
        }
        Value::Object(envelope)
    }
}

impl serde::Serialize for Response {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Converts a result value into JSON.
pub fn value_to_json(value: &ConstValue) -> Value {
    match value {
        ConstValue::Null => Value::Null,
        ConstValue::Int(n) => Value::Number((*n).into()),
        ConstValue::Float(n) => float_to_json(*n),
        ConstValue::String(s) => Value::String(s.clone()),
        ConstValue::Boolean(b) => Value::Bool(*b),
        ConstValue::Enum(name) => Value::String(name.to_string()),
        ConstValue::List(items) => Value::Array(items.iter().map(value_to_json).collect()),
        ConstValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.to_string(), value_to_json(value)))
                .collect(),
        ),
        ConstValue::Map(entries) => {
            let mut object = Map::with_capacity(entries.len());
            for (key, value) in entries {
                let key = map_key(key);
                if !object.contains_key(&key) {
                    object.insert(key, value_to_json(value));
                }
            }
            Value::Object(object)
        }
    }
}

fn float_to_json(n: f64) -> Value {
    match Number::from_f64(n) {
        Some(number) => Value::Number(number),
        None if n.is_nan() => Value::String("NaN".into()),
        None if n.is_sign_positive() => Value::String("Infinity".into()),
        None => Value::String("-Infinity".into()),
    }
}

fn map_key(key: &ConstValue) -> String {
    match key {
        ConstValue::String(s) => s.clone(),
        ConstValue::Enum(name) => name.to_string(),
        ConstValue::Null => "null".into(),
        ConstValue::Int(n) => n.to_string(),
        ConstValue::Boolean(b) => b.to_string(),
        ConstValue::Float(n) => match float_to_json(*n) {
            Value::String(s) => s,
            other => other.to_string(),
        },
        ConstValue::List(_) | ConstValue::Object(_) | ConstValue::Map(_) => value_to_json(key).to_string(),
    }
}

fn error_to_json(error: &GraphqlError, include_code: bool) -> Value {
    let mut object = Map::new();
    object.insert("message".into(), Value::String(error.message.to_string()));

    if !error.locations.is_empty() {
        object.insert(
            "locations".into(),
            Value::Array(
                error
                    .locations
                    .iter()
                    .map(|pos| serde_json::json!({"line": pos.line, "column": pos.column}))
                    .collect(),
            ),
        );
    }

    if let Some(path) = &error.path {
        object.insert("path".into(), serde_json::to_value(path).unwrap_or_default());
    }

    let mut extensions: Map<String, Value> = error
        .extensions
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    if include_code {
        extensions.insert("code".into(), Value::String(error.code.to_string()));
    }
    if !extensions.is_empty() {
        object.insert("extensions".into(), Value::Object(extensions));
    }

    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use query_parser::Pos;
    use query_value::Name;
    use rstest::rstest;

    use super::*;
    use crate::{ErrorCode, ErrorPath};

    #[rstest]
    #[case::int(ConstValue::Int(-42))]
    #[case::float(ConstValue::Float(1.5))]
    #[case::integral_float(ConstValue::Float(2.0))]
    #[case::string(ConstValue::from("Ada"))]
    #[case::boolean(ConstValue::Boolean(true))]
    #[case::null(ConstValue::Null)]
    #[case::list(ConstValue::List(vec![ConstValue::Int(1), ConstValue::Null, ConstValue::from("x")]))]
    #[case::nested_objects(ConstValue::object([
        ("zeta", ConstValue::object([("b", ConstValue::Int(1)), ("a", ConstValue::Float(0.25))])),
        ("alpha", ConstValue::List(vec![ConstValue::object([("id", ConstValue::from("1"))])])),
        ("mid", ConstValue::Null),
    ]))]
    fn representable_data_survives_a_json_round_trip(#[case] value: ConstValue) {
        let json = value_to_json(&value);
        assert_eq!(ConstValue::from_json(json.clone()), value);
        assert_eq!(serde_json::from_str::<Value>(&json.to_string()).unwrap(), json);
    }

    #[test]
    fn round_trip_keeps_field_order() {
        let value = ConstValue::object([("b", 1), ("a", 2), ("c", 3)].map(|(key, n)| (key, ConstValue::Int(n))));
        let text = value_to_json(&value).to_string();
        assert_eq!(text, r#"{"b":1,"a":2,"c":3}"#);

        let back = ConstValue::from_json(serde_json::from_str(&text).unwrap());
        let keys = back.as_object().unwrap().keys().map(Name::as_str).collect::<Vec<_>>();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn non_finite_floats_become_strings() {
        let value = ConstValue::List(vec![
            ConstValue::Float(f64::NAN),
            ConstValue::Float(f64::INFINITY),
            ConstValue::Float(f64::NEG_INFINITY),
            ConstValue::Float(1.5),
        ]);

        insta::assert_json_snapshot!(value_to_json(&value), @r###"
        [
          "NaN",
          "Infinity",
          "-Infinity",
          1.5
        ]
        "###);
    }

    #[test]
    fn map_keys_are_stringified_and_first_wins() {
        let value = ConstValue::Map(vec![
            (ConstValue::Int(1), ConstValue::from("int")),
            (ConstValue::from("1"), ConstValue::from("string")),
            (ConstValue::Enum(Name::new("RED")), ConstValue::from("enum")),
            (ConstValue::Float(f64::NAN), ConstValue::from("nan")),
            (ConstValue::List(vec![ConstValue::Int(1), ConstValue::Boolean(true)]), ConstValue::Null),
        ]);

        insta::assert_json_snapshot!(value_to_json(&value), @r###"
        {
          "1": "int",
          "RED": "enum",
          "NaN": "nan",
          "[1,true]": null
        }
        "###);
    }

    #[test]
    fn object_order_is_preserved() {
        let value = ConstValue::object([("z", 1), ("a", 2), ("m", 3)]);
        assert_eq!(value_to_json(&value).to_string(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn errors_only_envelope() {
        let response = Response::request_errors([GraphqlError::new(
            "missing required variable id",
            ErrorCode::VariableError,
        )]);
        assert_eq!(
            response.to_json().to_string(),
            r#"{"errors":[{"message":"missing required variable id"}]}"#
        );
    }

    #[test]
    fn error_fields_order() {
        let response = Response::new(ConstValue::object([("user", ConstValue::Null)]))
            .with_errors([GraphqlError::new("boom", ErrorCode::ExecutionError)
                .with_location(Pos::new(1, 3))
                .with_path(ErrorPath::from_iter(["user"]))
                .with_extension("retry", false)])
            .with_error_codes(true);

        assert_eq!(
            response.to_json().to_string(),
            r#"{"data":{"user":null},"errors":[{"message":"boom","locations":[{"line":1,"column":3}],"path":["user"],"extensions":{"retry":false,"code":"EXECUTION_ERROR"}}]}"#
        );
    }
}
