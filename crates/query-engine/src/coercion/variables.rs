use indexmap::IndexMap;
use query_parser::Pos;
use query_value::{ConstValue, Name, Variables};
use serde::{Deserialize, Deserializer};

use super::{CoercionMode, InputCoercer, InputValueError};
use crate::{schema::Schema, typecheck::FunEnv};

/// Variables as sent by the client.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RawVariables {
    #[default]
    Absent,
    /// A JSON object, or a string holding one.
    Json(serde_json::Value),
    /// Variables already decoded by the caller.
    Decoded(IndexMap<Name, ConstValue>),
}

impl<'de> Deserialize<'de> for RawVariables {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
            None | Some(serde_json::Value::Null) => RawVariables::Absent,
            Some(value) => RawVariables::Json(value),
        })
    }
}

impl From<serde_json::Value> for RawVariables {
    fn from(value: serde_json::Value) -> Self {
        RawVariables::Json(value)
    }
}

impl From<IndexMap<Name, ConstValue>> for RawVariables {
    fn from(variables: IndexMap<Name, ConstValue>) -> Self {
        RawVariables::Decoded(variables)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariableError {
    #[error("variables must be a JSON object: {message}")]
    InvalidPayload { message: String },
    #[error("unknown variable {name}")]
    UnknownVariable { name: Name },
    #[error("missing required variable {name}")]
    MissingVariable { name: Name },
    #[error("Variable ${name} must not be null")]
    NullVariable { name: Name, pos: Pos },
    #[error("Variable ${name} has an invalid value. {err}")]
    InvalidValue { name: Name, err: InputValueError, pos: Pos },
}

impl VariableError {
    pub fn location(&self) -> Option<Pos> {
        match self {
            VariableError::NullVariable { pos, .. } | VariableError::InvalidValue { pos, .. } => Some(*pos),
            VariableError::InvalidPayload { .. }
            | VariableError::UnknownVariable { .. }
            | VariableError::MissingVariable { .. } => None,
        }
    }
}

/// Coerces the variables supplied with a request against the signature of the operation.
///
/// Absent variables take their declared default. Without one they stay absent, so that the
/// defaults of the arguments they are used in apply, unless they are required.
pub fn coerce_variables(schema: &Schema, env: &FunEnv, raw: RawVariables) -> Result<Variables, VariableError> {
    let mut supplied = decode(raw)?;

    if let Some(name) = supplied.keys().find(|name| !env.variables.contains_key(*name)) {
        return Err(VariableError::UnknownVariable { name: name.clone() });
    }

    let mut variables = Variables::default();
    for signature in env.variables.values() {
        match supplied.shift_remove(&signature.name) {
            None => {
                if let Some(default_value) = &signature.default_value {
                    variables.insert(signature.name.clone(), default_value.clone());
                } else if !signature.ty.nullable || signature.required_by_usage {
                    return Err(VariableError::MissingVariable {
                        name: signature.name.clone(),
                    });
                }
            }
            Some(ConstValue::Null) if !signature.ty.nullable || signature.used_in_non_null_position => {
                return Err(VariableError::NullVariable {
                    name: signature.name.clone(),
                    pos: signature.pos,
                });
            }
            Some(value) => {
                let value = InputCoercer::new(schema, CoercionMode::Variable, signature.name.clone())
                    .coerce(&signature.ty, value)
                    .map_err(|err| VariableError::InvalidValue {
                        name: signature.name.clone(),
                        err,
                        pos: signature.pos,
                    })?;
                variables.insert(signature.name.clone(), value);
            }
        }
    }

    Ok(variables)
}

fn decode(raw: RawVariables) -> Result<IndexMap<Name, ConstValue>, VariableError> {
    match raw {
        RawVariables::Absent => Ok(IndexMap::new()),
        RawVariables::Decoded(variables) => Ok(variables),
        RawVariables::Json(value) => decode_json(value, true),
    }
}

fn decode_json(value: serde_json::Value, allow_string: bool) -> Result<IndexMap<Name, ConstValue>, VariableError> {
    match value {
        serde_json::Value::Null => Ok(IndexMap::new()),
        serde_json::Value::Object(fields) => Ok(fields
            .into_iter()
            .map(|(name, value)| (Name::new(name), ConstValue::from_json(value)))
            .collect()),
        // Some clients send the variables JSON-encoded a second time.
        serde_json::Value::String(encoded) if allow_string => {
            let value = serde_json::from_str(&encoded).map_err(|err| VariableError::InvalidPayload {
                message: err.to_string(),
            })?;
            decode_json(value, false)
        }
        value => Err(VariableError::InvalidPayload {
            message: format!("found {}", ConstValue::from_json(value).kind()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use query_parser::types::{OperationType, Type};
    use serde_json::json;

    use super::*;
    use crate::{
        schema::{MetaField, ObjectType},
        typecheck::VariableSignature,
    };

    fn schema() -> Schema {
        Schema::builder()
            .register(ObjectType::new("Query").field(MetaField::new("ok", "Boolean")))
            .build()
            .unwrap()
    }

    fn env(signatures: impl IntoIterator<Item = (&'static str, &'static str, Option<ConstValue>)>) -> FunEnv {
        FunEnv {
            operation_name: None,
            operation_type: OperationType::Query,
            root_type: Name::new("Query"),
            variables: signatures
                .into_iter()
                .map(|(name, ty, default_value)| {
                    (
                        Name::new(name),
                        VariableSignature {
                            name: Name::new(name),
                            ty: Type::new(ty).unwrap(),
                            default_value,
                            used_in_non_null_position: false,
                            required_by_usage: false,
                            pos: Pos { line: 1, column: 8 },
                        },
                    )
                })
                .collect(),
        }
    }

    fn coerce(env: &FunEnv, raw: serde_json::Value) -> Result<Variables, String> {
        coerce_variables(&schema(), env, RawVariables::Json(raw)).map_err(|err| err.to_string())
    }

    #[test]
    fn missing_required_variable() {
        let env = env([("id", "ID!", None)]);
        assert_eq!(coerce(&env, json!({})), Err("missing required variable id".to_string()));
        assert_eq!(
            coerce_variables(&schema(), &env, RawVariables::Absent).unwrap_err().location(),
            None
        );
    }

    #[test]
    fn defaults_and_absent_variables() {
        let env = env([("first", "Int", Some(ConstValue::Int(10))), ("after", "String", None)]);
        let variables = coerce(&env, json!({})).unwrap();

        assert_eq!(variables.get("first"), Some(&ConstValue::Int(10)));
        assert!(!variables.contains_key("after"));
    }

    #[test]
    fn unknown_variables_are_rejected() {
        let env = env([("id", "ID!", None)]);
        assert_eq!(
            coerce(&env, json!({"id": "1", "name": "x"})),
            Err("unknown variable name".to_string())
        );
    }

    #[test]
    fn null_for_non_null() {
        let env = env([("id", "ID!", None)]);
        let err = coerce_variables(&schema(), &env, RawVariables::Json(json!({"id": null}))).unwrap_err();

        assert_eq!(err.to_string(), "Variable $id must not be null");
        assert_eq!(err.location(), Some(Pos { line: 1, column: 8 }));
    }

    #[test]
    fn nullable_used_as_non_null() {
        let mut env = env([("id", "ID", None)]);
        if let Some(signature) = env.variables.get_mut("id") {
            signature.used_in_non_null_position = true;
            signature.required_by_usage = true;
        }

        assert_eq!(coerce(&env, json!({"id": null})).unwrap_err(), "Variable $id must not be null");
        assert_eq!(coerce(&env, json!({})).unwrap_err(), "missing required variable id");
    }

    #[test]
    fn invalid_values() {
        let env = env([("ids", "[Int!]!", None)]);
        assert_eq!(
            coerce(&env, json!({"ids": [1, "2"]})),
            Err("Variable $ids has an invalid value. Found a string where we expected a Int scalar at path 'ids.1'".to_string())
        );
    }

    #[test]
    fn encoded_payloads() {
        let env = env([("id", "ID!", None)]);
        let variables = coerce(&env, json!(r#"{"id": 1}"#)).unwrap();
        assert_eq!(variables.get("id"), Some(&ConstValue::String("1".into())));

        assert_eq!(
            coerce(&env, json!([1])),
            Err("variables must be a JSON object: found a list".to_string())
        );

        let raw: RawVariables = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(raw, RawVariables::Absent);
    }
}
