use query_value::Name;

/// A value that doesn't fit its input type.
///
/// `path` is either empty or ` at path '<root>.<segments>'`, pointing inside the value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputValueError {
    #[error("Found a null where we expected a {expected}{path}")]
    UnexpectedNull { expected: String, path: String },
    #[error("Found {actual} where we expected a '{name}' input object{path}")]
    MissingObject {
        name: Name,
        actual: &'static str,
        path: String,
    },
    #[error("Found {actual} where we expected a {expected} scalar{path}")]
    IncorrectScalarType {
        actual: &'static str,
        expected: Name,
        path: String,
    },
    #[error("Found value {actual} which cannot be coerced into a {expected} scalar{path}")]
    IncorrectScalarValue { actual: String, expected: Name, path: String },
    #[error("Found {actual} where we expected a {r#enum} enum value{path}")]
    IncorrectEnumValueType {
        r#enum: Name,
        actual: &'static str,
        path: String,
    },
    #[error("Unknown enum value '{value}' for enum {r#enum}{path}")]
    UnknownEnumValue { r#enum: Name, value: String, path: String },
    #[error("Input object {input_object} does not have a field named '{name}'{path}")]
    UnknownInputField {
        input_object: Name,
        name: Name,
        path: String,
    },
    #[error("Invalid value for scalar {scalar}: {message}{path}")]
    InvalidCustomScalar { scalar: Name, message: String, path: String },
    #[error("Type {name} is not an input type{path}")]
    NotAnInputType { name: Name, path: String },
    #[error("Unknown variable ${name}{path}")]
    UnknownVariable { name: Name, path: String },
    #[error("Variable ${name} doesn't have the right type. Declared as '{variable_ty}' but used as '{actual_ty}'{path}")]
    IncorrectVariableType {
        name: Name,
        variable_ty: String,
        actual_ty: String,
        path: String,
    },
}
