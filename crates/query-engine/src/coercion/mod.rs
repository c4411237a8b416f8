//! Input coercion, shared by argument literals, variable defaults, schema defaults and request
//! variables.
//!
//! Literals from the document and values from the request mostly follow the same rules. The
//! differences come from JSON: in [`CoercionMode::Variable`] enums are given as strings and
//! integral floats are accepted for `Int`.

mod error;
pub mod variables;

use indexmap::IndexMap;
use itertools::Itertools;
use query_parser::types::{BaseType, Type};
use query_value::{ConstValue, Name, Value};

pub use error::InputValueError;

use crate::{
    schema::{EnumType, InputObjectType, MetaType, ScalarType, Schema},
    typecheck::{InputValue, VariableSignature},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionMode {
    /// Values written in the document.
    Literal,
    /// Values decoded from the request variables.
    Variable,
}

enum PathSegment {
    Field(Name),
    Index(usize),
}

pub(crate) struct InputCoercer<'a> {
    schema: &'a Schema,
    mode: CoercionMode,
    root: Name,
    value_path: Vec<PathSegment>,
    variables: Option<&'a mut IndexMap<Name, VariableSignature>>,
}

impl<'a> InputCoercer<'a> {
    /// `root` is the argument, variable or field the value is coerced for, it starts the path of
    /// nested errors.
    pub fn new(schema: &'a Schema, mode: CoercionMode, root: Name) -> Self {
        InputCoercer {
            schema,
            mode,
            root,
            value_path: Vec::new(),
            variables: None,
        }
    }

    /// Variables literals may reference. Their usages are recorded in the signatures.
    #[must_use]
    pub fn with_variables(mut self, variables: &'a mut IndexMap<Name, VariableSignature>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn coerce(&mut self, ty: &Type, value: ConstValue) -> Result<ConstValue, InputValueError> {
        if value.is_null() {
            if !ty.nullable {
                return Err(InputValueError::UnexpectedNull {
                    expected: ty.to_string(),
                    path: self.path(),
                });
            }
            return Ok(ConstValue::Null);
        }

        match &ty.base {
            BaseType::List(item_ty) => match value {
                ConstValue::List(items) => {
                    let mut list = Vec::with_capacity(items.len());
                    for (index, item) in items.into_iter().enumerate() {
                        self.value_path.push(PathSegment::Index(index));
                        list.push(self.coerce(item_ty, item)?);
                        self.value_path.pop();
                    }
                    Ok(ConstValue::List(list))
                }
                // A single value is accepted where a list is expected.
                value => Ok(ConstValue::List(vec![self.coerce(item_ty, value)?])),
            },
            BaseType::Named(name) => self.coerce_named_type(name, value),
        }
    }

    /// Checks a document literal which may reference variables. Constant parts are coerced right
    /// away, the structure around variables is kept for execution.
    ///
    /// `position_default` is the default of the argument or input field the literal is written
    /// for, it applies when a variable in that position is absent.
    pub fn coerce_literal(
        &mut self,
        ty: &Type,
        value: Value,
        position_default: Option<&ConstValue>,
    ) -> Result<InputValue, InputValueError> {
        if value.is_const() {
            let value = value.into_const().unwrap_or_default();
            return self.coerce(ty, value).map(InputValue::Const);
        }

        match (value, &ty.base) {
            (Value::Variable(name), _) => self.use_variable(ty, name, position_default),
            (Value::List(items), BaseType::List(item_ty)) => {
                let mut list = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    self.value_path.push(PathSegment::Index(index));
                    list.push(self.coerce_literal(item_ty, item, None)?);
                    self.value_path.pop();
                }
                Ok(InputValue::List(list))
            }
            (value, BaseType::List(item_ty)) => Ok(InputValue::List(vec![self.coerce_literal(item_ty, value, None)?])),
            (Value::Object(fields), BaseType::Named(name)) => match self.schema.type_by_name(name) {
                Some(MetaType::InputObject(input_object)) => self.coerce_input_object_literal(input_object, fields),
                _ => Err(self.unexpected_composite(name, "an object")),
            },
            (_, BaseType::Named(name)) => Err(self.unexpected_composite(name, "a list")),
        }
    }

    // Variables nested in a list or an object literal need a typed position, which scalars
    // (including custom ones) and enums don't provide.
    fn unexpected_composite(&self, name: &Name, actual: &'static str) -> InputValueError {
        let path = self.path();
        match self.schema.type_by_name(name) {
            Some(MetaType::Scalar(_)) => InputValueError::IncorrectScalarType {
                actual,
                expected: name.clone(),
                path,
            },
            Some(MetaType::Enum(_)) => InputValueError::IncorrectEnumValueType {
                r#enum: name.clone(),
                actual,
                path,
            },
            Some(MetaType::InputObject(_)) => InputValueError::MissingObject {
                name: name.clone(),
                actual,
                path,
            },
            _ => InputValueError::NotAnInputType { name: name.clone(), path },
        }
    }

    fn coerce_input_object_literal(
        &mut self,
        input_object: &InputObjectType,
        mut fields: IndexMap<Name, Value>,
    ) -> Result<InputValue, InputValueError> {
        let mut coerced = IndexMap::with_capacity(input_object.fields.len());
        for input_field in input_object.fields.values() {
            match fields.shift_remove(input_field.name.as_str()) {
                None => {
                    if let Some(default_value) = &input_field.default_value {
                        coerced.insert(input_field.name.clone(), InputValue::Const(default_value.clone()));
                    } else if !input_field.ty.nullable {
                        self.value_path.push(PathSegment::Field(input_field.name.clone()));
                        return Err(InputValueError::UnexpectedNull {
                            expected: input_field.ty.to_string(),
                            path: self.path(),
                        });
                    }
                }
                Some(value) => {
                    self.value_path.push(PathSegment::Field(input_field.name.clone()));
                    let value = self.coerce_literal(&input_field.ty, value, input_field.default_value.as_ref())?;
                    coerced.insert(input_field.name.clone(), value);
                    self.value_path.pop();
                }
            }
        }

        if let Some(name) = fields.keys().next() {
            return Err(InputValueError::UnknownInputField {
                input_object: input_object.name.clone(),
                name: name.clone(),
                path: self.path(),
            });
        }

        Ok(InputValue::Object(coerced))
    }

    fn use_variable(
        &mut self,
        ty: &Type,
        name: Name,
        position_default: Option<&ConstValue>,
    ) -> Result<InputValue, InputValueError> {
        let path = self.path();
        let Some(signature) = self
            .variables
            .as_deref_mut()
            .and_then(|variables| variables.get_mut(name.as_str()))
        else {
            return Err(InputValueError::UnknownVariable { name, path });
        };

        if !fits(&signature.ty, ty) {
            return Err(InputValueError::IncorrectVariableType {
                variable_ty: signature.ty.to_string(),
                actual_ty: ty.to_string(),
                name,
                path,
            });
        }

        if !ty.nullable && signature.ty.nullable {
            signature.used_in_non_null_position = true;
            if position_default.is_none() && signature.default_value.is_none() {
                signature.required_by_usage = true;
            }
        }

        Ok(InputValue::Variable {
            name,
            default_value: position_default.cloned(),
        })
    }

    fn coerce_named_type(&mut self, name: &Name, value: ConstValue) -> Result<ConstValue, InputValueError> {
        match self.schema.type_by_name(name) {
            Some(MetaType::Scalar(scalar)) => self.coerce_scalar(scalar, value),
            Some(MetaType::Enum(r#enum)) => self.coerce_enum(r#enum, value),
            Some(MetaType::InputObject(input_object)) => self.coerce_input_object(input_object, value),
            _ => Err(InputValueError::NotAnInputType {
                name: name.clone(),
                path: self.path(),
            }),
        }
    }

    fn coerce_input_object(
        &mut self,
        input_object: &InputObjectType,
        value: ConstValue,
    ) -> Result<ConstValue, InputValueError> {
        let ConstValue::Object(mut fields) = value else {
            return Err(InputValueError::MissingObject {
                name: input_object.name.clone(),
                actual: value.kind(),
                path: self.path(),
            });
        };

        let mut coerced = IndexMap::with_capacity(input_object.fields.len());
        for input_field in input_object.fields.values() {
            match fields.shift_remove(input_field.name.as_str()) {
                None => {
                    if let Some(default_value) = &input_field.default_value {
                        coerced.insert(input_field.name.clone(), default_value.clone());
                    } else if !input_field.ty.nullable {
                        self.value_path.push(PathSegment::Field(input_field.name.clone()));
                        return Err(InputValueError::UnexpectedNull {
                            expected: input_field.ty.to_string(),
                            path: self.path(),
                        });
                    }
                }
                Some(value) => {
                    self.value_path.push(PathSegment::Field(input_field.name.clone()));
                    let value = self.coerce(&input_field.ty, value)?;
                    coerced.insert(input_field.name.clone(), value);
                    self.value_path.pop();
                }
            }
        }

        if let Some(name) = fields.keys().next() {
            return Err(InputValueError::UnknownInputField {
                input_object: input_object.name.clone(),
                name: name.clone(),
                path: self.path(),
            });
        }

        Ok(ConstValue::Object(coerced))
    }

    fn coerce_enum(&mut self, r#enum: &EnumType, value: ConstValue) -> Result<ConstValue, InputValueError> {
        let name = match (&value, self.mode) {
            (ConstValue::Enum(name), _) => name.as_str(),
            (ConstValue::String(name), CoercionMode::Variable) => name.as_str(),
            (value, _) => {
                return Err(InputValueError::IncorrectEnumValueType {
                    r#enum: r#enum.name.clone(),
                    actual: value.kind(),
                    path: self.path(),
                });
            }
        };

        if !r#enum.values.contains(name) {
            return Err(InputValueError::UnknownEnumValue {
                r#enum: r#enum.name.clone(),
                value: name.to_string(),
                path: self.path(),
            });
        }

        Ok(ConstValue::Enum(Name::new(name)))
    }

    fn coerce_scalar(&mut self, scalar: &ScalarType, value: ConstValue) -> Result<ConstValue, InputValueError> {
        match (scalar.name.as_str(), value) {
            ("Int", ConstValue::Int(n)) => match i32::try_from(n) {
                Ok(_) => Ok(ConstValue::Int(n)),
                Err(_) => Err(InputValueError::IncorrectScalarValue {
                    actual: n.to_string(),
                    expected: scalar.name.clone(),
                    path: self.path(),
                }),
            },
            ("Int", ConstValue::Float(n)) if self.mode == CoercionMode::Variable && can_coerce_to_int(n) => {
                Ok(ConstValue::Int(n as i64))
            }
            ("Float", ConstValue::Int(n)) => Ok(ConstValue::Float(n as f64)),
            ("Float", ConstValue::Float(n)) => Ok(ConstValue::Float(n)),
            ("String", ConstValue::String(s)) => Ok(ConstValue::String(s)),
            ("Boolean", ConstValue::Boolean(b)) => Ok(ConstValue::Boolean(b)),
            ("ID", ConstValue::String(s)) => Ok(ConstValue::String(s)),
            ("ID", ConstValue::Int(n)) => Ok(ConstValue::String(n.to_string())),
            (_, value) if !scalar.is_builtin() => match &scalar.coercer {
                Some(coercer) => coercer
                    .coerce_input(value)
                    .map_err(|message| InputValueError::InvalidCustomScalar {
                        scalar: scalar.name.clone(),
                        message,
                        path: self.path(),
                    }),
                None => Ok(value),
            },
            (_, actual) => Err(InputValueError::IncorrectScalarType {
                actual: actual.kind(),
                expected: scalar.name.clone(),
                path: self.path(),
            }),
        }
    }

    fn path(&self) -> String {
        if self.value_path.is_empty() {
            return String::new();
        }
        let segments = self.value_path.iter().map(|segment| match segment {
            PathSegment::Field(name) => name.to_string(),
            PathSegment::Index(index) => index.to_string(),
        });
        format!(
            " at path '{}'",
            std::iter::once(self.root.to_string()).chain(segments).join(".")
        )
    }
}

/// Whether a variable of type `variable` may be used where `location` is expected.
///
/// A nullable variable is accepted in a non-null position, null is then rejected when the
/// variables are coerced. Nested types must match exactly.
fn fits(variable: &Type, location: &Type) -> bool {
    fits_base(&variable.base, &location.base)
}

fn fits_strictly(variable: &Type, location: &Type) -> bool {
    (!variable.nullable || location.nullable) && fits_base(&variable.base, &location.base)
}

fn fits_base(variable: &BaseType, location: &BaseType) -> bool {
    match (variable, location) {
        (BaseType::Named(variable), BaseType::Named(location)) => variable == location,
        (BaseType::List(variable), BaseType::List(location)) => fits_strictly(variable, location),
        _ => false,
    }
}

fn can_coerce_to_int(float: f64) -> bool {
    float.floor() == float && float >= f64::from(i32::MIN) && float <= f64::from(i32::MAX)
}
