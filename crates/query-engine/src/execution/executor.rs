use std::borrow::Cow;

use futures_util::{
    future::{join_all, BoxFuture},
    FutureExt,
};
use indexmap::IndexMap;
use query_parser::types::{BaseType, Type};
use query_value::{ConstValue, Name, Variables};

use super::{collect_fields, Context};
use crate::{
    document::{FieldSelection, SelectionSet},
    response::{ErrorCode, ErrorPath, GraphqlError},
    schema::{Arguments, EnumType, MetaType, ObjectType, ResolverContext, ScalarType, Schema},
    typecheck::InputValue,
};

/// The outcome of executing a part of the operation.
pub(super) struct Completed {
    /// `None` if the value could not be produced, the error was already reported. The nearest
    /// nullable position turns it into `null`.
    pub value: Option<ConstValue>,
    pub errors: Vec<GraphqlError>,
}

impl Completed {
    fn value(value: ConstValue) -> Self {
        Completed {
            value: Some(value),
            errors: Vec::new(),
        }
    }

    fn error(error: GraphqlError) -> Self {
        Completed {
            value: None,
            errors: vec![error],
        }
    }

    fn nullable_if(mut self, nullable: bool) -> Self {
        if nullable && self.value.is_none() {
            self.value = Some(ConstValue::Null);
        }
        self
    }
}

pub(super) struct Executor<'a> {
    pub schema: &'a Schema,
    pub variables: &'a Variables,
    pub context: &'a Context,
    pub parallel: bool,
}

impl<'a> Executor<'a> {
    pub fn selection_set<'f>(
        &'f self,
        object_type: &'a ObjectType,
        parent: &'f ConstValue,
        selection_sets: Vec<&'a SelectionSet<InputValue>>,
        path: &'f ErrorPath,
        serial: bool,
    ) -> BoxFuture<'f, Completed> {
        async move {
            let grouped = collect_fields(self.schema, self.variables, &object_type.name, selection_sets);

            let futures = grouped
                .iter()
                .map(|(key, fields)| self.field(object_type, parent, fields, path.child((*key).clone())));
            let results = if serial {
                let mut results = Vec::with_capacity(grouped.len());
                for future in futures {
                    results.push(future.await);
                }
                results
            } else {
                join_all(futures).await
            };

            let mut object = IndexMap::with_capacity(results.len());
            let mut errors = Vec::new();
            let mut failed = false;
            for (key, result) in grouped.keys().zip(results) {
                errors.extend(result.errors);
                match result.value {
                    Some(value) => {
                        object.insert((*key).clone(), value);
                    }
                    None => failed = true,
                }
            }

            Completed {
                value: (!failed).then_some(ConstValue::Object(object)),
                errors,
            }
        }
        .boxed()
    }

    async fn field(
        &self,
        object_type: &'a ObjectType,
        parent: &ConstValue,
        fields: &[&'a FieldSelection<InputValue>],
        path: ErrorPath,
    ) -> Completed {
        let Some(field) = fields.first() else {
            return Completed::value(ConstValue::Null);
        };

        if field.is_typename() {
            return Completed::value(ConstValue::String(object_type.name.to_string()));
        }

        let Some(meta_field) = object_type.fields.get(&field.name) else {
            tracing::debug!(field = %field.name, object = %object_type.name, "field missing from the object type");
            return Completed::error(GraphqlError::internal_error().with_path(path));
        };

        let arguments: Arguments = field
            .arguments
            .iter()
            .filter_map(|(name, value)| Some((name.node.clone(), value.node.evaluate(self.variables)?)))
            .collect();

        tracing::trace!(path = %path, "resolving field");

        let resolved = match &meta_field.resolver {
            Some(resolver) => {
                resolver
                    .resolve(ResolverContext {
                        parent,
                        parent_type: &object_type.name,
                        field: meta_field,
                        arguments: &arguments,
                        path: &path,
                        context: self.context,
                    })
                    .await
            }
            None => Ok(parent.get(&field.name).cloned().unwrap_or_default()),
        };

        match resolved {
            Ok(value) => self.complete_value(&field.ty, fields, value, path).await,
            Err(err) => {
                tracing::trace!(path = %path, error = %err.message, "field failed");
                let error = field_error(err.message, field, &path).with_extensions(err.extensions);
                Completed::error(error).nullable_if(field.ty.nullable)
            }
        }
    }

    fn complete_value<'f>(
        &'f self,
        ty: &'f Type,
        fields: &'f [&'a FieldSelection<InputValue>],
        value: ConstValue,
        path: ErrorPath,
    ) -> BoxFuture<'f, Completed> {
        async move {
            let Some(field) = fields.first() else {
                return Completed::value(ConstValue::Null);
            };

            if value.is_null() {
                if ty.nullable {
                    return Completed::value(ConstValue::Null);
                }
                return Completed::error(field_error(
                    format!("Cannot return null for non-nullable field {}.{}", field.parent_type, field.name),
                    field,
                    &path,
                ));
            }

            let completed = match &ty.base {
                BaseType::List(item_ty) => self.complete_list(item_ty, field, fields, value, path).await,
                BaseType::Named(name) => match self.schema.type_by_name(name) {
                    Some(MetaType::Scalar(scalar)) => match serialize_scalar(scalar, value) {
                        Ok(value) => Completed::value(value),
                        Err(message) => Completed::error(field_error(message, field, &path)),
                    },
                    Some(MetaType::Enum(r#enum)) => match serialize_enum(r#enum, value) {
                        Ok(value) => Completed::value(value),
                        Err(message) => Completed::error(field_error(message, field, &path)),
                    },
                    Some(MetaType::Object(object)) => self.complete_object(object, fields, &value, &path).await,
                    Some(abstract_type @ (MetaType::Interface(_) | MetaType::Union(_))) => match self
                        .runtime_type(abstract_type, &value)
                    {
                        Some(object) => self.complete_object(object, fields, &value, &path).await,
                        None => Completed::error(field_error(
                            format!(
                                "Abstract type '{}' must resolve to an object type at runtime for field {}.{}",
                                abstract_type.name(),
                                field.parent_type,
                                field.name
                            ),
                            field,
                            &path,
                        )),
                    },
                    Some(MetaType::InputObject(_)) | None => {
                        Completed::error(GraphqlError::internal_error().with_path(path))
                    }
                },
            };

            completed.nullable_if(ty.nullable)
        }
        .boxed()
    }

    async fn complete_list(
        &self,
        item_ty: &Type,
        field: &FieldSelection<InputValue>,
        fields: &[&'a FieldSelection<InputValue>],
        value: ConstValue,
        path: ErrorPath,
    ) -> Completed {
        let ConstValue::List(items) = value else {
            let message = format!(
                "Expected a list for field {}.{}, found {}",
                field.parent_type,
                field.name,
                value.kind()
            );
            return Completed::error(field_error(message, field, &path));
        };

        let futures = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| self.complete_value(item_ty, fields, item, path.child(index)));
        let results = if self.parallel {
            join_all(futures).await
        } else {
            let mut results = Vec::new();
            for future in futures {
                results.push(future.await);
            }
            results
        };

        let mut list = Vec::with_capacity(results.len());
        let mut errors = Vec::new();
        let mut failed = false;
        for result in results {
            errors.extend(result.errors);
            match result.value {
                Some(value) => list.push(value),
                None => failed = true,
            }
        }

        Completed {
            value: (!failed).then_some(ConstValue::List(list)),
            errors,
        }
    }

    async fn complete_object(
        &self,
        object: &'a ObjectType,
        fields: &[&'a FieldSelection<InputValue>],
        value: &ConstValue,
        path: &ErrorPath,
    ) -> Completed {
        let selection_sets = fields.iter().map(|field| &field.selection_set).collect();
        self.selection_set(object, value, selection_sets, path, !self.parallel)
            .await
    }

    /// The object type of a value returned for an interface or a union.
    fn runtime_type(&self, ty: &'a MetaType, value: &ConstValue) -> Option<&'a ObjectType> {
        let type_resolver = match ty {
            MetaType::Interface(interface) => interface.type_resolver.as_ref(),
            MetaType::Union(union) => union.type_resolver.as_ref(),
            _ => None,
        };
        let name = match type_resolver {
            Some(type_resolver) => type_resolver.resolve_type(value)?,
            None => Name::new(value.get("__typename")?.as_str()?),
        };
        if !self.schema.is_possible_type(ty.name(), &name) {
            return None;
        }
        self.schema.object(&name)
    }
}

fn field_error(
    message: impl Into<Cow<'static, str>>,
    field: &FieldSelection<InputValue>,
    path: &ErrorPath,
) -> GraphqlError {
    GraphqlError::new(message, ErrorCode::ExecutionError)
        .with_location(field.pos)
        .with_path(path.clone())
}

fn serialize_scalar(scalar: &ScalarType, value: ConstValue) -> Result<ConstValue, String> {
    match (scalar.name.as_str(), value) {
        ("Int", ConstValue::Int(n)) if i32::try_from(n).is_ok() => Ok(ConstValue::Int(n)),
        ("Int", ConstValue::Float(n)) if n.fract() == 0.0 && n >= f64::from(i32::MIN) && n <= f64::from(i32::MAX) => {
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
                .coerce_output(value)
                .map_err(|message| format!("Invalid value for scalar {}: {message}", scalar.name)),
            None => Ok(value),
        },
        (name, value) => Err(format!("{name} cannot represent value {value}")),
    }
}

fn serialize_enum(r#enum: &EnumType, value: ConstValue) -> Result<ConstValue, String> {
    let name = match &value {
        ConstValue::Enum(name) => name.as_str(),
        ConstValue::String(name) => name.as_str(),
        _ => "",
    };
    match r#enum.values.get(name) {
        Some(name) => Ok(ConstValue::Enum(name.clone())),
        None => Err(format!("Enum {} cannot represent value {value}", r#enum.name)),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::int("Int", ConstValue::Int(3), Ok(ConstValue::Int(3)))]
    #[case::integral_float("Int", ConstValue::Float(3.0), Ok(ConstValue::Int(3)))]
    #[case::large_int("Int", ConstValue::Int(1 << 40), Err("Int cannot represent value 1099511627776"))]
    #[case::widened("Float", ConstValue::Int(3), Ok(ConstValue::Float(3.0)))]
    #[case::not_finite("Float", ConstValue::Float(f64::INFINITY), Ok(ConstValue::Float(f64::INFINITY)))]
    #[case::id("ID", ConstValue::Int(3), Ok(ConstValue::String("3".into())))]
    #[case::string("String", ConstValue::Boolean(true), Err("String cannot represent value true"))]
    #[case::custom("JSON", ConstValue::Boolean(true), Ok(ConstValue::Boolean(true)))]
    fn scalars(#[case] name: &str, #[case] value: ConstValue, #[case] expected: Result<ConstValue, &str>) {
        assert_eq!(
            serialize_scalar(&ScalarType::new(name), value),
            expected.map_err(ToString::to_string)
        );
    }

    #[test]
    fn enums() {
        let role = EnumType::new("Role", ["ADMIN", "GUEST"]);

        assert_eq!(
            serialize_enum(&role, ConstValue::String("ADMIN".into())),
            Ok(ConstValue::Enum(Name::new("ADMIN")))
        );
        assert_eq!(
            serialize_enum(&role, ConstValue::Enum(Name::new("ROOT"))),
            Err("Enum Role cannot represent value ROOT".to_string())
        );
    }
}
