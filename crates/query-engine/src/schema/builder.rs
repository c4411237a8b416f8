use indexmap::IndexMap;
use query_parser::types::Type;
use query_value::Name;

use super::{MetaInputValue, MetaType, ScalarType, Schema, BUILTIN_SCALARS};
use crate::coercion::{CoercionMode, InputCoercer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("'{name}' is not a valid name")]
    InvalidName { name: String },
    #[error("Type '{name}' is defined more than once")]
    DuplicateType { name: Name },
    #[error("Root type '{name}' is not defined")]
    MissingRootType { name: Name },
    #[error("Root type '{name}' must be an object, but is a {kind}")]
    RootNotObject { name: Name, kind: super::TypeKind },
    #[error("Unknown type '{name}' referenced by {referenced_by}")]
    UnknownType { name: Name, referenced_by: String },
    #[error("{referenced_by} must have an output type, but '{ty}' is an input object")]
    NotOutputType { ty: Type, referenced_by: String },
    #[error("{referenced_by} must have an input type, but '{ty}' is not one")]
    NotInputType { ty: Type, referenced_by: String },
    #[error("Object '{object}' cannot implement '{name}' which is not an interface")]
    NotAnInterface { object: Name, name: Name },
    #[error("Object '{object}' does not define the field '{field}' of interface '{interface}'")]
    MissingInterfaceField { object: Name, interface: Name, field: Name },
    #[error("Union '{union}' can only contain objects, '{member}' is not one")]
    InvalidUnionMember { union: Name, member: Name },
    #[error("Type '{name}' must define at least one field")]
    EmptyType { name: Name },
    #[error("Invalid default value for {referenced_by}: {message}")]
    InvalidDefaultValue { referenced_by: String, message: String },
}

/// Registers the types of a [`Schema`] and checks they form a consistent type system.
pub struct SchemaBuilder {
    types: IndexMap<Name, MetaType>,
    duplicates: Vec<Name>,
    query_type: Name,
    mutation_type: Option<Name>,
    version: Option<String>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// A builder with the built-in scalars and `Query` as query root.
    pub fn new() -> Self {
        SchemaBuilder {
            types: BUILTIN_SCALARS
                .into_iter()
                .map(|name| (Name::new(name), MetaType::Scalar(ScalarType::new(name))))
                .collect(),
            duplicates: Vec::new(),
            query_type: Name::new("Query"),
            mutation_type: None,
            version: None,
        }
    }

    #[must_use]
    pub fn query_type(mut self, name: impl Into<Name>) -> Self {
        self.query_type = name.into();
        self
    }

    #[must_use]
    pub fn mutation_type(mut self, name: impl Into<Name>) -> Self {
        self.mutation_type = Some(name.into());
        self
    }

    /// Identifies the schema in cache keys. Derived from the type system when not set.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    #[must_use]
    pub fn register(mut self, ty: impl Into<MetaType>) -> Self {
        let ty = ty.into();
        let name = ty.name().clone();
        if self.types.contains_key(&name) {
            self.duplicates.push(name);
        } else {
            self.types.insert(name, ty);
        }
        self
    }

    pub fn build(mut self) -> Result<Schema, SchemaError> {
        if let Some(name) = self.duplicates.into_iter().next() {
            return Err(SchemaError::DuplicateType { name });
        }

        link_interfaces(&mut self.types)?;

        let mut schema = Schema {
            types: self.types,
            query_type: self.query_type,
            mutation_type: self.mutation_type,
            version: String::new(),
        };

        check_root(&schema, &schema.query_type)?;
        if let Some(mutation) = &schema.mutation_type {
            check_root(&schema, mutation)?;
        }
        for ty in schema.types.values() {
            check_type(&schema, ty)?;
        }

        schema.version = match self.version {
            Some(version) => version,
            None => blake3::hash(schema.to_string().as_bytes()).to_hex().to_string(),
        };

        tracing::debug!(version = %schema.version, types = schema.types.len(), "schema built");

        Ok(schema)
    }
}

fn link_interfaces(types: &mut IndexMap<Name, MetaType>) -> Result<(), SchemaError> {
    let mut implementations = Vec::new();
    for ty in types.values() {
        if let MetaType::Object(object) = ty {
            for interface in &object.implements {
                implementations.push((interface.clone(), object.name.clone()));
            }
        }
    }

    for (interface, object) in implementations {
        match types.get_mut(&interface) {
            Some(MetaType::Interface(ty)) => {
                ty.possible_types.insert(object);
            }
            Some(_) => return Err(SchemaError::NotAnInterface { object, name: interface }),
            None => {
                return Err(SchemaError::UnknownType {
                    name: interface,
                    referenced_by: format!("object '{object}'"),
                })
            }
        }
    }

    Ok(())
}

fn check_root(schema: &Schema, name: &Name) -> Result<(), SchemaError> {
    match schema.types.get(name) {
        Some(MetaType::Object(_)) => Ok(()),
        Some(ty) => Err(SchemaError::RootNotObject {
            name: name.clone(),
            kind: ty.kind(),
        }),
        None => Err(SchemaError::MissingRootType { name: name.clone() }),
    }
}

fn check_type(schema: &Schema, ty: &MetaType) -> Result<(), SchemaError> {
    let name = ty.name();
    if !Name::is_valid(name) {
        return Err(SchemaError::InvalidName { name: name.to_string() });
    }

    match ty {
        MetaType::Scalar(_) => {}
        MetaType::Object(_) | MetaType::Interface(_) => {
            let fields = ty.fields().into_iter().flatten();
            if ty.fields().is_some_and(IndexMap::is_empty) {
                return Err(SchemaError::EmptyType { name: name.clone() });
            }
            for (_, field) in fields {
                let referenced_by = format!("field '{name}.{}'", field.name);
                let field_type = named_type(schema, &field.ty, &referenced_by)?;
                if matches!(field_type, MetaType::InputObject(_)) {
                    return Err(SchemaError::NotOutputType {
                        ty: field.ty.clone(),
                        referenced_by,
                    });
                }
                for arg in field.args.values() {
                    check_input_value(schema, arg, &format!("argument '{name}.{}({})'", field.name, arg.name))?;
                }
            }
            if let MetaType::Object(object) = ty {
                for interface in &object.implements {
                    let Some(interface_type) = schema.type_by_name(interface) else {
                        continue;
                    };
                    for field in interface_type.fields().into_iter().flat_map(IndexMap::keys) {
                        if !object.fields.contains_key(field) {
                            return Err(SchemaError::MissingInterfaceField {
                                object: object.name.clone(),
                                interface: interface.clone(),
                                field: field.clone(),
                            });
                        }
                    }
                }
            }
        }
        MetaType::Union(union) => {
            if union.possible_types.is_empty() {
                return Err(SchemaError::EmptyType { name: name.clone() });
            }
            for member in &union.possible_types {
                if schema.object(member).is_none() {
                    return Err(SchemaError::InvalidUnionMember {
                        union: union.name.clone(),
                        member: member.clone(),
                    });
                }
            }
        }
        MetaType::Enum(r#enum) => {
            if let Some(value) = r#enum.values.iter().find(|value| !Name::is_valid(value)) {
                return Err(SchemaError::InvalidName {
                    name: value.to_string(),
                });
            }
        }
        MetaType::InputObject(input) => {
            if input.fields.is_empty() {
                return Err(SchemaError::EmptyType { name: name.clone() });
            }
            for field in input.fields.values() {
                check_input_value(schema, field, &format!("input field '{name}.{}'", field.name))?;
            }
        }
    }

    Ok(())
}

fn check_input_value(schema: &Schema, value: &MetaInputValue, referenced_by: &str) -> Result<(), SchemaError> {
    let ty = named_type(schema, &value.ty, referenced_by)?;
    if !ty.is_input() {
        return Err(SchemaError::NotInputType {
            ty: value.ty.clone(),
            referenced_by: referenced_by.to_string(),
        });
    }

    if let Some(default) = &value.default_value {
        InputCoercer::new(schema, CoercionMode::Literal, value.name.clone())
            .coerce(&value.ty, default.clone())
            .map_err(|err| SchemaError::InvalidDefaultValue {
                referenced_by: referenced_by.to_string(),
                message: err.to_string(),
            })?;
    }

    Ok(())
}

fn named_type<'a>(schema: &'a Schema, ty: &Type, referenced_by: &str) -> Result<&'a MetaType, SchemaError> {
    schema
        .type_by_name(ty.named_type())
        .ok_or_else(|| SchemaError::UnknownType {
            name: ty.named_type().clone(),
            referenced_by: referenced_by.to_string(),
        })
}
