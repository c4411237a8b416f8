//! The schema the operations are run against.
//!
//! A [`Schema`] is built once through a [`SchemaBuilder`] and then only read. Besides the type
//! system it holds the field resolvers, the type resolvers of abstract types and the coercers of
//! custom scalars.

mod builder;
mod resolver;

use std::{
    fmt::{self, Display, Write},
    sync::Arc,
};

use indexmap::{IndexMap, IndexSet};
use query_parser::types::{BaseType, OperationType, Type};
use query_value::{ConstValue, Name};

pub use builder::{SchemaBuilder, SchemaError};
pub use resolver::*;

pub(crate) const BUILTIN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

pub struct Schema {
    types: IndexMap<Name, MetaType>,
    query_type: Name,
    mutation_type: Option<Name>,
    version: String,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Identifies this schema in cache keys.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn type_by_name(&self, name: &str) -> Option<&MetaType> {
        self.types.get(name)
    }

    pub fn types(&self) -> impl Iterator<Item = &MetaType> + '_ {
        self.types.values()
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        match self.types.get(name)? {
            MetaType::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn query_type(&self) -> &Name {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&Name> {
        self.mutation_type.as_ref()
    }

    /// The root object of an operation type, `None` if the schema doesn't support it.
    pub fn root_type(&self, operation_type: OperationType) -> Option<&ObjectType> {
        match operation_type {
            OperationType::Query => self.object(&self.query_type),
            OperationType::Mutation => self.object(self.mutation_type.as_ref()?),
            OperationType::Subscription => None,
        }
    }

    /// The field `field_name` of the object or interface `type_name`.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&MetaField> {
        self.types.get(type_name)?.field(field_name)
    }

    /// The object types a value of type `name` may have at runtime.
    pub fn possible_types<'a>(&'a self, name: &'a str) -> Vec<&'a str> {
        match self.types.get(name) {
            Some(MetaType::Object(object)) => vec![object.name.as_str()],
            Some(MetaType::Interface(interface)) => interface.possible_types.iter().map(Name::as_str).collect(),
            Some(MetaType::Union(union)) => union.possible_types.iter().map(Name::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Whether an object of type `object` is a `name`.
    pub fn is_possible_type(&self, name: &str, object: &str) -> bool {
        if name == object {
            return true;
        }
        match self.types.get(name) {
            Some(MetaType::Interface(interface)) => interface.possible_types.contains(object),
            Some(MetaType::Union(union)) => union.possible_types.contains(object),
            _ => false,
        }
    }

    /// Whether `ty` is a scalar, an enum or an input object, possibly wrapped.
    pub fn is_input_type(&self, ty: &Type) -> bool {
        self.types.get(ty.named_type().as_str()).is_some_and(MetaType::is_input)
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    #[strum(to_string = "input object")]
    InputObject,
}

#[derive(Debug, Clone)]
pub enum MetaType {
    Scalar(ScalarType),
    Object(ObjectType),
    Interface(InterfaceType),
    Union(UnionType),
    Enum(EnumType),
    InputObject(InputObjectType),
}

impl MetaType {
    pub fn name(&self) -> &Name {
        match self {
            MetaType::Scalar(ty) => &ty.name,
            MetaType::Object(ty) => &ty.name,
            MetaType::Interface(ty) => &ty.name,
            MetaType::Union(ty) => &ty.name,
            MetaType::Enum(ty) => &ty.name,
            MetaType::InputObject(ty) => &ty.name,
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            MetaType::Scalar(_) => TypeKind::Scalar,
            MetaType::Object(_) => TypeKind::Object,
            MetaType::Interface(_) => TypeKind::Interface,
            MetaType::Union(_) => TypeKind::Union,
            MetaType::Enum(_) => TypeKind::Enum,
            MetaType::InputObject(_) => TypeKind::InputObject,
        }
    }

    /// The fields of an object or an interface.
    pub fn fields(&self) -> Option<&IndexMap<Name, MetaField>> {
        match self {
            MetaType::Object(ty) => Some(&ty.fields),
            MetaType::Interface(ty) => Some(&ty.fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&MetaField> {
        self.fields()?.get(name)
    }

    /// Objects, interfaces and unions.
    pub fn is_composite(&self) -> bool {
        matches!(self, MetaType::Object(_) | MetaType::Interface(_) | MetaType::Union(_))
    }

    /// Scalars and enums.
    pub fn is_leaf(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_))
    }

    pub fn is_input(&self) -> bool {
        matches!(self, MetaType::Scalar(_) | MetaType::Enum(_) | MetaType::InputObject(_))
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, MetaType::Interface(_) | MetaType::Union(_))
    }
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    pub name: Name,
    pub coercer: Option<Arc<dyn ScalarCoercer>>,
}

impl ScalarType {
    pub fn new(name: impl Into<Name>) -> Self {
        ScalarType {
            name: name.into(),
            coercer: None,
        }
    }

    #[must_use]
    pub fn coercer(mut self, coercer: impl ScalarCoercer + 'static) -> Self {
        self.coercer = Some(Arc::new(coercer));
        self
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_SCALARS.contains(&self.name.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ObjectType {
    pub name: Name,
    pub fields: IndexMap<Name, MetaField>,
    pub implements: IndexSet<Name>,
}

impl ObjectType {
    pub fn new(name: impl Into<Name>) -> Self {
        ObjectType {
            name: name.into(),
            fields: IndexMap::new(),
            implements: IndexSet::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: MetaField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    #[must_use]
    pub fn implements(mut self, interface: impl Into<Name>) -> Self {
        self.implements.insert(interface.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct InterfaceType {
    pub name: Name,
    pub fields: IndexMap<Name, MetaField>,
    /// Objects implementing the interface, filled in by the builder.
    pub possible_types: IndexSet<Name>,
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
}

impl InterfaceType {
    pub fn new(name: impl Into<Name>) -> Self {
        InterfaceType {
            name: name.into(),
            fields: IndexMap::new(),
            possible_types: IndexSet::new(),
            type_resolver: None,
        }
    }

    #[must_use]
    pub fn field(mut self, field: MetaField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    #[must_use]
    pub fn type_resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }
}

#[derive(Debug, Clone)]
pub struct UnionType {
    pub name: Name,
    pub possible_types: IndexSet<Name>,
    pub type_resolver: Option<Arc<dyn TypeResolver>>,
}

impl UnionType {
    pub fn new(name: impl Into<Name>) -> Self {
        UnionType {
            name: name.into(),
            possible_types: IndexSet::new(),
            type_resolver: None,
        }
    }

    #[must_use]
    pub fn member(mut self, object: impl Into<Name>) -> Self {
        self.possible_types.insert(object.into());
        self
    }

    #[must_use]
    pub fn type_resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.type_resolver = Some(Arc::new(resolver));
        self
    }
}

#[derive(Debug, Clone)]
pub struct EnumType {
    pub name: Name,
    pub values: IndexSet<Name>,
}

impl EnumType {
    pub fn new<V: Into<Name>>(name: impl Into<Name>, values: impl IntoIterator<Item = V>) -> Self {
        EnumType {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct InputObjectType {
    pub name: Name,
    pub fields: IndexMap<Name, MetaInputValue>,
}

impl InputObjectType {
    pub fn new(name: impl Into<Name>) -> Self {
        InputObjectType {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn field(mut self, field: MetaInputValue) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MetaField {
    pub name: Name,
    pub args: IndexMap<Name, MetaInputValue>,
    pub ty: Type,
    /// Without one, the value is read from the parent object.
    pub resolver: Option<Arc<dyn Resolver>>,
}

impl MetaField {
    /// A field of type `ty`, written the GraphQL way: `String`, `[User!]!`.
    pub fn new(name: impl Into<Name>, ty: &str) -> Self {
        MetaField {
            name: name.into(),
            args: IndexMap::new(),
            ty: parse_type(ty),
            resolver: None,
        }
    }

    #[must_use]
    pub fn argument(mut self, argument: MetaInputValue) -> Self {
        self.args.insert(argument.name.clone(), argument);
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }
}

/// An argument or an input object field.
#[derive(Debug, Clone)]
pub struct MetaInputValue {
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
}

impl MetaInputValue {
    pub fn new(name: impl Into<Name>, ty: &str) -> Self {
        MetaInputValue {
            name: name.into(),
            ty: parse_type(ty),
            default_value: None,
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<ConstValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

// Invalid type strings are kept as a named type, which the builder then reports as unknown.
fn parse_type(ty: &str) -> Type {
    Type::new(ty).unwrap_or_else(|| Type::nullable(BaseType::named(ty)))
}

macro_rules! impl_from_for_meta_type {
    ($($ty:ident => $variant:ident),*) => {
        $(
            impl From<$ty> for MetaType {
                fn from(ty: $ty) -> Self {
                    MetaType::$variant(ty)
                }
            }
        )*
    };
}

impl_from_for_meta_type!(
    ScalarType => Scalar,
    ObjectType => Object,
    InterfaceType => Interface,
    UnionType => Union,
    EnumType => Enum,
    InputObjectType => InputObject
);

impl Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema {{")?;
        writeln!(f, "  query: {}", self.query_type)?;
        if let Some(mutation) = &self.mutation_type {
            writeln!(f, "  mutation: {mutation}")?;
        }
        f.write_char('}')?;

        for ty in self.types.values() {
            match ty {
                MetaType::Scalar(scalar) if scalar.is_builtin() => continue,
                MetaType::Scalar(scalar) => write!(f, "\n\nscalar {}", scalar.name)?,
                MetaType::Object(object) => {
                    write!(f, "\n\ntype {}", object.name)?;
                    for (i, interface) in object.implements.iter().enumerate() {
                        write!(f, "{}{interface}", if i == 0 { " implements " } else { " & " })?;
                    }
                    write_fields(f, &object.fields)?;
                }
                MetaType::Interface(interface) => {
                    write!(f, "\n\ninterface {}", interface.name)?;
                    write_fields(f, &interface.fields)?;
                }
                MetaType::Union(union) => {
                    write!(f, "\n\nunion {} =", union.name)?;
                    for (i, member) in union.possible_types.iter().enumerate() {
                        write!(f, "{}{member}", if i == 0 { " " } else { " | " })?;
                    }
                }
                MetaType::Enum(r#enum) => {
                    write!(f, "\n\nenum {} {{", r#enum.name)?;
                    for value in &r#enum.values {
                        write!(f, "\n  {value}")?;
                    }
                    f.write_str("\n}")?;
                }
                MetaType::InputObject(input) => {
                    write!(f, "\n\ninput {} {{", input.name)?;
                    for field in input.fields.values() {
                        f.write_str("\n  ")?;
                        write_input_value(f, field)?;
                    }
                    f.write_str("\n}")?;
                }
            }
        }

        Ok(())
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &IndexMap<Name, MetaField>) -> fmt::Result {
    f.write_str(" {")?;
    for field in fields.values() {
        write!(f, "\n  {}", field.name)?;
        if !field.args.is_empty() {
            f.write_char('(')?;
            for (i, arg) in field.args.values().enumerate() {
                if i != 0 {
                    f.write_str(", ")?;
                }
                write_input_value(f, arg)?;
            }
            f.write_char(')')?;
        }
        write!(f, ": {}", field.ty)?;
    }
    f.write_str("\n}")
}

fn write_input_value(f: &mut fmt::Formatter<'_>, value: &MetaInputValue) -> fmt::Result {
    write!(f, "{}: {}", value.name, value.ty)?;
    if let Some(default) = &value.default_value {
        write!(f, " = {default}")?;
    }
    Ok(())
}
