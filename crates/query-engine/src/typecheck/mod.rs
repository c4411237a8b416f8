//! Checks argument values and variable usages of an elaborated document.
//!
//! Constant arguments are coerced once here, so executing a prepared operation only has to
//! substitute variables. Each operation gets a [`FunEnv`] describing the variables it declares
//! and how they are used.

use indexmap::IndexMap;
use query_parser::{
    types::{OperationType, Type},
    Pos, Positioned,
};
use query_value::{ConstValue, Name, Value, Variables};

use crate::{
    coercion::{CoercionMode, InputCoercer, InputValueError},
    document::{Condition, FieldSelection, FragmentSelection, Selection, SelectionSet},
    elaborate::{ElaboratedDocument, ElaboratedOperation, FragmentSummary},
    schema::{MetaInputValue, Schema},
};

type Result<T> = std::result::Result<T, TypeError>;

/// A checked argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    /// Fully coerced, doesn't depend on the request.
    Const(ConstValue),
    Variable {
        name: Name,
        /// Default of the position the variable is used in, applied when it's absent.
        default_value: Option<ConstValue>,
    },
    List(Vec<InputValue>),
    Object(IndexMap<Name, InputValue>),
}

impl InputValue {
    /// Substitutes the coerced variables. `None` if the value is an absent variable without
    /// default, in which case the argument or input field is left out.
    pub fn evaluate(&self, variables: &Variables) -> Option<ConstValue> {
        match self {
            InputValue::Const(value) => Some(value.clone()),
            InputValue::Variable { name, default_value } => {
                variables.get(name).cloned().or_else(|| default_value.clone())
            }
            InputValue::List(items) => Some(ConstValue::List(
                items
                    .iter()
                    .map(|item| item.evaluate(variables).unwrap_or_default())
                    .collect(),
            )),
            InputValue::Object(fields) => Some(ConstValue::Object(
                fields
                    .iter()
                    .filter_map(|(name, value)| Some((name.clone(), value.evaluate(variables)?)))
                    .collect(),
            )),
        }
    }

    pub fn referenced_variables<'a>(&'a self, variables: &mut Vec<&'a Name>) {
        match self {
            InputValue::Const(_) => {}
            InputValue::Variable { name, .. } => variables.push(name),
            InputValue::List(items) => items.iter().for_each(|item| item.referenced_variables(variables)),
            InputValue::Object(fields) => fields.values().for_each(|value| value.referenced_variables(variables)),
        }
    }
}

/// A variable declared by an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSignature {
    pub name: Name,
    pub ty: Type,
    /// The declared default, already coerced.
    pub default_value: Option<ConstValue>,
    /// Nullable but used where a non-null value is expected: null must be rejected.
    pub used_in_non_null_position: bool,
    /// Used in a non-null position without any default to fall back to: it must be provided.
    pub required_by_usage: bool,
    pub pos: Pos,
}

/// What an operation needs from a request to run.
#[derive(Debug, Clone, PartialEq)]
pub struct FunEnv {
    pub operation_name: Option<Name>,
    pub operation_type: OperationType,
    /// The root object type of the operation.
    pub root_type: Name,
    pub variables: IndexMap<Name, VariableSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedOperation {
    pub name: Option<Positioned<Name>>,
    pub ty: OperationType,
    pub pos: Pos,
    pub selection_set: SelectionSet<InputValue>,
    pub env: FunEnv,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypedDocument {
    pub operations: Vec<TypedOperation>,
    pub fragments: Vec<FragmentSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("Unknown type named '{ty}' for variable '${name}'")]
    UnknownVariableType { name: Name, ty: Name, pos: Pos },
    #[error(
        "Variable named '${name}' does not have a valid input type. Can only be a scalar, enum or input object. Found: '{ty}'."
    )]
    InvalidVariableType { name: Name, ty: String, pos: Pos },
    #[error("There can only be one variable named '${name}'")]
    DuplicateVariable { name: Name, pos: Pos },
    #[error("Variable ${name} has an invalid default value. {err}")]
    InvalidDefaultValue { name: Name, err: InputValueError, pos: Pos },
    #[error("Invalid value for argument '{name}' of {target}. {err}")]
    InvalidArgument {
        name: Name,
        target: String,
        err: InputValueError,
        pos: Pos,
    },
    #[error("{err}")]
    InvalidVariableUsage { err: InputValueError, pos: Pos },
    #[error("Missing argument named '{name}' for {target}")]
    MissingArgument { name: Name, target: String, pos: Pos },
}

impl TypeError {
    pub fn location(&self) -> Pos {
        match self {
            TypeError::UnknownVariableType { pos, .. }
            | TypeError::InvalidVariableType { pos, .. }
            | TypeError::DuplicateVariable { pos, .. }
            | TypeError::InvalidDefaultValue { pos, .. }
            | TypeError::InvalidArgument { pos, .. }
            | TypeError::InvalidVariableUsage { pos, .. }
            | TypeError::MissingArgument { pos, .. } => *pos,
        }
    }
}

pub fn typecheck(schema: &Schema, document: ElaboratedDocument) -> Result<TypedDocument> {
    let operations = document
        .operations
        .into_iter()
        .map(|operation| typecheck_operation(schema, operation))
        .collect::<Result<Vec<_>>>()?;

    Ok(TypedDocument {
        operations,
        fragments: document.fragments,
    })
}

fn typecheck_operation(schema: &Schema, operation: ElaboratedOperation) -> Result<TypedOperation> {
    let mut variables = IndexMap::with_capacity(operation.variable_definitions.len());
    for definition in operation.variable_definitions {
        let definition = definition.node;
        let name = definition.name.node;
        let ty = definition.var_type.node;

        match schema.type_by_name(ty.named_type()) {
            None => {
                return Err(TypeError::UnknownVariableType {
                    ty: ty.named_type().clone(),
                    name,
                    pos: definition.var_type.pos,
                })
            }
            Some(named_type) if !named_type.is_input() => {
                return Err(TypeError::InvalidVariableType {
                    name,
                    ty: ty.to_string(),
                    pos: definition.var_type.pos,
                })
            }
            Some(_) => {}
        }

        if variables.contains_key(&name) {
            return Err(TypeError::DuplicateVariable {
                name,
                pos: definition.name.pos,
            });
        }

        let default_value = match definition.default_value {
            Some(default_value) => Some(
                InputCoercer::new(schema, CoercionMode::Literal, name.clone())
                    .coerce(&ty, default_value.node)
                    .map_err(|err| TypeError::InvalidDefaultValue {
                        name: name.clone(),
                        err,
                        pos: default_value.pos,
                    })?,
            ),
            None => None,
        };

        variables.insert(
            name.clone(),
            VariableSignature {
                name,
                ty,
                default_value,
                used_in_non_null_position: false,
                required_by_usage: false,
                pos: definition.name.pos,
            },
        );
    }

    let mut checker = TypeChecker { schema, variables };
    let selection_set = checker.selection_set(operation.selection_set)?;

    Ok(TypedOperation {
        env: FunEnv {
            operation_name: operation.name.as_ref().map(|name| name.node.clone()),
            operation_type: operation.ty,
            root_type: operation.root_type,
            variables: checker.variables,
        },
        name: operation.name,
        ty: operation.ty,
        pos: operation.pos,
        selection_set,
    })
}

struct TypeChecker<'a> {
    schema: &'a Schema,
    variables: IndexMap<Name, VariableSignature>,
}

impl TypeChecker<'_> {
    fn selection_set(&mut self, selection_set: SelectionSet<Value>) -> Result<SelectionSet<InputValue>> {
        let items = selection_set
            .items
            .into_iter()
            .map(|selection| match selection {
                Selection::Field(field) => self.field(field).map(Selection::Field),
                Selection::Fragment(fragment) => self.fragment(fragment).map(Selection::Fragment),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(SelectionSet { items })
    }

    fn field(&mut self, field: FieldSelection<Value>) -> Result<FieldSelection<InputValue>> {
        let conditions = self.conditions(field.conditions)?;
        let arguments = match self.schema.field(&field.parent_type, &field.name) {
            Some(meta_field) => {
                let target = format!("field '{}.{}'", field.parent_type, field.name);
                self.arguments(&target, meta_field.args.values(), field.arguments, field.pos)?
            }
            // `__typename`
            None => Vec::new(),
        };

        Ok(FieldSelection {
            pos: field.pos,
            alias: field.alias,
            name: field.name,
            parent_type: field.parent_type,
            ty: field.ty,
            arguments,
            conditions,
            selection_set: self.selection_set(field.selection_set)?,
        })
    }

    fn fragment(&mut self, fragment: FragmentSelection<Value>) -> Result<FragmentSelection<InputValue>> {
        Ok(FragmentSelection {
            pos: fragment.pos,
            origin: fragment.origin,
            parent_type: fragment.parent_type,
            type_condition: fragment.type_condition,
            conditions: self.conditions(fragment.conditions)?,
            selection_set: self.selection_set(fragment.selection_set)?,
        })
    }

    fn conditions(&mut self, conditions: Vec<Condition<Value>>) -> Result<Vec<Condition<InputValue>>> {
        let definition = MetaInputValue::new("if", "Boolean!");
        conditions
            .into_iter()
            .map(|condition| {
                let target = format!("directive '@{}'", condition.kind);
                Ok(Condition {
                    kind: condition.kind,
                    pos: condition.pos,
                    arguments: self.arguments(&target, [&definition].into_iter(), condition.arguments, condition.pos)?,
                })
            })
            .collect()
    }

    /// Checks the arguments against their definitions, in definition order, filling in defaults.
    fn arguments<'d>(
        &mut self,
        target: &str,
        definitions: impl Iterator<Item = &'d MetaInputValue>,
        mut arguments: Vec<(Positioned<Name>, Positioned<Value>)>,
        pos: Pos,
    ) -> Result<Vec<(Positioned<Name>, Positioned<InputValue>)>> {
        let mut checked = Vec::with_capacity(arguments.len());
        for definition in definitions {
            match arguments.iter().position(|(name, _)| name.node == definition.name) {
                Some(index) => {
                    let (name, value) = arguments.remove(index);
                    let input_value = InputCoercer::new(self.schema, CoercionMode::Literal, definition.name.clone())
                        .with_variables(&mut self.variables)
                        .coerce_literal(&definition.ty, value.node, definition.default_value.as_ref())
                        .map_err(|err| match err {
                            InputValueError::UnknownVariable { .. } | InputValueError::IncorrectVariableType { .. } => {
                                TypeError::InvalidVariableUsage { err, pos: value.pos }
                            }
                            err => TypeError::InvalidArgument {
                                name: definition.name.clone(),
                                target: target.to_string(),
                                err,
                                pos: value.pos,
                            },
                        })?;
                    checked.push((name, Positioned::new(input_value, value.pos)));
                }
                None => {
                    if let Some(default_value) = &definition.default_value {
                        checked.push((
                            Positioned::new(definition.name.clone(), pos),
                            Positioned::new(InputValue::Const(default_value.clone()), pos),
                        ));
                    } else if !definition.ty.nullable {
                        return Err(TypeError::MissingArgument {
                            name: definition.name.clone(),
                            target: target.to_string(),
                            pos,
                        });
                    }
                }
            }
        }
        Ok(checked)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use query_parser::parse_query;

    use super::*;
    use crate::{
        elaborate::elaborate,
        schema::{EnumType, InputObjectType, MetaField, ObjectType},
    };

    fn schema() -> Schema {
        Schema::builder()
            .register(
                ObjectType::new("Query")
                    .field(MetaField::new("user", "User").argument(MetaInputValue::new("id", "ID!")))
                    .field(
                        MetaField::new("users", "[User!]!")
                            .argument(MetaInputValue::new("first", "Int").default_value(10))
                            .argument(MetaInputValue::new("filter", "UserFilter")),
                    ),
            )
            .register(
                ObjectType::new("User")
                    .field(MetaField::new("id", "ID!"))
                    .field(MetaField::new("name", "String")),
            )
            .register(EnumType::new("Role", ["ADMIN", "GUEST"]))
            .register(
                InputObjectType::new("UserFilter")
                    .field(MetaInputValue::new("role", "Role!"))
                    .field(MetaInputValue::new("name", "String")),
            )
            .build()
            .unwrap()
    }

    fn check(query: &str) -> Result<TypedDocument> {
        let schema = schema();
        typecheck(&schema, elaborate(&schema, &parse_query(query).unwrap()).unwrap())
    }

    fn error(query: &str) -> String {
        check(query).unwrap_err().to_string()
    }

    fn root_field(document: &TypedDocument) -> &FieldSelection<InputValue> {
        match &document.operations[0].selection_set.items[0] {
            Selection::Field(field) => field,
            Selection::Fragment(_) => unreachable!(),
        }
    }

    #[test]
    fn constant_arguments_are_coerced_and_defaults_filled() {
        let document = check("{ users(filter: { role: ADMIN }) { id } }").unwrap();
        let users = root_field(&document);

        let arguments = users
            .arguments
            .iter()
            .map(|(name, value)| (name.node.as_str(), value.node.clone()))
            .collect::<Vec<_>>();
        assert_eq!(
            arguments,
            vec![
                ("first", InputValue::Const(ConstValue::Int(10))),
                (
                    "filter",
                    InputValue::Const(ConstValue::object([("role", ConstValue::Enum(Name::new("ADMIN")))]))
                ),
            ]
        );
    }

    #[test]
    fn variables_are_tracked_per_operation() {
        let document = check(
            r#"
            query A($id: ID, $first: Int = 3) { user(id: $id) { id } users(first: $first) { id } }
            query B($role: Role!) { users(filter: { role: $role, name: "x" }) { id } }
            "#,
        )
        .unwrap();

        let a = &document.operations[0].env;
        assert_eq!(a.operation_name.as_deref(), Some("A"));
        assert!(a.variables["id"].used_in_non_null_position);
        assert!(a.variables["id"].required_by_usage);
        assert_eq!(a.variables["first"].default_value, Some(ConstValue::Int(3)));
        assert!(!a.variables["first"].used_in_non_null_position);

        let b = &document.operations[1];
        assert_eq!(b.env.variables.keys().collect::<Vec<_>>(), vec!["role"]);
        let Selection::Field(users) = &b.selection_set.items[0] else {
            unreachable!()
        };
        let filter = &users.argument("filter").unwrap().node;

        let variables = Variables::from_json(serde_json::json!({"role": "GUEST"}));
        assert_eq!(
            filter.evaluate(&variables),
            Some(ConstValue::object([
                ("role", ConstValue::from("GUEST")),
                ("name", ConstValue::from("x")),
            ]))
        );
    }

    #[test]
    fn absent_variables_fall_back_to_the_position_default() {
        let document = check("query ($first: Int) { users(first: $first) { id } }").unwrap();
        let first = &root_field(&document).argument("first").unwrap().node;

        assert_eq!(first.evaluate(&Variables::default()), Some(ConstValue::Int(10)));
        assert!(!document.operations[0].env.variables["first"].required_by_usage);
    }

    #[test]
    fn rejects_invalid_arguments() {
        assert_eq!(error("{ user { id } }"), "Missing argument named 'id' for field 'Query.user'");
        assert_eq!(
            error("{ users(first: \"ten\") { id } }"),
            "Invalid value for argument 'first' of field 'Query.users'. Found a string where we expected a Int scalar"
        );
        assert_eq!(
            error("{ users(filter: { role: ROOT }) { id } }"),
            "Invalid value for argument 'filter' of field 'Query.users'. Unknown enum value 'ROOT' for enum Role at path 'filter.role'"
        );
        assert_eq!(
            error("{ users @skip { id } }"),
            "Missing argument named 'if' for directive '@skip'"
        );
    }

    #[test]
    fn rejects_invalid_variables() {
        assert_eq!(error("{ user(id: $id) { id } }"), "Unknown variable $id");
        assert_eq!(
            error("query ($id: Int) { user(id: $id) { id } }"),
            "Variable $id doesn't have the right type. Declared as 'Int' but used as 'ID!'"
        );
        assert_eq!(
            error("query ($id: ID, $id: ID) { user(id: $id) { id } }"),
            "There can only be one variable named '$id'"
        );
        assert_eq!(
            error("query ($u: User) { user(id: 1) { id } }"),
            "Variable named '$u' does not have a valid input type. Can only be a scalar, enum or input object. Found: 'User'."
        );
        assert_eq!(
            error("query ($u: Person) { user(id: 1) { id } }"),
            "Unknown type named 'Person' for variable '$u'"
        );
        assert_eq!(
            error("query ($first: Int = \"ten\") { users(first: $first) { id } }"),
            "Variable $first has an invalid default value. Found a string where we expected a Int scalar"
        );
    }
}
