//! Document-wide rules, checked once per prepared document.
//!
//! Unlike the previous stages, all the violations are reported, in rule order.

mod limits;

use std::{collections::HashSet, fmt};

use query_parser::Pos;
use query_value::Name;

use crate::{
    config::OperationLimits,
    document::{visit_selection_set, Condition, FieldSelection, FragmentOrigin, FragmentSelection, SelectionVisitor},
    schema::Schema,
    typecheck::{InputValue, TypedDocument, TypedOperation},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("fragment \"{name}\" is never used")]
    UnusedFragment { name: Name, pos: Pos },
    #[error("There can be only one fragment named '{name}'")]
    DuplicateFragment { name: Name, pos: Pos },
    #[error("There can be only one operation named '{name}'")]
    DuplicateOperation { name: Name, pos: Pos },
    #[error("This anonymous operation must be the only defined operation.")]
    AnonymousOperationNotAlone { pos: Pos },
    #[error("Type condition on '{ty}' cannot be used in a '{parent}' selection_set")]
    DisjointTypeCondition { parent: Name, ty: Name, pos: Pos },
    #[error("Variable '${name}' is not used{operation}")]
    UnusedVariable {
        name: Name,
        operation: ErrorOperationName,
        pos: Pos,
    },
    #[error("Query contains too many root fields.")]
    TooManyRootFields { count: usize, pos: Pos },
    #[error("Query contains too many aliases.")]
    TooManyAliases { count: usize, pos: Pos },
    #[error("Query is nested too deep.")]
    TooDeep { depth: usize, pos: Pos },
    #[error("Must provide operation name if query contains multiple operations")]
    OperationNameRequired,
    #[error("Unknown operation named '{name}'")]
    UnknownOperation { name: String },
    #[error("Document does not contain any operation")]
    NoOperation,
}

impl ValidationError {
    pub fn location(&self) -> Option<Pos> {
        match self {
            ValidationError::UnusedFragment { pos, .. }
            | ValidationError::DuplicateFragment { pos, .. }
            | ValidationError::DuplicateOperation { pos, .. }
            | ValidationError::AnonymousOperationNotAlone { pos }
            | ValidationError::DisjointTypeCondition { pos, .. }
            | ValidationError::UnusedVariable { pos, .. }
            | ValidationError::TooManyRootFields { pos, .. }
            | ValidationError::TooManyAliases { pos, .. }
            | ValidationError::TooDeep { pos, .. } => Some(*pos),
            ValidationError::OperationNameRequired
            | ValidationError::UnknownOperation { .. }
            | ValidationError::NoOperation => None,
        }
    }
}

/// A helper struct for optionally including operation names in error messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorOperationName(Option<Name>);

impl fmt::Display for ErrorOperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.0 {
            write!(f, " by operation '{name}'")?;
        }
        Ok(())
    }
}

pub fn validate(
    schema: &Schema,
    document: &TypedDocument,
    limits: &OperationLimits,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for fragment in &document.fragments {
        if !seen.insert(&fragment.name) {
            errors.push(ValidationError::DuplicateFragment {
                name: fragment.name.clone(),
                pos: fragment.pos,
            });
        }
    }

    let mut seen = HashSet::new();
    for operation in &document.operations {
        match &operation.name {
            Some(name) if !seen.insert(&name.node) => errors.push(ValidationError::DuplicateOperation {
                name: name.node.clone(),
                pos: name.pos,
            }),
            None if document.operations.len() > 1 => {
                errors.push(ValidationError::AnonymousOperationNotAlone { pos: operation.pos })
            }
            _ => {}
        }
    }

    let mut spreads = SpreadCollector::default();
    for operation in &document.operations {
        visit_selection_set(&mut spreads, &operation.selection_set);
    }
    for fragment in &document.fragments {
        if !spreads.used.contains(&fragment.name) {
            errors.push(ValidationError::UnusedFragment {
                name: fragment.name.clone(),
                pos: fragment.pos,
            });
        }
    }

    let mut disjoint = DisjointTypeConditions { schema, errors: Vec::new() };
    for operation in &document.operations {
        visit_selection_set(&mut disjoint, &operation.selection_set);
    }
    errors.extend(disjoint.errors);

    for operation in &document.operations {
        errors.extend(unused_variables(operation));
    }

    for operation in &document.operations {
        errors.extend(limits::check(operation, limits));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Picks the operation a request asked for.
pub fn select_operation<'a>(
    document: &'a TypedDocument,
    operation_name: Option<&str>,
) -> Result<&'a TypedOperation, ValidationError> {
    match operation_name {
        Some(name) => document
            .operations
            .iter()
            .find(|operation| operation.name.as_ref().is_some_and(|n| n.node == name))
            .ok_or_else(|| ValidationError::UnknownOperation { name: name.to_string() }),
        None => match document.operations.as_slice() {
            [operation] => Ok(operation),
            [] => Err(ValidationError::NoOperation),
            _ => Err(ValidationError::OperationNameRequired),
        },
    }
}

#[derive(Default)]
struct SpreadCollector<'a> {
    used: HashSet<&'a Name>,
}

impl<'a> SelectionVisitor<'a, InputValue> for SpreadCollector<'a> {
    fn enter_fragment(&mut self, fragment: &'a FragmentSelection<InputValue>) {
        if let FragmentOrigin::Named(name) = &fragment.origin {
            self.used.insert(name);
        }
    }
}

struct DisjointTypeConditions<'a> {
    schema: &'a Schema,
    errors: Vec<ValidationError>,
}

impl<'a> SelectionVisitor<'a, InputValue> for DisjointTypeConditions<'a> {
    fn enter_fragment(&mut self, fragment: &'a FragmentSelection<InputValue>) {
        if fragment.parent_type == fragment.type_condition {
            return;
        }
        let possible_types = self.schema.possible_types(&fragment.parent_type);
        let overlaps = self
            .schema
            .possible_types(&fragment.type_condition)
            .iter()
            .any(|ty| possible_types.contains(ty));
        if !overlaps {
            self.errors.push(ValidationError::DisjointTypeCondition {
                parent: fragment.parent_type.clone(),
                ty: fragment.type_condition.clone(),
                pos: fragment.pos,
            });
        }
    }
}

fn unused_variables(operation: &TypedOperation) -> Vec<ValidationError> {
    #[derive(Default)]
    struct Usages<'a> {
        variables: Vec<&'a Name>,
    }

    impl<'a> SelectionVisitor<'a, InputValue> for Usages<'a> {
        fn enter_field(&mut self, field: &'a FieldSelection<InputValue>) {
            for (_, value) in &field.arguments {
                value.referenced_variables(&mut self.variables);
            }
        }

        fn enter_condition(&mut self, condition: &'a Condition<InputValue>) {
            for (_, value) in &condition.arguments {
                value.referenced_variables(&mut self.variables);
            }
        }
    }

    let mut usages = Usages::default();
    visit_selection_set(&mut usages, &operation.selection_set);

    operation
        .env
        .variables
        .values()
        .filter(|variable| !usages.variables.contains(&&variable.name))
        .map(|variable| ValidationError::UnusedVariable {
            name: variable.name.clone(),
            operation: ErrorOperationName(operation.env.operation_name.clone()),
            pos: variable.pos,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use query_parser::parse_query;

    use super::*;
    use crate::{
        elaborate::elaborate,
        schema::{InterfaceType, MetaField, MetaInputValue, ObjectType, UnionType},
        typecheck::typecheck,
    };

    fn schema() -> Schema {
        Schema::builder()
            .register(
                ObjectType::new("Query")
                    .field(MetaField::new("user", "User").argument(MetaInputValue::new("id", "ID")))
                    .field(MetaField::new("node", "Node"))
                    .field(MetaField::new("search", "[SearchResult!]!")),
            )
            .register(InterfaceType::new("Node").field(MetaField::new("id", "ID!")))
            .register(
                ObjectType::new("User")
                    .implements("Node")
                    .field(MetaField::new("id", "ID!"))
                    .field(MetaField::new("name", "String"))
                    .field(MetaField::new("friends", "[User!]!")),
            )
            .register(ObjectType::new("Post").field(MetaField::new("title", "String")))
            .register(UnionType::new("SearchResult").member("Post"))
            .build()
            .unwrap()
    }

    fn typed(query: &str) -> TypedDocument {
        let schema = schema();
        typecheck(&schema, elaborate(&schema, &parse_query(query).unwrap()).unwrap()).unwrap()
    }

    fn errors_with(query: &str, limits: &OperationLimits) -> Vec<String> {
        match validate(&schema(), &typed(query), limits) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(ToString::to_string).collect(),
        }
    }

    fn errors(query: &str) -> Vec<String> {
        errors_with(query, &OperationLimits::default())
    }

    #[test]
    fn documents_without_fragments_pass() {
        assert_eq!(errors("query A($id: ID) { user(id: $id) { id name } }"), Vec::<String>::new());
    }

    #[test]
    fn unused_fragments() {
        assert_eq!(
            errors("{ user { ...Used } } fragment Used on User { id } fragment Unused on User { name }"),
            vec![r#"fragment "Unused" is never used"#]
        );
    }

    #[test]
    fn fragments_spread_from_fragments_are_used() {
        assert_eq!(
            errors("{ user { ...A } } fragment A on User { ...B } fragment B on User { id }"),
            Vec::<String>::new()
        );
    }

    #[test]
    fn names() {
        assert_eq!(
            errors("query A { user { id } } query A { node { id } } { user { name } }"),
            vec![
                "There can be only one operation named 'A'",
                "This anonymous operation must be the only defined operation.",
            ]
        );
        assert_eq!(
            errors("{ user { ...F } } fragment F on User { id } fragment F on User { name }"),
            vec!["There can be only one fragment named 'F'"]
        );
    }

    #[test]
    fn disjoint_type_conditions() {
        assert_eq!(
            errors("{ node { ... on Post { title } } user { ... on Node { id } } }"),
            vec!["Type condition on 'Post' cannot be used in a 'Node' selection_set"]
        );
    }

    #[test]
    fn unused_variables() {
        assert_eq!(
            errors("query A($id: ID, $skip: Boolean!, $unused: Int) { user(id: $id) @skip(if: $skip) { id } }"),
            vec!["Variable '$unused' is not used by operation 'A'"]
        );
    }

    #[test]
    fn operation_limits() {
        let limits = OperationLimits {
            depth: Some(2),
            aliases: Some(1),
            root_fields: Some(1),
        };
        assert_eq!(
            errors_with("{ a: user { b: friends { friends { id } } } node { id } }", &limits),
            vec![
                "Query contains too many aliases.",
                "Query is nested too deep.",
                "Query contains too many root fields.",
            ]
        );
    }

    #[test]
    fn operation_selection() {
        let document = typed("query A { user { id } } query B { node { id } }");

        assert_eq!(
            select_operation(&document, None).unwrap_err().to_string(),
            "Must provide operation name if query contains multiple operations"
        );
        assert_eq!(
            select_operation(&document, Some("C")).unwrap_err().to_string(),
            "Unknown operation named 'C'"
        );
        assert_eq!(
            select_operation(&document, Some("B")).unwrap().env.operation_name.as_deref(),
            Some("B")
        );
    }
}
