//! Executable document-related GraphQL types.

use query_value::{ConstValue, Name, Value};

use super::{Directive, OperationType, Type};
use crate::pos::Positioned;

/// An executable GraphQL file or request string.
///
/// [Reference](https://spec.graphql.org/October2021/#ExecutableDocument).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableDocument {
    /// The definitions, in document order.
    pub definitions: Vec<ExecutableDefinition>,
}

impl ExecutableDocument {
    /// All operations of the document, in order.
    pub fn operations(&self) -> impl Iterator<Item = &Positioned<OperationDefinition>> + '_ {
        self.definitions.iter().filter_map(|definition| match definition {
            ExecutableDefinition::Operation(operation) => Some(operation),
            ExecutableDefinition::Fragment(_) => None,
        })
    }

    /// All fragment definitions of the document, in order.
    pub fn fragments(&self) -> impl Iterator<Item = &Positioned<FragmentDefinition>> + '_ {
        self.definitions.iter().filter_map(|definition| match definition {
            ExecutableDefinition::Fragment(fragment) => Some(fragment),
            ExecutableDefinition::Operation(_) => None,
        })
    }

    /// The first fragment definition with this name.
    pub fn fragment(&self, name: &str) -> Option<&Positioned<FragmentDefinition>> {
        self.fragments().find(|fragment| fragment.node.name.node == name)
    }
}

/// An executable definition in a query; a query, mutation, subscription or a fragment definition.
///
/// [Reference](https://spec.graphql.org/October2021/#ExecutableDefinition).
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutableDefinition {
    /// The definition of an operation.
    Operation(Positioned<OperationDefinition>),
    /// The definition of a fragment.
    Fragment(Positioned<FragmentDefinition>),
}

/// The definition of an operation, with its name if it isn't anonymous.
///
/// [Reference](https://spec.graphql.org/October2021/#OperationDefinition).
#[derive(Debug, Clone, PartialEq)]
pub struct OperationDefinition {
    /// The type of operation.
    pub ty: OperationType,
    /// The name of the operation, `None` for anonymous and shorthand operations.
    pub name: Option<Positioned<Name>>,
    /// The variable definitions.
    pub variable_definitions: Vec<Positioned<VariableDefinition>>,
    /// The operation's directives.
    pub directives: Vec<Positioned<Directive>>,
    /// The operation's selection set.
    pub selection_set: Positioned<SelectionSet>,
}

/// A variable definition inside a list of variable definitions, for example `$name:String!`.
///
/// [Reference](https://spec.graphql.org/October2021/#VariableDefinition).
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    /// The name of the variable, without the preceding `$`.
    pub name: Positioned<Name>,
    /// The type of the variable.
    pub var_type: Positioned<Type>,
    /// The variable's directives.
    pub directives: Vec<Positioned<Directive>>,
    /// The optional default value of the variable.
    pub default_value: Option<Positioned<ConstValue>>,
}

/// A set of fields to be selected, for example `{ name age }`.
///
/// [Reference](https://spec.graphql.org/October2021/#SelectionSet).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SelectionSet {
    /// The fields to be selected.
    pub items: Vec<Positioned<Selection>>,
}

/// A part of an object to be selected; a single field, a fragment spread or an inline fragment.
///
/// [Reference](https://spec.graphql.org/October2021/#Selection).
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Select a single field, such as `name` or `weightKilos: weight(unit: KILOGRAMS)`.
    Field(Positioned<Field>),
    /// Select using a fragment.
    FragmentSpread(Positioned<FragmentSpread>),
    /// Select using an inline fragment.
    InlineFragment(Positioned<InlineFragment>),
}

impl Selection {
    /// Get a reference to the directives of the selection.
    #[must_use]
    pub fn directives(&self) -> &Vec<Positioned<Directive>> {
        match self {
            Selection::Field(field) => &field.node.directives,
            Selection::FragmentSpread(spread) => &spread.node.directives,
            Selection::InlineFragment(fragment) => &fragment.node.directives,
        }
    }
}

/// A field being selected on an object, such as `name` or `weightKilos: weight(unit: KILOGRAMS)`.
///
/// [Reference](https://spec.graphql.org/October2021/#Field).
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The optional field alias.
    pub alias: Option<Positioned<Name>>,
    /// The name of the field.
    pub name: Positioned<Name>,
    /// The arguments to the field, empty if no arguments are provided.
    pub arguments: Vec<(Positioned<Name>, Positioned<Value>)>,
    /// The directives in the field selector.
    pub directives: Vec<Positioned<Directive>>,
    /// The subfields being selected in this field, if there is any.
    pub selection_set: Option<Positioned<SelectionSet>>,
}

impl Field {
    /// Get the response key of the field. This is the alias if present and the name otherwise.
    #[must_use]
    pub fn response_key(&self) -> &Positioned<Name> {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    /// Get the value of the argument with the specified name.
    #[must_use]
    pub fn get_argument(&self, name: &str) -> Option<&Positioned<Value>> {
        self.arguments
            .iter()
            .find(|item| item.0.node == name)
            .map(|item| &item.1)
    }
}

/// A fragment selector, such as `... userFields`.
///
/// [Reference](https://spec.graphql.org/October2021/#FragmentSpread).
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSpread {
    /// The name of the fragment being selected.
    pub fragment_name: Positioned<Name>,
    /// The directives in the fragment selector.
    pub directives: Vec<Positioned<Directive>>,
}

/// An inline fragment selector, such as `... on User { name }`.
///
/// [Reference](https://spec.graphql.org/October2021/#InlineFragment).
#[derive(Debug, Clone, PartialEq)]
pub struct InlineFragment {
    /// The type condition.
    pub type_condition: Option<Positioned<TypeCondition>>,
    /// The directives in the inline fragment.
    pub directives: Vec<Positioned<Directive>>,
    /// The selected fields of the fragment.
    pub selection_set: Positioned<SelectionSet>,
}

/// The definition of a fragment, such as `fragment userFields on User { name age }`.
///
/// [Reference](https://spec.graphql.org/October2021/#FragmentDefinition).
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentDefinition {
    /// The name of the fragment. Any name is allowed except `on`.
    pub name: Positioned<Name>,
    /// The type condition.
    pub type_condition: Positioned<TypeCondition>,
    /// The fragment's directives.
    pub directives: Vec<Positioned<Directive>>,
    /// The fragment's selection set.
    pub selection_set: Positioned<SelectionSet>,
}

/// A type a fragment can apply to (`on` followed by the type).
///
/// [Reference](https://spec.graphql.org/October2021/#TypeCondition).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCondition {
    /// The type this fragment operates on.
    pub on: Positioned<Name>,
}
