//! Selection trees shared by the elaborated and the typed documents.
//!
//! Both stages produce the same shape, they only differ by how argument values are represented:
//! raw literals after elaboration, checked [`InputValue`](crate::typecheck::InputValue)s after
//! type checking.

use query_parser::{types::Type, Pos, Positioned};
use query_value::Name;

pub(crate) const TYPENAME_FIELD: &str = "__typename";

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSet<V> {
    pub items: Vec<Selection<V>>,
}

impl<V> Default for SelectionSet<V> {
    fn default() -> Self {
        SelectionSet { items: Vec::new() }
    }
}

impl<V> SelectionSet<V> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection<V> {
    Field(FieldSelection<V>),
    Fragment(FragmentSelection<V>),
}

/// A field checked against the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSelection<V> {
    pub pos: Pos,
    pub alias: Option<Name>,
    pub name: Name,
    /// The type the field is selected on, possibly an interface.
    pub parent_type: Name,
    /// The declared type of the field.
    pub ty: Type,
    pub arguments: Vec<(Positioned<Name>, Positioned<V>)>,
    pub conditions: Vec<Condition<V>>,
    /// Empty for scalars and enums.
    pub selection_set: SelectionSet<V>,
}

impl<V> FieldSelection<V> {
    /// The key of the field in the response: the alias if present and the name otherwise.
    pub fn response_key(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }

    pub fn is_typename(&self) -> bool {
        self.name == TYPENAME_FIELD
    }

    pub fn argument(&self, name: &str) -> Option<&Positioned<V>> {
        self.arguments
            .iter()
            .find(|(argument, _)| argument.node == name)
            .map(|(_, value)| value)
    }
}

/// A named fragment spliced where it was spread, or an inline fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentSelection<V> {
    pub pos: Pos,
    pub origin: FragmentOrigin,
    /// The type of the selection set the fragment appears in.
    pub parent_type: Name,
    /// The type condition, the parent type for inline fragments without one.
    pub type_condition: Name,
    pub conditions: Vec<Condition<V>>,
    pub selection_set: SelectionSet<V>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentOrigin {
    Named(Name),
    Inline,
}

/// A `@skip` or `@include` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition<V> {
    pub kind: ConditionKind,
    pub pos: Pos,
    pub arguments: Vec<(Positioned<Name>, Positioned<V>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ConditionKind {
    Skip,
    Include,
}

/// Visits every field and fragment of a selection tree, depth first.
pub(crate) trait SelectionVisitor<'a, V> {
    fn enter_field(&mut self, _field: &'a FieldSelection<V>) {}
    fn leave_field(&mut self, _field: &'a FieldSelection<V>) {}
    fn enter_fragment(&mut self, _fragment: &'a FragmentSelection<V>) {}
    fn enter_condition(&mut self, _condition: &'a Condition<V>) {}
}

pub(crate) fn visit_selection_set<'a, V>(
    visitor: &mut impl SelectionVisitor<'a, V>,
    selection_set: &'a SelectionSet<V>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                visitor.enter_field(field);
                for condition in &field.conditions {
                    visitor.enter_condition(condition);
                }
                visit_selection_set(visitor, &field.selection_set);
                visitor.leave_field(field);
            }
            Selection::Fragment(fragment) => {
                visitor.enter_fragment(fragment);
                for condition in &fragment.conditions {
                    visitor.enter_condition(condition);
                }
                visit_selection_set(visitor, &fragment.selection_set);
            }
        }
    }
}
