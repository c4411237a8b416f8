//! Resolves the fields of a parsed document against the schema.
//!
//! Every field gets the type it's selected on and its declared type, named fragments are spliced
//! where they're spread. Argument values are kept as written, the type checker takes it from
//! there.

mod error;

use std::collections::HashMap;

use query_parser::{
    types::{self, Directive, ExecutableDocument, FragmentDefinition, OperationType, VariableDefinition},
    Pos, Positioned,
};
use query_value::{Name, Value};

pub use error::ElaborationError;

use crate::{
    document::{
        Condition, ConditionKind, FieldSelection, FragmentOrigin, FragmentSelection, Selection, SelectionSet,
        TYPENAME_FIELD,
    },
    schema::{MetaType, Schema},
};

type Result<T> = std::result::Result<T, ElaborationError>;

/// Upper bound on the selections a document may expand to once named fragments are spliced.
pub const MAX_EXPANDED_SELECTIONS: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq)]
pub struct ElaboratedDocument {
    pub operations: Vec<ElaboratedOperation>,
    /// Every fragment definition, in document order, spread or not.
    pub fragments: Vec<FragmentSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElaboratedOperation {
    pub name: Option<Positioned<Name>>,
    pub ty: OperationType,
    pub pos: Pos,
    pub root_type: Name,
    pub variable_definitions: Vec<Positioned<VariableDefinition>>,
    pub selection_set: SelectionSet<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentSummary {
    pub name: Name,
    pub pos: Pos,
    pub type_condition: Name,
}

pub fn elaborate(schema: &Schema, document: &ExecutableDocument) -> Result<ElaboratedDocument> {
    let mut elaborator = Elaborator {
        schema,
        fragments: HashMap::new(),
        spreads: Vec::new(),
        expanded: 0,
    };
    for fragment in document.fragments() {
        // The validator reports duplicates, the first definition is the one used.
        elaborator
            .fragments
            .entry(fragment.name.as_str())
            .or_insert(fragment);
    }

    let mut fragments = Vec::new();
    for fragment in document.fragments() {
        elaborator.reject_directives(&fragment.directives, "fragment definitions")?;
        let type_condition = &fragment.type_condition.on;
        elaborator.composite_type(type_condition)?;
        fragments.push(FragmentSummary {
            name: fragment.name.node.clone(),
            pos: fragment.pos,
            type_condition: type_condition.node.clone(),
        });
    }

    let operations = document
        .operations()
        .map(|operation| {
            let root_type = match operation.ty {
                OperationType::Query => Some(schema.query_type()),
                OperationType::Mutation => schema.mutation_type(),
                OperationType::Subscription => {
                    return Err(ElaborationError::SubscriptionsNotSupported { pos: operation.pos })
                }
            }
            .and_then(|name| schema.type_by_name(name))
            .ok_or(ElaborationError::NoMutationDefined { pos: operation.pos })?;

            elaborator.reject_directives(&operation.directives, "operations")?;
            for variable in &operation.variable_definitions {
                elaborator.reject_directives(&variable.directives, "variable definitions")?;
            }

            Ok(ElaboratedOperation {
                name: operation.name.clone(),
                ty: operation.ty,
                pos: operation.pos,
                root_type: root_type.name().clone(),
                variable_definitions: operation.variable_definitions.clone(),
                selection_set: elaborator.selection_set(root_type, &operation.selection_set)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ElaboratedDocument { operations, fragments })
}

struct Elaborator<'a> {
    schema: &'a Schema,
    fragments: HashMap<&'a str, &'a Positioned<FragmentDefinition>>,
    /// Named fragments being spliced, innermost last.
    spreads: Vec<&'a str>,
    /// Selections produced so far, across all operations.
    expanded: usize,
}

impl<'a> Elaborator<'a> {
    fn selection_set(
        &mut self,
        parent: &'a MetaType,
        selection_set: &'a Positioned<types::SelectionSet>,
    ) -> Result<SelectionSet<Value>> {
        let mut items = Vec::with_capacity(selection_set.items.len());
        for selection in &selection_set.items {
            self.expanded += 1;
            if self.expanded > MAX_EXPANDED_SELECTIONS {
                return Err(ElaborationError::TooManySelections {
                    limit: MAX_EXPANDED_SELECTIONS,
                    pos: selection.pos,
                });
            }
            let selection = match &selection.node {
                types::Selection::Field(field) => Selection::Field(self.field(parent, field)?),
                types::Selection::FragmentSpread(spread) => Selection::Fragment(self.fragment_spread(parent, spread)?),
                types::Selection::InlineFragment(fragment) => {
                    Selection::Fragment(self.inline_fragment(parent, fragment)?)
                }
            };
            items.push(selection);
        }
        Ok(SelectionSet { items })
    }

    fn field(&mut self, parent: &'a MetaType, field: &'a Positioned<types::Field>) -> Result<FieldSelection<Value>> {
        let name = &field.name;
        let conditions = self.conditions(&field.directives)?;

        if name.node == TYPENAME_FIELD {
            if let Some((argument, _)) = field.arguments.first() {
                return Err(ElaborationError::UnknownArgument {
                    target: format!("field '{}'", TYPENAME_FIELD),
                    name: argument.node.clone(),
                    pos: argument.pos,
                });
            }
            if field.selection_set.is_some() {
                return Err(ElaborationError::CannotHaveSelectionSet {
                    name: name.node.clone(),
                    ty: "String!".to_string(),
                    pos: name.pos,
                });
            }
            return Ok(FieldSelection {
                pos: field.pos,
                alias: field.alias.as_ref().map(|alias| alias.node.clone()),
                name: name.node.clone(),
                parent_type: parent.name().clone(),
                ty: types::Type::required(types::BaseType::named("String")),
                arguments: Vec::new(),
                conditions,
                selection_set: SelectionSet::default(),
            });
        }

        let meta_field = match parent {
            MetaType::Union(union) => {
                return Err(ElaborationError::UnionHaveNoFields {
                    name: name.node.clone(),
                    ty: union.name.clone(),
                    pos: name.pos,
                })
            }
            parent => parent.field(name).ok_or_else(|| ElaborationError::UnknownField {
                name: name.node.clone(),
                ty: parent.name().clone(),
                pos: name.pos,
            })?,
        };

        let target = format!("field '{}.{}'", parent.name(), meta_field.name);
        check_arguments(&field.arguments, &target, |argument| meta_field.args.contains_key(argument))?;

        // The schema builder made sure field types exist.
        let Some(field_type) = self.schema.type_by_name(meta_field.ty.named_type()) else {
            return Err(ElaborationError::UnknownType {
                name: meta_field.ty.named_type().clone(),
                pos: name.pos,
            });
        };

        let selection_set = match (&field.selection_set, field_type.is_composite()) {
            (Some(selection_set), true) => self.selection_set(field_type, selection_set)?,
            (None, false) => SelectionSet::default(),
            (Some(_), false) => {
                return Err(ElaborationError::CannotHaveSelectionSet {
                    name: name.node.clone(),
                    ty: field_type.kind().to_string(),
                    pos: name.pos,
                })
            }
            (None, true) => {
                return Err(ElaborationError::MissingSelectionSet {
                    name: name.node.clone(),
                    ty: meta_field.ty.to_string(),
                    pos: name.pos,
                })
            }
        };

        Ok(FieldSelection {
            pos: field.pos,
            alias: field.alias.as_ref().map(|alias| alias.node.clone()),
            name: name.node.clone(),
            parent_type: parent.name().clone(),
            ty: meta_field.ty.clone(),
            arguments: field.arguments.clone(),
            conditions,
            selection_set,
        })
    }

    fn fragment_spread(
        &mut self,
        parent: &'a MetaType,
        spread: &'a Positioned<types::FragmentSpread>,
    ) -> Result<FragmentSelection<Value>> {
        let name = &spread.fragment_name;
        let Some(fragment) = self.fragments.get(name.as_str()).copied() else {
            return Err(ElaborationError::UnknownFragment {
                name: name.node.clone(),
                pos: name.pos,
            });
        };
        if self.spreads.contains(&name.as_str()) {
            return Err(ElaborationError::FragmentCycle {
                name: name.node.clone(),
                pos: name.pos,
            });
        }

        let conditions = self.conditions(&spread.directives)?;
        let type_condition = self.composite_type(&fragment.type_condition.on)?;

        self.spreads.push(name.as_str());
        let selection_set = self.selection_set(type_condition, &fragment.selection_set)?;
        self.spreads.pop();

        Ok(FragmentSelection {
            pos: spread.pos,
            origin: FragmentOrigin::Named(name.node.clone()),
            parent_type: parent.name().clone(),
            type_condition: type_condition.name().clone(),
            conditions,
            selection_set,
        })
    }

    fn inline_fragment(
        &mut self,
        parent: &'a MetaType,
        fragment: &'a Positioned<types::InlineFragment>,
    ) -> Result<FragmentSelection<Value>> {
        let conditions = self.conditions(&fragment.directives)?;
        let type_condition = match &fragment.type_condition {
            Some(type_condition) => self.composite_type(&type_condition.on)?,
            None => parent,
        };

        Ok(FragmentSelection {
            pos: fragment.pos,
            origin: FragmentOrigin::Inline,
            parent_type: parent.name().clone(),
            type_condition: type_condition.name().clone(),
            conditions,
            selection_set: self.selection_set(type_condition, &fragment.selection_set)?,
        })
    }

    fn composite_type(&self, name: &Positioned<Name>) -> Result<&'a MetaType> {
        match self.schema.type_by_name(name) {
            Some(ty) if ty.is_composite() => Ok(ty),
            Some(_) => Err(ElaborationError::InvalidTypeConditionTargetType {
                name: name.node.clone(),
                pos: name.pos,
            }),
            None => Err(ElaborationError::UnknownType {
                name: name.node.clone(),
                pos: name.pos,
            }),
        }
    }

    fn conditions(&self, directives: &[Positioned<Directive>]) -> Result<Vec<Condition<Value>>> {
        directives
            .iter()
            .map(|directive| {
                let kind = known_directive(directive)?;
                check_arguments(&directive.arguments, &format!("directive @{}", directive.name), |argument| {
                    argument == "if"
                })?;
                Ok(Condition {
                    kind,
                    pos: directive.pos,
                    arguments: directive.arguments.clone(),
                })
            })
            .collect()
    }

    fn reject_directives(&self, directives: &[Positioned<Directive>], location: &'static str) -> Result<()> {
        match directives.first() {
            Some(directive) => {
                known_directive(directive)?;
                Err(ElaborationError::MisplacedDirective {
                    name: directive.name.node.clone(),
                    location,
                    pos: directive.pos,
                })
            }
            None => Ok(()),
        }
    }
}

fn known_directive(directive: &Positioned<Directive>) -> Result<ConditionKind> {
    let name = &directive.name;
    match name.as_str() {
        "skip" => Ok(ConditionKind::Skip),
        "include" => Ok(ConditionKind::Include),
        "defer" | "stream" => Err(ElaborationError::UnsupportedDirective {
            name: name.node.clone(),
            pos: name.pos,
        }),
        _ => Err(ElaborationError::UnknownDirective {
            name: name.node.clone(),
            pos: name.pos,
        }),
    }
}

fn check_arguments(
    arguments: &[(Positioned<Name>, Positioned<Value>)],
    target: &str,
    is_defined: impl Fn(&str) -> bool,
) -> Result<()> {
    for (i, (name, _)) in arguments.iter().enumerate() {
        if !is_defined(name.as_str()) {
            return Err(ElaborationError::UnknownArgument {
                target: target.to_string(),
                name: name.node.clone(),
                pos: name.pos,
            });
        }
        if arguments[..i].iter().any(|(other, _)| other.node == name.node) {
            return Err(ElaborationError::DuplicateArgument {
                name: name.node.clone(),
                pos: name.pos,
            });
        }
    }
    Ok(())
}
