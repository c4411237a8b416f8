use cynic_parser::{
    common::{OperationType as AstOperationType, WrappingType},
    executable::{self as ast, Iter},
    Span,
};
use indexmap::IndexMap;
use query_value::{Name, Value};

use crate::{
    pos::{LineIndex, Pos, Positioned},
    types::{
        BaseType, Directive, ExecutableDefinition, ExecutableDocument, Field, FragmentDefinition, FragmentSpread,
        InlineFragment, OperationDefinition, OperationType, Selection, SelectionSet, Type, TypeCondition,
        VariableDefinition,
    },
    Error, Result,
};

/// Selection sets, list and object values nested deeper than this are rejected.
pub const MAX_RECURSION_DEPTH: usize = 128;

/// Parse a GraphQL executable document.
///
/// The document is read by `cynic-parser` and converted into the positioned AST used by the
/// rest of the pipeline.
pub fn parse_query<T: AsRef<str>>(input: T) -> Result<ExecutableDocument> {
    let source = input.as_ref();
    let lines = LineIndex::new(source);
    let document = cynic_parser::parse_executable_document(source).map_err(|err| Error::Syntax {
        message: err.to_string(),
        pos: err.span().map_or(Pos::new(1, 1), |span| lines.pos(span.start)),
    })?;

    Converter { lines, depth: 0 }.document(&document)
}

struct Converter<'a> {
    lines: LineIndex<'a>,
    depth: usize,
}

impl Converter<'_> {
    fn document(&mut self, document: &cynic_parser::ExecutableDocument) -> Result<ExecutableDocument> {
        let definitions = document
            .definitions()
            .map(|definition| match definition {
                ast::ExecutableDefinition::Operation(operation) => {
                    self.operation(operation).map(ExecutableDefinition::Operation)
                }
                ast::ExecutableDefinition::Fragment(fragment) => {
                    self.fragment_definition(fragment).map(ExecutableDefinition::Fragment)
                }
            })
            .collect::<Result<Vec<_>>>()?;

        if definitions.is_empty() {
            return Err(Error::syntax(
                "document must contain at least one operation or fragment",
                Pos::new(1, 1),
            ));
        }

        Ok(ExecutableDocument { definitions })
    }

    fn operation(&mut self, operation: ast::OperationDefinition<'_>) -> Result<Positioned<OperationDefinition>> {
        let ty = match operation.operation_type() {
            AstOperationType::Query => OperationType::Query,
            AstOperationType::Mutation => OperationType::Mutation,
            AstOperationType::Subscription => OperationType::Subscription,
        };
        let selection_set_span = operation.selection_set_span();
        // Shorthand queries start at their opening brace.
        let pos = self.pos(operation.operation_type_span().unwrap_or(selection_set_span));

        let name = operation
            .name()
            .zip(operation.name_span())
            .map(|(name, span)| self.name(name, span));
        let variable_definitions = operation
            .variable_definitions()
            .map(|definition| self.variable_definition(definition))
            .collect::<Result<Vec<_>>>()?;
        let directives = self.directives(operation.directives())?;
        let selection_set = self.selection_set(operation.selection_set(), selection_set_span)?;

        Ok(Positioned::new(
            OperationDefinition {
                ty,
                name,
                variable_definitions,
                directives,
                selection_set,
            },
            pos,
        ))
    }

    fn fragment_definition(&mut self, fragment: ast::FragmentDefinition<'_>) -> Result<Positioned<FragmentDefinition>> {
        let name = self.name(fragment.name(), fragment.name_span());
        let pos = name.pos;
        if name.node == "on" {
            return Err(Error::syntax("\"on\" is not allowed as a fragment name", pos));
        }
        let type_condition = self.type_condition(fragment.type_condition(), fragment.type_condition_span());
        let directives = self.directives(fragment.directives())?;
        let selection_set = self.selection_set(fragment.selection_set(), fragment.selection_set_span())?;

        Ok(Positioned::new(
            FragmentDefinition {
                name,
                type_condition,
                directives,
                selection_set,
            },
            pos,
        ))
    }

    fn variable_definition(
        &mut self,
        definition: ast::VariableDefinition<'_>,
    ) -> Result<Positioned<VariableDefinition>> {
        let name = self.name(definition.name(), definition.name_span());
        let pos = name.pos;
        let ty = definition.ty();
        let var_type = Positioned::new(convert_type(ty.name(), ty.wrappers()), self.pos(ty.span()));
        let directives = self.directives(definition.directives())?;
        let default_value = definition
            .default_value()
            .map(|value| {
                let pos = self.pos(value.span());
                self.value(value.into())?
                    .node
                    .into_const()
                    .map(|value| Positioned::new(value, pos))
                    .ok_or_else(|| Error::syntax("variables are not allowed in constant values", pos))
            })
            .transpose()?;

        Ok(Positioned::new(
            VariableDefinition {
                name,
                var_type,
                directives,
                default_value,
            },
            pos,
        ))
    }

    fn selection_set(
        &mut self,
        selections: Iter<'_, ast::Selection<'_>>,
        span: Span,
    ) -> Result<Positioned<SelectionSet>> {
        let pos = self.pos(span);
        self.enter(pos)?;
        let items = selections
            .map(|selection| self.selection(selection))
            .collect::<Result<Vec<_>>>()?;
        self.depth -= 1;

        Ok(Positioned::new(SelectionSet { items }, pos))
    }

    fn selection(&mut self, selection: ast::Selection<'_>) -> Result<Positioned<Selection>> {
        Ok(match selection {
            ast::Selection::Field(field) => {
                let field = self.field(field)?;
                let pos = field.pos;
                Positioned::new(Selection::Field(field), pos)
            }
            ast::Selection::FragmentSpread(spread) => {
                let fragment_name = self.name(spread.fragment_name(), spread.fragment_name_span());
                let pos = fragment_name.pos;
                let spread = FragmentSpread {
                    fragment_name,
                    directives: self.directives(spread.directives())?,
                };
                Positioned::new(Selection::FragmentSpread(Positioned::new(spread, pos)), pos)
            }
            ast::Selection::InlineFragment(fragment) => {
                let type_condition = fragment
                    .type_condition()
                    .zip(fragment.type_condition_span())
                    .map(|(on, span)| self.type_condition(on, span));
                let directives = self.directives(fragment.directives())?;
                let selection_set = self.selection_set(fragment.selection_set(), fragment.selection_set_span())?;
                let pos = type_condition.as_ref().map_or(selection_set.pos, |condition| condition.pos);
                let fragment = InlineFragment {
                    type_condition,
                    directives,
                    selection_set,
                };
                Positioned::new(Selection::InlineFragment(Positioned::new(fragment, pos)), pos)
            }
        })
    }

    fn field(&mut self, field: ast::FieldSelection<'_>) -> Result<Positioned<Field>> {
        let alias = field
            .alias()
            .zip(field.alias_span())
            .map(|(alias, span)| self.name(alias, span));
        let name = self.name(field.name(), field.name_span());
        let pos = alias.as_ref().map_or(name.pos, |alias| alias.pos);
        let arguments = self.arguments(field.arguments())?;
        let directives = self.directives(field.directives())?;
        let selection_set = field
            .selection_set_span()
            .map(|span| self.selection_set(field.selection_set(), span))
            .transpose()?;

        Ok(Positioned::new(
            Field {
                alias,
                name,
                arguments,
                directives,
                selection_set,
            },
            pos,
        ))
    }

    fn directives(&mut self, directives: Iter<'_, ast::Directive<'_>>) -> Result<Vec<Positioned<Directive>>> {
        directives
            .map(|directive| {
                let name = self.name(directive.name(), directive.name_span());
                let pos = name.pos;
                let arguments = self.arguments(directive.arguments())?;
                Ok(Positioned::new(Directive { name, arguments }, pos))
            })
            .collect()
    }

    fn arguments(
        &mut self,
        arguments: Iter<'_, ast::Argument<'_>>,
    ) -> Result<Vec<(Positioned<Name>, Positioned<Value>)>> {
        arguments
            .map(|argument| {
                let name = self.name(argument.name(), argument.name_span());
                Ok((name, self.value(argument.value())?))
            })
            .collect()
    }

    fn value(&mut self, value: cynic_parser::Value<'_>) -> Result<Positioned<Value>> {
        use cynic_parser::Value as Ast;

        let pos = self.pos(value.span());
        let value = match value {
            Ast::Variable(variable) => Value::Variable(Name::new(variable.name())),
            Ast::Null(_) => Value::Null,
            Ast::Int(number) => Value::Int(number.as_i64()),
            Ast::Float(number) => Value::Float(number.as_f64()),
            Ast::String(string) => Value::String(string.as_str().to_owned()),
            Ast::Boolean(boolean) => Value::Boolean(boolean.value()),
            Ast::Enum(value) => Value::Enum(Name::new(value.name())),
            Ast::List(list) => {
                self.enter(pos)?;
                let items = list
                    .into_iter()
                    .map(|item| self.value(item).map(Positioned::into_inner))
                    .collect::<Result<Vec<_>>>()?;
                self.depth -= 1;
                Value::List(items)
            }
            Ast::Object(object) => {
                self.enter(pos)?;
                let mut fields = IndexMap::new();
                for field in object.fields() {
                    let name = self.name(field.name(), field.name_span());
                    if fields.contains_key(&name.node) {
                        return Err(Error::syntax(
                            format!("duplicate field \"{}\" in input object", name.node),
                            name.pos,
                        ));
                    }
                    let value = self.value(field.value())?;
                    fields.insert(name.node, value.node);
                }
                self.depth -= 1;
                Value::Object(fields)
            }
        };
        Ok(Positioned::new(value, pos))
    }

    fn type_condition(&self, on: &str, span: Span) -> Positioned<TypeCondition> {
        let on = self.name(on, span);
        let pos = on.pos;
        Positioned::new(TypeCondition { on }, pos)
    }

    fn name(&self, name: &str, span: Span) -> Positioned<Name> {
        Positioned::new(Name::new(name), self.pos(span))
    }

    fn pos(&self, span: Span) -> Pos {
        self.lines.pos(span.start)
    }

    fn enter(&mut self, pos: Pos) -> Result<()> {
        if self.depth >= MAX_RECURSION_DEPTH {
            return Err(Error::RecursionLimitExceeded { pos });
        }
        self.depth += 1;
        Ok(())
    }
}

/// Wrappers come outermost first, `[Int!]!` is `NonNull, List, NonNull`.
fn convert_type(name: &str, wrappers: impl IntoIterator<Item = WrappingType>) -> Type {
    let wrappers = wrappers.into_iter().collect::<Vec<_>>();
    let mut ty = Type::nullable(BaseType::named(name));

    for wrapper in wrappers.into_iter().rev() {
        match wrapper {
            WrappingType::NonNull => ty.nullable = false,
            WrappingType::List => ty = Type::nullable(BaseType::list(ty)),
        }
    }

    ty
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use query_value::ConstValue;

    use super::*;

    fn error_position(query: &str) -> Pos {
        parse_query(query).unwrap_err().position()
    }

    #[test]
    fn parses_operations_and_fragments() {
        let document = parse_query(indoc! {r#"
            query GetUser($id: ID!, $withFriends: Boolean = false) {
              user(id: $id) {
                ...userFields
                friends @include(if: $withFriends) { name }
              }
            }

            fragment userFields on User {
              id
              displayName: name
            }
        "#})
        .unwrap();

        let operation = document.operations().next().unwrap();
        assert_eq!(operation.ty, OperationType::Query);
        assert_eq!(operation.name.as_ref().unwrap().node, "GetUser");
        assert_eq!(operation.pos, Pos::new(1, 1));

        let variables = &operation.variable_definitions;
        assert_eq!(variables.len(), 2);
        assert_eq!(variables[0].name.node, "id");
        assert_eq!(variables[0].var_type.to_string(), "ID!");
        assert_eq!(variables[1].default_value.as_ref().unwrap().node, ConstValue::Boolean(false));

        let Selection::Field(user) = &operation.selection_set.items[0].node else {
            unreachable!()
        };
        assert_eq!(user.pos, Pos::new(2, 3));
        assert_eq!(
            user.get_argument("id").map(|value| &value.node),
            Some(&Value::Variable(Name::new("id")))
        );

        let items = &user.selection_set.as_ref().unwrap().items;
        assert!(
            matches!(&items[0].node, Selection::FragmentSpread(spread) if spread.fragment_name.node == "userFields")
        );
        assert_eq!(items[0].pos, Pos::new(3, 8));
        assert_eq!(items[1].directives()[0].name.node, "include");

        let fragment = document.fragment("userFields").unwrap();
        assert_eq!(fragment.pos, Pos::new(8, 10));
        assert_eq!(fragment.type_condition.on.node, "User");
        let Selection::Field(field) = &fragment.selection_set.items[1].node else {
            unreachable!()
        };
        assert_eq!(field.response_key().node, "displayName");
        assert_eq!(field.name.node, "name");
        assert_eq!(field.pos, Pos::new(10, 3));
    }

    #[test]
    fn shorthand_query() {
        let document = parse_query("{ a, b }").unwrap();
        let operation = document.operations().next().unwrap();
        assert_eq!(operation.ty, OperationType::Query);
        assert_eq!(operation.pos, Pos::new(1, 1));
        assert!(operation.name.is_none());
        assert_eq!(operation.selection_set.items.len(), 2);
    }

    #[test]
    fn inline_fragments() {
        let document = parse_query("{ node { ... on User { name } ... @skip(if: true) { id } } }").unwrap();
        let operation = document.operations().next().unwrap();
        let Selection::Field(node) = &operation.selection_set.items[0].node else {
            unreachable!()
        };
        let items = &node.selection_set.as_ref().unwrap().items;

        let Selection::InlineFragment(on_user) = &items[0].node else {
            unreachable!()
        };
        assert_eq!(on_user.type_condition.as_ref().unwrap().on.node, "User");

        let Selection::InlineFragment(skipped) = &items[1].node else {
            unreachable!()
        };
        assert!(skipped.type_condition.is_none());
        assert_eq!(
            skipped.directives[0].get_argument("if").map(|value| &value.node),
            Some(&Value::Boolean(true))
        );
    }

    #[test]
    fn values_and_types() {
        let document = parse_query(indoc! {r#"
            query($ids: [ID!]!, $limit: Int = 10) {
              f(a: 1, b: -2.5e1, c: "s", d: [A, null, true], e: {x: $v}, f: """block""")
            }
        "#})
        .unwrap();
        let operation = document.operations().next().unwrap();

        let types = operation
            .variable_definitions
            .iter()
            .map(|definition| definition.var_type.to_string())
            .collect::<Vec<_>>();
        assert_eq!(types, vec!["[ID!]!", "Int"]);

        let Selection::Field(field) = &operation.selection_set.items[0].node else {
            unreachable!()
        };
        let args: Vec<String> = field.arguments.iter().map(|(name, value)| format!("{name}: {value}")).collect();
        assert_eq!(
            args,
            vec![
                "a: 1",
                "b: -25.0",
                "c: \"s\"",
                "d: [A, null, true]",
                "e: {x: $v}",
                "f: \"block\"",
            ]
        );
    }

    #[test]
    fn syntax_errors_carry_their_position() {
        assert_eq!(error_position("{ user(id: 1 }"), Pos::new(1, 14));
        assert_eq!(error_position("{}"), Pos::new(1, 2));
        assert_eq!(error_position("type User { a }"), Pos::new(1, 1));
        assert_eq!(error_position("query($a: Int = $b) { a }"), Pos::new(1, 17));
        assert_eq!(error_position("{ a }\n\n  { b(x: ) }"), Pos::new(3, 9));
        assert!(matches!(parse_query(""), Err(Error::Syntax { .. })));
    }

    #[test]
    fn rejected_after_parsing() {
        insta::assert_snapshot!(
            parse_query("{ a(x: {k: 1, k: 2}) }").unwrap_err(),
            @r###"Syntax error: duplicate field "k" in input object"###
        );
        assert_eq!(error_position("{ a(x: {k: 1, k: 2}) }"), Pos::new(1, 15));
        assert_eq!(error_position("fragment on on User { a }"), Pos::new(1, 10));
    }

    #[test]
    fn recursion_limit() {
        let query = format!("{}{}", "{ a ".repeat(MAX_RECURSION_DEPTH + 1), "}".repeat(MAX_RECURSION_DEPTH + 1));
        assert!(matches!(parse_query(query), Err(Error::RecursionLimitExceeded { .. })));

        let query = format!("{}{}", "{ a ".repeat(MAX_RECURSION_DEPTH), "}".repeat(MAX_RECURSION_DEPTH));
        assert!(parse_query(query).is_ok());

        let value = format!("{{ a(x: {}1{}) }}", "[".repeat(MAX_RECURSION_DEPTH), "]".repeat(MAX_RECURSION_DEPTH));
        assert!(matches!(parse_query(value), Err(Error::RecursionLimitExceeded { .. })));
    }
}
