use indexmap::IndexMap;
use query_value::{ConstValue, Name, Variables};

use crate::{
    document::{Condition, ConditionKind, FieldSelection, Selection, SelectionSet},
    schema::Schema,
    typecheck::InputValue,
};

/// Fields to execute on an object, grouped by response key in order of first occurrence.
pub(crate) type GroupedFields<'a> = IndexMap<&'a Name, Vec<&'a FieldSelection<InputValue>>>;

/// Flattens the selection sets for an object of type `object_type`: evaluates `@skip` and
/// `@include`, applies fragments whose type condition matches and groups fields sharing a
/// response key so their sub-selections get merged.
pub(crate) fn collect_fields<'a>(
    schema: &Schema,
    variables: &Variables,
    object_type: &str,
    selection_sets: impl IntoIterator<Item = &'a SelectionSet<InputValue>>,
) -> GroupedFields<'a> {
    let mut grouped = GroupedFields::new();
    for selection_set in selection_sets {
        collect_into(schema, variables, object_type, selection_set, &mut grouped);
    }
    grouped
}

fn collect_into<'a>(
    schema: &Schema,
    variables: &Variables,
    object_type: &str,
    selection_set: &'a SelectionSet<InputValue>,
    grouped: &mut GroupedFields<'a>,
) {
    for selection in &selection_set.items {
        match selection {
            Selection::Field(field) => {
                if is_included(&field.conditions, variables) {
                    grouped.entry(field.response_key()).or_default().push(field);
                }
            }
            Selection::Fragment(fragment) => {
                if is_included(&fragment.conditions, variables)
                    && schema.is_possible_type(&fragment.type_condition, object_type)
                {
                    collect_into(schema, variables, object_type, &fragment.selection_set, grouped);
                }
            }
        }
    }
}

fn is_included(conditions: &[Condition<InputValue>], variables: &Variables) -> bool {
    conditions.iter().all(|condition| {
        let value = condition
            .arguments
            .first()
            .and_then(|(_, value)| value.evaluate(variables));
        let condition_met = matches!(value, Some(ConstValue::Boolean(true)));
        match condition.kind {
            ConditionKind::Skip => !condition_met,
            ConditionKind::Include => condition_met,
        }
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use query_parser::parse_query;

    use super::*;
    use crate::{
        elaborate::elaborate,
        schema::{InterfaceType, MetaField, ObjectType},
        typecheck::typecheck,
    };

    #[test]
    fn groups_fields_and_applies_conditions() {
        let schema = Schema::builder()
            .register(ObjectType::new("Query").field(MetaField::new("node", "Node")))
            .register(InterfaceType::new("Node").field(MetaField::new("id", "ID!")))
            .register(
                ObjectType::new("User")
                    .implements("Node")
                    .field(MetaField::new("id", "ID!"))
                    .field(MetaField::new("name", "String")),
            )
            .register(
                ObjectType::new("Bot")
                    .implements("Node")
                    .field(MetaField::new("id", "ID!"))
                    .field(MetaField::new("model", "String")),
            )
            .build()
            .unwrap();
        let query = r#"
            query ($hide: Boolean!) {
                node {
                    id
                    ... on User { name id }
                    ... on Bot { model }
                    hidden: id @skip(if: $hide)
                    shown: id @include(if: true)
                }
            }
        "#;
        let document = typecheck(&schema, elaborate(&schema, &parse_query(query).unwrap()).unwrap()).unwrap();
        let Selection::Field(node) = &document.operations[0].selection_set.items[0] else {
            unreachable!()
        };
        let variables = Variables::from_json(serde_json::json!({"hide": true}));

        let grouped = collect_fields(&schema, &variables, "User", [&node.selection_set]);
        let keys = grouped
            .iter()
            .map(|(key, fields)| (key.as_str(), fields.len()))
            .collect::<Vec<_>>();
        assert_eq!(keys, vec![("id", 2), ("name", 1), ("shown", 1)]);

        let grouped = collect_fields(&schema, &Variables::default(), "Bot", [&node.selection_set]);
        let keys = grouped.keys().map(|key| key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["id", "model", "hidden", "shown"]);
    }
}
