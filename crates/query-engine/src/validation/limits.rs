use crate::{
    config::OperationLimits,
    document::{visit_selection_set, FieldSelection, SelectionVisitor},
    typecheck::{InputValue, TypedOperation},
};

use super::ValidationError;

/// Each limit is reported once, where it's first exceeded.
pub(super) fn check(operation: &TypedOperation, limits: &OperationLimits) -> Vec<ValidationError> {
    let mut visitor = Visitor {
        errors: Vec::new(),
        root_fields: 0,
        max_root_fields: limits.root_fields.map(Into::into).unwrap_or(usize::MAX),
        current_depth: 0,
        max_depth: limits.depth.map(Into::into).unwrap_or(usize::MAX),
        aliases_count: 0,
        max_aliases_count: limits.aliases.map(Into::into).unwrap_or(usize::MAX),
    };
    visit_selection_set(&mut visitor, &operation.selection_set);
    visitor.errors
}

struct Visitor {
    errors: Vec<ValidationError>,
    root_fields: usize,
    max_root_fields: usize,
    current_depth: usize,
    max_depth: usize,
    aliases_count: usize,
    max_aliases_count: usize,
}

impl<'a> SelectionVisitor<'a, InputValue> for Visitor {
    fn enter_field(&mut self, field: &'a FieldSelection<InputValue>) {
        self.root_fields += usize::from(self.current_depth == 0);
        if self.current_depth == 0 && self.root_fields == self.max_root_fields.saturating_add(1) {
            self.errors.push(ValidationError::TooManyRootFields {
                count: self.root_fields,
                pos: field.pos,
            });
        }

        self.aliases_count += usize::from(field.alias.is_some());
        if field.alias.is_some() && self.aliases_count == self.max_aliases_count.saturating_add(1) {
            self.errors.push(ValidationError::TooManyAliases {
                count: self.aliases_count,
                pos: field.pos,
            });
        }

        self.current_depth += 1;
        let already_reported = self
            .errors
            .iter()
            .any(|err| matches!(err, ValidationError::TooDeep { .. }));
        if self.current_depth > self.max_depth && !already_reported {
            self.errors.push(ValidationError::TooDeep {
                depth: self.current_depth,
                pos: field.pos,
            });
        }
    }

    fn leave_field(&mut self, _field: &'a FieldSelection<InputValue>) {
        self.current_depth -= 1;
    }
}
