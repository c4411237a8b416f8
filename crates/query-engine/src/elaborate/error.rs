use query_parser::Pos;
use query_value::Name;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElaborationError {
    #[error("Subscriptions are not supported")]
    SubscriptionsNotSupported { pos: Pos },
    #[error("Mutations are not defined on this schema.")]
    NoMutationDefined { pos: Pos },
    #[error("unknown field {name} on type {ty}")]
    UnknownField { name: Name, ty: Name, pos: Pos },
    #[error(
        "Field '{name}' does not exists on {ty}, it's a union. Only interfaces and objects have fields, consider using a fragment with a type condition."
    )]
    UnionHaveNoFields { name: Name, ty: Name, pos: Pos },
    #[error("Unknown argument '{name}' on {target}")]
    UnknownArgument { target: String, name: Name, pos: Pos },
    #[error("There can be only one argument named '{name}'")]
    DuplicateArgument { name: Name, pos: Pos },
    #[error("Field '{name}' cannot have a selection set, it's a {ty}. Only interfaces, unions and objects can.")]
    CannotHaveSelectionSet { name: Name, ty: String, pos: Pos },
    #[error("Field '{name}' of type '{ty}' must have a selection of subfields.")]
    MissingSelectionSet { name: Name, ty: String, pos: Pos },
    #[error("unknown fragment {name}")]
    UnknownFragment { name: Name, pos: Pos },
    #[error("Fragment '{name}' cannot spread itself")]
    FragmentCycle { name: Name, pos: Pos },
    #[error("Unknown type named '{name}'")]
    UnknownType { name: Name, pos: Pos },
    #[error("Type conditions cannot be declared on '{name}', only on unions, interfaces or objects.")]
    InvalidTypeConditionTargetType { name: Name, pos: Pos },
    #[error("unknown directive @{name}")]
    UnknownDirective { name: Name, pos: Pos },
    #[error("Directive @{name} is not supported")]
    UnsupportedDirective { name: Name, pos: Pos },
    #[error("Directive @{name} is not allowed on {location}")]
    MisplacedDirective {
        name: Name,
        location: &'static str,
        pos: Pos,
    },
    #[error("Query is too big, its fragments expand to more than {limit} selections")]
    TooManySelections { limit: usize, pos: Pos },
}

impl ElaborationError {
    pub fn location(&self) -> Pos {
        match self {
            ElaborationError::SubscriptionsNotSupported { pos }
            | ElaborationError::NoMutationDefined { pos }
            | ElaborationError::UnknownField { pos, .. }
            | ElaborationError::UnionHaveNoFields { pos, .. }
            | ElaborationError::UnknownArgument { pos, .. }
            | ElaborationError::DuplicateArgument { pos, .. }
            | ElaborationError::CannotHaveSelectionSet { pos, .. }
            | ElaborationError::MissingSelectionSet { pos, .. }
            | ElaborationError::UnknownFragment { pos, .. }
            | ElaborationError::FragmentCycle { pos, .. }
            | ElaborationError::UnknownType { pos, .. }
            | ElaborationError::InvalidTypeConditionTargetType { pos, .. }
            | ElaborationError::UnknownDirective { pos, .. }
            | ElaborationError::UnsupportedDirective { pos, .. }
            | ElaborationError::TooManySelections { pos, .. }
            | ElaborationError::MisplacedDirective { pos, .. } => *pos,
        }
    }
}
