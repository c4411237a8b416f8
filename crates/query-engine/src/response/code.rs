/// Classification of every error a request can produce.
///
/// All codes but [`ErrorCode::ExecutionError`] and [`ErrorCode::InternalError`] are raised before
/// execution starts, in which case the response carries no `data`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Operation preparation phases
    SyntaxError,
    ElaborationError,
    TypeError,
    ValidationError,
    VariableError,
    // Runtime
    ExecutionError,
    InternalError,
}

impl ErrorCode {
    /// Whether an error with this code prevents execution altogether.
    pub fn is_request_error(self) -> bool {
        !matches!(self, ErrorCode::ExecutionError | ErrorCode::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn codes_are_screaming_snake_case() {
        let codes: Vec<&'static str> = ErrorCode::iter().map(Into::into).collect();
        assert_eq!(
            codes,
            [
                "SYNTAX_ERROR",
                "ELABORATION_ERROR",
                "TYPE_ERROR",
                "VALIDATION_ERROR",
                "VARIABLE_ERROR",
                "EXECUTION_ERROR",
                "INTERNAL_ERROR",
            ]
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::VariableError).unwrap(),
            serde_json::json!("VARIABLE_ERROR")
        );
    }

    #[test]
    fn only_execution_errors_are_partial() {
        assert!(ErrorCode::SyntaxError.is_request_error());
        assert!(ErrorCode::VariableError.is_request_error());
        assert!(!ErrorCode::ExecutionError.is_request_error());
    }
}
