mod code;
mod error;
mod format;
mod path;

pub use code::*;
pub use error::*;
pub use format::value_to_json;
pub use path::*;
use query_value::ConstValue;

/// The outcome of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// `None` when the request failed before execution.
    pub data: Option<ConstValue>,
    pub errors: Vec<GraphqlError>,
    include_error_codes: bool,
}

/// How the request went, for the transport to pick a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Severity {
    /// Data without any error.
    Success,
    /// Data alongside execution errors.
    PartialSuccess,
    /// No data, the request failed before execution.
    RequestError,
}

impl Response {
    pub fn new(data: ConstValue) -> Self {
        Response {
            data: Some(data),
            ..Default::default()
        }
    }

    /// A response to a request that could not be executed.
    pub fn request_errors(errors: impl IntoIterator<Item = GraphqlError>) -> Self {
        Response {
            data: None,
            errors: errors.into_iter().collect(),
            include_error_codes: false,
        }
    }

    #[must_use]
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = GraphqlError>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Adds the error class to every error as `extensions.code` when formatted.
    #[must_use]
    pub fn with_error_codes(mut self, include_error_codes: bool) -> Self {
        self.include_error_codes = include_error_codes;
        self
    }

    pub fn severity(&self) -> Severity {
        if self.data.is_none() {
            Severity::RequestError
        } else if self.errors.is_empty() {
            Severity::Success
        } else {
            Severity::PartialSuccess
        }
    }

    pub fn is_ok(&self) -> bool {
        self.severity() == Severity::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity() {
        let error = GraphqlError::new("boom", ErrorCode::ExecutionError);

        assert_eq!(Response::new(ConstValue::Null).severity(), Severity::Success);
        assert_eq!(
            Response::new(ConstValue::Null).with_errors([error.clone()]).severity(),
            Severity::PartialSuccess
        );
        assert_eq!(Response::request_errors([error]).severity(), Severity::RequestError);
    }
}
