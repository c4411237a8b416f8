use std::borrow::Cow;

use query_parser::Pos;

use super::{ErrorCode, ErrorPath};
use crate::{
    coercion::variables::VariableError, elaborate::ElaborationError, typecheck::TypeError,
    validation::ValidationError,
};

/// An error as it appears in the response `errors` list.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphqlError {
    pub message: Cow<'static, str>,
    pub code: ErrorCode,
    pub locations: Vec<Pos>,
    pub path: Option<ErrorPath>,
    // Serialized as a map, but kept as a Vec for efficiency.
    pub extensions: Vec<(Cow<'static, str>, serde_json::Value)>,
}

impl GraphqlError {
    pub fn new(message: impl Into<Cow<'static, str>>, code: ErrorCode) -> Self {
        GraphqlError {
            message: message.into(),
            code,
            locations: Vec::new(),
            path: None,
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Pos) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn with_locations(mut self, locations: impl IntoIterator<Item = Pos>) -> Self {
        self.locations.extend(locations);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<ErrorPath>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<serde_json::Value>) -> Self {
        self.extensions.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_extensions(
        mut self,
        extensions: impl IntoIterator<Item = (impl Into<Cow<'static, str>>, impl Into<serde_json::Value>)>,
    ) -> Self {
        for (key, value) in extensions {
            self.extensions.push((key.into(), value.into()));
        }
        self
    }

    // ------------- //
    // Common errors //
    // ------------- //

    pub fn internal_error() -> Self {
        GraphqlError::new("Internal error", ErrorCode::InternalError)
    }
}

impl std::fmt::Display for GraphqlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.message.fmt(f)
    }
}

impl From<query_parser::Error> for GraphqlError {
    fn from(err: query_parser::Error) -> Self {
        let location = err.position();
        GraphqlError::new(err.to_string(), ErrorCode::SyntaxError).with_location(location)
    }
}

impl From<ElaborationError> for GraphqlError {
    fn from(err: ElaborationError) -> Self {
        let location = err.location();
        GraphqlError::new(err.to_string(), ErrorCode::ElaborationError).with_location(location)
    }
}

impl From<TypeError> for GraphqlError {
    fn from(err: TypeError) -> Self {
        let location = err.location();
        GraphqlError::new(err.to_string(), ErrorCode::TypeError).with_location(location)
    }
}

impl From<ValidationError> for GraphqlError {
    fn from(err: ValidationError) -> Self {
        let locations = err.location();
        GraphqlError::new(err.to_string(), ErrorCode::ValidationError).with_locations(locations)
    }
}

impl From<VariableError> for GraphqlError {
    fn from(err: VariableError) -> Self {
        let locations = err.location();
        GraphqlError::new(err.to_string(), ErrorCode::VariableError).with_locations(locations)
    }
}
