//! Preparation and execution of GraphQL operations.
//!
//! A request goes through the following stages:
//!
//! 1. parsing, in [`query_parser`],
//! 2. elaboration, which binds the document to the [`Schema`] and inlines fragments,
//! 3. type checking of arguments, variables and directives,
//! 4. validation of the document-wide rules and operation limits,
//! 5. coercion of the request variables,
//! 6. execution with the schema resolvers.
//!
//! The first four stages only depend on the document and are cached by the [`Engine`]. Each stage
//! has its own error type, all of them converting into a [`GraphqlError`] with an [`ErrorCode`].

mod cache;
mod coercion;
mod config;
mod document;
mod elaborate;
mod engine;
mod execution;
mod request;
mod response;
mod schema;
mod typecheck;
mod validation;

pub use cache::{CacheKey, CacheStats, OperationCache, Prepared};
pub use coercion::{
    variables::{coerce_variables, RawVariables, VariableError},
    CoercionMode, InputValueError,
};
pub use config::*;
pub use document::*;
pub use elaborate::{
    elaborate, ElaboratedDocument, ElaboratedOperation, ElaborationError, FragmentSummary, MAX_EXPANDED_SELECTIONS,
};
pub use engine::{prepare, Engine, EngineBuilder};
pub use execution::{execute, Context, ExecutionOptions, ExecutionOutput};
pub use request::Request;
pub use response::*;
pub use schema::*;
pub use typecheck::{typecheck, FunEnv, InputValue, TypeError, TypedDocument, TypedOperation, VariableSignature};
pub use validation::{select_operation, validate, ErrorOperationName, ValidationError};
