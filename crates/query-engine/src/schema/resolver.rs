use std::{any::Any, fmt, sync::Arc};

use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use query_value::{ConstValue, Name};

use super::MetaField;
use crate::{execution::Context, ErrorPath};

/// Arguments of a field once variables and defaults have been applied.
pub type Arguments = IndexMap<Name, ConstValue>;

pub type FieldResult<T> = Result<T, FieldError>;

/// An error returned by a resolver.
///
/// It ends up in the response `errors` with the path and location of the field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub message: String,
    pub extensions: Vec<(String, serde_json::Value)>,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        FieldError {
            message: message.into(),
            extensions: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.extensions.push((key.into(), value.into()));
        self
    }
}

impl<E: fmt::Display> From<E> for FieldError {
    fn from(err: E) -> Self {
        FieldError::new(err.to_string())
    }
}

/// Everything a resolver gets to produce the value of a field.
pub struct ResolverContext<'a> {
    /// The value of the parent object, the root value for root fields.
    pub parent: &'a ConstValue,
    /// The runtime type of the parent object.
    pub parent_type: &'a Name,
    pub field: &'a MetaField,
    pub arguments: &'a Arguments,
    pub path: &'a ErrorPath,
    pub context: &'a Context,
}

impl ResolverContext<'_> {
    pub fn arg(&self, name: &str) -> Option<&ConstValue> {
        self.arguments.get(name)
    }

    /// The data attached to the request context, if it is a `T`.
    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.context.data::<T>()
    }
}

/// Produces the value of a field.
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, ctx: ResolverContext<'_>) -> FieldResult<ConstValue>;
}

impl fmt::Debug for dyn Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver")
    }
}

/// A resolver from a synchronous closure.
pub fn resolver_fn<F>(f: F) -> Arc<dyn Resolver>
where
    F: Fn(ResolverContext<'_>) -> FieldResult<ConstValue> + Send + Sync + 'static,
{
    Arc::new(SyncResolver(f))
}

/// A resolver from a closure returning a boxed future.
pub fn async_resolver_fn<F>(f: F) -> Arc<dyn Resolver>
where
    F: for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, FieldResult<ConstValue>> + Send + Sync + 'static,
{
    Arc::new(AsyncResolver(f))
}

struct SyncResolver<F>(F);

#[async_trait::async_trait]
impl<F> Resolver for SyncResolver<F>
where
    F: Fn(ResolverContext<'_>) -> FieldResult<ConstValue> + Send + Sync,
{
    async fn resolve(&self, ctx: ResolverContext<'_>) -> FieldResult<ConstValue> {
        (self.0)(ctx)
    }
}

struct AsyncResolver<F>(F);

#[async_trait::async_trait]
impl<F> Resolver for AsyncResolver<F>
where
    F: for<'a> Fn(ResolverContext<'a>) -> BoxFuture<'a, FieldResult<ConstValue>> + Send + Sync,
{
    async fn resolve(&self, ctx: ResolverContext<'_>) -> FieldResult<ConstValue> {
        (self.0)(ctx).await
    }
}

/// Picks the object type of a value returned for an interface or a union.
pub trait TypeResolver: Send + Sync {
    fn resolve_type(&self, value: &ConstValue) -> Option<Name>;
}

impl<F> TypeResolver for F
where
    F: Fn(&ConstValue) -> Option<Name> + Send + Sync,
{
    fn resolve_type(&self, value: &ConstValue) -> Option<Name> {
        self(value)
    }
}

impl fmt::Debug for dyn TypeResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TypeResolver")
    }
}

/// Input and output coercion of a custom scalar. Both directions pass values through unchanged
/// unless overridden.
pub trait ScalarCoercer: Send + Sync {
    fn coerce_input(&self, value: ConstValue) -> Result<ConstValue, String> {
        Ok(value)
    }

    fn coerce_output(&self, value: ConstValue) -> Result<ConstValue, String> {
        Ok(value)
    }
}

impl fmt::Debug for dyn ScalarCoercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ScalarCoercer")
    }
}
