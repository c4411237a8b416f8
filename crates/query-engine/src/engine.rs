use std::sync::Arc;

use query_value::ConstValue;
use tracing::{field::Empty, Instrument, Span};

use crate::{
    cache::{CacheStats, OperationCache, Prepared},
    coercion::variables::coerce_variables,
    config::{EngineConfig, OperationLimits},
    elaborate::elaborate,
    execution::{self, Context, ExecutionOptions},
    request::Request,
    response::{GraphqlError, Response},
    schema::Schema,
    typecheck::typecheck,
    validation::{select_operation, validate},
};

/// Runs requests against a schema.
///
/// Documents are prepared once per schema version and kept in the operation cache, each request
/// then only selects its operation, coerces its variables and executes.
pub struct Engine {
    schema: Arc<Schema>,
    config: EngineConfig,
    cache: OperationCache,
}

pub struct EngineBuilder {
    schema: Arc<Schema>,
    config: EngineConfig,
}

impl EngineBuilder {
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Engine {
        Engine {
            cache: OperationCache::new(&self.config.operation_caching),
            schema: self.schema,
            config: self.config,
        }
    }
}

impl Engine {
    pub fn builder(schema: impl Into<Arc<Schema>>) -> EngineBuilder {
        EngineBuilder {
            schema: schema.into(),
            config: EngineConfig::default(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Parses, elaborates, type checks and validates a document, going through the operation
    /// cache.
    pub fn prepare(&self, document: &str) -> Prepared {
        self.cache.get_or_prepare(self.schema.version(), document, || {
            prepare(&self.schema, document, &self.config.operation_limits)
        })
    }

    pub async fn execute(&self, request: Request, root: &ConstValue, context: &Context) -> Response {
        let span = tracing::info_span!("graphql-execute", operation.name = Empty, operation.type = Empty);
        self.execute_inner(request, root, context, span.clone())
            .instrument(span)
            .await
    }

    async fn execute_inner(&self, request: Request, root: &ConstValue, context: &Context, span: Span) -> Response {
        let document = match self.prepare(&request.query) {
            Ok(document) => document,
            Err(errors) => return self.request_errors(errors.iter().cloned()),
        };

        let operation = match select_operation(&document, request.operation_name.as_deref()) {
            Ok(operation) => operation,
            Err(err) => {
                tracing::debug!(error = %err, "operation selection failed");
                return self.request_errors([err.into()]);
            }
        };
        if let Some(name) = &operation.name {
            span.record("operation.name", name.node.as_str());
        }
        span.record("operation.type", operation.ty.as_str());

        let variables = match coerce_variables(&self.schema, &operation.env, request.variables) {
            Ok(variables) => variables,
            Err(err) => {
                tracing::debug!(error = %err, "variable coercion failed");
                return self.request_errors([err.into()]);
            }
        };

        let options = ExecutionOptions {
            parallel_fields: self.config.execution.parallel_fields,
        };
        let output = execution::execute(&self.schema, operation, &variables, root, context, options).await;
        if !output.errors.is_empty() {
            tracing::debug!(errors = output.errors.len(), "execution completed with errors");
        }

        Response::new(output.data)
            .with_errors(output.errors)
            .with_error_codes(self.config.response.include_error_codes)
    }

    fn request_errors(&self, errors: impl IntoIterator<Item = GraphqlError>) -> Response {
        Response::request_errors(errors).with_error_codes(self.config.response.include_error_codes)
    }
}

/// Prepares a document without caching it.
pub fn prepare(schema: &Schema, document: &str, limits: &OperationLimits) -> Prepared {
    let parsed = query_parser::parse_query(document).map_err(|err| {
        tracing::debug!(error = %err, "parsing failed");
        single(err.into())
    })?;
    let elaborated = elaborate(schema, &parsed).map_err(|err| {
        tracing::debug!(error = %err, "elaboration failed");
        single(err.into())
    })?;
    let typed = typecheck(schema, elaborated).map_err(|err| {
        tracing::debug!(error = %err, "type checking failed");
        single(err.into())
    })?;
    validate(schema, &typed, limits).map_err(|errors| {
        tracing::debug!(errors = errors.len(), "validation failed");
        errors.into_iter().map(GraphqlError::from).collect::<Arc<[_]>>()
    })?;
    Ok(Arc::new(typed))
}

fn single(error: GraphqlError) -> Arc<[GraphqlError]> {
    Arc::from(vec![error])
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use query_parser::Pos;

    use super::*;
    use crate::{
        response::ErrorCode,
        schema::{MetaField, MetaInputValue, ObjectType},
    };

    fn engine() -> Engine {
        let schema = Schema::builder()
            .register(
                ObjectType::new("Query")
                    .field(MetaField::new("hello", "String").argument(MetaInputValue::new("name", "String"))),
            )
            .build()
            .unwrap();
        Engine::builder(schema).build()
    }

    #[test]
    fn preparation_is_idempotent() {
        let engine = engine();

        let first = engine.prepare("{ hello }").unwrap();
        let second = engine.prepare("{ hello }").unwrap();
        assert_eq!(first, second);

        let first = engine.prepare("{ goodbye }").unwrap_err();
        let second = engine.prepare("{ goodbye }").unwrap_err();
        assert_eq!(first, second);
        assert_eq!(engine.cache_stats().hits, 2);
    }

    #[test]
    fn each_stage_maps_to_its_error_code() {
        let engine = engine();
        let codes = |document: &str| -> Vec<ErrorCode> {
            engine
                .prepare(document)
                .unwrap_err()
                .iter()
                .map(|error| error.code)
                .collect()
        };

        assert_eq!(codes("{ hello"), vec![ErrorCode::SyntaxError]);
        assert_eq!(codes("{ goodbye }"), vec![ErrorCode::ElaborationError]);
        assert_eq!(codes("{ hello(name: 1) }"), vec![ErrorCode::TypeError]);
        assert_eq!(
            codes("query ($a: Int, $b: Int) { hello }"),
            vec![ErrorCode::ValidationError, ErrorCode::ValidationError]
        );
    }

    #[test]
    fn errors_point_at_the_document() {
        let errors = engine().prepare("{\n  goodbye\n}").unwrap_err();
        assert_eq!(errors[0].message, "unknown field goodbye on type Query");
        assert_eq!(errors[0].locations, vec![Pos::new(2, 3)]);
    }

    #[tokio::test]
    async fn executes_with_the_default_resolver() {
        let root = ConstValue::from_json(serde_json::json!({"hello": "world"}));
        let response = engine()
            .execute(Request::new("{ hello }"), &root, &Context::default())
            .await;
        assert_eq!(response.to_json(), serde_json::json!({"data": {"hello": "world"}}));
    }
}
