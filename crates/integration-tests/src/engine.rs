use query_engine::{Context, Engine, EngineConfig, RawVariables, Request, Response, Schema};
use query_value::ConstValue;

use crate::schemas;

/// An [`Engine`] over a test schema, with the empty object as root value.
pub struct TestEngine {
    engine: Engine,
    context: Context,
}

pub struct TestEngineBuilder {
    schema: Option<Schema>,
    config: EngineConfig,
    context: Context,
}

impl TestEngine {
    pub fn builder() -> TestEngineBuilder {
        TestEngineBuilder {
            schema: None,
            config: EngineConfig::default(),
            context: Context::default(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub async fn post(&self, query: &str) -> serde_json::Value {
        self.execute(Request::new(query)).await.to_json()
    }

    pub async fn post_with_variables(&self, query: &str, variables: serde_json::Value) -> serde_json::Value {
        self.execute(Request::new(query).variables(RawVariables::from(variables)))
            .await
            .to_json()
    }

    pub async fn execute(&self, request: Request) -> Response {
        let root = ConstValue::Object(Default::default());
        self.engine.execute(request, &root, &self.context).await
    }
}

impl TestEngineBuilder {
    /// Uses [`schemas::users`] when not set.
    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    #[must_use]
    pub fn with_toml_config(mut self, config: &str) -> Self {
        self.config = EngineConfig::from_toml(config).unwrap();
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn build(self) -> TestEngine {
        let schema = self.schema.unwrap_or_else(|| schemas::users().build());
        TestEngine {
            engine: Engine::builder(schema).with_config(self.config).build(),
            context: self.context,
        }
    }
}
