use std::sync::Arc;

use integration_tests::{runtime, schemas, TestEngine};
use pretty_assertions::assert_eq;
use query_engine::{CacheStats, Engine, Request};
use serde_json::json;

#[test]
fn documents_are_prepared_once() {
    let engine = TestEngine::builder().build();
    let query = "query($id: ID!) { user(id: $id) { name } }";

    let responses = runtime().block_on(async {
        let mut responses = Vec::new();
        for id in ["1", "2", "1"] {
            responses.push(engine.post_with_variables(query, json!({"id": id})).await);
        }
        responses
    });

    assert_eq!(
        responses,
        vec![
            json!({"data": {"user": {"name": "Ada"}}}),
            json!({"data": {"user": {"name": "Grace"}}}),
            json!({"data": {"user": {"name": "Ada"}}}),
        ]
    );
    assert_eq!(
        engine.engine().cache_stats(),
        CacheStats {
            hits: 2,
            misses: 1,
            entries: 1
        }
    );
}

#[test]
fn preparation_is_idempotent() {
    let engine = TestEngine::builder().build();

    let first = engine.engine().prepare("{ users { name } }").unwrap();
    let second = engine.engine().prepare("{ users { name } }").unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let uncached = TestEngine::builder()
        .with_toml_config("[operation_caching]\nenabled = false")
        .build();
    let third = uncached.engine().prepare("{ users { name } }").unwrap();
    assert_eq!(*first, *third);
    assert_eq!(uncached.engine().cache_stats(), CacheStats::default());
}

#[test]
fn failures_are_cached_too() {
    let engine = TestEngine::builder().build();

    let first = runtime().block_on(engine.execute(Request::new("{ user(id: 1) { age } }")));
    let second = runtime().block_on(engine.execute(Request::new("{ user(id: 1) { age } }")));

    assert_eq!(first, second);
    assert_eq!(engine.engine().cache_stats().hits, 1);
}

#[test]
fn engines_can_be_shared_between_tasks() {
    let engine = Arc::new(Engine::builder(schemas::users().build()).build());

    let responses = runtime().block_on(async {
        let tasks = (0..8).map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let root = query_value::ConstValue::Null;
                let request =
                    Request::new("query($id: ID!) { user(id: $id) { id } }").variables(json!({"id": i % 2 + 1}));
                engine
                    .execute(request, &root, &Default::default())
                    .await
                    .to_json()
            })
        });
        let mut responses = Vec::new();
        for task in tasks.collect::<Vec<_>>() {
            responses.push(task.await.unwrap());
        }
        responses
    });

    for (i, response) in responses.into_iter().enumerate() {
        assert_eq!(response, json!({"data": {"user": {"id": (i % 2 + 1).to_string()}}}));
    }
    assert_eq!(engine.cache_stats().misses, 1);
}
