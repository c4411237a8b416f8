use integration_tests::{runtime, TestEngine};
use pretty_assertions::assert_eq;
use query_engine::{resolver_fn, MetaField, ObjectType, ScalarType, Schema, Severity};
use query_value::{ConstValue, Name};
use serde_json::json;

fn metrics_schema() -> Schema {
    Schema::builder()
        .register(
            ObjectType::new("Query")
                .field(MetaField::new("ratios", "[Float]").resolver(resolver_fn(|_| {
                    Ok(ConstValue::List(vec![
                        ConstValue::Float(0.5),
                        ConstValue::Float(f64::NAN),
                        ConstValue::Float(f64::NEG_INFINITY),
                        ConstValue::Int(2),
                    ]))
                })))
                .field(MetaField::new("histogram", "JSON").resolver(resolver_fn(|_| {
                    Ok(ConstValue::Map(vec![
                        (ConstValue::Int(200), ConstValue::Int(12)),
                        (ConstValue::Enum(Name::new("TIMEOUT")), ConstValue::Int(1)),
                        (ConstValue::from("200"), ConstValue::Int(0)),
                    ]))
                })))
                .field(MetaField::new("count", "Int").resolver(resolver_fn(|_| Ok(ConstValue::Int(1 << 40))))),
        )
        .register(ScalarType::new("JSON"))
        .build()
        .unwrap()
}

#[test]
fn values_without_a_json_representation() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().with_schema(metrics_schema()).build();
        engine.post("{ ratios histogram }").await
    });

    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "ratios": [
          0.5,
          "NaN",
          "-Infinity",
          2.0
        ],
        "histogram": {
          "200": 12,
          "TIMEOUT": 1
        }
      }
    }
    "###);
}

#[test]
fn output_coercion_failures_are_field_errors() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder()
            .with_schema(metrics_schema())
            .with_toml_config("[response]\ninclude_error_codes = true")
            .build();
        engine.execute(query_engine::Request::new("{ ratios count }")).await
    });

    assert_eq!(response.severity(), Severity::PartialSuccess);
    insta::assert_json_snapshot!(response, @r###"
    {
      "data": {
        "ratios": [
          0.5,
          "NaN",
          "-Infinity",
          2.0
        ],
        "count": null
      },
      "errors": [
        {
          "message": "Int cannot represent value 1099511627776",
          "locations": [
            {
              "line": 1,
              "column": 10
            }
          ],
          "path": [
            "count"
          ],
          "extensions": {
            "code": "EXECUTION_ERROR"
          }
        }
      ]
    }
    "###);
}

#[test]
fn request_errors_have_no_data() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder()
            .with_toml_config("[response]\ninclude_error_codes = true")
            .build();
        engine.post("{ user(id: \"1\") { name }").await
    });

    assert!(response.get("data").is_none());
    assert_eq!(response["errors"][0]["extensions"], json!({"code": "SYNTAX_ERROR"}));
    assert_eq!(response["errors"][0]["locations"].as_array().map(Vec::len), Some(1));
}
