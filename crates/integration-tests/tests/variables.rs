use integration_tests::{runtime, TestEngine};
use pretty_assertions::assert_eq;
use query_engine::{ErrorCode, Request, Severity};
use rstest::rstest;
use serde_json::json;

#[test]
fn missing_required_variable() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .post_with_variables("query($id: ID!){ user(id:$id){name} }", json!({}))
            .await
    });

    assert_eq!(
        response.to_string(),
        r#"{"errors":[{"message":"missing required variable id"}]}"#
    );
}

#[test]
fn inline_arguments_need_no_variables() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .post_with_variables(r#"query { user(id: "1") { name } }"#, json!({}))
            .await
    });

    assert_eq!(response, json!({"data": {"user": {"name": "Ada"}}}));
}

#[rstest]
#[case::string(json!({"id": "2"}), json!({"data": {"user": {"name": "Grace"}}}))]
#[case::int_as_id(json!({"id": 2}), json!({"data": {"user": {"name": "Grace"}}}))]
#[case::unknown_user(json!({"id": "42"}), json!({"data": {"user": null}}))]
fn id_variable(#[case] variables: serde_json::Value, #[case] expected: serde_json::Value) {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .post_with_variables("query($id: ID!){ user(id: $id) { name } }", variables)
            .await
    });

    assert_eq!(response, expected);
}

#[test]
fn variables_sent_as_a_string() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .post_with_variables("query($id: ID!){ user(id: $id) { name } }", json!(r#"{"id": "1"}"#))
            .await
    });

    assert_eq!(response, json!({"data": {"user": {"name": "Ada"}}}));
}

#[test]
fn absent_variables_fall_back_to_defaults() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .post_with_variables(
                "query($first: Int, $role: Role = GUEST) { users(first: $first, role: $role) { id } }",
                json!({}),
            )
            .await
    });

    assert_eq!(response, json!({"data": {"users": [{"id": "2"}, {"id": "4"}]}}));
}

#[test]
fn input_objects() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .post_with_variables(
                "mutation($input: CreateUserInput!) { createUser(input: $input) { name role } }",
                json!({"input": {"name": "Alan", "role": "ADMIN", "tags": "math"}}),
            )
            .await
    });

    assert_eq!(
        response,
        json!({"data": {"createUser": {"name": "Alan", "role": "ADMIN"}}})
    );
}

#[rstest]
#[case::unknown_variable(
    "query($id: ID!) { user(id: $id) { name } }",
    json!({"id": "1", "other": 2}),
    "unknown variable other"
)]
#[case::null_for_non_null(
    "query($id: ID!) { user(id: $id) { name } }",
    json!({"id": null}),
    "Variable $id must not be null"
)]
#[case::not_an_object(
    "query($id: ID!) { user(id: $id) { name } }",
    json!([1]),
    "variables must be a JSON object: found a list"
)]
#[case::unknown_enum_value(
    "query($role: Role) { users(role: $role) { name } }",
    json!({"role": "ROOT"}),
    "Variable $role has an invalid value. Unknown enum value 'ROOT' for enum Role"
)]
#[case::invalid_item(
    "mutation($input: CreateUserInput!) { createUser(input: $input) { name } }",
    json!({"input": {"name": "Alan", "tags": ["a", 1]}}),
    "Variable $input has an invalid value. Found an integer where we expected a String scalar at path 'input.tags.1'"
)]
#[case::custom_scalar(
    "query($email: Email!) { userByEmail(email: $email) { name } }",
    json!({"email": "ada"}),
    "Variable $email has an invalid value. Invalid value for scalar Email: \"ada\" is not an email address"
)]
fn invalid_variables(#[case] query: &str, #[case] variables: serde_json::Value, #[case] expected: &str) {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .execute(Request::new(query).variables(query_engine::RawVariables::from(variables)))
            .await
    });

    assert_eq!(response.severity(), Severity::RequestError);
    assert_eq!(response.errors.len(), 1);
    assert_eq!(response.errors[0].code, ErrorCode::VariableError);
    assert_eq!(response.errors[0].message, expected);
}

#[test]
fn custom_scalar_input() {
    let response = runtime().block_on(async move {
        let engine = TestEngine::builder().build();

        engine
            .post_with_variables(
                "query($email: Email!) { userByEmail(email: $email) { name } }",
                json!({"email": "grace@example.com"}),
            )
            .await
    });

    assert_eq!(response, json!({"data": {"userByEmail": {"name": "Grace"}}}));
}
