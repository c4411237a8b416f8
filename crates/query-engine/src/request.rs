use crate::coercion::variables::RawVariables;

/// A GraphQL request, as sent over the wire.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub query: String,
    #[serde(default)]
    pub operation_name: Option<String>,
    #[serde(default)]
    pub variables: RawVariables,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Request {
            query: query.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn variables(mut self, variables: impl Into<RawVariables>) -> Self {
        self.variables = variables.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn deserialize() {
        let request: Request = serde_json::from_value(json!({
            "query": "query A($id: ID!) { user(id: $id) { name } }",
            "operationName": "A",
            "variables": {"id": "1"}
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::new("query A($id: ID!) { user(id: $id) { name } }")
                .operation_name("A")
                .variables(json!({"id": "1"}))
        );

        let request: Request = serde_json::from_value(json!({"query": "{ a }", "variables": null})).unwrap();
        assert_eq!(request, Request::new("{ a }"));
    }
}
