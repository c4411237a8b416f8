//! Schemas shared by the tests.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use futures_util::FutureExt;
use query_engine::{
    async_resolver_fn, resolver_fn, EnumType, InputObjectType, InterfaceType, MetaField, MetaInputValue, ObjectType,
    Resolver, ScalarCoercer, ScalarType, Schema, UnionType,
};
use query_value::{ConstValue, Name};
use serde_json::json;

/// Names of the mutation root fields, in the order they ran. Expected in the request context by
/// the mutations of [`users`].
#[derive(Debug, Default)]
pub struct MutationLog(pub Mutex<Vec<String>>);

impl MutationLog {
    fn push(&self, name: &str) {
        if let Ok(mut log) = self.0.lock() {
            log.push(name.to_string());
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

/// A small social schema:
///
/// ```graphql
/// type Query {
///   user(id: ID!): User
///   users(first: Int = 10, role: Role): [User!]!
///   userByEmail(email: Email!): User
///   node(id: ID!): Node
///   search(text: String!): [SearchResult!]!
/// }
///
/// type Mutation {
///   createUser(input: CreateUserInput!): User!
///   deleteUser(id: ID!): Boolean!
/// }
///
/// interface Node { id: ID! }
/// type User implements Node { id: ID! name: String email: Email! role: Role! friends: [User!]! }
/// type Post implements Node { id: ID! title: String! author: User }
/// union SearchResult = User | Post
/// enum Role { ADMIN GUEST }
/// scalar Email
/// input CreateUserInput { name: String! role: Role = GUEST tags: [String!] }
/// ```
pub fn users() -> UsersSchema {
    UsersSchema {
        name_type: "String",
        name_resolver: None,
    }
}

pub struct UsersSchema {
    name_type: &'static str,
    name_resolver: Option<Arc<dyn Resolver>>,
}

impl UsersSchema {
    #[must_use]
    pub fn with_name_type(mut self, ty: &'static str) -> Self {
        self.name_type = ty;
        self
    }

    #[must_use]
    pub fn with_name_resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.name_resolver = Some(resolver);
        self
    }

    pub fn build(self) -> Schema {
        let mut name = MetaField::new("name", self.name_type);
        if let Some(resolver) = self.name_resolver {
            name = name.resolver(resolver);
        }

        Schema::builder()
            .mutation_type("Mutation")
            .version("users-v1")
            .register(
                ObjectType::new("Query")
                    .field(
                        MetaField::new("user", "User")
                            .argument(MetaInputValue::new("id", "ID!"))
                            .resolver(resolver_fn(|ctx| Ok(find_user(ctx.arg("id"))))),
                    )
                    .field(
                        MetaField::new("users", "[User!]!")
                            .argument(MetaInputValue::new("first", "Int").default_value(10))
                            .argument(MetaInputValue::new("role", "Role"))
                            .resolver(resolver_fn(|ctx| Ok(list_users(ctx.arg("first"), ctx.arg("role"))))),
                    )
                    .field(
                        MetaField::new("userByEmail", "User")
                            .argument(MetaInputValue::new("email", "Email!"))
                            .resolver(resolver_fn(|ctx| {
                                let email = ctx.arg("email").and_then(ConstValue::as_str);
                                Ok(users_data()
                                    .into_iter()
                                    .find(|user| user.get("email").and_then(ConstValue::as_str) == email)
                                    .unwrap_or_default())
                            })),
                    )
                    .field(
                        MetaField::new("node", "Node")
                            .argument(MetaInputValue::new("id", "ID!"))
                            .resolver(resolver_fn(|ctx| {
                                let id = ctx.arg("id").and_then(ConstValue::as_str);
                                Ok(users_data()
                                    .into_iter()
                                    .chain(posts_data())
                                    .find(|node| node.get("id").and_then(ConstValue::as_str) == id)
                                    .unwrap_or_default())
                            })),
                    )
                    .field(
                        MetaField::new("search", "[SearchResult!]!")
                            .argument(MetaInputValue::new("text", "String!"))
                            .resolver(resolver_fn(|ctx| {
                                let text = ctx.arg("text").and_then(ConstValue::as_str).unwrap_or_default();
                                let matches = |value: &ConstValue, key: &str| {
                                    value
                                        .get(key)
                                        .and_then(ConstValue::as_str)
                                        .is_some_and(|s| s.contains(text))
                                };
                                Ok(ConstValue::List(
                                    users_data()
                                        .into_iter()
                                        .filter(|user| matches(user, "name"))
                                        .chain(posts_data().into_iter().filter(|post| matches(post, "title")))
                                        .map(without_typename)
                                        .collect(),
                                ))
                            })),
                    ),
            )
            .register(
                ObjectType::new("Mutation")
                    .field(
                        MetaField::new("createUser", "User!")
                            .argument(MetaInputValue::new("input", "CreateUserInput!"))
                            .resolver(async_resolver_fn(|ctx| {
                                async move {
                                    tokio::time::sleep(Duration::from_millis(20)).await;
                                    if let Some(log) = ctx.data::<MutationLog>() {
                                        log.push("createUser");
                                    }
                                    let mut user = ctx.arg("input").cloned().unwrap_or_default();
                                    if let ConstValue::Object(fields) = &mut user {
                                        let email = fields
                                            .get("name")
                                            .and_then(ConstValue::as_str)
                                            .map(|name| format!("{}@example.com", name.to_lowercase()))
                                            .unwrap_or_default();
                                        fields.insert(Name::new("id"), "3".into());
                                        fields.insert(Name::new("email"), email.into());
                                        fields.insert(Name::new("friendIds"), ConstValue::List(Vec::new()));
                                    }
                                    Ok(user)
                                }
                                .boxed()
                            })),
                    )
                    .field(
                        MetaField::new("deleteUser", "Boolean!")
                            .argument(MetaInputValue::new("id", "ID!"))
                            .resolver(resolver_fn(|ctx| {
                                if let Some(log) = ctx.data::<MutationLog>() {
                                    log.push("deleteUser");
                                }
                                Ok((!find_user(ctx.arg("id")).is_null()).into())
                            })),
                    ),
            )
            .register(InterfaceType::new("Node").field(MetaField::new("id", "ID!")))
            .register(
                ObjectType::new("User")
                    .implements("Node")
                    .field(MetaField::new("id", "ID!"))
                    .field(name)
                    .field(MetaField::new("email", "Email!"))
                    .field(MetaField::new("role", "Role!"))
                    .field(MetaField::new("friends", "[User!]!").resolver(resolver_fn(|ctx| {
                        let friends = match ctx.parent.get("friendIds") {
                            Some(ConstValue::List(ids)) => ids.iter().map(|id| find_user(Some(id))).collect(),
                            _ => Vec::new(),
                        };
                        Ok(ConstValue::List(friends))
                    }))),
            )
            .register(
                ObjectType::new("Post")
                    .implements("Node")
                    .field(MetaField::new("id", "ID!"))
                    .field(MetaField::new("title", "String!"))
                    .field(
                        MetaField::new("author", "User")
                            .resolver(resolver_fn(|ctx| Ok(find_user(ctx.parent.get("authorId"))))),
                    ),
            )
            .register(
                UnionType::new("SearchResult")
                    .member("User")
                    .member("Post")
                    .type_resolver(|value: &ConstValue| {
                        Some(Name::new(if value.get("title").is_some() { "Post" } else { "User" }))
                    }),
            )
            .register(EnumType::new("Role", ["ADMIN", "GUEST"]))
            .register(ScalarType::new("Email").coercer(EmailCoercer))
            .register(
                InputObjectType::new("CreateUserInput")
                    .field(MetaInputValue::new("name", "String!"))
                    .field(MetaInputValue::new("role", "Role").default_value(ConstValue::Enum(Name::new("GUEST"))))
                    .field(MetaInputValue::new("tags", "[String!]")),
            )
            .build()
            .unwrap()
    }
}

struct EmailCoercer;

impl ScalarCoercer for EmailCoercer {
    fn coerce_input(&self, value: ConstValue) -> Result<ConstValue, String> {
        if value.as_str().is_some_and(|email| email.contains('@')) {
            Ok(value)
        } else {
            Err(format!("{value} is not an email address"))
        }
    }
}

fn users_data() -> Vec<ConstValue> {
    [
        json!({
            "__typename": "User", "id": "1", "name": "Ada",
            "email": "ada@example.com", "role": "ADMIN", "friendIds": ["2"]
        }),
        json!({
            "__typename": "User", "id": "2", "name": "Grace",
            "email": "grace@example.com", "role": "GUEST", "friendIds": ["1", "4"]
        }),
        json!({
            "__typename": "User", "id": "4", "name": null,
            "email": "anonymous@example.com", "role": "GUEST", "friendIds": []
        }),
    ]
    .into_iter()
    .map(ConstValue::from_json)
    .collect()
}

fn posts_data() -> Vec<ConstValue> {
    [json!({"__typename": "Post", "id": "10", "title": "Notes on the Analytical Engine", "authorId": "1"})]
        .into_iter()
        .map(ConstValue::from_json)
        .collect()
}

fn find_user(id: Option<&ConstValue>) -> ConstValue {
    let id = id.and_then(ConstValue::as_str);
    users_data()
        .into_iter()
        .find(|user| user.get("id").and_then(ConstValue::as_str) == id)
        .unwrap_or_default()
}

fn list_users(first: Option<&ConstValue>, role: Option<&ConstValue>) -> ConstValue {
    let first = match first {
        Some(ConstValue::Int(n)) => usize::try_from(*n).unwrap_or(0),
        _ => usize::MAX,
    };
    ConstValue::List(
        users_data()
            .into_iter()
            .filter(|user| match role {
                Some(ConstValue::Enum(role)) => user.get("role").and_then(ConstValue::as_str) == Some(role.as_str()),
                _ => true,
            })
            .take(first)
            .collect(),
    )
}

/// The union type resolver doesn't need `__typename`.
fn without_typename(mut value: ConstValue) -> ConstValue {
    if let ConstValue::Object(fields) = &mut value {
        fields.shift_remove("__typename");
    }
    value
}
