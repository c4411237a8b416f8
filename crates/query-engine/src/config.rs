//! Engine configuration, usually loaded from TOML.

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub operation_caching: OperationCaching,
    pub operation_limits: OperationLimits,
    pub execution: ExecutionConfig,
    pub response: ResponseConfig,
}

impl EngineConfig {
    pub fn from_toml(toml: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml)
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationCaching {
    /// If operation caching should be enabled.
    pub enabled: bool,
    /// The maximum number of operations that can be kept in the cache.
    /// 1000 by default.
    pub limit: usize,
}

impl Default for OperationCaching {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OperationLimits {
    /// Limits the deepest nesting of selection sets in an operation,
    /// including fields in fragments.
    pub depth: Option<u16>,
    /// Limits the total number of aliased fields in an operation,
    /// including fields of fragments.
    pub aliases: Option<u16>,
    /// Limits the number of root fields in an operation, including root
    /// fields in fragments. If a particular root field is included multiple
    /// times via aliases, each usage is counted.
    pub root_fields: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionConfig {
    /// Resolve the fields of a selection set concurrently. Mutation root fields always run
    /// one after the other.
    pub parallel_fields: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { parallel_fields: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResponseConfig {
    /// Add the error class as `extensions.code` to every error.
    pub include_error_codes: bool,
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use insta::assert_debug_snapshot;

    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::from_toml("").unwrap();

        assert_eq!(config, EngineConfig::default());
        assert!(config.operation_caching.enabled);
        assert_eq!(config.operation_caching.limit, 1000);
        assert!(config.execution.parallel_fields);
    }

    #[test]
    fn full() {
        let config = EngineConfig::from_toml(indoc! {r#"
            [operation_caching]
            enabled = false
            limit = 10

            [operation_limits]
            depth = 4
            root_fields = 2

            [execution]
            parallel_fields = false

            [response]
            include_error_codes = true
        "#})
        .unwrap();

        assert_debug_snapshot!(config, @r###"
        EngineConfig {
            operation_caching: OperationCaching {
                enabled: false,
                limit: 10,
            },
            operation_limits: OperationLimits {
                depth: Some(
                    4,
                ),
                aliases: None,
                root_fields: Some(
                    2,
                ),
            },
            execution: ExecutionConfig {
                parallel_fields: false,
            },
            response: ResponseConfig {
                include_error_codes: true,
            },
        }
        "###);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = EngineConfig::from_toml("[operation_limits]\nheight = 3").unwrap_err();
        assert!(err.to_string().contains("unknown field `height`"), "{err}");
    }
}
