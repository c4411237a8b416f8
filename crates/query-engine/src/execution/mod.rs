//! Execution of a typed operation against the schema resolvers.

mod collect;
mod executor;

use std::{any::Any, fmt, sync::Arc};

use query_value::{ConstValue, Variables};

pub(crate) use collect::collect_fields;

use crate::{response::GraphqlError, schema::Schema, typecheck::TypedOperation};

/// Caller data made available to every resolver of a request.
#[derive(Clone, Default)]
pub struct Context {
    data: Option<Arc<dyn Any + Send + Sync>>,
}

impl Context {
    pub fn new<T: Any + Send + Sync>(data: T) -> Self {
        Context {
            data: Some(Arc::new(data)),
        }
    }

    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.data.as_deref()?.downcast_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Resolve sibling fields and list items concurrently. Mutation root fields are always
    /// resolved one after the other.
    pub parallel_fields: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        ExecutionOptions { parallel_fields: true }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOutput {
    /// `Null` if a failure propagated up to the root.
    pub data: ConstValue,
    /// In request order.
    pub errors: Vec<GraphqlError>,
}

/// Runs an operation. `variables` must have been coerced against the operation's [`FunEnv`].
///
/// Field failures don't stop the execution: they are reported in the output errors and the
/// field is nulled, or its nearest nullable ancestor when the field is non-null.
///
/// [`FunEnv`]: crate::FunEnv
pub async fn execute(
    schema: &Schema,
    operation: &TypedOperation,
    variables: &Variables,
    root: &ConstValue,
    context: &Context,
    options: ExecutionOptions,
) -> ExecutionOutput {
    let Some(root_type) = schema.object(&operation.env.root_type) else {
        return ExecutionOutput {
            data: ConstValue::Null,
            errors: vec![GraphqlError::internal_error()],
        };
    };

    let executor = executor::Executor {
        schema,
        variables,
        context,
        parallel: options.parallel_fields,
    };
    let serial = operation.ty.is_mutation() || !options.parallel_fields;
    let completed = executor
        .selection_set(
            root_type,
            root,
            vec![&operation.selection_set],
            &Default::default(),
            serial,
        )
        .await;

    ExecutionOutput {
        data: completed.value.unwrap_or_default(),
        errors: completed.errors,
    }
}
