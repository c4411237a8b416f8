//! Values of the query pipeline.
//!
//! [`ConstValue`] is the internal representation of every value once variables have been
//! substituted: coerced inputs, resolver results and the response tree. [`Value`] is the
//! literal form found in a document, which may still reference variables.

mod name;
mod value;
mod variables;

pub use name::Name;
pub use value::{ConstValue, Value};
pub use variables::Variables;

pub use indexmap::IndexMap;
