//! A parser for GraphQL executable documents.
//!
//! [`parse_query`] reads a query string with `cynic-parser` and turns it into an
//! [`ExecutableDocument`](types::ExecutableDocument).
//! Every node keeps its original position so later stages can point errors back to the source.

mod error;
mod parser;
mod pos;
pub mod types;

pub use error::{Error, Result};
pub use parser::{parse_query, MAX_RECURSION_DEPTH};
pub use pos::{Pos, Positioned};
