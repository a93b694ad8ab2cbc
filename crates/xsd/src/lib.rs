//! XML Schema subset compiler and instance validator.
//!
//! Document definitions carry their schema as raw XSD text. This crate
//! compiles that text into a [`Schema`] and validates instance documents
//! against it, collecting every violation with 1-based line/column positions.

pub mod compiler;
pub mod error;
pub mod model;
pub mod validator;

pub use compiler::compile;
pub use error::{Location, XsdError};
pub use model::Schema;
pub use validator::Violation;
