//! XSLT subset compiler and executor.
//!
//! Document definitions may carry an XSLT stylesheet as raw text; it is
//! compiled and applied to wrapped rich-text fragments to produce preview
//! HTML. The same compiler backs save-time syntax validation of stylesheet
//! text: the candidate is compiled and run against a fixed placeholder
//! document so compile and execution errors surface before the text is
//! stored.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod executor;
pub mod path;
pub mod pattern;

pub use ast::Stylesheet;
pub use compiler::compile;
pub use error::{Location, XsltError};

/// The trivial document a candidate stylesheet is exercised against during
/// syntax validation.
pub const PLACEHOLDER_DOC: &str = "<?xml version='1.0'?><root/>";

/// Checks that `text` is a compilable stylesheet by compiling it and
/// transforming the placeholder document through it.
pub fn validate_xsl(text: &str) -> Result<(), XsltError> {
    compile(text)?.transform(PLACEHOLDER_DOC).map(|_| ())
}
