use thiserror::Error;

/// A 1-based line/column position in the stylesheet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub col: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}

impl From<roxmltree::TextPos> for Location {
    fn from(pos: roxmltree::TextPos) -> Self {
        Location {
            line: pos.row,
            col: pos.col,
        }
    }
}

#[derive(Error, Debug)]
pub enum XsltError {
    #[error("XML parsing error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    // Location is carried beside the message, not inside it: reporting
    // layers position errors themselves.
    #[error("{message}")]
    Compile { message: String, location: Location },

    #[error("path expression error in '{expr}': {message}")]
    PathParse { expr: String, message: String },

    #[error("transform execution error: {0}")]
    Execution(String),
}

impl XsltError {
    /// The position of the offending construct. Path-expression and
    /// execution errors carry none; callers fall back to a location-free
    /// report for those.
    pub fn location(&self) -> Option<Location> {
        match self {
            XsltError::XmlParse(e) => Some(e.pos().into()),
            XsltError::Compile { location, .. } => Some(*location),
            XsltError::PathParse { .. } | XsltError::Execution(_) => None,
        }
    }
}
