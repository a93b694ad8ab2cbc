use thiserror::Error;

/// A 1-based line/column position in the schema or instance text.
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
pub enum XsdError {
    #[error("XML parsing error: {0}")]
    Parse(#[from] roxmltree::Error),

    // Location is carried beside the message, not inside it: reporting
    // layers position errors themselves.
    #[error("{message}")]
    Malformed { message: String, location: Location },

    #[error("unsupported schema construct 'xs:{construct}'")]
    Unsupported { construct: String, location: Location },

    #[error("unresolved reference '{reference}'")]
    UnresolvedReference { reference: String, location: Location },

    #[error("duplicate definition of '{name}'")]
    Duplicate { name: String, location: Location },
}

impl XsdError {
    /// The position of the offending construct, where one is known.
    pub fn location(&self) -> Option<Location> {
        match self {
            XsdError::Parse(e) => Some(e.pos().into()),
            XsdError::Malformed { location, .. }
            | XsdError::Unsupported { location, .. }
            | XsdError::UnresolvedReference { location, .. }
            | XsdError::Duplicate { location, .. } => Some(*location),
        }
    }
}
