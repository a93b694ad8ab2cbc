//! Field-level error values shown beside the offending input.
//!
//! All validator modes funnel into the same collection so the feedback
//! panel renders one unified list. Multi-line editor fields report line and
//! column; single-line text fields only have one line, so they report the
//! column alone.

/// Which kind of form component the validated value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A multi-line editor; messages carry line and column.
    Editor,
    /// A single-line text field; messages carry the column only.
    TextField,
}

/// Distinguishes bad user input from a broken stored configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// The submitted value violates the schema or is not well-formed.
    Validation,
    /// The definition's stored schema or stylesheet itself is broken; the
    /// field cannot be validated until an administrator repairs it.
    Configuration,
}

/// One error attached to a validated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub field_kind: FieldKind,
    pub kind: FieldErrorKind,
    /// Line in the submitted value, already adjusted for any synthetic
    /// wrapper line. Absent when the underlying error carries no location.
    pub line: Option<i64>,
    pub col: Option<u32>,
    pub message: String,
}

impl FieldError {
    pub fn validation(
        field: &str,
        field_kind: FieldKind,
        line: i64,
        col: u32,
        message: String,
    ) -> Self {
        FieldError {
            field: field.to_string(),
            field_kind,
            kind: FieldErrorKind::Validation,
            line: Some(line),
            col: Some(col),
            message,
        }
    }

    pub fn unlocated(field: &str, field_kind: FieldKind, message: String) -> Self {
        FieldError {
            field: field.to_string(),
            field_kind,
            kind: FieldErrorKind::Validation,
            line: None,
            col: None,
            message,
        }
    }

    pub fn configuration(field: &str, field_kind: FieldKind, message: String) -> Self {
        FieldError {
            field: field.to_string(),
            field_kind,
            kind: FieldErrorKind::Configuration,
            line: None,
            col: None,
            message,
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.kind == FieldErrorKind::Configuration {
            return write!(f, "{}: configuration error: {}", self.field, self.message);
        }
        match (self.field_kind, self.line, self.col) {
            (FieldKind::Editor, Some(line), Some(col)) => write!(
                f,
                "{}: error on line {line}, column {col}: {}",
                self.field, self.message
            ),
            (FieldKind::TextField, _, Some(col)) => {
                write!(f, "{}: error at column {col}: {}", self.field, self.message)
            }
            _ => write!(f, "{}: {}", self.field, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn editor_errors_show_line_and_column() {
        let error = FieldError::validation("text", FieldKind::Editor, 3, 7, "bad".to_string());
        assert_eq!(error.to_string(), "text: error on line 3, column 7: bad");
    }

    #[test]
    fn text_field_errors_show_column_only() {
        let error =
            FieldError::validation("taggedName", FieldKind::TextField, 1, 7, "bad".to_string());
        assert_eq!(error.to_string(), "taggedName: error at column 7: bad");
    }

    #[test]
    fn unlocated_errors_omit_positions() {
        let error = FieldError::unlocated("xsl", FieldKind::Editor, "bad".to_string());
        assert_eq!(error.to_string(), "xsl: bad");
    }

    #[test]
    fn configuration_errors_are_marked() {
        let error = FieldError::configuration("text", FieldKind::Editor, "no schema".to_string());
        assert_eq!(error.to_string(), "text: configuration error: no schema");
        assert_eq!(error.kind, FieldErrorKind::Configuration);
    }
}
