//! Field validation in three mutually exclusive modes.
//!
//! Document mode wraps the submitted fragment in the definition's root
//! element before validating, so every reported line is shifted down by the
//! synthetic opening line; the offset of −1 undoes that. Schema and XSL
//! modes validate the submitted text as-is (offset 0).

use crate::feedback::{FieldError, FieldKind};
use sigla_store::DocumentDefinition;

/// Which check applies to a validated field.
#[derive(Debug, Clone, Copy)]
pub enum ValidatorMode<'a> {
    /// The value is a fragment of the given definition's document type.
    Document(&'a DocumentDefinition),
    /// The value must itself be a compilable XSD schema.
    Schema,
    /// The value must itself be a compilable XSLT stylesheet.
    Xsl,
}

/// Validates one form field's raw value.
#[derive(Debug, Clone)]
pub struct XmlFieldValidator<'a> {
    field: String,
    field_kind: FieldKind,
    mode: ValidatorMode<'a>,
}

impl<'a> XmlFieldValidator<'a> {
    pub fn new(field: &str, field_kind: FieldKind, mode: ValidatorMode<'a>) -> Self {
        XmlFieldValidator {
            field: field.to_string(),
            field_kind,
            mode,
        }
    }

    /// Runs the check and returns every error found; an empty vector means
    /// the value passed. The definition under validation is never mutated.
    pub fn validate(&self, value: &str) -> Vec<FieldError> {
        match self.mode {
            ValidatorMode::Document(definition) => self.validate_fragment(definition, value),
            ValidatorMode::Schema => self.validate_schema_text(value),
            ValidatorMode::Xsl => self.validate_xsl_text(value),
        }
    }

    fn validate_fragment(&self, definition: &DocumentDefinition, value: &str) -> Vec<FieldError> {
        let schema = match sigla_xsd::compile(&definition.schema) {
            Ok(schema) => schema,
            Err(e) => {
                log::warn!(
                    "stored schema of document definition '{}' does not compile: {e}",
                    definition.identifier
                );
                return vec![FieldError::configuration(
                    &self.field,
                    self.field_kind,
                    format!(
                        "the stored schema of '{}' does not compile: {e}",
                        definition.identifier
                    ),
                )];
            }
        };

        let wrapped = format!(
            "<{0}>\n{1}\n</{0}>",
            definition.root_element, value
        );

        schema
            .validate(&wrapped)
            .into_iter()
            .map(|violation| {
                FieldError::validation(
                    &self.field,
                    self.field_kind,
                    i64::from(violation.line) - 1,
                    violation.col,
                    violation.message,
                )
            })
            .collect()
    }

    fn validate_schema_text(&self, value: &str) -> Vec<FieldError> {
        match sigla_xsd::compile(value) {
            Ok(_) => Vec::new(),
            Err(e) => vec![match e.location() {
                Some(location) => FieldError::validation(
                    &self.field,
                    self.field_kind,
                    i64::from(location.line),
                    location.col,
                    e.to_string(),
                ),
                None => FieldError::unlocated(&self.field, self.field_kind, e.to_string()),
            }],
        }
    }

    fn validate_xsl_text(&self, value: &str) -> Vec<FieldError> {
        match sigla_xslt::validate_xsl(value) {
            Ok(()) => Vec::new(),
            Err(e) => vec![match e.location() {
                Some(location) => FieldError::validation(
                    &self.field,
                    self.field_kind,
                    i64::from(location.line),
                    location.col,
                    e.to_string(),
                ),
                None => FieldError::unlocated(&self.field, self.field_kind, e.to_string()),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::FieldErrorKind;

    const BOLD_SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="document">
        <xs:complexType mixed="true">
            <xs:sequence>
                <xs:element name="b" type="xs:string" minOccurs="0" maxOccurs="unbounded"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

    fn definition_with(schema: &str) -> DocumentDefinition {
        let mut definition = DocumentDefinition::new("siglumTextMarkup", "document");
        definition.schema = schema.to_string();
        definition
    }

    #[test]
    fn valid_fragment_passes() {
        let definition = definition_with(BOLD_SCHEMA);
        let validator = XmlFieldValidator::new(
            "text",
            FieldKind::Editor,
            ValidatorMode::Document(&definition),
        );
        assert!(validator.validate("<b>ok</b>").is_empty());
    }

    #[test]
    fn violation_line_is_adjusted_for_the_wrapper() {
        let definition = definition_with(BOLD_SCHEMA);
        let validator = XmlFieldValidator::new(
            "text",
            FieldKind::Editor,
            ValidatorMode::Document(&definition),
        );
        // The offending element sits on line 1 of the fragment; the wrapper
        // pushes it to line 2 of the validated document.
        let errors = validator.validate("<b><c/></b>");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, Some(1));
        assert_eq!(errors[0].kind, FieldErrorKind::Validation);
    }

    #[test]
    fn uncompilable_stored_schema_is_a_configuration_error() {
        let definition = definition_with("<xs:schema");
        let validator = XmlFieldValidator::new(
            "text",
            FieldKind::Editor,
            ValidatorMode::Document(&definition),
        );
        let errors = validator.validate("<b>ok</b>");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, FieldErrorKind::Configuration);
    }

    #[test]
    fn schema_mode_reports_unshifted_positions() {
        let validator = XmlFieldValidator::new("schema", FieldKind::Editor, ValidatorMode::Schema);
        assert!(validator.validate(BOLD_SCHEMA).is_empty());

        let errors = validator.validate(
            "<xs:schema xmlns:xs=\"http://www.w3.org/2001/XMLSchema\">\n<xs:unknown/>\n</xs:schema>",
        );
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, Some(2));
    }

    #[test]
    fn xsl_mode_accepts_and_rejects() {
        let validator = XmlFieldValidator::new("xsl", FieldKind::Editor, ValidatorMode::Xsl);
        let good = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
            <xsl:template match="/"><div/></xsl:template>
        </xsl:stylesheet>"#;
        assert!(validator.validate(good).is_empty());

        let errors = validator.validate("<not-a-stylesheet/>");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].line.is_some());
    }

    #[test]
    fn xsl_mode_path_errors_have_no_location() {
        let validator = XmlFieldValidator::new("xsl", FieldKind::Editor, ValidatorMode::Xsl);
        let bad_select = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
            <xsl:template match="/"><p><xsl:value-of select="a//b"/></p></xsl:template>
        </xsl:stylesheet>"#;
        let errors = validator.validate(bad_select);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].line.is_none());
    }
}
