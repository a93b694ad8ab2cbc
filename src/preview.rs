//! Live preview rendering for rich-text fields.

use sigla_store::DocumentDefinition;

/// Applies the definition's stored stylesheet to a field's fragment and
/// returns the preview HTML. The empty string is the first-class "nothing
/// to preview" signal — returned when the definition carries no stylesheet
/// text or the fragment is absent — and callers hide the preview panel on
/// it. The stylesheet is admin-authored and trusted; its output is not
/// escaped further.
///
/// Stored stylesheets are syntax-checked when saved, so a failure here is
/// abnormal; it is logged and the preview stays hidden rather than failing
/// the page.
pub fn render_preview(definition: &DocumentDefinition, fragment: Option<&str>) -> String {
    let Some(fragment) = fragment else {
        return String::new();
    };
    let Some(xsl) = definition.xsl.as_deref().filter(|x| !x.is_empty()) else {
        return String::new();
    };

    let wrapped = format!("<{0}>{1}</{0}>", definition.root_element, fragment);

    let stylesheet = match sigla_xslt::compile(xsl) {
        Ok(stylesheet) => stylesheet,
        Err(e) => {
            log::warn!(
                "stored stylesheet of document definition '{}' does not compile: {e}",
                definition.identifier
            );
            return String::new();
        }
    };

    match stylesheet.transform(&wrapped) {
        Ok(html) => html,
        Err(e) => {
            log::warn!(
                "preview transform for document definition '{}' failed: {e}",
                definition.identifier
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigla_store::DocumentDefinition;

    const PREVIEW_XSLT: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
        <xsl:template match="/"><div class="preview"><xsl:apply-templates/></div></xsl:template>
        <xsl:template match="b"><strong><xsl:apply-templates/></strong></xsl:template>
    </xsl:stylesheet>"#;

    #[test]
    fn renders_through_the_stored_stylesheet() {
        let mut definition = DocumentDefinition::new("siglumTextMarkup", "document");
        definition.xsl = Some(PREVIEW_XSLT.to_string());
        let html = render_preview(&definition, Some("Hello <b>World</b>"));
        assert_eq!(html, r#"<div class="preview">Hello <strong>World</strong></div>"#);
    }

    #[test]
    fn no_stylesheet_means_empty_output() {
        let definition = DocumentDefinition::new("siglumTextMarkup", "document");
        assert_eq!(render_preview(&definition, Some("<b>x</b>")), "");

        let mut empty_xsl = DocumentDefinition::new("fontMarkup", "document");
        empty_xsl.xsl = Some(String::new());
        assert_eq!(render_preview(&empty_xsl, Some("<b>x</b>")), "");
    }

    #[test]
    fn absent_fragment_means_empty_output() {
        let mut definition = DocumentDefinition::new("siglumTextMarkup", "document");
        definition.xsl = Some(PREVIEW_XSLT.to_string());
        assert_eq!(render_preview(&definition, None), "");
    }

    #[test]
    fn broken_fragment_means_empty_output() {
        let mut definition = DocumentDefinition::new("siglumTextMarkup", "document");
        definition.xsl = Some(PREVIEW_XSLT.to_string());
        assert_eq!(render_preview(&definition, Some("<unclosed")), "");
    }
}
