//! Applies a compiled stylesheet to an input document and serializes the
//! result tree.

use crate::ast::{AttrTemplate, AvtPart, Instruction, Stylesheet};
use crate::error::XsltError;
use crate::path::PathValue;
use quick_xml::escape::escape;
use roxmltree::{Document, Node};

pub(crate) fn transform(stylesheet: &Stylesheet, xml_text: &str) -> Result<String, XsltError> {
    let doc = Document::parse(xml_text)?;
    let mut out = MarkupWriter::default();
    apply_templates(stylesheet, doc.root(), doc.root(), &mut out)?;
    Ok(out.finish())
}

fn apply_templates(
    stylesheet: &Stylesheet,
    node: Node,
    root: Node,
    out: &mut MarkupWriter,
) -> Result<(), XsltError> {
    // Later rules shadow earlier ones.
    let rule = stylesheet
        .rules
        .iter()
        .rev()
        .find(|r| r.pattern.matches(node, root));

    match rule {
        Some(rule) => execute_body(stylesheet, &rule.body, node, root, out),
        None => builtin_rule(stylesheet, node, root, out),
    }
}

/// The built-in template rules: root and elements apply templates to their
/// children, text nodes copy their text.
fn builtin_rule(
    stylesheet: &Stylesheet,
    node: Node,
    root: Node,
    out: &mut MarkupWriter,
) -> Result<(), XsltError> {
    if node.is_text() {
        out.text(node.text().unwrap_or_default());
        return Ok(());
    }
    if node.is_root() || node.is_element() {
        for child in node.children().filter(|c| c.is_element() || c.is_text()) {
            apply_templates(stylesheet, child, root, out)?;
        }
    }
    Ok(())
}

fn execute_body(
    stylesheet: &Stylesheet,
    body: &[Instruction],
    context: Node,
    root: Node,
    out: &mut MarkupWriter,
) -> Result<(), XsltError> {
    for instruction in body {
        execute(stylesheet, instruction, context, root, out)?;
    }
    Ok(())
}

fn execute(
    stylesheet: &Stylesheet,
    instruction: &Instruction,
    context: Node,
    root: Node,
    out: &mut MarkupWriter,
) -> Result<(), XsltError> {
    match instruction {
        Instruction::Text(text) => out.text(text),
        Instruction::ValueOf(path) => out.text(&path.string(context, root)),
        Instruction::Element {
            name,
            attributes,
            children,
        } => {
            out.start_element(name);
            for (attr_name, template) in attributes {
                let value = evaluate_avt(template, context, root);
                out.add_attribute(attr_name, &value)?;
            }
            execute_body(stylesheet, children, context, root, out)?;
            out.end_element(name);
        }
        Instruction::Attribute { name, body } => {
            let mut value = String::new();
            evaluate_text(stylesheet, body, context, root, &mut value)?;
            out.add_attribute(name, &value)?;
        }
        Instruction::ApplyTemplates(select) => match select {
            None => {
                for child in context.children().filter(|c| c.is_element() || c.is_text()) {
                    apply_templates(stylesheet, child, root, out)?;
                }
            }
            Some(path) => {
                for value in path.select(context, root) {
                    match value {
                        PathValue::Node(node) => apply_templates(stylesheet, node, root, out)?,
                        PathValue::Attr(_) => {
                            log::debug!("apply-templates over an attribute value is ignored");
                        }
                    }
                }
            }
        },
        Instruction::ForEach { select, body } => {
            for value in select.select(context, root) {
                match value {
                    PathValue::Node(node) => {
                        execute_body(stylesheet, body, node, root, out)?;
                    }
                    PathValue::Attr(_) => {
                        log::debug!("for-each over an attribute value is ignored");
                    }
                }
            }
        }
        Instruction::If { test, body } => {
            if test.evaluate(context, root) {
                execute_body(stylesheet, body, context, root, out)?;
            }
        }
        Instruction::Choose {
            branches,
            otherwise,
        } => {
            let taken = branches
                .iter()
                .find(|(test, _)| test.evaluate(context, root));
            match taken {
                Some((_, body)) => execute_body(stylesheet, body, context, root, out)?,
                None => execute_body(stylesheet, otherwise, context, root, out)?,
            }
        }
    }
    Ok(())
}

fn evaluate_avt(template: &AttrTemplate, context: Node, root: Node) -> String {
    let mut value = String::new();
    for part in &template.parts {
        match part {
            AvtPart::Literal(text) => value.push_str(text),
            AvtPart::Path(path) => value.push_str(&path.string(context, root)),
        }
    }
    value
}

/// Evaluates a body for its text value only, as inside `xsl:attribute`.
fn evaluate_text(
    stylesheet: &Stylesheet,
    body: &[Instruction],
    context: Node,
    root: Node,
    buf: &mut String,
) -> Result<(), XsltError> {
    for instruction in body {
        match instruction {
            Instruction::Text(text) => buf.push_str(text),
            Instruction::ValueOf(path) => buf.push_str(&path.string(context, root)),
            Instruction::If { test, body } => {
                if test.evaluate(context, root) {
                    evaluate_text(stylesheet, body, context, root, buf)?;
                }
            }
            Instruction::Choose {
                branches,
                otherwise,
            } => {
                match branches.iter().find(|(test, _)| test.evaluate(context, root)) {
                    Some((_, body)) => evaluate_text(stylesheet, body, context, root, buf)?,
                    None => evaluate_text(stylesheet, otherwise, context, root, buf)?,
                }
            }
            Instruction::ForEach { select, body } => {
                for value in select.select(context, root) {
                    if let PathValue::Node(node) = value {
                        evaluate_text(stylesheet, body, node, root, buf)?;
                    }
                }
            }
            Instruction::Element { name, .. } => {
                return Err(XsltError::Execution(format!(
                    "cannot create element '{name}' while computing an attribute value"
                )));
            }
            Instruction::Attribute { name, .. } => {
                return Err(XsltError::Execution(format!(
                    "cannot create attribute '{name}' while computing an attribute value"
                )));
            }
            Instruction::ApplyTemplates(_) => {
                return Err(XsltError::Execution(
                    "cannot apply templates while computing an attribute value".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Serializes the result tree. An element start stays pending until content
/// arrives so `xsl:attribute` can still attach to it; an element closed
/// while pending is written self-closing.
#[derive(Debug, Default)]
struct MarkupWriter {
    buf: String,
    pending: Option<(String, Vec<(String, String)>)>,
}

impl MarkupWriter {
    fn start_element(&mut self, name: &str) {
        self.flush_pending();
        self.pending = Some((name.to_string(), Vec::new()));
    }

    fn add_attribute(&mut self, name: &str, value: &str) -> Result<(), XsltError> {
        match &mut self.pending {
            Some((_, attrs)) => {
                // A later attribute of the same name wins.
                attrs.retain(|(existing, _)| existing != name);
                attrs.push((name.to_string(), value.to_string()));
                Ok(())
            }
            None => Err(XsltError::Execution(format!(
                "attribute '{name}' created with no open element to attach to"
            ))),
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.flush_pending();
        self.buf.push_str(&escape(text));
    }

    fn end_element(&mut self, name: &str) {
        if let Some((pending_name, attrs)) = self.pending.take() {
            if pending_name == name {
                self.write_tag(&pending_name, &attrs, true);
                return;
            }
            self.write_tag(&pending_name, &attrs, false);
        }
        self.buf.push_str("</");
        self.buf.push_str(name);
        self.buf.push('>');
    }

    fn flush_pending(&mut self) {
        if let Some((name, attrs)) = self.pending.take() {
            self.write_tag(&name, &attrs, false);
        }
    }

    fn write_tag(&mut self, name: &str, attrs: &[(String, String)], self_closing: bool) {
        self.buf.push('<');
        self.buf.push_str(name);
        for (attr_name, value) in attrs {
            self.buf.push(' ');
            self.buf.push_str(attr_name);
            self.buf.push_str("=\"");
            self.buf.push_str(&escape(value));
            self.buf.push('"');
        }
        self.buf.push_str(if self_closing { "/>" } else { ">" });
    }

    fn finish(mut self) -> String {
        self.flush_pending();
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use crate::compile;

    const MARKUP_XSLT: &str = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
        <xsl:template match="/"><div class="preview"><xsl:apply-templates/></div></xsl:template>
        <xsl:template match="b"><strong><xsl:apply-templates/></strong></xsl:template>
        <xsl:template match="i"><em><xsl:apply-templates/></em></xsl:template>
    </xsl:stylesheet>"#;

    #[test]
    fn transforms_wrapped_fragment() {
        let stylesheet = compile(MARKUP_XSLT).unwrap();
        let html = stylesheet
            .transform("<document>Hello <b>World</b></document>")
            .unwrap();
        assert_eq!(html, r#"<div class="preview">Hello <strong>World</strong></div>"#);
    }

    #[test]
    fn built_in_rules_copy_text_through_unknown_elements() {
        let stylesheet = compile(MARKUP_XSLT).unwrap();
        let html = stylesheet
            .transform("<document><u>plain</u> and <i>styled</i></document>")
            .unwrap();
        assert_eq!(html, r#"<div class="preview">plain and <em>styled</em></div>"#);
    }

    #[test]
    fn output_text_is_escaped() {
        let stylesheet = compile(MARKUP_XSLT).unwrap();
        let html = stylesheet
            .transform("<document>a &amp; b &lt; c</document>")
            .unwrap();
        assert_eq!(html, r#"<div class="preview">a &amp; b &lt; c</div>"#);
    }

    #[test]
    fn empty_elements_self_close() {
        let xslt = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
            <xsl:template match="/"><p>a<br/>b</p></xsl:template>
        </xsl:stylesheet>"#;
        let html = compile(xslt).unwrap().transform("<document/>").unwrap();
        assert_eq!(html, "<p>a<br/>b</p>");
    }

    #[test]
    fn attribute_value_templates_and_xsl_attribute() {
        let xslt = r##"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
            <xsl:template match="/"><xsl:apply-templates select="document/ref"/></xsl:template>
            <xsl:template match="ref"><a href="#{@target}"><xsl:attribute name="title"><xsl:value-of select="@target"/></xsl:attribute><xsl:value-of select="."/></a></xsl:template>
        </xsl:stylesheet>"##;
        let html = compile(xslt)
            .unwrap()
            .transform(r#"<document><ref target="s1">see</ref></document>"#)
            .unwrap();
        assert_eq!(html, r##"<a href="#s1" title="s1">see</a>"##);
    }

    #[test]
    fn for_each_and_choose() {
        let xslt = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
            <xsl:template match="/"><ul><xsl:for-each select="document/item"><li><xsl:choose><xsl:when test="@kind = 'a'"><xsl:text>A: </xsl:text></xsl:when><xsl:otherwise><xsl:text>other: </xsl:text></xsl:otherwise></xsl:choose><xsl:value-of select="."/></li></xsl:for-each></ul></xsl:template>
        </xsl:stylesheet>"#;
        let html = compile(xslt)
            .unwrap()
            .transform(r#"<document><item kind="a">one</item><item kind="b">two</item></document>"#)
            .unwrap();
        assert_eq!(html, "<ul><li>A: one</li><li>other: two</li></ul>");
    }

    #[test]
    fn placeholder_document_validation() {
        assert!(crate::validate_xsl(MARKUP_XSLT).is_ok());
        assert!(crate::validate_xsl("<busted").is_err());
        assert!(
            crate::validate_xsl(
                r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
                    <xsl:template match="/"><xsl:call-template name="x"/></xsl:template>
                </xsl:stylesheet>"#
            )
            .is_err()
        );
    }

    #[test]
    fn if_condition_controls_output() {
        let xslt = r#"<xsl:stylesheet version="1.0" xmlns:xsl="http://www.w3.org/1999/XSL/Transform">
            <xsl:template match="/"><xsl:if test="document/note"><aside><xsl:value-of select="document/note"/></aside></xsl:if></xsl:template>
        </xsl:stylesheet>"#;
        let stylesheet = compile(xslt).unwrap();
        assert_eq!(
            stylesheet
                .transform("<document><note>nb</note></document>")
                .unwrap(),
            "<aside>nb</aside>"
        );
        assert_eq!(stylesheet.transform("<document/>").unwrap(), "");
    }
}
