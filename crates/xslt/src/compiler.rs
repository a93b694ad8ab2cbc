//! Compiles stylesheet text into a [`Stylesheet`].
//!
//! Instructions outside the supported subset are compile errors naming the
//! element, with the location of the offending node.

use crate::ast::{AttrTemplate, AvtPart, Instruction, Stylesheet, TemplateRule};
use crate::error::{Location, XsltError};
use crate::path::{Path, Test};
use crate::pattern::Pattern;
use roxmltree::{Document, Node};

pub const XSLT_NS: &str = "http://www.w3.org/1999/XSL/Transform";

pub fn compile(text: &str) -> Result<Stylesheet, XsltError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();

    if !matches!(xsl_name(root), Some("stylesheet") | Some("transform")) {
        return Err(compile_error(
            root,
            format!(
                "document element is '{}', expected 'xsl:stylesheet'",
                root.tag_name().name()
            ),
        ));
    }

    let mut rules = Vec::new();

    for child in root.children().filter(|c| c.is_element()) {
        match xsl_name(child) {
            Some("template") => {
                let Some(pattern_text) = child.attribute("match") else {
                    return Err(compile_error(
                        child,
                        "xsl:template without a 'match' attribute is not supported".to_string(),
                    ));
                };
                let pattern = Pattern::parse(pattern_text)?;
                let body = compile_body(child)?;
                rules.push(TemplateRule { pattern, body });
            }
            // Output method is always serialized markup here.
            Some("output") => {}
            Some(other) => {
                return Err(compile_error(
                    child,
                    format!("unsupported top-level instruction 'xsl:{other}'"),
                ));
            }
            None => {
                return Err(compile_error(
                    child,
                    format!(
                        "element '{}' is not allowed at the stylesheet top level",
                        child.tag_name().name()
                    ),
                ));
            }
        }
    }

    Ok(Stylesheet { rules })
}

fn compile_body(node: Node) -> Result<Vec<Instruction>, XsltError> {
    let mut instructions = Vec::new();

    for child in node.children() {
        if child.is_text() {
            let text = child.text().unwrap_or_default();
            // Whitespace-only text between instructions is stylesheet
            // formatting, not output.
            if !text.trim().is_empty() {
                instructions.push(Instruction::Text(text.to_string()));
            }
            continue;
        }
        if !child.is_element() {
            continue;
        }

        match xsl_name(child) {
            Some("value-of") => {
                let select = require_attr(child, "select")?;
                instructions.push(Instruction::ValueOf(Path::parse(&select)?));
            }
            Some("apply-templates") => {
                let select = match child.attribute("select") {
                    Some(expr) => Some(Path::parse(expr)?),
                    None => None,
                };
                instructions.push(Instruction::ApplyTemplates(select));
            }
            Some("for-each") => {
                let select = require_attr(child, "select")?;
                instructions.push(Instruction::ForEach {
                    select: Path::parse(&select)?,
                    body: compile_body(child)?,
                });
            }
            Some("if") => {
                let test = require_attr(child, "test")?;
                instructions.push(Instruction::If {
                    test: Test::parse(&test)?,
                    body: compile_body(child)?,
                });
            }
            Some("choose") => {
                instructions.push(compile_choose(child)?);
            }
            Some("text") => {
                instructions.push(Instruction::Text(
                    child.text().unwrap_or_default().to_string(),
                ));
            }
            Some("attribute") => {
                let name = require_attr(child, "name")?;
                instructions.push(Instruction::Attribute {
                    name,
                    body: compile_body(child)?,
                });
            }
            Some(other) => {
                return Err(compile_error(
                    child,
                    format!("unsupported instruction 'xsl:{other}'"),
                ));
            }
            None => {
                let mut attributes = Vec::new();
                for attr in child.attributes() {
                    if attr.namespace().is_some() {
                        continue;
                    }
                    attributes.push((attr.name().to_string(), parse_avt(child, attr.value())?));
                }
                instructions.push(Instruction::Element {
                    name: child.tag_name().name().to_string(),
                    attributes,
                    children: compile_body(child)?,
                });
            }
        }
    }

    Ok(instructions)
}

fn compile_choose(node: Node) -> Result<Instruction, XsltError> {
    let mut branches = Vec::new();
    let mut otherwise = Vec::new();

    for child in node.children().filter(|c| c.is_element()) {
        match xsl_name(child) {
            Some("when") => {
                let test = require_attr(child, "test")?;
                branches.push((Test::parse(&test)?, compile_body(child)?));
            }
            Some("otherwise") => otherwise = compile_body(child)?,
            _ => {
                return Err(compile_error(
                    child,
                    format!(
                        "'{}' is not allowed inside xsl:choose",
                        child.tag_name().name()
                    ),
                ));
            }
        }
    }

    if branches.is_empty() {
        return Err(compile_error(
            node,
            "xsl:choose requires at least one xsl:when".to_string(),
        ));
    }

    Ok(Instruction::Choose {
        branches,
        otherwise,
    })
}

/// Parses an attribute value template: `{path}` placeholders inside literal
/// text, with `{{` and `}}` as brace escapes.
fn parse_avt(node: Node, value: &str) -> Result<AttrTemplate, XsltError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut rest = value;

    while let Some(open) = rest.find(['{', '}']) {
        let (before, from_brace) = rest.split_at(open);
        literal.push_str(before);

        if let Some(after) = from_brace.strip_prefix("{{") {
            literal.push('{');
            rest = after;
        } else if let Some(after) = from_brace.strip_prefix("}}") {
            literal.push('}');
            rest = after;
        } else if let Some(after) = from_brace.strip_prefix('{') {
            let Some(close) = after.find('}') else {
                return Err(compile_error(
                    node,
                    format!("unterminated '{{' in attribute value template '{value}'"),
                ));
            };
            if !literal.is_empty() {
                parts.push(AvtPart::Literal(std::mem::take(&mut literal)));
            }
            parts.push(AvtPart::Path(Path::parse(&after[..close])?));
            rest = &after[close + 1..];
        } else {
            return Err(compile_error(
                node,
                format!("unmatched '}}' in attribute value template '{value}'"),
            ));
        }
    }

    literal.push_str(rest);
    if !literal.is_empty() || parts.is_empty() {
        parts.push(AvtPart::Literal(literal));
    }

    Ok(AttrTemplate { parts })
}

fn require_attr(node: Node, attr: &str) -> Result<String, XsltError> {
    node.attribute(attr)
        .map(str::to_string)
        .ok_or_else(|| {
            compile_error(
                node,
                format!(
                    "'xsl:{}' is missing its '{attr}' attribute",
                    node.tag_name().name()
                ),
            )
        })
}

fn xsl_name<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    let tag = node.tag_name();
    (tag.namespace() == Some(XSLT_NS)).then(|| tag.name())
}

fn compile_error(node: Node, message: String) -> XsltError {
    let location: Location = node.document().text_pos_at(node.range().start).into();
    XsltError::Compile { message, location }
}
