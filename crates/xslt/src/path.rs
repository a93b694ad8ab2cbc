//! Select/test expressions: the path subset used by preview stylesheets.
//!
//! Supported steps: `.`, element names, `*`, `text()`, and `@name`, joined
//! with `/`; a leading `/` makes the path absolute. Test expressions add
//! `path = 'literal'` and `path != 'literal'` comparisons.

use crate::error::XsltError;
use roxmltree::Node;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    SelfNode,
    Child(String),
    Wildcard,
    Text,
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub absolute: bool,
    pub steps: Vec<Step>,
}

/// A value selected by a path: a tree node or an attribute string.
#[derive(Debug, Clone)]
pub enum PathValue<'a, 'input> {
    Node(Node<'a, 'input>),
    Attr(&'a str),
}

impl<'a, 'input> PathValue<'a, 'input> {
    /// The XPath string-value: concatenated descendant text for elements,
    /// the text itself for text nodes, the value for attributes.
    pub fn string_value(&self) -> String {
        match self {
            PathValue::Attr(value) => (*value).to_string(),
            PathValue::Node(node) => {
                if node.is_text() {
                    node.text().unwrap_or_default().to_string()
                } else {
                    let mut out = String::new();
                    for descendant in node.descendants().filter(|d| d.is_text()) {
                        out.push_str(descendant.text().unwrap_or_default());
                    }
                    out
                }
            }
        }
    }
}

impl Path {
    pub fn parse(expr: &str) -> Result<Path, XsltError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(parse_error(expr, "empty expression"));
        }

        let (absolute, rest) = match trimmed.strip_prefix('/') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        if absolute && rest.is_empty() {
            return Ok(Path {
                absolute,
                steps: Vec::new(),
            });
        }

        let mut steps = Vec::new();
        for token in rest.split('/') {
            let token = token.trim();
            if token.is_empty() {
                return Err(parse_error(expr, "empty step"));
            }
            steps.push(parse_step(expr, token)?);
        }

        Ok(Path { absolute, steps })
    }

    /// Evaluates the path against `context`, with `root` anchoring absolute
    /// paths.
    pub fn select<'a, 'input>(
        &self,
        context: Node<'a, 'input>,
        root: Node<'a, 'input>,
    ) -> Vec<PathValue<'a, 'input>> {
        let start = if self.absolute { root } else { context };
        let mut current = vec![PathValue::Node(start)];

        for step in &self.steps {
            let mut next = Vec::new();
            for value in &current {
                let PathValue::Node(node) = value else {
                    // Attribute values have no further axes.
                    continue;
                };
                match step {
                    Step::SelfNode => next.push(PathValue::Node(*node)),
                    Step::Child(name) => next.extend(
                        node.children()
                            .filter(|c| c.is_element() && c.tag_name().name() == name)
                            .map(PathValue::Node),
                    ),
                    Step::Wildcard => next.extend(
                        node.children().filter(|c| c.is_element()).map(PathValue::Node),
                    ),
                    Step::Text => next.extend(
                        node.children().filter(|c| c.is_text()).map(PathValue::Node),
                    ),
                    Step::Attribute(name) => {
                        if let Some(value) = node.attribute(name.as_str()) {
                            next.push(PathValue::Attr(value));
                        }
                    }
                }
            }
            current = next;
        }

        current
    }

    /// The string-value of the first selected node, or the empty string.
    pub fn string<'a, 'input>(&self, context: Node<'a, 'input>, root: Node<'a, 'input>) -> String {
        self.select(context, root)
            .first()
            .map(PathValue::string_value)
            .unwrap_or_default()
    }
}

fn parse_step(expr: &str, token: &str) -> Result<Step, XsltError> {
    if token == "." {
        return Ok(Step::SelfNode);
    }
    if token == "*" {
        return Ok(Step::Wildcard);
    }
    if token == "text()" {
        return Ok(Step::Text);
    }
    if let Some(name) = token.strip_prefix('@') {
        if !is_valid_name(name) {
            return Err(parse_error(expr, &format!("invalid attribute name '{name}'")));
        }
        return Ok(Step::Attribute(name.to_string()));
    }
    if !is_valid_name(token) {
        return Err(parse_error(expr, &format!("invalid step '{token}'")));
    }
    Ok(Step::Child(token.to_string()))
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
        && !name.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '-' | '.'))
}

fn parse_error(expr: &str, message: &str) -> XsltError {
    XsltError::PathParse {
        expr: expr.to_string(),
        message: message.to_string(),
    }
}

/// A boolean test expression: existence or string comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Test {
    Exists(Path),
    Equals(Path, String),
    NotEquals(Path, String),
}

impl Test {
    pub fn parse(expr: &str) -> Result<Test, XsltError> {
        if let Some((lhs, rhs)) = expr.split_once("!=") {
            let literal = parse_literal(expr, rhs)?;
            return Ok(Test::NotEquals(Path::parse(lhs)?, literal));
        }
        if let Some((lhs, rhs)) = expr.split_once('=') {
            let literal = parse_literal(expr, rhs)?;
            return Ok(Test::Equals(Path::parse(lhs)?, literal));
        }
        Ok(Test::Exists(Path::parse(expr)?))
    }

    pub fn evaluate(&self, context: Node, root: Node) -> bool {
        match self {
            Test::Exists(path) => !path.select(context, root).is_empty(),
            // Node-set comparison semantics: true if any selected value
            // compares as stated.
            Test::Equals(path, literal) => path
                .select(context, root)
                .iter()
                .any(|v| v.string_value() == *literal),
            Test::NotEquals(path, literal) => path
                .select(context, root)
                .iter()
                .any(|v| v.string_value() != *literal),
        }
    }
}

fn parse_literal(expr: &str, raw: &str) -> Result<String, XsltError> {
    let raw = raw.trim();
    let inner = raw
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .or_else(|| raw.strip_prefix('"').and_then(|r| r.strip_suffix('"')));
    match inner {
        Some(inner) => Ok(inner.to_string()),
        None => Err(parse_error(
            expr,
            "comparison operand must be a quoted string literal",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const DOC: &str = r#"<document><head type="main">Title</head><p>One</p><p>Two</p></document>"#;

    fn with_doc<F: FnOnce(Node, Node)>(f: F) {
        let doc = Document::parse(DOC).unwrap();
        f(doc.root_element(), doc.root());
    }

    #[test]
    fn parses_step_kinds() {
        let path = Path::parse("head/text()").unwrap();
        assert_eq!(
            path.steps,
            vec![Step::Child("head".into()), Step::Text]
        );
        assert!(Path::parse("@type").is_ok());
        assert!(Path::parse(".").is_ok());
        assert!(Path::parse("/document/p").unwrap().absolute);
        assert!(Path::parse("a//b").is_err());
        assert!(Path::parse("").is_err());
    }

    #[test]
    fn selects_children_and_attributes() {
        with_doc(|context, root| {
            assert_eq!(Path::parse("head").unwrap().string(context, root), "Title");
            assert_eq!(
                Path::parse("head/@type").unwrap().string(context, root),
                "main"
            );
            assert_eq!(Path::parse("p").unwrap().select(context, root).len(), 2);
            assert_eq!(Path::parse(".").unwrap().string(context, root), "TitleOneTwo");
        });
    }

    #[test]
    fn absolute_paths_anchor_at_root() {
        with_doc(|context, root| {
            let first_p = context
                .children()
                .filter(|c| c.is_element() && c.tag_name().name() == "p")
                .next()
                .unwrap();
            assert_eq!(
                Path::parse("/document/head").unwrap().string(first_p, root),
                "Title"
            );
        });
    }

    #[test]
    fn evaluates_tests() {
        with_doc(|context, root| {
            assert!(Test::parse("head").unwrap().evaluate(context, root));
            assert!(!Test::parse("missing").unwrap().evaluate(context, root));
            assert!(
                Test::parse("head/@type = 'main'")
                    .unwrap()
                    .evaluate(context, root)
            );
            assert!(
                !Test::parse("head/@type = 'other'")
                    .unwrap()
                    .evaluate(context, root)
            );
            assert!(
                Test::parse("p != 'One'")
                    .unwrap()
                    .evaluate(context, root)
            );
            assert!(Test::parse("head = main").is_err());
        });
    }
}
