//! Parsing and evaluation of `xsl:template` match patterns.
//!
//! A pattern is a union (`|`) of location paths built from element names,
//! `*`, and `text()` steps. Matching walks the steps right-to-left up the
//! ancestor chain; an absolute pattern must terminate at the tree root.

use crate::error::XsltError;
use roxmltree::Node;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternStep {
    Name(String),
    Wildcard,
    Text,
}

/// A compiled match pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    paths: Vec<LocationPathPattern>,
    original_text: String,
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.original_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LocationPathPattern {
    is_absolute: bool,
    steps: Vec<PatternStep>,
}

impl Pattern {
    pub fn parse(text: &str) -> Result<Pattern, XsltError> {
        let mut paths = Vec::new();
        for alternative in text.split('|') {
            paths.push(parse_path(text, alternative.trim())?);
        }
        Ok(Pattern {
            paths,
            original_text: text.to_string(),
        })
    }

    /// Evaluates whether `node` matches this pattern, with `root` the tree
    /// root that anchors absolute paths.
    pub fn matches(&self, node: Node, root: Node) -> bool {
        self.paths.iter().any(|path| path.matches(node, root))
    }
}

impl LocationPathPattern {
    fn matches(&self, node: Node, root: Node) -> bool {
        if self.is_absolute && self.steps.is_empty() {
            // The "/" pattern.
            return node == root;
        }

        let mut current = Some(node);
        for step in self.steps.iter().rev() {
            match current {
                Some(n) if step.matches(n) => current = n.parent(),
                _ => return false,
            }
        }

        if self.is_absolute {
            current == Some(root)
        } else {
            true
        }
    }
}

impl PatternStep {
    fn matches(&self, node: Node) -> bool {
        match self {
            PatternStep::Name(name) => {
                node.is_element() && node.tag_name().name() == name
            }
            PatternStep::Wildcard => node.is_element(),
            PatternStep::Text => node.is_text(),
        }
    }
}

fn parse_path(pattern: &str, text: &str) -> Result<LocationPathPattern, XsltError> {
    if text.is_empty() {
        return Err(pattern_error(pattern, "empty alternative"));
    }

    let (is_absolute, rest) = match text.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    if is_absolute && rest.is_empty() {
        return Ok(LocationPathPattern {
            is_absolute,
            steps: Vec::new(),
        });
    }

    let mut steps = Vec::new();
    for token in rest.split('/') {
        let token = token.trim();
        let step = match token {
            "" => return Err(pattern_error(pattern, "empty step")),
            "*" => PatternStep::Wildcard,
            "text()" => PatternStep::Text,
            name if name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')) =>
            {
                PatternStep::Name(name.to_string())
            }
            other => {
                return Err(pattern_error(
                    pattern,
                    &format!("unsupported pattern step '{other}'"),
                ));
            }
        };
        steps.push(step);
    }

    Ok(LocationPathPattern { is_absolute, steps })
}

fn pattern_error(pattern: &str, message: &str) -> XsltError {
    XsltError::PathParse {
        expr: pattern.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roxmltree::Document;

    const DOC: &str = "<document><p>Hello <b>World</b></p></document>";

    fn node_named<'a, 'input>(doc: &'a Document<'input>, name: &str) -> Node<'a, 'input> {
        doc.descendants()
            .find(|n| n.is_element() && n.tag_name().name() == name)
            .unwrap()
    }

    #[test]
    fn pattern_parsing() {
        assert!(Pattern::parse("p").is_ok());
        assert!(Pattern::parse("document/p").is_ok());
        assert!(Pattern::parse("/").is_ok());
        assert!(Pattern::parse("/*").is_ok());
        assert!(Pattern::parse("p|b").is_ok());
        assert!(Pattern::parse("text()").is_ok());
        assert!(Pattern::parse("p//b").is_err());
        assert!(Pattern::parse("@id").is_err());
    }

    #[test]
    fn simple_name_match() {
        let doc = Document::parse(DOC).unwrap();
        let pattern = Pattern::parse("b").unwrap();
        assert!(pattern.matches(node_named(&doc, "b"), doc.root()));
        assert!(!pattern.matches(node_named(&doc, "p"), doc.root()));
    }

    #[test]
    fn path_and_union_match() {
        let doc = Document::parse(DOC).unwrap();
        let pattern = Pattern::parse("p/b").unwrap();
        assert!(pattern.matches(node_named(&doc, "b"), doc.root()));

        let union = Pattern::parse("missing|b").unwrap();
        assert!(union.matches(node_named(&doc, "b"), doc.root()));
    }

    #[test]
    fn absolute_match() {
        let doc = Document::parse(DOC).unwrap();
        let root_pattern = Pattern::parse("/").unwrap();
        assert!(root_pattern.matches(doc.root(), doc.root()));
        assert!(!root_pattern.matches(node_named(&doc, "p"), doc.root()));

        let absolute = Pattern::parse("/document/p").unwrap();
        assert!(absolute.matches(node_named(&doc, "p"), doc.root()));
        assert!(!absolute.matches(node_named(&doc, "b"), doc.root()));
    }

    #[test]
    fn text_match() {
        let doc = Document::parse(DOC).unwrap();
        let text_node = doc.descendants().find(|n| n.is_text()).unwrap();
        let pattern = Pattern::parse("text()").unwrap();
        assert!(pattern.matches(text_node, doc.root()));
    }
}
