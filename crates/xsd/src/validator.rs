//! Validates instance documents against a compiled [`Schema`].
//!
//! All violations from one pass are collected; nothing fails fast. Content
//! models are interpreted with a greedy deterministic matcher, which is
//! exact for the deterministic models XML Schema requires.

use crate::model::{ComplexType, Content, GroupKind, Particle, Resolved, Schema};
use roxmltree::{Document, Node};
use std::collections::HashMap;

/// One schema violation, positioned in the validated text (1-based).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub line: u32,
    pub col: u32,
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}: {}", self.line, self.col, self.message)
    }
}

impl Schema {
    /// Validates a complete XML document text. A document that does not
    /// parse yields a single violation at the parser's reported position,
    /// matching how fatal errors and schema violations share one report
    /// channel.
    pub fn validate(&self, xml_text: &str) -> Vec<Violation> {
        let doc = match Document::parse(xml_text) {
            Ok(doc) => doc,
            Err(e) => {
                let pos = e.pos();
                return vec![Violation {
                    line: pos.row,
                    col: pos.col,
                    message: e.to_string(),
                }];
            }
        };

        let mut violations = Vec::new();
        let root = doc.root_element();
        let name = root.tag_name().name();

        match self.global(name) {
            Some(decl) => self.validate_element(root, &decl.content, &mut violations),
            None => violations.push(violation_at(
                root,
                format!("cannot find the declaration of element '{name}'"),
            )),
        }

        violations
    }

    fn validate_element<'s>(&'s self, node: Node, content: &'s Content, out: &mut Vec<Violation>) {
        match self.resolve(content) {
            Resolved::Text => self.validate_text_element(node, out),
            Resolved::Complex(ct) => self.validate_complex_element(node, ct, out),
        }
    }

    /// Simple content: no attributes, no child elements.
    fn validate_text_element(&self, node: Node, out: &mut Vec<Violation>) {
        let name = node.tag_name().name();

        for attr in node.attributes() {
            if attr.namespace().is_some() {
                continue;
            }
            out.push(violation_at(
                node,
                format!(
                    "attribute '{}' is not allowed on element '{name}'",
                    attr.name()
                ),
            ));
        }

        for child in node.children().filter(|c| c.is_element()) {
            out.push(violation_at(
                child,
                format!(
                    "element '{}' is not allowed here: '{name}' has text-only content",
                    child.tag_name().name()
                ),
            ));
            self.validate_unmatched(child, out);
        }
    }

    fn validate_complex_element<'s>(
        &'s self,
        node: Node,
        ct: &'s ComplexType,
        out: &mut Vec<Violation>,
    ) {
        let name = node.tag_name().name();

        for attr in node.attributes() {
            if attr.namespace().is_some() {
                continue;
            }
            match ct.attributes.iter().find(|a| a.name == attr.name()) {
                None => out.push(violation_at(
                    node,
                    format!(
                        "attribute '{}' is not allowed on element '{name}'",
                        attr.name()
                    ),
                )),
                Some(a) if a.prohibited => out.push(violation_at(
                    node,
                    format!("attribute '{}' is prohibited on element '{name}'", a.name),
                )),
                Some(_) => {}
            }
        }

        for a in &ct.attributes {
            if a.required && node.attribute(a.name.as_str()).is_none() {
                out.push(violation_at(
                    node,
                    format!("required attribute '{}' is missing on element '{name}'", a.name),
                ));
            }
        }

        if !ct.mixed {
            let has_text = node
                .children()
                .any(|c| c.is_text() && c.text().is_some_and(|t| !t.trim().is_empty()));
            if has_text {
                out.push(violation_at(
                    node,
                    format!("text is not allowed in the content of element '{name}'"),
                ));
            }
        }

        let children: Vec<Node> = node.children().filter(|c| c.is_element()).collect();
        let mut matched: Vec<(usize, &Content)> = Vec::new();
        let mut pos = 0usize;

        let satisfied = match &ct.particle {
            None => true,
            Some(particle) => self.match_occurs(particle, &children, &mut pos, &mut matched),
        };

        if !satisfied {
            match children.get(pos) {
                Some(child) => out.push(violation_at(
                    *child,
                    format!(
                        "unexpected element '{}' in the content of element '{name}'",
                        child.tag_name().name()
                    ),
                )),
                None => out.push(violation_at(
                    node,
                    format!("the content of element '{name}' is not complete"),
                )),
            }
        } else if pos < children.len() {
            let child = children[pos];
            out.push(violation_at(
                child,
                format!(
                    "element '{}' is not allowed here in the content of element '{name}'",
                    child.tag_name().name()
                ),
            ));
        }

        // Every child gets validated, matched or not, so one pass reports
        // everything it can.
        let bindings: HashMap<usize, &Content> = matched.into_iter().collect();
        for (i, child) in children.iter().enumerate() {
            match bindings.get(&i) {
                Some(content) => self.validate_element(*child, content, out),
                None => self.validate_unmatched(*child, out),
            }
        }
    }

    /// A child the content model did not bind: descend through its global
    /// declaration when one exists, otherwise stop (its subtree cannot be
    /// judged against anything).
    fn validate_unmatched(&self, node: Node, out: &mut Vec<Violation>) {
        if let Some(decl) = self.global(node.tag_name().name()) {
            self.validate_element(node, &decl.content, out);
        }
    }

    fn match_occurs<'s>(
        &'s self,
        particle: &'s Particle,
        children: &[Node],
        pos: &mut usize,
        matched: &mut Vec<(usize, &'s Content)>,
    ) -> bool {
        let (min, max) = particle.occurs();
        let mut count = 0u32;

        while max.admits(count) {
            let save_pos = *pos;
            let save_len = matched.len();
            if !self.match_once(particle, children, pos, matched) {
                *pos = save_pos;
                matched.truncate(save_len);
                break;
            }
            count += 1;
            if *pos == save_pos {
                // Vacuous occurrence; repeating it cannot consume anything.
                break;
            }
        }

        count >= min
    }

    fn match_once<'s>(
        &'s self,
        particle: &'s Particle,
        children: &[Node],
        pos: &mut usize,
        matched: &mut Vec<(usize, &'s Content)>,
    ) -> bool {
        match particle {
            Particle::Element { name, content, .. } => match children.get(*pos) {
                Some(child) if child.tag_name().name() == name => {
                    matched.push((*pos, content));
                    *pos += 1;
                    true
                }
                _ => false,
            },
            Particle::Group {
                kind: GroupKind::Sequence,
                children: parts,
                ..
            } => {
                let save_pos = *pos;
                let save_len = matched.len();
                for part in parts {
                    if !self.match_occurs(part, children, pos, matched) {
                        *pos = save_pos;
                        matched.truncate(save_len);
                        return false;
                    }
                }
                true
            }
            Particle::Group {
                kind: GroupKind::Choice,
                children: parts,
                ..
            } => {
                let mut vacuous = false;
                for part in parts {
                    let save_pos = *pos;
                    let save_len = matched.len();
                    if self.match_occurs(part, children, pos, matched) {
                        if *pos > save_pos {
                            return true;
                        }
                        vacuous = true;
                    }
                    *pos = save_pos;
                    matched.truncate(save_len);
                }
                vacuous
            }
            Particle::Group {
                kind: GroupKind::All,
                children: parts,
                ..
            } => {
                let mut seen = vec![false; parts.len()];
                loop {
                    let mut progressed = false;
                    for (i, part) in parts.iter().enumerate() {
                        if seen[i] {
                            continue;
                        }
                        let Particle::Element { name, content, .. } = part else {
                            continue;
                        };
                        if let Some(child) = children.get(*pos) {
                            if child.tag_name().name() == name {
                                matched.push((*pos, content));
                                *pos += 1;
                                seen[i] = true;
                                progressed = true;
                                break;
                            }
                        }
                    }
                    if !progressed {
                        break;
                    }
                }
                parts
                    .iter()
                    .zip(&seen)
                    .all(|(part, &s)| s || part.occurs().0 == 0)
            }
        }
    }
}

fn violation_at(node: Node, message: String) -> Violation {
    let pos = node.document().text_pos_at(node.range().start);
    Violation {
        line: pos.row,
        col: pos.col,
        message,
    }
}
