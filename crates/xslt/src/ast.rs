//! Compiled stylesheet representation.

use crate::error::XsltError;
use crate::executor;
use crate::path::{Path, Test};
use crate::pattern::Pattern;

/// A compiled stylesheet, ready to transform documents.
#[derive(Debug, Clone)]
pub struct Stylesheet {
    pub(crate) rules: Vec<TemplateRule>,
}

impl Stylesheet {
    /// Transforms `xml_text` and serializes the result tree to a string.
    pub fn transform(&self, xml_text: &str) -> Result<String, XsltError> {
        executor::transform(self, xml_text)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TemplateRule {
    pub(crate) pattern: Pattern,
    pub(crate) body: Vec<Instruction>,
}

#[derive(Debug, Clone)]
pub(crate) enum Instruction {
    /// A literal result element with attribute value templates.
    Element {
        name: String,
        attributes: Vec<(String, AttrTemplate)>,
        children: Vec<Instruction>,
    },
    Text(String),
    ValueOf(Path),
    ApplyTemplates(Option<Path>),
    ForEach {
        select: Path,
        body: Vec<Instruction>,
    },
    If {
        test: Test,
        body: Vec<Instruction>,
    },
    Choose {
        branches: Vec<(Test, Vec<Instruction>)>,
        otherwise: Vec<Instruction>,
    },
    /// `xsl:attribute`: body evaluated as text, attached to the open element.
    Attribute {
        name: String,
        body: Vec<Instruction>,
    },
}

/// An attribute value template: literal runs interleaved with `{path}`
/// placeholders.
#[derive(Debug, Clone)]
pub(crate) struct AttrTemplate {
    pub(crate) parts: Vec<AvtPart>,
}

#[derive(Debug, Clone)]
pub(crate) enum AvtPart {
    Literal(String),
    Path(Path),
}
