//! Compiles XSD text into a [`Schema`].
//!
//! Constructs outside the supported subset (imports, derivation, wildcards,
//! substitution groups) are compile errors carrying the location of the
//! offending node — a schema that cannot be fully understood must never
//! silently validate as permissive.

use crate::error::{Location, XsdError};
use crate::model::{
    AttributeUse, ComplexType, Content, ElementDecl, GroupKind, Occurs, Particle, Schema,
};
use roxmltree::{Document, Node};
use std::collections::{HashMap, HashSet};

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Names collected in the first pass so references resolve regardless of
/// declaration order.
#[derive(Debug, Default)]
struct Names {
    complex: HashSet<String>,
    simple: HashSet<String>,
    elements: HashSet<String>,
}

pub fn compile(text: &str) -> Result<Schema, XsdError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();

    if xsd_name(root) != Some("schema") {
        return Err(XsdError::Malformed {
            message: format!(
                "document element is '{}', expected 'xs:schema'",
                root.tag_name().name()
            ),
            location: loc(root),
        });
    }

    let names = collect_names(root)?;

    let mut types = HashMap::new();
    let mut elements = HashMap::new();

    for child in root.children().filter(|c| c.is_element()) {
        match xsd_name(child) {
            Some("complexType") => {
                let name = require_attr(child, "name")?;
                types.insert(name, build_complex_type(child, &names)?);
            }
            Some("element") => {
                let name = require_attr(child, "name")?;
                let content = element_content(child, &names)?;
                elements.insert(name, ElementDecl { content });
            }
            _ => {}
        }
    }

    Ok(Schema { elements, types })
}

fn collect_names(root: Node) -> Result<Names, XsdError> {
    let mut names = Names::default();

    for child in root.children().filter(|c| c.is_element()) {
        match xsd_name(child) {
            Some("complexType") => {
                let name = require_attr(child, "name")?;
                if !names.complex.insert(name.clone()) {
                    return Err(XsdError::Duplicate {
                        name,
                        location: loc(child),
                    });
                }
            }
            Some("simpleType") => {
                let name = require_attr(child, "name")?;
                if !names.simple.insert(name.clone()) {
                    return Err(XsdError::Duplicate {
                        name,
                        location: loc(child),
                    });
                }
            }
            Some("element") => {
                let name = require_attr(child, "name")?;
                if !names.elements.insert(name.clone()) {
                    return Err(XsdError::Duplicate {
                        name,
                        location: loc(child),
                    });
                }
            }
            Some("annotation") => {}
            Some(other) => {
                return Err(XsdError::Unsupported {
                    construct: other.to_string(),
                    location: loc(child),
                });
            }
            None => {
                return Err(XsdError::Malformed {
                    message: format!(
                        "'{}' is not an XML Schema element",
                        child.tag_name().name()
                    ),
                    location: loc(child),
                });
            }
        }
    }

    Ok(names)
}

/// Determines an element declaration's content from its inline type or
/// `type` reference. An element without any type information validates as
/// text-only content.
fn element_content(node: Node, names: &Names) -> Result<Content, XsdError> {
    let mut inline = None;

    for child in node.children().filter(|c| c.is_element()) {
        match xsd_name(child) {
            Some("complexType") => {
                inline = Some(Content::Inline(Box::new(build_complex_type(child, names)?)));
            }
            Some("simpleType") => {
                inline = Some(Content::Text);
            }
            Some("annotation") => {}
            Some(other) => {
                return Err(XsdError::Unsupported {
                    construct: other.to_string(),
                    location: loc(child),
                });
            }
            None => {
                return Err(XsdError::Malformed {
                    message: format!(
                        "'{}' is not an XML Schema element",
                        child.tag_name().name()
                    ),
                    location: loc(child),
                });
            }
        }
    }

    if let Some(content) = inline {
        return Ok(content);
    }

    match node.attribute("type") {
        Some(type_ref) => resolve_type_ref(node, type_ref, names),
        None => Ok(Content::Text),
    }
}

fn resolve_type_ref(node: Node, type_ref: &str, names: &Names) -> Result<Content, XsdError> {
    let (prefix, local) = match type_ref.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, type_ref),
    };

    if node.lookup_namespace_uri(prefix) == Some(XSD_NS) {
        // Built-in simple types all validate as text.
        return Ok(Content::Text);
    }

    if names.complex.contains(local) {
        Ok(Content::Named(local.to_string()))
    } else if names.simple.contains(local) {
        Ok(Content::Text)
    } else {
        Err(XsdError::UnresolvedReference {
            reference: type_ref.to_string(),
            location: loc(node),
        })
    }
}

fn build_complex_type(node: Node, names: &Names) -> Result<ComplexType, XsdError> {
    let mixed = node
        .attribute("mixed")
        .is_some_and(|v| v == "true" || v == "1");
    let mut attributes = Vec::new();
    let mut particle = None;

    for child in node.children().filter(|c| c.is_element()) {
        match xsd_name(child) {
            Some("attribute") => attributes.push(build_attribute(child)?),
            Some("sequence") | Some("choice") | Some("all") => {
                if particle.is_some() {
                    return Err(XsdError::Malformed {
                        message: "complex type has more than one model group".to_string(),
                        location: loc(child),
                    });
                }
                particle = Some(build_group(child, names)?);
            }
            Some("annotation") => {}
            Some(other) => {
                return Err(XsdError::Unsupported {
                    construct: other.to_string(),
                    location: loc(child),
                });
            }
            None => {
                return Err(XsdError::Malformed {
                    message: format!(
                        "'{}' is not an XML Schema element",
                        child.tag_name().name()
                    ),
                    location: loc(child),
                });
            }
        }
    }

    Ok(ComplexType {
        mixed,
        attributes,
        particle,
    })
}

fn build_attribute(node: Node) -> Result<AttributeUse, XsdError> {
    let name = require_attr(node, "name")?;
    let use_attr = node.attribute("use").unwrap_or("optional");

    Ok(AttributeUse {
        name,
        required: use_attr == "required",
        prohibited: use_attr == "prohibited",
    })
}

fn build_group(node: Node, names: &Names) -> Result<Particle, XsdError> {
    let kind = match xsd_name(node) {
        Some("sequence") => GroupKind::Sequence,
        Some("choice") => GroupKind::Choice,
        _ => GroupKind::All,
    };
    let (min, max) = parse_occurs(node)?;
    let mut children = Vec::new();

    for child in node.children().filter(|c| c.is_element()) {
        match xsd_name(child) {
            Some("element") => children.push(build_particle_element(child, names)?),
            Some("sequence") | Some("choice") | Some("all") => {
                if kind == GroupKind::All {
                    return Err(XsdError::Malformed {
                        message: "xs:all may only contain element particles".to_string(),
                        location: loc(child),
                    });
                }
                children.push(build_group(child, names)?);
            }
            Some("annotation") => {}
            Some(other) => {
                return Err(XsdError::Unsupported {
                    construct: other.to_string(),
                    location: loc(child),
                });
            }
            None => {
                return Err(XsdError::Malformed {
                    message: format!(
                        "'{}' is not an XML Schema element",
                        child.tag_name().name()
                    ),
                    location: loc(child),
                });
            }
        }
    }

    Ok(Particle::Group {
        kind,
        children,
        min,
        max,
    })
}

fn build_particle_element(node: Node, names: &Names) -> Result<Particle, XsdError> {
    let (min, max) = parse_occurs(node)?;

    if let Some(reference) = node.attribute("ref") {
        if !names.elements.contains(reference) {
            return Err(XsdError::UnresolvedReference {
                reference: reference.to_string(),
                location: loc(node),
            });
        }
        return Ok(Particle::Element {
            name: reference.to_string(),
            content: Content::GlobalRef(reference.to_string()),
            min,
            max,
        });
    }

    let name = require_attr(node, "name")?;
    let content = element_content(node, names)?;

    Ok(Particle::Element {
        name,
        content,
        min,
        max,
    })
}

fn parse_occurs(node: Node) -> Result<(u32, Occurs), XsdError> {
    let min = match node.attribute("minOccurs") {
        None => 1,
        Some(v) => v.parse::<u32>().map_err(|_| XsdError::Malformed {
            message: format!("invalid minOccurs value '{v}'"),
            location: loc(node),
        })?,
    };
    let max = match node.attribute("maxOccurs") {
        None => Occurs::Bounded(1),
        Some("unbounded") => Occurs::Unbounded,
        Some(v) => Occurs::Bounded(v.parse::<u32>().map_err(|_| XsdError::Malformed {
            message: format!("invalid maxOccurs value '{v}'"),
            location: loc(node),
        })?),
    };

    Ok((min, max))
}

fn require_attr(node: Node, attr: &str) -> Result<String, XsdError> {
    node.attribute(attr)
        .map(str::to_string)
        .ok_or_else(|| XsdError::Malformed {
            message: format!(
                "'xs:{}' is missing its '{attr}' attribute",
                node.tag_name().name()
            ),
            location: loc(node),
        })
}

fn xsd_name<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    let tag = node.tag_name();
    (tag.namespace() == Some(XSD_NS)).then(|| tag.name())
}

fn loc(node: Node) -> Location {
    node.document().text_pos_at(node.range().start).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKUP_SCHEMA: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" elementFormDefault="qualified">
    <xs:element name="document" type="documentType"/>
    <xs:complexType name="documentType" mixed="true">
        <xs:choice minOccurs="0" maxOccurs="unbounded">
            <xs:element name="b" type="xs:string"/>
            <xs:element name="i" type="xs:string"/>
            <xs:element name="ref">
                <xs:complexType>
                    <xs:attribute name="target" use="required"/>
                </xs:complexType>
            </xs:element>
        </xs:choice>
    </xs:complexType>
</xs:schema>"#;

    #[test]
    fn compiles_markup_schema() {
        let schema = compile(MARKUP_SCHEMA).unwrap();
        assert!(schema.global("document").is_some());
        assert!(schema.global("b").is_none());
    }

    #[test]
    fn compiles_empty_schema() {
        let text = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" elementFormDefault="qualified" attributeFormDefault="unqualified">

</xs:schema>"#;
        let schema = compile(text).unwrap();
        assert_eq!(schema.element_names().count(), 0);
    }

    #[test]
    fn rejects_non_schema_document_element() {
        let err = compile("<html/>").unwrap_err();
        assert!(matches!(err, XsdError::Malformed { .. }));
    }

    #[test]
    fn rejects_unsupported_constructs() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:import namespace="urn:other"/>
</xs:schema>"#;
        let err = compile(text).unwrap_err();
        match err {
            XsdError::Unsupported { construct, location } => {
                assert_eq!(construct, "import");
                assert_eq!(location.line, 2);
            }
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unresolved_type_reference() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="document" type="missingType"/>
</xs:schema>"#;
        let err = compile(text).unwrap_err();
        assert!(matches!(err, XsdError::UnresolvedReference { .. }));
    }

    #[test]
    fn rejects_duplicate_global_elements() {
        let text = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="document"/>
    <xs:element name="document"/>
</xs:schema>"#;
        let err = compile(text).unwrap_err();
        assert!(matches!(err, XsdError::Duplicate { .. }));
    }

    #[test]
    fn parse_error_carries_position() {
        let err = compile("<xs:schema").unwrap_err();
        assert!(err.location().is_some());
    }
}
