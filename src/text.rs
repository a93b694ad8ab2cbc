//! Plain-text extraction from markup-annotated values.

/// Returns the concatenated text content of an XML fragment, markup
/// stripped, whitespace preserved. `None` means the fragment is not
/// well-formed; callers turn that into a validation error instead of
/// crashing.
///
/// Used to derive a siglum's canonical plain `name` from its tagged display
/// name before uniqueness checks and persistence.
pub fn extract_text(fragment: &str) -> Option<String> {
    let wrapped = format!("<document>{fragment}</document>");
    match roxmltree::Document::parse(&wrapped) {
        Ok(doc) => {
            let mut text = String::new();
            for node in doc.root_element().descendants().filter(|n| n.is_text()) {
                text.push_str(node.text().unwrap_or_default());
            }
            Some(text)
        }
        Err(e) => {
            log::warn!("tagged value is not well-formed XML: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markup_and_preserves_whitespace() {
        assert_eq!(
            extract_text("Hello <i>World</i>").as_deref(),
            Some("Hello World")
        );
        assert_eq!(
            extract_text("  spaced  <b>out</b>  ").as_deref(),
            Some("  spaced  out  ")
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(extract_text("Bergamo").as_deref(), Some("Bergamo"));
    }

    #[test]
    fn malformed_fragment_yields_none() {
        assert_eq!(extract_text("<unclosed"), None);
        assert_eq!(extract_text("a < b"), None);
    }

    #[test]
    fn entities_are_resolved() {
        assert_eq!(extract_text("a &amp; b").as_deref(), Some("a & b"));
    }
}
