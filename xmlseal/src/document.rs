// Copyright (c) 2026 The XmlSeal Authors
//
// SPDX-License-Identifier: Apache-2.0
//

//! Structural access to envelope documents.
//!
//! All reads run over `roxmltree` nodes; every lookup that the decryption
//! protocol depends on demands exactly one match and fails hard otherwise.
//! Transformation never mutates a tree: the callers splice byte ranges of
//! the original string, so a failed operation leaves the input untouched.

use roxmltree::{Document, Node};

use crate::{Error, Result};

pub(crate) fn parse(xml: &str) -> Result<Document<'_>> {
    Document::parse(xml).map_err(|e| Error::Structure(format!("XML parse failed: {e}")))
}

/// Returns the document's root element. The document node must have exactly
/// one element child; that child is adopted as the root.
pub(crate) fn document_root<'a, 'input>(doc: &'a Document<'input>) -> Result<Node<'a, 'input>> {
    let mut elements = doc.root().children().filter(Node::is_element);
    match (elements.next(), elements.next()) {
        (Some(root), None) => Ok(root),
        (None, _) => Err(Error::Structure("document has no root element".to_string())),
        (Some(_), Some(_)) => Err(Error::Structure(
            "document has multiple root elements".to_string(),
        )),
    }
}

/// Finds the single child element of `parent` with the given namespace and
/// local name. Zero or several matches is a structure error, never a
/// best-effort pick.
pub(crate) fn single_child<'a, 'input>(
    parent: Node<'a, 'input>,
    ns_uri: &str,
    local_name: &str,
) -> Result<Node<'a, 'input>> {
    let mut matches = parent.children().filter(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && n.tag_name().namespace().unwrap_or("") == ns_uri
    });
    match (matches.next(), matches.next()) {
        (Some(element), None) => Ok(element),
        (None, _) => Err(Error::Structure(format!(
            "expected exactly one {local_name} element, found 0"
        ))),
        (Some(_), Some(_)) => Err(Error::Structure(format!(
            "expected exactly one {local_name} element, found several"
        ))),
    }
}

/// Required non-blank attribute value.
pub(crate) fn required_attribute<'a>(element: Node<'a, '_>, name: &str) -> Result<&'a str> {
    element
        .attribute(name)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| {
            Error::Structure(format!(
                "missing {name} attribute on {}",
                element.tag_name().name()
            ))
        })
}

/// Required non-empty text content, trimmed.
pub(crate) fn text_content<'a>(element: Node<'a, '_>) -> Result<&'a str> {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| {
            Error::Structure(format!(
                "element {} has no text content",
                element.tag_name().name()
            ))
        })
}

/// Byte span of an element's content (everything between its tags) within
/// the source string. `None` when the element has no child nodes at all.
pub(crate) fn content_span(element: Node<'_, '_>) -> Option<(usize, usize)> {
    let first = element.children().next()?;
    let last = element.children().last()?;
    Some((first.range().start, last.range().end))
}

/// Escapes text-node content.
pub(crate) fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::ns;
    use crate::Error;

    use super::{content_span, document_root, escape_text, parse, single_child, text_content};

    const PO: &str = "<po:PurchaseOrder xmlns:po=\"urn:example:po\"><po:Item/>\
                      <po:ShippingAddress>home</po:ShippingAddress></po:PurchaseOrder>";

    #[test]
    fn root_is_found() {
        let doc = parse(PO).unwrap();
        let root = document_root(&doc).unwrap();
        assert_eq!(root.tag_name().name(), "PurchaseOrder");
    }

    #[test]
    fn content_span_covers_all_children() {
        let doc = parse(PO).unwrap();
        let root = document_root(&doc).unwrap();
        let (start, end) = content_span(root).unwrap();
        assert_eq!(
            &PO[start..end],
            "<po:Item/><po:ShippingAddress>home</po:ShippingAddress>"
        );
    }

    #[test]
    fn empty_element_has_no_content_span() {
        let doc = parse("<a/>").unwrap();
        let root = document_root(&doc).unwrap();
        assert!(content_span(root).is_none());
    }

    #[rstest]
    #[case("<r xmlns:x=\"urn:t\"></r>", 0)]
    #[case("<r xmlns:x=\"urn:t\"><x:e/><x:e/></r>", 2)]
    fn single_child_demands_cardinality_one(#[case] xml: &str, #[case] _count: usize) {
        let doc = parse(xml).unwrap();
        let root = document_root(&doc).unwrap();
        let result = single_child(root, "urn:t", "e");
        assert!(matches!(result, Err(Error::Structure(_))));
    }

    #[test]
    fn single_child_ignores_other_namespaces() {
        let xml = "<r xmlns:x=\"urn:t\" xmlns:y=\"urn:other\"><y:e/><x:e/></r>";
        let doc = parse(xml).unwrap();
        let root = document_root(&doc).unwrap();
        let found = single_child(root, "urn:t", "e").unwrap();
        assert_eq!(found.tag_name().namespace(), Some("urn:t"));
    }

    #[test]
    fn text_content_rejects_empty_elements() {
        let doc = parse("<r><a>  </a></r>").unwrap();
        let root = document_root(&doc).unwrap();
        let a = single_child(root, "", "a").unwrap();
        assert!(matches!(text_content(a), Err(Error::Structure(_))));
    }

    #[test]
    fn namespaced_envelope_lookup() {
        let xml = format!(
            "<r><xenc:EncryptedData xmlns:xenc=\"{}\"/></r>",
            ns::ENC
        );
        let doc = parse(&xml).unwrap();
        let root = document_root(&doc).unwrap();
        assert!(single_child(root, ns::ENC, ns::node::ENCRYPTED_DATA).is_ok());
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(escape_text("a&b<c>d"), "a&amp;b&lt;c&gt;d");
    }
}
