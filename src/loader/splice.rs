//! The splice step: materialize a fragment at its inclusion point.
//!
//! Everything here is synchronous. A caller holding the document borrow runs
//! a whole splice without yielding, so splices for different inclusion points
//! never interleave their mutations.

use crate::dom::{Document, NodeId};

use super::script::{execution_region, extract_scripts, synthesize, ScriptDescriptor};

/// Scripts taken from one fragment, re-created in the execution region.
#[derive(Debug, Clone)]
pub struct QueuedScript {
    pub descriptor: ScriptDescriptor,
    /// The fresh element appended to the execution region.
    pub element: NodeId,
}

/// Replace the content of `point` with `payload`, hoist its scripts into the
/// execution region and consume the inclusion marker.
///
/// Returns the execution queue in fragment order.
pub fn splice_fragment(
    document: &mut Document,
    point: NodeId,
    payload: &str,
    attribute: &str,
) -> Vec<QueuedScript> {
    let context = document.tag_name(point).unwrap_or("body").to_string();
    let nodes = document.parse_fragment(payload, &context);
    document.replace_children(point, &nodes);
    document.mark_fragment_root(point);

    let descriptors = extract_scripts(document, point);

    let region = execution_region(document);
    let queue = descriptors
        .into_iter()
        .map(|descriptor| {
            let element = synthesize(document, &descriptor);
            document.append_child(region, element);
            QueuedScript {
                descriptor,
                element,
            }
        })
        .collect();

    document.remove_attr(point, attribute);
    queue
}

/// Replace the content of `point` with a visible failure marker and consume
/// the inclusion marker so the point is not retried.
pub fn mark_failed(
    document: &mut Document,
    point: NodeId,
    source: &str,
    attribute: &str,
    marker_style: &str,
) {
    let marker = document.create_element("p");
    if !marker_style.is_empty() {
        document.set_attr(marker, "style", marker_style);
    }
    document.set_text_content(marker, &format!("Failed to load: {}", source));
    document.replace_children(point, &[marker]);
    document.remove_attr(point, attribute);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> (Document, NodeId) {
        let doc = Document::parse(
            r#"<html><head><title>t</title></head><body><div id="inc" data-include="/parts/header.html">placeholder</div></body></html>"#,
        );
        let point = doc.get_element_by_id("inc").unwrap();
        (doc, point)
    }

    #[test]
    fn test_splice_replaces_content_and_consumes_marker() {
        let (mut doc, point) = page();
        let queue = splice_fragment(
            &mut doc,
            point,
            r#"<span id="x">hi</span><script>window.__order=(window.__order||[]).concat(1)</script>"#,
            "data-include",
        );

        assert_eq!(doc.inner_html(point), r#"<span id="x">hi</span>"#);
        assert!(!doc.has_attr(point, "data-include"));
        let x = doc.get_element_by_id("x").unwrap();
        assert_eq!(doc.text_content(x), "hi");

        assert_eq!(queue.len(), 1);
        let head = doc.head().unwrap();
        assert_eq!(doc.parent(queue[0].element), Some(head));
        assert_eq!(
            doc.inner_html(head),
            "<title>t</title><script>window.__order=(window.__order||[]).concat(1)</script>"
        );
    }

    #[test]
    fn test_splice_keeps_script_order_in_region() {
        let (mut doc, point) = page();
        let queue = splice_fragment(
            &mut doc,
            point,
            r#"<script>a()</script><script src="/b.js"></script><p><script>c()</script></p>"#,
            "data-include",
        );
        let head = doc.head().unwrap();
        let in_head: Vec<NodeId> = doc.select_by_tag(head, "script");
        let queued: Vec<NodeId> = queue.iter().map(|q| q.element).collect();
        assert_eq!(in_head, queued);
        assert_eq!(queue[1].descriptor.source_url(), Some("/b.js"));
        assert_eq!(doc.inner_html(point), "<p></p>");
    }

    #[test]
    fn test_splice_parses_in_point_context() {
        let mut doc = Document::parse(
            r#"<table><tbody id="t" data-include="/rows.html"></tbody></table>"#,
        );
        let point = doc.get_element_by_id("t").unwrap();
        splice_fragment(&mut doc, point, "<tr><td>x</td></tr>", "data-include");
        assert_eq!(doc.inner_html(point), "<tr><td>x</td></tr>");
    }

    #[test]
    fn test_template_scripts_stay_inert() {
        let (mut doc, point) = page();
        let queue = splice_fragment(
            &mut doc,
            point,
            r#"<template id="tpl"><script>inert()</script><b>row</b></template><script>live()</script>"#,
            "data-include",
        );
        let bodies: Vec<&str> = queue
            .iter()
            .filter_map(|q| q.descriptor.inline_body())
            .collect();
        assert_eq!(bodies, vec!["live()"]);
        let tpl = doc.children(point)[0];
        assert_eq!(
            doc.outer_html(tpl),
            "<template id=\"tpl\"><script>inert()</script><b>row</b></template>"
        );
    }

    #[test]
    fn test_nested_include_directive_is_not_followed() {
        let (mut doc, point) = page();
        splice_fragment(
            &mut doc,
            point,
            r#"<div data-include="/parts/inner.html"></div>"#,
            "data-include",
        );
        // Spliced verbatim; discovery skips it because it sits in a fragment
        let nested = doc.select_by_attribute("data-include");
        assert_eq!(nested.len(), 1);
        assert!(doc.is_inside_fragment(nested[0]));
    }

    #[test]
    fn test_mark_failed() {
        let (mut doc, point) = page();
        mark_failed(&mut doc, point, "/parts/broken.html", "data-include", "color:red;");
        assert_eq!(
            doc.inner_html(point),
            r#"<p style="color:red;">Failed to load: /parts/broken.html</p>"#
        );
        assert!(!doc.has_attr(point, "data-include"));
    }

    #[test]
    fn test_mark_failed_escapes_source() {
        let (mut doc, point) = page();
        mark_failed(&mut doc, point, "/x.html?a=<b>", "data-include", "");
        assert_eq!(
            doc.inner_html(point),
            "<p>Failed to load: /x.html?a=&lt;b&gt;</p>"
        );
    }
}
