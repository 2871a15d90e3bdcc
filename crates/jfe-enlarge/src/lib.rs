//! The Japanese text enlarger.
//!
//! [`TextEnlarger::enlarge`] walks a subtree in pre-order and bumps the font
//! size of Japanese text at the leaves:
//!
//! - subtrees rooted at a free-text element or an ignored class are pruned,
//! - an element leaf whose `value` attribute holds Japanese gets an inline
//!   `font-size`,
//! - a text node that is its parent's only child has its parent's markup
//!   rewritten so each Japanese run sits in a sized `<span>`, unless the
//!   parent already renders at least that large.
//!
//! The size check makes the pass idempotent: wrapped runs live in spans that
//! already carry the target size, so a second pass with the same (or a
//! smaller) size finds nothing to do.

pub mod classifier;
pub mod japanese;

pub use classifier::ClassifierRules;
pub use classifier::ScriptClassifier;

use jfe_core::EnlargeError;
use jfe_core::EnlargeResult;
use jfe_css::InlineStyle;
use jfe_dom::Document;
use jfe_dom::NodeId;
use jfe_dom::NodeKind;
use jfe_dom::TextMode;
use jfe_dom::text_mode;
use jfe_style::FontSizeProbe;
use japanese::contains_japanese;
use japanese::japanese_runs;
use japanese::wrap_japanese_runs;

/// Counters describing one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnlargeReport {
    pub visited: usize,
    pub pruned: usize,
    pub styled_leaves: usize,
    pub already_large: usize,
    pub rewritten_parents: usize,
    pub wrapped_runs: usize,
}

impl EnlargeReport {
    /// True when the pass changed the document.
    pub fn changed(&self) -> bool {
        self.styled_leaves > 0 || self.rewritten_parents > 0
    }
}

/// Tree-walking engine; see the crate docs for the rules.
#[derive(Debug, Clone, Default)]
pub struct TextEnlarger {
    classifier: ScriptClassifier,
}

impl TextEnlarger {
    pub fn new(classifier: ScriptClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ScriptClassifier {
        &self.classifier
    }

    /// Enlarges Japanese text under `root` to `font_size_px`.
    ///
    /// Every node reachable from `root` when it is popped is visited once,
    /// parents before children, children in document order. Nodes inserted
    /// by a rewrite are not visited in the same pass.
    pub fn enlarge(
        &self,
        doc: &mut Document,
        probe: &dyn FontSizeProbe,
        root: NodeId,
        font_size_px: u32,
    ) -> EnlargeResult<EnlargeReport> {
        if !doc.contains(root) {
            return Err(EnlargeError::UnknownNode(root.index()));
        }

        let mut report = EnlargeReport::default();
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            report.visited += 1;

            if self.classifier.should_skip(doc, node) {
                report.pruned += 1;
                continue;
            }

            if doc.has_children(node) {
                stack.extend(doc.children(node).iter().rev().copied());
                continue;
            }

            match doc.kind(node) {
                Some(NodeKind::Element(_)) => {
                    if self.style_value_leaf(doc, node, font_size_px)? {
                        report.styled_leaves += 1;
                    }
                }
                Some(NodeKind::Text(_)) => {
                    match self.rewrite_text_leaf(doc, probe, node, font_size_px)? {
                        TextLeafOutcome::AlreadyLarge => report.already_large += 1,
                        TextLeafOutcome::Rewritten { runs } => {
                            report.rewritten_parents += 1;
                            report.wrapped_runs += runs;
                        }
                        TextLeafOutcome::Untouched => {}
                    }
                }
                _ => {}
            }
        }

        tracing::debug!(
            root = root.index(),
            font_size_px,
            visited = report.visited,
            pruned = report.pruned,
            styled = report.styled_leaves,
            rewritten = report.rewritten_parents,
            runs = report.wrapped_runs,
            already_large = report.already_large,
            "enlarge pass finished"
        );
        Ok(report)
    }

    /// Element leaves have no visible text, so only a Japanese `value`
    /// attribute (compact answer inputs and the like) can need sizing.
    fn style_value_leaf(
        &self,
        doc: &mut Document,
        node: NodeId,
        font_size_px: u32,
    ) -> EnlargeResult<bool> {
        let Some(element) = doc.element(node) else {
            return Ok(false);
        };
        if !element.attribute("value").is_some_and(contains_japanese) {
            return Ok(false);
        }

        let current = element.attribute("style").unwrap_or_default();
        let mut style = InlineStyle::parse(current);
        style.set("font-size", &format!("{font_size_px}px"), false);
        let css_text = style.to_css_text();
        if css_text == current {
            return Ok(false);
        }

        doc.set_attribute(node, "style", &css_text)?;
        tracing::trace!(node = node.index(), font_size_px, "styled value leaf");
        Ok(true)
    }

    fn rewrite_text_leaf(
        &self,
        doc: &mut Document,
        probe: &dyn FontSizeProbe,
        node: NodeId,
        font_size_px: u32,
    ) -> EnlargeResult<TextLeafOutcome> {
        let Some(parent) = doc.parent(node).filter(|parent| doc.is_element(*parent)) else {
            return Ok(TextLeafOutcome::Untouched);
        };
        // Script, style and other text-only elements hold no markup to wrap.
        if doc
            .tag_name(parent)
            .is_some_and(|tag| text_mode(tag) != TextMode::Normal)
        {
            return Ok(TextLeafOutcome::Untouched);
        }

        let current_px = probe
            .computed_font_size(doc, parent)
            .or_else(|| probe.current_style_font_size(doc, parent))
            .unwrap_or(0.0);
        if current_px >= font_size_px as f32 {
            return Ok(TextLeafOutcome::AlreadyLarge);
        }

        // Re-serializing a parent with mixed children could reorder or
        // duplicate sibling markup.
        if doc.children(parent).len() != 1 {
            return Ok(TextLeafOutcome::Untouched);
        }

        let markup = doc.inner_html(parent)?;
        let runs = japanese_runs(&markup).len();
        if runs == 0 {
            return Ok(TextLeafOutcome::Untouched);
        }
        let wrapped = wrap_japanese_runs(&markup, font_size_px);

        jfe_html::set_inner_html(doc, parent, &wrapped)?;
        tracing::trace!(
            parent = parent.index(),
            font_size_px,
            current_px,
            runs,
            "wrapped japanese runs"
        );
        Ok(TextLeafOutcome::Rewritten { runs })
    }
}

enum TextLeafOutcome {
    Untouched,
    AlreadyLarge,
    Rewritten { runs: usize },
}

#[cfg(test)]
mod tests {
    use super::TextEnlarger;
    use jfe_dom::Document;
    use jfe_dom::NodeId;
    use jfe_html::HtmlParser;
    use jfe_style::FontSizeProbe;
    use jfe_style::StyleResolver;

    const SPAN_28: &str =
        "<span style=\"font-size: 28px !important; line-height: normal !important;\">";

    fn parse(html: &str) -> Document {
        match HtmlParser.parse(html) {
            Ok(doc) => doc,
            Err(error) => panic!("parse failed: {error}"),
        }
    }

    fn body(doc: &Document) -> NodeId {
        match doc.body() {
            Some(body) => body,
            None => panic!("body missing"),
        }
    }

    fn run(html: &str, css: &str, size: u32) -> (Document, String) {
        let mut doc = parse(html);
        let resolver = StyleResolver::from_css(css);
        let root = body(&doc);
        if let Err(error) = TextEnlarger::default().enlarge(&mut doc, &resolver, root, size) {
            panic!("enlarge failed: {error}");
        }
        let markup = match doc.inner_html(root) {
            Ok(markup) => markup,
            Err(error) => panic!("serialize failed: {error}"),
        };
        (doc, markup)
    }

    #[test]
    fn latin_only_text_is_unchanged() {
        let (_, markup) = run("<body><p>abc</p></body>", "", 28);
        assert_eq!(markup, "<p>abc</p>");
    }

    #[test]
    fn sole_japanese_text_child_is_wrapped() {
        let (_, markup) = run("<body><p>日本語</p></body>", "", 28);
        assert_eq!(markup, format!("<p>{SPAN_28}日本語</span></p>"));
    }

    #[test]
    fn parent_already_larger_is_left_alone() {
        let (_, markup) = run("<body><p>日本語</p></body>", "p { font-size: 30px }", 28);
        assert_eq!(markup, "<p>日本語</p>");
    }

    #[test]
    fn ignored_class_prunes_the_whole_subtree() {
        let html = "<body><div class=\"navbar\"><p>日本語</p><input value=\"日本\"></div></body>";
        let (_, markup) = run(html, "", 28);
        assert_eq!(
            markup,
            "<div class=\"navbar\"><p>日本語</p><input value=\"日本\"></div>"
        );
    }

    #[test]
    fn textarea_contents_are_never_touched() {
        let (_, markup) = run("<body><textarea>日本語</textarea></body>", "", 28);
        assert_eq!(markup, "<textarea>日本語</textarea>");
    }

    #[test]
    fn text_only_elements_keep_their_content() {
        let html = "<body><script>if (a<b) { s = \"日本\"; }</script>\
                    <style>p::after { content: \"<日本>\"; }</style>\
                    <noscript>x &lt;b&gt; 日本</noscript></body>";
        let (doc, markup) = run(html, "", 28);
        assert_eq!(
            markup,
            format!(
                "<script>if (a<b) {{ s = \"日本\"; }}</script>\
                 <style>p::after {{ content: \"<日本>\"; }}</style>\
                 <noscript>x &lt;b&gt; {SPAN_28}日本</span></noscript>"
            )
        );
        let children = doc.children(body(&doc));
        assert_eq!(doc.children(children[0]).len(), 1);
        assert_eq!(doc.text_content(children[0]), "if (a<b) { s = \"日本\"; }");
        assert_eq!(doc.children(children[2]).len(), 2);
        assert_eq!(doc.text_content(children[2]), "x <b> 日本");
    }

    #[test]
    fn mixed_children_are_not_rewritten() {
        let (_, markup) = run("<body><p>日本<b>語</b></p></body>", "", 28);
        assert_eq!(markup, format!("<p>日本<b>{SPAN_28}語</span></b></p>"));
    }

    #[test]
    fn non_japanese_character_splits_spans() {
        let mut doc = parse("<body><p>日本a語</p></body>");
        let root = body(&doc);
        let report = TextEnlarger::default().enlarge(&mut doc, &StyleResolver::default(), root, 28);
        assert!(report.is_ok_and(|report| report.wrapped_runs == 2 && report.rewritten_parents == 1));
        let markup = doc.inner_html(root).unwrap_or_default();
        assert_eq!(
            markup,
            format!("<p>{SPAN_28}日本</span>a{SPAN_28}語</span></p>")
        );
    }

    #[test]
    fn value_leaf_gets_inline_font_size() {
        let (_, markup) = run(
            "<body><input value=\"答え\"><input value=\"answer\"><input></body>",
            "",
            28,
        );
        assert_eq!(
            markup,
            "<input value=\"答え\" style=\"font-size: 28px;\"><input value=\"answer\"><input>"
        );
    }

    #[test]
    fn second_pass_with_same_or_smaller_size_is_a_no_op() {
        let (mut doc, first) = run("<body><p>日本語 and かな</p><div>漢字</div></body>", "", 28);
        let resolver = StyleResolver::default();
        let root = body(&doc);
        let enlarger = TextEnlarger::default();

        for size in [28, 20] {
            let report = match enlarger.enlarge(&mut doc, &resolver, root, size) {
                Ok(report) => report,
                Err(error) => panic!("enlarge failed: {error}"),
            };
            assert!(!report.changed());
            assert_eq!(doc.inner_html(root).ok().as_deref(), Some(first.as_str()));
        }
    }

    #[test]
    fn larger_size_wraps_again_inside_existing_spans() {
        let (mut doc, _) = run("<body><p>日本</p></body>", "", 28);
        let root = body(&doc);
        let report = TextEnlarger::default().enlarge(&mut doc, &StyleResolver::default(), root, 56);
        assert!(report.is_ok_and(|report| report.rewritten_parents == 1));
        let markup = doc.inner_html(root).unwrap_or_default();
        assert!(markup.contains("font-size: 56px !important"));
        assert!(markup.contains("font-size: 28px !important"));
    }

    #[test]
    fn unknown_font_size_still_rewrites() {
        struct Blind;
        impl FontSizeProbe for Blind {
            fn computed_font_size(&self, _: &Document, _: NodeId) -> Option<f32> {
                None
            }
        }

        let mut doc = parse("<body><p>日本</p></body>");
        let root = body(&doc);
        let report = TextEnlarger::default().enlarge(&mut doc, &Blind, root, 28);
        assert!(report.is_ok_and(|report| report.rewritten_parents == 1));
    }

    #[test]
    fn legacy_probe_is_consulted_when_computed_is_missing() {
        struct LegacyOnly;
        impl FontSizeProbe for LegacyOnly {
            fn computed_font_size(&self, _: &Document, _: NodeId) -> Option<f32> {
                None
            }

            fn current_style_font_size(&self, _: &Document, _: NodeId) -> Option<f32> {
                Some(40.0)
            }
        }

        let mut doc = parse("<body><p>日本</p></body>");
        let root = body(&doc);
        let report = TextEnlarger::default().enlarge(&mut doc, &LegacyOnly, root, 28);
        assert!(report.is_ok_and(|report| report.already_large == 1 && !report.changed()));
    }

    #[test]
    fn unknown_root_is_an_error() {
        let mut doc = parse("<body></body>");
        let other = parse("<body><p>a</p><p>b</p></body>");
        let Some(foreign) = other.node_id(other.node_count() - 1) else {
            panic!("foreign node missing");
        };
        let result = TextEnlarger::default().enlarge(&mut doc, &StyleResolver::default(), foreign, 28);
        assert!(result.is_err_and(|error| error.code() == "dom.unknown_node"));
    }
}
