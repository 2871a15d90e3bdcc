//! Style resolution: selector matching and the `font-size` cascade.

use jfe_css::Combinator;
use jfe_css::CompoundSelector;
use jfe_css::CssParser;
use jfe_css::FontSize;
use jfe_css::InlineStyle;
use jfe_css::MEDIUM_FONT_SIZE_PX;
use jfe_css::Selector;
use jfe_css::Specificity;
use jfe_css::StyleSheet;
use jfe_dom::Document;
use jfe_dom::NodeId;

/// Answers "how large is this element's text rendered right now".
///
/// `computed_font_size` mirrors `getComputedStyle`; `current_style_font_size`
/// mirrors the legacy cascaded-style lookup some hosts expose instead. Both
/// return CSS pixels, or `None` when the host cannot tell.
pub trait FontSizeProbe {
    fn computed_font_size(&self, doc: &Document, node: NodeId) -> Option<f32>;

    fn current_style_font_size(&self, _doc: &Document, _node: NodeId) -> Option<f32> {
        None
    }
}

/// Resolves computed styles from one author stylesheet plus inline styles.
#[derive(Debug, Clone, Default)]
pub struct StyleResolver {
    sheet: StyleSheet,
}

/// Ordering key for competing declarations; the greatest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct CascadeRank {
    important: bool,
    inline: bool,
    specificity: Specificity,
    order: (usize, usize),
}

impl StyleResolver {
    pub fn new(sheet: StyleSheet) -> Self {
        Self { sheet }
    }

    pub fn from_css(source: &str) -> Self {
        Self::new(CssParser.parse(source))
    }

    pub fn stylesheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// The winning specified `font-size` for `node`, if any declaration
    /// applies to it.
    pub fn cascaded_font_size(&self, doc: &Document, node: NodeId) -> Option<FontSize> {
        let element = doc.element(node)?;
        let mut winner: Option<(CascadeRank, FontSize)> = None;
        let mut consider = |rank: CascadeRank, value: &str| {
            let Some(parsed) = FontSize::parse(value) else {
                return;
            };
            if winner.as_ref().is_none_or(|(best, _)| rank > *best) {
                winner = Some((rank, parsed));
            }
        };

        for (rule_index, rule) in self.sheet.rules.iter().enumerate() {
            let Some(specificity) = rule
                .selectors
                .iter()
                .filter(|selector| matches_selector(doc, node, selector))
                .map(Selector::specificity)
                .max()
            else {
                continue;
            };

            for (declaration_index, declaration) in rule.declarations.iter().enumerate() {
                if declaration.name == "font-size" {
                    consider(
                        CascadeRank {
                            important: declaration.important,
                            inline: false,
                            specificity,
                            order: (rule_index, declaration_index),
                        },
                        &declaration.value,
                    );
                }
            }
        }

        if let Some(style) = element.attribute("style").map(InlineStyle::parse) {
            if let Some(declaration) = style.get("font-size") {
                consider(
                    CascadeRank {
                        important: declaration.important,
                        inline: true,
                        specificity: Specificity::default(),
                        order: (usize::MAX, 0),
                    },
                    &declaration.value,
                );
            }
        }

        winner.map(|(_, value)| value)
    }

    /// Computed `font-size` in pixels. Non-element nodes report their
    /// parent element's size; nodes with no element ancestry report `None`.
    pub fn computed_font_size_px(&self, doc: &Document, node: NodeId) -> Option<f32> {
        let mut chain: Vec<NodeId> = core::iter::once(node)
            .chain(doc.ancestors(node))
            .filter(|candidate| doc.is_element(*candidate))
            .collect();
        if chain.is_empty() {
            return None;
        }
        chain.reverse();

        let mut parent_px = MEDIUM_FONT_SIZE_PX;
        let mut root_px = MEDIUM_FONT_SIZE_PX;
        for (depth, element) in chain.into_iter().enumerate() {
            let size = self
                .cascaded_font_size(doc, element)
                .map(|specified| specified.resolve(parent_px, root_px))
                .unwrap_or(parent_px);
            if depth == 0 {
                root_px = size;
            }
            parent_px = size;
        }

        Some(parent_px)
    }
}

impl FontSizeProbe for StyleResolver {
    fn computed_font_size(&self, doc: &Document, node: NodeId) -> Option<f32> {
        self.computed_font_size_px(doc, node)
    }

    /// Cascaded value only, without inheritance; absolute units only.
    fn current_style_font_size(&self, doc: &Document, node: NodeId) -> Option<f32> {
        match self.cascaded_font_size(doc, node)? {
            FontSize::Px(px) | FontSize::Keyword(px) => Some(px),
            FontSize::Pt(pt) => Some(pt * 4.0 / 3.0),
            _ => None,
        }
    }
}

pub fn matches_selector(doc: &Document, node: NodeId, selector: &Selector) -> bool {
    let Some(((subject, combinator), rest)) = selector.parts.split_first() else {
        return false;
    };
    matches_compound(doc, node, subject) && matches_ancestors(doc, node, rest, *combinator)
}

fn matches_ancestors(
    doc: &Document,
    node: NodeId,
    rest: &[(CompoundSelector, Option<Combinator>)],
    combinator: Option<Combinator>,
) -> bool {
    let Some(((compound, next_combinator), remaining)) = rest.split_first() else {
        return true;
    };

    let matches_here = |candidate: NodeId| {
        matches_compound(doc, candidate, compound)
            && matches_ancestors(doc, candidate, remaining, *next_combinator)
    };

    match combinator {
        Some(Combinator::Child) => doc
            .parent(node)
            .filter(|parent| doc.is_element(*parent))
            .is_some_and(matches_here),
        Some(Combinator::Descendant) | None => doc
            .ancestors(node)
            .filter(|ancestor| doc.is_element(*ancestor))
            .any(matches_here),
    }
}

fn matches_compound(doc: &Document, node: NodeId, compound: &CompoundSelector) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };

    if compound
        .tag
        .as_deref()
        .is_some_and(|tag| tag != element.tag_name())
    {
        return false;
    }

    if compound
        .id
        .as_deref()
        .is_some_and(|id| element.id() != Some(id))
    {
        return false;
    }

    compound
        .classes
        .iter()
        .all(|class_name| element.has_class(class_name))
}

#[cfg(test)]
mod tests {
    use super::FontSizeProbe;
    use super::StyleResolver;
    use jfe_dom::Document;
    use jfe_dom::NodeId;
    use jfe_html::HtmlParser;

    fn first_tag(doc: &Document, tag: &str) -> NodeId {
        match doc
            .descendants(doc.root())
            .find(|node| doc.tag_name(*node) == Some(tag))
        {
            Some(node) => node,
            None => panic!("no <{tag}> in document"),
        }
    }

    fn parse(html: &str) -> Document {
        match HtmlParser.parse(html) {
            Ok(doc) => doc,
            Err(error) => panic!("parse failed: {error}"),
        }
    }

    #[test]
    fn defaults_to_medium_without_rules() {
        let doc = parse("<body><p>日本</p></body>");
        let resolver = StyleResolver::default();
        let paragraph = first_tag(&doc, "p");
        assert_eq!(resolver.computed_font_size(&doc, paragraph), Some(16.0));
        let text = doc.children(paragraph)[0];
        assert_eq!(resolver.computed_font_size(&doc, text), Some(16.0));
    }

    #[test]
    fn inherits_and_resolves_relative_units() {
        let doc = parse("<html><body class='big'><div><p>日本</p></div></body></html>");
        let resolver = StyleResolver::from_css(".big { font-size: 20px } div p { font-size: 1.5em }");
        assert_eq!(
            resolver.computed_font_size(&doc, first_tag(&doc, "div")),
            Some(20.0)
        );
        assert_eq!(
            resolver.computed_font_size(&doc, first_tag(&doc, "p")),
            Some(30.0)
        );
    }

    #[test]
    fn inline_style_beats_sheet_unless_sheet_is_important() {
        let doc = parse("<body><p style='font-size: 30px'>a</p><span style='font-size: 30px'>b</span></body>");
        let resolver =
            StyleResolver::from_css("p { font-size: 12px } span { font-size: 10px !important }");
        assert_eq!(
            resolver.computed_font_size(&doc, first_tag(&doc, "p")),
            Some(30.0)
        );
        assert_eq!(
            resolver.computed_font_size(&doc, first_tag(&doc, "span")),
            Some(10.0)
        );
    }

    #[test]
    fn specificity_then_order_decides() {
        let doc = parse("<body><p id='x' class='c'>a</p></body>");
        let resolver = StyleResolver::from_css(
            "#x { font-size: 40px } p.c { font-size: 20px } p { font-size: 12px } p { font-size: 14px }",
        );
        assert_eq!(
            resolver.computed_font_size(&doc, first_tag(&doc, "p")),
            Some(40.0)
        );

        let resolver = StyleResolver::from_css("p { font-size: 12px } p { font-size: 14px }");
        assert_eq!(
            resolver.computed_font_size(&doc, first_tag(&doc, "p")),
            Some(14.0)
        );
    }

    #[test]
    fn child_combinator_requires_direct_parent() {
        let doc = parse("<body><div><section><p>a</p></section></div></body>");
        let resolver = StyleResolver::from_css("div > p { font-size: 40px }");
        assert_eq!(
            resolver.computed_font_size(&doc, first_tag(&doc, "p")),
            Some(16.0)
        );
    }

    #[test]
    fn current_style_reports_only_cascaded_absolute_sizes() {
        let doc = parse("<body><div style='font-size: 2em'><p style='font-size: 12pt'>a</p></div></body>");
        let resolver = StyleResolver::default();
        assert_eq!(
            resolver.current_style_font_size(&doc, first_tag(&doc, "div")),
            None
        );
        assert_eq!(
            resolver.current_style_font_size(&doc, first_tag(&doc, "p")),
            Some(16.0)
        );
    }
}
