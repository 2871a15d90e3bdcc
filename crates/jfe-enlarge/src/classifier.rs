//! Decides where the tree walk must stop.

use jfe_dom::Document;
use jfe_dom::NodeId;
use serde::Deserialize;

/// Input types a user can type free text into.
const DEFAULT_TEXT_INPUT_TYPES: &[&str] = &[
    "text",
    "password",
    "number",
    "email",
    "tel",
    "url",
    "search",
    "date",
    "datetime-local",
    "month",
    "time",
    "week",
];

/// Every `type` value HTML knows; anything else falls back to `text`.
const KNOWN_INPUT_TYPES: &[&str] = &[
    "button",
    "checkbox",
    "color",
    "date",
    "datetime-local",
    "email",
    "file",
    "hidden",
    "image",
    "month",
    "number",
    "password",
    "radio",
    "range",
    "reset",
    "search",
    "submit",
    "tel",
    "text",
    "time",
    "url",
    "week",
];

const DEFAULT_IGNORED_CLASSES: &[&str] = &[
    "navbar",
    "legend",
    "single-character-grid",
    "multi-character-grid",
    "character-item",
    "radical",
    "kanji",
    "vocabulary",
    "radical-icon",
    "kanji-icon",
    "vocabulary-icon",
    "radical-highlight",
    "kanji-highlight",
    "vocabulary-highlight",
    "reading-highlight",
];

/// The page-specific lists the classifier consults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClassifierRules {
    /// Tags holding user-editable raw text.
    pub free_text_tags: Vec<String>,
    /// Classes marking chrome and glyph tiles that keep the host's sizing.
    pub ignored_classes: Vec<String>,
    pub text_input_types: Vec<String>,
}

impl Default for ClassifierRules {
    fn default() -> Self {
        Self {
            free_text_tags: vec!["textarea".to_owned()],
            ignored_classes: to_owned_list(DEFAULT_IGNORED_CLASSES),
            text_input_types: to_owned_list(DEFAULT_TEXT_INPUT_TYPES),
        }
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_owned()).collect()
}

/// Stateless classification over [`ClassifierRules`].
#[derive(Debug, Clone, Default)]
pub struct ScriptClassifier {
    rules: ClassifierRules,
}

impl ScriptClassifier {
    pub fn new(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// True when traversal must not enter `node`: a free-text tag, or an
    /// element wearing any ignored class. Non-elements are never skipped.
    pub fn should_skip(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };

        if self.is_free_text_tag(element.tag_name()) {
            return true;
        }

        element.classes().any(|class_name| {
            self.rules
                .ignored_classes
                .iter()
                .any(|ignored| ignored == class_name)
        })
    }

    /// True for an `<input>` whose effective type accepts typed text.
    pub fn is_text_input(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        if element.tag_name() != "input" {
            return false;
        }

        let declared = element
            .attribute("type")
            .map(|value| value.trim().to_ascii_lowercase())
            .unwrap_or_default();
        let effective = if KNOWN_INPUT_TYPES.contains(&declared.as_str()) {
            declared.as_str()
        } else {
            "text"
        };

        self.rules
            .text_input_types
            .iter()
            .any(|kind| kind.eq_ignore_ascii_case(effective))
    }

    /// A text input or a free-text tag such as `<textarea>`.
    pub fn is_free_text_entry(&self, doc: &Document, node: NodeId) -> bool {
        self.is_text_input(doc, node)
            || doc
                .tag_name(node)
                .is_some_and(|tag| self.is_free_text_tag(tag))
    }

    fn is_free_text_tag(&self, tag_name: &str) -> bool {
        self.rules
            .free_text_tags
            .iter()
            .any(|tag| tag.eq_ignore_ascii_case(tag_name))
    }
}

#[cfg(test)]
mod tests {
    use super::ClassifierRules;
    use super::ScriptClassifier;
    use jfe_dom::Document;
    use jfe_dom::NodeId;
    use jfe_html::HtmlParser;

    fn body_children(html: &str) -> (Document, Vec<NodeId>) {
        let doc = match HtmlParser.parse(html) {
            Ok(doc) => doc,
            Err(error) => panic!("parse failed: {error}"),
        };
        let Some(body) = doc.body() else {
            panic!("body missing");
        };
        let children = doc.children(body).to_vec();
        (doc, children)
    }

    #[test]
    fn skips_textareas_and_ignored_classes() {
        let (doc, nodes) = body_children(
            "<body><textarea>日本</textarea><div class='card kanji-icon'></div><div class='kanji-card'></div></body>",
        );
        let classifier = ScriptClassifier::default();
        assert!(classifier.should_skip(&doc, nodes[0]));
        assert!(classifier.should_skip(&doc, nodes[1]));
        assert!(!classifier.should_skip(&doc, nodes[2]));
    }

    #[test]
    fn text_nodes_are_never_skipped() {
        let (doc, nodes) = body_children("<body>日本</body>");
        assert!(!ScriptClassifier::default().should_skip(&doc, nodes[0]));
    }

    #[test]
    fn missing_or_unknown_input_type_counts_as_text() {
        let (doc, nodes) = body_children(
            "<body><input><input type='BOGUS'><input type='Email'><input type='checkbox'><input type='submit'><textarea></textarea></body>",
        );
        let classifier = ScriptClassifier::default();
        assert!(classifier.is_text_input(&doc, nodes[0]));
        assert!(classifier.is_text_input(&doc, nodes[1]));
        assert!(classifier.is_text_input(&doc, nodes[2]));
        assert!(!classifier.is_text_input(&doc, nodes[3]));
        assert!(!classifier.is_text_input(&doc, nodes[4]));
        assert!(!classifier.is_text_input(&doc, nodes[5]));
        assert!(classifier.is_free_text_entry(&doc, nodes[5]));
    }

    #[test]
    fn custom_rules_replace_the_defaults() {
        let (doc, nodes) = body_children("<body><div class='navbar'></div><div class='promo'></div></body>");
        let classifier = ScriptClassifier::new(ClassifierRules {
            ignored_classes: vec!["promo".to_owned()],
            ..ClassifierRules::default()
        });
        assert!(!classifier.should_skip(&doc, nodes[0]));
        assert!(classifier.should_skip(&doc, nodes[1]));
    }
}
