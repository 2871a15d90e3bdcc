//! HTML fragment serialization.

use crate::Document;
use crate::NodeId;
use crate::NodeKind;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// How the content of an element is tokenized and serialized. The parser and
/// the serializer both read this table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    /// Markup: child elements, entity-decoded text.
    Normal,
    /// One literal text node, written back unescaped.
    Raw,
    /// One entity-decoded text node, written back escaped.
    Escapable,
}

pub fn text_mode(tag_name: &str) -> TextMode {
    match tag_name {
        "iframe" | "noembed" | "noframes" | "script" | "style" | "xmp" => TextMode::Raw,
        "textarea" | "title" => TextMode::Escapable,
        _ => TextMode::Normal,
    }
}

pub fn is_void_element(tag_name: &str) -> bool {
    VOID_ELEMENTS.contains(&tag_name)
}

pub(crate) fn children_markup(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for child in doc.children(id) {
        write_node(doc, *child, &mut out);
    }
    out
}

pub(crate) fn node_markup(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    let Some(kind) = doc.kind(id) else {
        return;
    };

    match kind {
        NodeKind::Document => {
            for child in doc.children(id) {
                write_node(doc, *child, out);
            }
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(element.tag_name());
            for attribute in element.attributes() {
                out.push(' ');
                out.push_str(&attribute.name);
                out.push_str("=\"");
                escape_into(&attribute.value, true, out);
                out.push('"');
            }
            out.push('>');

            if is_void_element(element.tag_name()) {
                return;
            }

            for child in doc.children(id) {
                write_node(doc, *child, out);
            }

            out.push_str("</");
            out.push_str(element.tag_name());
            out.push('>');
        }
        NodeKind::Text(text) => {
            let raw_parent = doc
                .parent(id)
                .and_then(|parent| doc.tag_name(parent))
                .is_some_and(|tag| text_mode(tag) == TextMode::Raw);
            if raw_parent {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        NodeKind::Comment(data) => {
            out.push_str("<!--");
            out.push_str(data);
            out.push_str("-->");
        }
    }
}

fn escape_into(input: &str, attribute_mode: bool, out: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute_mode => out.push_str("&quot;"),
            '<' if !attribute_mode => out.push_str("&lt;"),
            '>' if !attribute_mode => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Document;
    use crate::Element;
    use jfe_core::EnlargeResult;

    #[test]
    fn serializes_elements_text_and_void_tags() -> EnlargeResult<()> {
        let mut doc = Document::new();
        let p = doc.create_element(Element::with_attributes("p", [("title", "a \"b\"")]));
        doc.append_child(doc.root(), p)?;
        let text = doc.create_text("1 < 2 & 日本\u{a0}");
        doc.append_child(p, text)?;
        let br = doc.create_element(Element::new("br"));
        doc.append_child(p, br)?;

        assert_eq!(
            doc.outer_html(p)?,
            "<p title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 日本&nbsp;<br></p>"
        );
        assert_eq!(doc.inner_html(p)?, "1 &lt; 2 &amp; 日本&nbsp;<br>");
        Ok(())
    }

    #[test]
    fn leaves_script_text_unescaped() -> EnlargeResult<()> {
        let mut doc = Document::new();
        let script = doc.create_element(Element::new("script"));
        doc.append_child(doc.root(), script)?;
        let text = doc.create_text("if (a < b) {}");
        doc.append_child(script, text)?;
        assert_eq!(doc.inner_html(script)?, "if (a < b) {}");
        Ok(())
    }

    #[test]
    fn escapes_text_outside_raw_text_elements() -> EnlargeResult<()> {
        let mut doc = Document::new();
        for tag in ["noscript", "plaintext", "textarea"] {
            let element = doc.create_element(Element::new(tag));
            doc.append_child(doc.root(), element)?;
            let text = doc.create_text("x <b> 日本");
            doc.append_child(element, text)?;
            assert_eq!(doc.inner_html(element)?, "x &lt;b&gt; 日本", "<{tag}>");
        }
        Ok(())
    }
}
