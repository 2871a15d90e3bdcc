//! HTML tokenization and tree building.
//!
//! This is a small, forgiving tree builder: start tags open elements, end
//! tags close the nearest matching open element, stray end tags are dropped.
//! It does not implement the HTML5 insertion-mode machinery (no implied
//! `<html>`/`<body>`, no auto-closing of `<p>`), which is enough for the
//! well-formed markup the enlarger reads and writes.

mod entities;

pub use entities::decode_entities;

use jfe_core::EnlargeResult;
use jfe_dom::Document;
use jfe_dom::Element;
use jfe_dom::NodeId;
use jfe_dom::TextMode;
use jfe_dom::is_void_element;
use jfe_dom::text_mode;
use std::borrow::Cow;

/// Parses raw HTML into DOM nodes.
#[derive(Debug, Default)]
pub struct HtmlParser;

impl HtmlParser {
    /// Parses a whole document. Top-level nodes become children of the
    /// document root.
    pub fn parse(&self, input: &str) -> EnlargeResult<Document> {
        let mut doc = Document::new();
        let root = doc.root();
        let mut builder = TreeBuilder::new(&mut doc, Some(root));
        builder.run(input)?;
        Ok(doc)
    }

    /// Parses a markup fragment into new, detached nodes of `doc`, returned
    /// in source order.
    pub fn parse_fragment(&self, doc: &mut Document, input: &str) -> EnlargeResult<Vec<NodeId>> {
        let mut builder = TreeBuilder::new(doc, None);
        builder.run(input)?;
        Ok(builder.top_level)
    }
}

/// Replaces the children of `target` with the nodes parsed from `markup`.
///
/// Raw-text and escapable-text targets (`script`, `textarea`, ...) receive
/// `markup` as a single text node, the way their content is tokenized.
pub fn set_inner_html(doc: &mut Document, target: NodeId, markup: &str) -> EnlargeResult<()> {
    let mode = doc.tag_name(target).map_or(TextMode::Normal, text_mode);
    let text = match mode {
        TextMode::Normal => {
            let nodes = HtmlParser.parse_fragment(doc, markup)?;
            return doc.replace_children(target, nodes);
        }
        TextMode::Raw => Cow::Borrowed(markup),
        TextMode::Escapable => decode_entities(markup),
    };

    let nodes = if text.is_empty() {
        Vec::new()
    } else {
        vec![doc.create_text(text.as_ref())]
    };
    doc.replace_children(target, nodes)
}

struct TreeBuilder<'a> {
    doc: &'a mut Document,
    base: Option<NodeId>,
    open: Vec<NodeId>,
    top_level: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(doc: &'a mut Document, base: Option<NodeId>) -> Self {
        Self {
            doc,
            base,
            open: Vec::new(),
            top_level: Vec::new(),
        }
    }

    fn insert(&mut self, node: NodeId) -> EnlargeResult<()> {
        match self.open.last().copied().or(self.base) {
            Some(parent) => self.doc.append_child(parent, node),
            None => {
                self.top_level.push(node);
                Ok(())
            }
        }
    }

    fn insert_text(&mut self, text: &str) -> EnlargeResult<()> {
        if text.is_empty() {
            return Ok(());
        }
        let node = self.doc.create_text(text);
        self.insert(node)
    }

    fn close(&mut self, tag_name: &str) {
        let matching = self
            .open
            .iter()
            .rposition(|open| self.doc.tag_name(*open) == Some(tag_name));
        if let Some(position) = matching {
            self.open.truncate(position);
        }
    }

    fn run(&mut self, input: &str) -> EnlargeResult<()> {
        let bytes = input.as_bytes();
        let mut idx = 0_usize;

        while idx < bytes.len() {
            if bytes[idx] != b'<' {
                let next = find_byte(bytes, idx.saturating_add(1), b'<').unwrap_or(bytes.len());
                self.insert_text(&decode_entities(&input[idx..next]))?;
                idx = next;
                continue;
            }

            if starts_with(bytes, idx, b"<!--") {
                let (data, next) = read_comment(input, idx);
                let node = self.doc.create_comment(data);
                self.insert(node)?;
                idx = next;
                continue;
            }

            if starts_with(bytes, idx, b"<!") {
                idx = skip_to_gt(bytes, idx.saturating_add(2));
                continue;
            }

            if starts_with(bytes, idx, b"<?") {
                idx = skip_processing_instruction(bytes, idx);
                continue;
            }

            let Some((tag, next_idx)) = parse_tag(input, idx) else {
                // A lone `<` that does not open a tag is text.
                let next = find_byte(bytes, idx.saturating_add(1), b'<').unwrap_or(bytes.len());
                self.insert_text(&decode_entities(&input[idx..next]))?;
                idx = next;
                continue;
            };

            if tag.is_end {
                self.close(&tag.name);
                idx = next_idx;
                continue;
            }

            let element = self
                .doc
                .create_element(Element::with_attributes(&tag.name, tag.attributes));
            self.insert(element)?;

            let mode = text_mode(&tag.name);
            if !matches!(mode, TextMode::Normal) {
                let (raw, after) = read_raw_text_until_end_tag(input, next_idx, &tag.name);
                let text = match mode {
                    TextMode::Escapable => decode_entities(raw),
                    _ => Cow::Borrowed(raw),
                };
                if !text.is_empty() {
                    let node = self.doc.create_text(text.as_ref());
                    self.doc.append_child(element, node)?;
                }
                idx = after;
                continue;
            }

            // Self-closing syntax only matters for void elements in HTML.
            if !is_void_element(&tag.name) {
                self.open.push(element);
            }
            idx = next_idx;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    name: String,
    attributes: Vec<(String, String)>,
    is_end: bool,
}

fn parse_tag(input: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = input.as_bytes();
    if bytes.get(start).copied() != Some(b'<') {
        return None;
    }

    let mut idx = start.saturating_add(1);
    let mut is_end = false;
    if bytes.get(idx).copied() == Some(b'/') {
        is_end = true;
        idx = idx.saturating_add(1);
    }

    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }

    if idx == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }

    let name = input[name_start..idx].to_ascii_lowercase();
    let mut attributes = Vec::new();

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => break,
            Some(b'/') => {
                idx = idx.saturating_add(1);
                continue;
            }
            Some(_) => {}
        }

        let attr_start = idx;
        while idx < bytes.len()
            && !bytes[idx].is_ascii_whitespace()
            && !matches!(bytes[idx], b'=' | b'>' | b'/')
        {
            idx = idx.saturating_add(1);
        }
        if idx == attr_start {
            idx = idx.saturating_add(1);
            continue;
        }
        let attr_name = input[attr_start..idx].to_ascii_lowercase();

        idx = skip_spaces(bytes, idx);
        if bytes.get(idx).copied() != Some(b'=') {
            attributes.push((attr_name, String::new()));
            continue;
        }

        idx = skip_spaces(bytes, idx.saturating_add(1));
        let (raw_value, after_value) = match bytes.get(idx).copied() {
            Some(quote @ (b'"' | b'\'')) => {
                let value_start = idx.saturating_add(1);
                let value_end = find_byte(bytes, value_start, quote)?;
                (&input[value_start..value_end], value_end.saturating_add(1))
            }
            _ => {
                let value_start = idx;
                while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>'
                {
                    idx = idx.saturating_add(1);
                }
                (&input[value_start..idx], idx)
            }
        };
        attributes.push((attr_name, decode_entities(raw_value).into_owned()));
        idx = after_value;
    }

    Some((
        ParsedTag {
            name,
            attributes,
            is_end,
        },
        idx.saturating_add(1),
    ))
}

fn read_raw_text_until_end_tag<'a>(
    input: &'a str,
    start: usize,
    tag_name: &str,
) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx.saturating_add(1)).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx.saturating_add(2), tag_bytes)
            && tag_name_boundary(bytes, idx.saturating_add(2 + tag_bytes.len()))
        {
            if let Some((_, end_idx)) = parse_tag(input, idx) {
                return (&input[start..idx], end_idx);
            }
        }

        idx = idx.saturating_add(1);
    }

    (&input[start..], bytes.len())
}

fn read_comment(input: &str, start: usize) -> (&str, usize) {
    let data_start = start.saturating_add(4);
    match find_subslice(input.as_bytes(), data_start, b"-->") {
        Some(end) => (&input[data_start..end], end.saturating_add(3)),
        None => (input.get(data_start..).unwrap_or_default(), input.len()),
    }
}

fn skip_processing_instruction(bytes: &[u8], start: usize) -> usize {
    if let Some(end) = find_subslice(bytes, start.saturating_add(2), b"?>") {
        return end.saturating_add(2);
    }

    skip_to_gt(bytes, start.saturating_add(2))
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx.saturating_add(1);
        }
        idx = idx.saturating_add(1);
    }

    bytes.len()
}

fn tag_name_boundary(bytes: &[u8], idx: usize) -> bool {
    match bytes.get(idx).copied() {
        None => true,
        Some(byte) => byte.is_ascii_whitespace() || byte == b'>' || byte == b'/',
    }
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    if end > bytes.len() {
        return false;
    }

    bytes[idx..end]
        .iter()
        .zip(pattern.iter())
        .all(|(left, right)| left.eq_ignore_ascii_case(right))
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}
