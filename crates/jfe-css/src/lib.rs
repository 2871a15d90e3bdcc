//! CSS tokenization and stylesheet model.
//!
//! Covers what font-size resolution needs: rule blocks (including rules
//! nested in grouping at-rules), declarations with `!important`, simple
//! selectors, inline `style` attributes and font-size values.

mod font_size;
mod inline;
mod selector;

pub use font_size::FontSize;
pub use font_size::MEDIUM_FONT_SIZE_PX;
pub use inline::InlineStyle;
pub use selector::Combinator;
pub use selector::CompoundSelector;
pub use selector::Selector;
pub use selector::Specificity;

/// One `name: value` pair. Names are lower-cased; `!important` is split off
/// the value.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(name: &str, value: &str, important: bool) -> Self {
        Self {
            name: name.trim().to_ascii_lowercase(),
            value: value.trim().to_owned(),
            important,
        }
    }
}

/// A style rule: selector list plus declaration block.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// Style rules compiled from source CSS, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSheet {
    pub rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Parses CSS source text.
#[derive(Debug, Default)]
pub struct CssParser;

impl CssParser {
    pub fn parse(&self, input: &str) -> StyleSheet {
        let sanitized = strip_comments(input);
        let mut rules = Vec::new();
        parse_rules_recursive(&sanitized, &mut rules);
        StyleSheet { rules }
    }
}

fn parse_rules_recursive(input: &str, out: &mut Vec<StyleRule>) {
    let mut cursor = 0_usize;

    while let Some((prelude, body, next_cursor)) = next_rule_block(input, cursor) {
        cursor = next_cursor;

        let prelude = prelude.trim();
        if prelude.is_empty() {
            continue;
        }

        if prelude.starts_with('@') {
            if is_grouping_at_rule(prelude) {
                parse_rules_recursive(body, out);
            }
            continue;
        }

        // Selectors we cannot match are dropped; a list with none left is dead.
        let selectors: Vec<Selector> = split_top_level(prelude, b',')
            .into_iter()
            .filter_map(Selector::parse)
            .collect();
        let declarations = parse_declarations(body);
        if selectors.is_empty() || declarations.is_empty() {
            continue;
        }

        out.push(StyleRule {
            selectors,
            declarations,
        });
    }
}

fn next_rule_block(input: &str, from: usize) -> Option<(&str, &str, usize)> {
    let start = skip_rule_separators(input, from);
    if start >= input.len() {
        return None;
    }

    let open = find_top_level(input, start, b'{')?;
    let close = find_matching_brace(input, open)?;
    Some((&input[start..open], &input[open + 1..close], close + 1))
}

fn skip_rule_separators(input: &str, mut idx: usize) -> usize {
    let bytes = input.as_bytes();
    while idx < bytes.len() && (bytes[idx].is_ascii_whitespace() || bytes[idx] == b';') {
        idx = idx.saturating_add(1);
    }
    idx
}

fn is_grouping_at_rule(prelude: &str) -> bool {
    let lower = prelude.to_ascii_lowercase();
    ["@media", "@supports", "@layer", "@document"]
        .iter()
        .any(|keyword| lower.starts_with(keyword))
}

/// Parses a declaration block body (`a: b; c: d !important`).
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    for raw in split_top_level(input, b';') {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(colon) = find_top_level(trimmed, 0, b':') else {
            continue;
        };

        let name = collapse_whitespace(&trimmed[..colon]);
        let (value, important) = split_important(&collapse_whitespace(&trimmed[colon + 1..]));
        if name.is_empty() || value.is_empty() {
            continue;
        }

        declarations.push(Declaration::new(&name, &value, important));
    }
    declarations
}

fn split_important(value: &str) -> (String, bool) {
    if let Some(bang) = value.rfind('!') {
        if value[bang + 1..].trim().eq_ignore_ascii_case("important") {
            return (value[..bang].trim_end().to_owned(), true);
        }
    }
    (value.to_owned(), false)
}

/// Tracks quoting and bracket nesting while scanning CSS byte by byte.
#[derive(Debug, Default)]
struct Nesting {
    quote: Option<u8>,
    escape: bool,
    parens: u32,
    brackets: u32,
}

impl Nesting {
    /// Consumes `byte`; returns true when it sits outside any string,
    /// parenthesis or bracket.
    fn step(&mut self, byte: u8) -> bool {
        if let Some(quote) = self.quote {
            if self.escape {
                self.escape = false;
            } else if byte == b'\\' {
                self.escape = true;
            } else if byte == quote {
                self.quote = None;
            }
            return false;
        }

        match byte {
            b'\'' | b'"' => {
                self.quote = Some(byte);
                false
            }
            b'(' => {
                self.parens = self.parens.saturating_add(1);
                false
            }
            b')' => {
                self.parens = self.parens.saturating_sub(1);
                false
            }
            b'[' => {
                self.brackets = self.brackets.saturating_add(1);
                false
            }
            b']' => {
                self.brackets = self.brackets.saturating_sub(1);
                false
            }
            _ => self.parens == 0 && self.brackets == 0,
        }
    }

    fn in_string(&self) -> bool {
        self.quote.is_some()
    }
}

fn find_top_level(input: &str, from: usize, target: u8) -> Option<usize> {
    let mut nesting = Nesting::default();
    input
        .as_bytes()
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, byte)| nesting.step(**byte) && **byte == target)
        .map(|(idx, _)| idx)
}

fn find_matching_brace(input: &str, open_brace: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if bytes.get(open_brace).copied() != Some(b'{') {
        return None;
    }

    let mut nesting = Nesting::default();
    let mut depth = 1_u32;
    for (idx, byte) in bytes.iter().enumerate().skip(open_brace + 1) {
        if !nesting.step(*byte) {
            continue;
        }
        match byte {
            b'{' => depth = depth.saturating_add(1),
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }

    None
}

fn split_top_level(input: &str, delimiter: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut nesting = Nesting::default();
    let mut start = 0_usize;

    for (idx, byte) in input.as_bytes().iter().enumerate() {
        if nesting.step(*byte) && *byte == delimiter {
            parts.push(&input[start..idx]);
            start = idx + 1;
        }
    }

    parts.push(&input[start..]);
    parts
}

fn strip_comments(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut nesting = Nesting::default();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        if !nesting.in_string()
            && bytes[idx] == b'/'
            && bytes.get(idx.saturating_add(1)).copied() == Some(b'*')
        {
            idx = bytes[idx + 2..]
                .windows(2)
                .position(|window| window == b"*/")
                .map(|offset| idx + 2 + offset + 2)
                .unwrap_or(bytes.len());
            continue;
        }

        nesting.step(bytes[idx]);
        out.push(bytes[idx]);
        idx = idx.saturating_add(1);
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
