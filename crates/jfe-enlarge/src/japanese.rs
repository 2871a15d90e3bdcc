//! Japanese code point ranges and run wrapping.

use std::borrow::Cow;

/// Inclusive code point ranges counted as Japanese: CJK symbols and
/// punctuation, hiragana, katakana, halfwidth/fullwidth forms, CJK unified
/// ideographs (common block) and extension A.
pub const JAPANESE_RANGES: [(u32, u32); 6] = [
    (0x3000, 0x303F),
    (0x3040, 0x309F),
    (0x30A0, 0x30FF),
    (0xFF00, 0xFFEF),
    (0x4E00, 0x9FAF),
    (0x3400, 0x4DBF),
];

pub fn is_japanese(ch: char) -> bool {
    let code = u32::from(ch);
    JAPANESE_RANGES
        .iter()
        .any(|(start, end)| (*start..=*end).contains(&code))
}

pub fn contains_japanese(text: &str) -> bool {
    text.chars().any(is_japanese)
}

/// Byte ranges of the maximal Japanese runs in `text`.
pub fn japanese_runs(text: &str) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, ch) in text.char_indices() {
        match (is_japanese(ch), open) {
            (true, None) => open = Some(idx),
            (false, Some(start)) => {
                runs.push((start, idx));
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        runs.push((start, text.len()));
    }
    runs
}

/// Wraps every maximal Japanese run of `markup` in a span pinned to
/// `font_size_px`. Returns the input untouched when it has no run.
pub fn wrap_japanese_runs(markup: &str, font_size_px: u32) -> Cow<'_, str> {
    let runs = japanese_runs(markup);
    if runs.is_empty() {
        return Cow::Borrowed(markup);
    }

    let open_tag = format!(
        "<span style=\"font-size: {font_size_px}px !important; line-height: normal !important;\">"
    );
    let mut out = String::with_capacity(markup.len() + runs.len() * (open_tag.len() + 7));
    let mut cursor = 0_usize;
    for (start, end) in runs {
        out.push_str(&markup[cursor..start]);
        out.push_str(&open_tag);
        out.push_str(&markup[start..end]);
        out.push_str("</span>");
        cursor = end;
    }
    out.push_str(&markup[cursor..]);
    Cow::Owned(out)
}
