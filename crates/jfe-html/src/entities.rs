//! Character reference decoding.

use std::borrow::Cow;

const NAMED_REFERENCES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
];

/// Decodes `&name;`, `&#NN;` and `&#xHH;` references. Unknown or malformed
/// references are kept verbatim.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp + 1..];

        match decode_reference(candidate) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &candidate[consumed..];
            }
            None => {
                out.push('&');
                rest = candidate;
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

/// Decodes the reference following an `&`, returning the character and the
/// number of bytes consumed (including the trailing `;`).
fn decode_reference(candidate: &str) -> Option<(char, usize)> {
    let semicolon = candidate.find(';')?;
    let body = &candidate[..semicolon];

    let ch = if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        char::from_u32(code)?
    } else {
        NAMED_REFERENCES
            .iter()
            .find(|(name, _)| *name == body)
            .map(|(_, ch)| *ch)?
    };

    Some((ch, semicolon + 1))
}
