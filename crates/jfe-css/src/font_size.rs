//! `font-size` value parsing and resolution.

/// The initial `font-size` (`medium`) in CSS pixels.
pub const MEDIUM_FONT_SIZE_PX: f32 = 16.0;

const KEYWORD_SIZES: &[(&str, f32)] = &[
    ("xx-small", 9.0),
    ("x-small", 10.0),
    ("small", 13.0),
    ("medium", 16.0),
    ("large", 18.0),
    ("x-large", 24.0),
    ("xx-large", 32.0),
    ("xxx-large", 48.0),
];

const RELATIVE_STEP: f32 = 1.2;

/// A specified `font-size` value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    Px(f32),
    Pt(f32),
    Em(f32),
    Rem(f32),
    Percent(f32),
    Keyword(f32),
    Smaller,
    Larger,
    Inherit,
}

impl FontSize {
    /// Parses a specified value. Unsupported units and garbage yield `None`,
    /// which callers treat as "declaration ignored".
    pub fn parse(input: &str) -> Option<Self> {
        let value = input.trim().to_ascii_lowercase();
        if value.is_empty() {
            return None;
        }

        match value.as_str() {
            "inherit" | "unset" => return Some(Self::Inherit),
            "initial" => return Some(Self::Keyword(MEDIUM_FONT_SIZE_PX)),
            "smaller" => return Some(Self::Smaller),
            "larger" => return Some(Self::Larger),
            _ => {}
        }

        if let Some((_, px)) = KEYWORD_SIZES.iter().find(|(name, _)| *name == value) {
            return Some(Self::Keyword(*px));
        }

        let (number, unit) = split_number(&value)?;
        if number < 0.0 {
            return None;
        }

        match unit {
            "px" => Some(Self::Px(number)),
            "pt" => Some(Self::Pt(number)),
            "em" => Some(Self::Em(number)),
            "rem" => Some(Self::Rem(number)),
            "%" => Some(Self::Percent(number)),
            "" if number == 0.0 => Some(Self::Px(0.0)),
            _ => None,
        }
    }

    /// Resolves to CSS pixels given the parent's and the root element's
    /// computed sizes.
    pub fn resolve(self, parent_px: f32, root_px: f32) -> f32 {
        match self {
            Self::Px(px) | Self::Keyword(px) => px,
            Self::Pt(pt) => pt * 4.0 / 3.0,
            Self::Em(em) => em * parent_px,
            Self::Rem(rem) => rem * root_px,
            Self::Percent(percent) => percent / 100.0 * parent_px,
            Self::Smaller => parent_px / RELATIVE_STEP,
            Self::Larger => parent_px * RELATIVE_STEP,
            Self::Inherit => parent_px,
        }
    }
}

fn split_number(value: &str) -> Option<(f32, &str)> {
    let unit_start = value
        .char_indices()
        .find(|(_, ch)| !(ch.is_ascii_digit() || *ch == '.' || *ch == '-' || *ch == '+'))
        .map(|(idx, _)| idx)
        .unwrap_or(value.len());
    let number = value[..unit_start].parse::<f32>().ok()?;
    number.is_finite().then_some((number, &value[unit_start..]))
}

#[cfg(test)]
mod tests {
    use super::FontSize;

    #[test]
    fn parses_absolute_and_relative_units() {
        assert_eq!(FontSize::parse("28px"), Some(FontSize::Px(28.0)));
        assert_eq!(FontSize::parse(" 1.5EM "), Some(FontSize::Em(1.5)));
        assert_eq!(FontSize::parse("large"), Some(FontSize::Keyword(18.0)));
        assert_eq!(FontSize::parse("150%"), Some(FontSize::Percent(150.0)));
        assert_eq!(FontSize::parse("12vw"), None);
        assert_eq!(FontSize::parse("-2px"), None);
        assert_eq!(FontSize::parse("big"), None);
    }

    #[test]
    fn resolves_against_parent_and_root() {
        assert_eq!(FontSize::Em(2.0).resolve(14.0, 16.0), 28.0);
        assert_eq!(FontSize::Rem(2.0).resolve(14.0, 16.0), 32.0);
        assert_eq!(FontSize::Percent(50.0).resolve(30.0, 16.0), 15.0);
        assert_eq!(FontSize::Pt(12.0).resolve(30.0, 16.0), 16.0);
        assert_eq!(FontSize::Inherit.resolve(30.0, 16.0), 30.0);
    }
}
