//! Simple selectors: type, class, id and universal compounds joined by
//! descendant or child combinators.
//!
//! Matching lives with the DOM-aware style resolver; this module only knows
//! the selector grammar.

/// How a compound relates to the compound on its left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

/// `(ids, classes, types)` as defined by CSS selectors level 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

/// A complex selector, stored right to left: `parts[0]` is the subject
/// compound, each following entry is an ancestor reached through the
/// combinator stored with the compound before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub parts: Vec<(CompoundSelector, Option<Combinator>)>,
}

impl Selector {
    /// Parses one selector of a selector list. Returns `None` for syntax
    /// outside the supported subset (attribute selectors, pseudo-classes,
    /// sibling combinators).
    pub fn parse(input: &str) -> Option<Self> {
        let mut left_to_right: Vec<(Option<Combinator>, CompoundSelector)> = Vec::new();
        let mut pending: Option<Combinator> = None;
        let mut rest = input.trim();

        while !rest.is_empty() {
            let first = rest.chars().next()?;
            if first.is_whitespace() {
                rest = rest.trim_start();
                if !left_to_right.is_empty() && pending.is_none() {
                    pending = Some(Combinator::Descendant);
                }
                continue;
            }
            if first == '>' {
                if left_to_right.is_empty() {
                    return None;
                }
                pending = Some(Combinator::Child);
                rest = &rest[1..];
                continue;
            }

            let end = rest
                .find(|ch: char| ch.is_whitespace() || ch == '>')
                .unwrap_or(rest.len());
            let compound = parse_compound(&rest[..end])?;
            let combinator = if left_to_right.is_empty() {
                None
            } else {
                Some(pending.take()?)
            };
            left_to_right.push((combinator, compound));
            rest = &rest[end..];
        }

        if left_to_right.is_empty() || pending.is_some() {
            return None;
        }

        // Re-pair so each compound carries the combinator towards its
        // left-hand neighbour.
        let mut parts = Vec::with_capacity(left_to_right.len());
        for (combinator, compound) in left_to_right.into_iter().rev() {
            parts.push((compound, combinator));
        }
        Some(Self { parts })
    }

    pub fn subject(&self) -> Option<&CompoundSelector> {
        self.parts.first().map(|(compound, _)| compound)
    }

    pub fn specificity(&self) -> Specificity {
        self.parts
            .iter()
            .fold(Specificity::default(), |acc, (compound, _)| {
                Specificity(
                    acc.0 + u32::from(compound.id.is_some()),
                    acc.1 + compound.classes.len() as u32,
                    acc.2 + u32::from(compound.tag.is_some()),
                )
            })
    }
}

fn parse_compound(input: &str) -> Option<CompoundSelector> {
    let mut compound = CompoundSelector::default();
    let mut rest = input;

    if let Some(after) = rest.strip_prefix('*') {
        rest = after;
    } else {
        let end = ident_end(rest);
        if end > 0 {
            compound.tag = Some(rest[..end].to_ascii_lowercase());
            rest = &rest[end..];
        }
    }

    while let Some(marker) = rest.chars().next() {
        let after_marker = &rest[marker.len_utf8()..];
        let end = ident_end(after_marker);
        if end == 0 {
            return None;
        }
        let name = after_marker[..end].to_owned();
        match marker {
            '.' => compound.classes.push(name),
            '#' if compound.id.is_none() => compound.id = Some(name),
            _ => return None,
        }
        rest = &after_marker[end..];
    }

    Some(compound)
}

fn ident_end(input: &str) -> usize {
    input
        .char_indices()
        .find(|(_, ch)| !(ch.is_alphanumeric() || *ch == '-' || *ch == '_'))
        .map(|(idx, _)| idx)
        .unwrap_or(input.len())
}
