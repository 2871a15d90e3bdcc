//! Inline `style` attribute model.

use crate::Declaration;
use crate::parse_declarations;

/// Declarations of a `style` attribute, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InlineStyle {
    declarations: Vec<Declaration>,
}

impl InlineStyle {
    pub fn parse(attribute: &str) -> Self {
        let mut style = Self::default();
        // Later duplicates override earlier ones, as in the CSSOM.
        for declaration in parse_declarations(attribute) {
            style.set(&declaration.name, &declaration.value, declaration.important);
        }
        style
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    pub fn get(&self, name: &str) -> Option<&Declaration> {
        self.declarations
            .iter()
            .find(|declaration| declaration.name.eq_ignore_ascii_case(name))
    }

    /// Sets or replaces a property in place, keeping its position.
    pub fn set(&mut self, name: &str, value: &str, important: bool) {
        let declaration = Declaration::new(name, value, important);
        match self
            .declarations
            .iter_mut()
            .find(|existing| existing.name == declaration.name)
        {
            Some(existing) => *existing = declaration,
            None => self.declarations.push(declaration),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.declarations.len();
        self.declarations
            .retain(|declaration| !declaration.name.eq_ignore_ascii_case(name));
        before != self.declarations.len()
    }

    /// Serializes back to attribute text: `a: b; c: d !important;`.
    pub fn to_css_text(&self) -> String {
        self.declarations
            .iter()
            .map(|declaration| {
                if declaration.important {
                    format!("{}: {} !important;", declaration.name, declaration.value)
                } else {
                    format!("{}: {};", declaration.name, declaration.value)
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
