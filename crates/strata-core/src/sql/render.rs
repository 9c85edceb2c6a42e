//! Rendering blocks to Postgres query text.

use super::block::{Atom, Block};
use super::value::SqlValue;

/// Turns a [`Block`] into query text with `$n` placeholders.
///
/// Raw atoms are joined with single spaces. Each parameter atom takes the
/// next placeholder number, starting at `$1`, and its value is collected in
/// the same order.
#[derive(Debug, Default)]
pub struct Renderer {
    parts: Vec<String>,
    params: Vec<SqlValue>,
}

impl Renderer {
    /// Creates an empty renderer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders a block, its own wrap included.
    #[must_use]
    pub fn render(mut self, block: &Block) -> (String, Vec<SqlValue>) {
        if block.is_wrapped() {
            self.parts.push(String::from("("));
        }
        for atom in block.atoms() {
            self.atom(atom);
        }
        if block.is_wrapped() {
            self.parts.push(String::from(")"));
        }
        (self.parts.join(" "), self.params)
    }

    fn atom(&mut self, atom: &Atom) {
        match atom {
            Atom::Raw(text) => self.parts.push(text.clone()),
            Atom::Param(value) => {
                self.params.push(value.clone());
                self.parts.push(format!("${}", self.params.len()));
            }
        }
    }
}
