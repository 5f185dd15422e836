//! Diagnostic codes such as `R106`.
//!
//! A code is a category letter followed by a three-digit number. The
//! letter follows the device model's error taxonomy, so a code alone says
//! at which stage a problem was found.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The stage or kind of problem a code belongs to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `C`: placement and layout problems found while adding entities.
    Configuration,
    /// `R`: input routing problems found while saving.
    Wiring,
    /// `S`: undecodable image contents found while loading.
    Serialization,
    /// `W`: suspicious but non-fatal conditions.
    Warning,
    /// `N`: informational.
    Note,
}

const PREFIXES: [(Category, char); 5] = [
    (Category::Configuration, 'C'),
    (Category::Wiring, 'R'),
    (Category::Serialization, 'S'),
    (Category::Warning, 'W'),
    (Category::Note, 'N'),
];

impl Category {
    /// The category's code letter.
    pub fn prefix(self) -> char {
        PREFIXES
            .iter()
            .find(|(c, _)| *c == self)
            .map_or('?', |&(_, p)| p)
    }

    /// The category for a code letter.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        PREFIXES.iter().find(|(_, p)| *p == prefix).map(|&(c, _)| c)
    }
}

/// A category plus a number, unique per error kind.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Which category the code is in.
    pub category: Category,
    /// Number within the category, displayed with three digits.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a code.
    pub fn new(category: Category, number: u16) -> Self {
        Self { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}

impl FromStr for DiagnosticCode {
    type Err = String;

    /// Parses `R106`-style codes.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let category = chars
            .next()
            .and_then(Category::from_prefix)
            .ok_or_else(|| format!("`{s}` does not start with a category letter"))?;
        let number = chars
            .as_str()
            .parse()
            .map_err(|_| format!("`{s}` has no code number"))?;
        Ok(Self::new(category, number))
    }
}
