//! Symbol set accepted by the renderer.
//!
//! The order of the alphabet is also the order in which glyphs are stored
//! in a font atlas.

const SYMBOLS: &str = "0123456789abcdefghijklmnopqrstuvwxyz";

/// Ordered set of the 36 renderable symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Alphabet;

impl Alphabet {
    /// Number of symbols.
    pub const LEN: usize = SYMBOLS.len();

    /// All symbols as a string, in atlas order.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        SYMBOLS
    }

    /// Iterates the symbols in atlas order.
    pub fn symbols(self) -> impl Iterator<Item = char> {
        SYMBOLS.chars()
    }

    /// Returns the symbol at `index`.
    #[must_use]
    pub fn symbol(self, index: usize) -> Option<char> {
        SYMBOLS.as_bytes().get(index).map(|b| char::from(*b))
    }

    /// Position of `ch` in atlas order.
    #[must_use]
    pub fn index_of(self, ch: char) -> Option<usize> {
        match ch {
            '0'..='9' => Some(ch as usize - '0' as usize),
            'a'..='z' => Some(ch as usize - 'a' as usize + 10),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains(self, ch: char) -> bool {
        self.index_of(ch).is_some()
    }

    /// Case-folds `text` and checks every character belongs to the alphabet.
    ///
    /// Returns `None` for empty text or when any character is outside the set.
    #[must_use]
    pub fn normalize(self, text: &str) -> Option<String> {
        let folded = text.to_lowercase();
        if folded.is_empty() || !folded.chars().all(|c| self.contains(c)) {
            return None;
        }
        Some(folded)
    }
}
