/// Letters hidden behind the cards.  Eight distinct symbols, each of which
/// appears on exactly two cards, giving a 4×4 grid of sixteen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl Symbol {
    /// All eight symbols, in canonical order.
    pub const ALL: [Symbol; 8] = [
        Symbol::A,
        Symbol::B,
        Symbol::C,
        Symbol::D,
        Symbol::E,
        Symbol::F,
        Symbol::G,
        Symbol::H,
    ];

    /// Single-character label shown when a card is face-up.
    pub fn letter(self) -> char {
        match self {
            Symbol::A => 'A',
            Symbol::B => 'B',
            Symbol::C => 'C',
            Symbol::D => 'D',
            Symbol::E => 'E',
            Symbol::F => 'F',
            Symbol::G => 'G',
            Symbol::H => 'H',
        }
    }
}

/// Number of matching pairs in a deck.
pub const PAIR_COUNT: usize = Symbol::ALL.len();
/// Total cards dealt per game.
pub const DECK_SIZE: usize = PAIR_COUNT * 2;

/// A single card on the table.  `id` is the card's position in the deal and
/// stays stable for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub id: usize,
    pub symbol: Symbol,
    pub face_up: bool,
    pub matched: bool,
}

impl Card {
    pub fn hidden(id: usize, symbol: Symbol) -> Self {
        Card {
            id,
            symbol,
            face_up: false,
            matched: false,
        }
    }
}

/// The unshuffled multiset of symbols: every symbol exactly twice.
pub fn paired_symbols() -> Vec<Symbol> {
    let mut symbols = Vec::with_capacity(DECK_SIZE);
    symbols.extend_from_slice(&Symbol::ALL);
    symbols.extend_from_slice(&Symbol::ALL);

    debug_assert_eq!(symbols.len(), DECK_SIZE, "Deck must have exactly {DECK_SIZE} cards");
    symbols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paired_symbols_has_every_symbol_twice() {
        let symbols = paired_symbols();
        assert_eq!(symbols.len(), DECK_SIZE);
        for s in Symbol::ALL {
            assert_eq!(symbols.iter().filter(|&&x| x == s).count(), 2);
        }
    }

    #[test]
    fn letters_are_distinct() {
        for (i, a) in Symbol::ALL.iter().enumerate() {
            for b in &Symbol::ALL[i + 1..] {
                assert_ne!(a.letter(), b.letter());
            }
        }
    }
}
