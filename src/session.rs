use std::time::Duration;

use rand::SeedableRng;
use rand::seq::SliceRandom;

use crate::card::{Card, DECK_SIZE, PAIR_COUNT, Symbol, paired_symbols};

/// How long a mismatched pair stays face-up before flipping back.
pub const FLIP_BACK_DELAY: Duration = Duration::from_millis(750);

/// What a `select` call did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// The selection was invalid (face-up, matched, or two flips already
    /// pending) and nothing changed.
    Ignored,
    /// First card of a pair turned face-up; waiting for the second.
    Flipped,
    /// Second card completed a pair.  `won` is set on the attempt that
    /// matched the final pair.
    Matched { won: bool },
    /// Second card did not match.  Both stay face-up; the caller schedules
    /// a reversal after [`FLIP_BACK_DELAY`].
    Mismatched { first: usize, second: usize },
}

/// One game in progress – the single source of truth for all card state.
///
/// `generation` is assigned by the owner when the session is dealt and never
/// changes.  Anything scheduled against a session (the flip-back of a
/// mismatched pair) carries the generation it was scheduled under, so a task
/// that outlives its session can be recognized as stale and dropped instead
/// of mutating a newer deal.
#[derive(Debug, Clone)]
pub struct Session {
    cards: Vec<Card>,
    /// Face-up, unmatched cards awaiting resolution.  Never longer than 2.
    pending: Vec<usize>,
    attempts: u32,
    matches: u32,
    has_won: bool,
    generation: u64,
}

impl Session {
    // -------------------------------------------------------------------------
    // Construction / Dealing
    // -------------------------------------------------------------------------

    /// Deal a fresh shuffled session using OS randomness.
    pub fn deal(generation: u64) -> Self {
        let mut rng = rand::rngs::SmallRng::from_os_rng();
        let mut symbols = paired_symbols();
        symbols.shuffle(&mut rng);
        Self::from_symbols(symbols, generation)
    }

    /// Deal from a specific seed (useful for reproducible games).
    pub fn deal_seeded(seed: u64, generation: u64) -> Self {
        let mut rng = rand::rngs::SmallRng::seed_from_u64(seed);
        let mut symbols = paired_symbols();
        symbols.shuffle(&mut rng);
        Self::from_symbols(symbols, generation)
    }

    /// Build a session from an already-ordered symbol sequence (for testing).
    pub fn from_symbols(symbols: Vec<Symbol>, generation: u64) -> Self {
        assert_eq!(symbols.len(), DECK_SIZE, "Need exactly {DECK_SIZE} symbols to deal");

        let cards = symbols
            .into_iter()
            .enumerate()
            .map(|(id, symbol)| Card::hidden(id, symbol))
            .collect();

        Session {
            cards,
            pending: Vec::with_capacity(2),
            attempts: 0,
            matches: 0,
            has_won: false,
            generation,
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn pending(&self) -> &[usize] {
        &self.pending
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn matches(&self) -> u32 {
        self.matches
    }

    pub fn has_won(&self) -> bool {
        self.has_won
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // -------------------------------------------------------------------------
    // Flipping & Resolution
    // -------------------------------------------------------------------------

    /// Flip the card with the given id.  Invalid selections (unknown id,
    /// card already face-up or matched, two flips pending) are silent
    /// no-ops: the input domain is the UI, which only offers real cards.
    ///
    /// When this flip is the second of a pair the attempt is resolved
    /// immediately: the attempt counter increments here, matches lock here,
    /// and a mismatch is reported for the caller to schedule the flip-back.
    pub fn select(&mut self, id: usize) -> SelectOutcome {
        if self.pending.len() == 2 {
            return SelectOutcome::Ignored;
        }
        match self.cards.get(id) {
            Some(card) if !card.face_up && !card.matched => {}
            _ => return SelectOutcome::Ignored,
        }

        self.cards[id].face_up = true;
        self.pending.push(id);
        if self.pending.len() < 2 {
            return SelectOutcome::Flipped;
        }

        // Resolution: the attempt counts now, not when the cards flip back.
        self.attempts += 1;
        let (first, second) = (self.pending[0], self.pending[1]);

        if self.cards[first].symbol == self.cards[second].symbol {
            self.cards[first].matched = true;
            self.cards[second].matched = true;
            self.pending.clear();
            self.matches += 1;

            // One-way latch: the winning transition fires exactly once.
            if self.matches as usize == PAIR_COUNT && !self.has_won {
                self.has_won = true;
                return SelectOutcome::Matched { won: true };
            }
            SelectOutcome::Matched { won: false }
        } else {
            SelectOutcome::Mismatched { first, second }
        }
    }

    /// Flip any pending cards back face-down.  Called when the flip-back
    /// delay for a mismatched pair elapses.
    pub fn revert_pending(&mut self) {
        for id in self.pending.drain(..) {
            self.cards[id].face_up = false;
        }
    }
}
