//! The draw pile: two standard decks shuffled together.

use crate::card::Card;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Number of standard decks in a Sequence draw pile.
pub const DECKS: usize = 2;

/// Total cards in a fresh draw pile.
pub const DECK_SIZE: usize = DECKS * 52;

/// The remaining draw pile. Cards are drawn from the end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Two standard decks one after the other, unshuffled.
    pub fn ordered() -> Self {
        let cards = (0..DECKS).flat_map(|_| Card::standard_deck()).collect();
        Self { cards }
    }

    /// Two standard decks, uniformly shuffled with the given RNG.
    #[instrument(skip(rng))]
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::ordered();
        deck.cards.shuffle(rng);
        debug!(cards = deck.cards.len(), "Shuffled deck");
        deck
    }

    /// A deck holding exactly these cards, last card drawn first.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Draws the top card.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Number of cards left.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the pile is exhausted.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The remaining cards, bottom first.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

/// Builds a fresh 104-card pile shuffled with the thread RNG.
#[instrument]
pub fn build_shuffled_deck() -> Deck {
    Deck::shuffled(&mut rand::thread_rng())
}

/// Moves up to `count` cards from the end of the deck into the hand.
///
/// Deals fewer when the deck runs short. Returns how many were dealt.
#[instrument(skip(deck, hand), fields(remaining = deck.len()))]
pub fn deal(deck: &mut Deck, hand: &mut Vec<Card>, count: usize) -> usize {
    let mut dealt = 0;
    while dealt < count {
        match deck.draw() {
            Some(card) => {
                hand.push(card);
                dealt += 1;
            }
            None => break,
        }
    }
    debug!(requested = count, dealt, "Dealt cards");
    dealt
}
