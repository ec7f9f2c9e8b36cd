//! Playing cards as they appear in hands, in the deck and on the board.
//!
//! A card's text form is its *code*: the rank label followed by the suit
//! symbol, e.g. `"10♠"` or `"J♦"`. Codes are what travels over the wire.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{EnumIter, IntoEnumIterator};
use tracing::instrument;

/// Card suit.
///
/// Declaration order is the order used when building a fresh deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Suit {
    /// ♥
    Hearts,
    /// ♦
    Diamonds,
    /// ♠
    Spades,
    /// ♣
    Clubs,
}

impl Suit {
    /// Unicode symbol used in card codes.
    pub fn symbol(self) -> char {
        match self {
            Suit::Hearts => '♥',
            Suit::Diamonds => '♦',
            Suit::Spades => '♠',
            Suit::Clubs => '♣',
        }
    }

    /// Parses a suit from its symbol or ASCII letter (`H`, `D`, `S`, `C`).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '♥' | 'H' | 'h' => Some(Suit::Hearts),
            '♦' | 'D' | 'd' => Some(Suit::Diamonds),
            '♠' | 'S' | 's' => Some(Suit::Spades),
            '♣' | 'C' | 'c' => Some(Suit::Clubs),
            _ => None,
        }
    }
}

/// Card rank, Ace low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter)]
pub enum Rank {
    /// A
    Ace,
    /// 2
    Two,
    /// 3
    Three,
    /// 4
    Four,
    /// 5
    Five,
    /// 6
    Six,
    /// 7
    Seven,
    /// 8
    Eight,
    /// 9
    Nine,
    /// 10
    Ten,
    /// J. Never printed on the board.
    Jack,
    /// Q
    Queen,
    /// K
    King,
}

impl Rank {
    /// Label used in card codes.
    pub fn label(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }

    /// Parses a rank label.
    pub fn from_label(label: &str) -> Option<Self> {
        Rank::iter().find(|rank| rank.label().eq_ignore_ascii_case(label))
    }
}

/// What a Jack does when played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JackKind {
    /// J♥ and J♠: removes one unlocked opponent token.
    OneEyed,
    /// J♦ and J♣: places a token on any empty card slot.
    TwoEyed,
}

/// A playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    /// Creates a card.
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// Returns the rank.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// Returns the suit.
    pub fn suit(&self) -> Suit {
        self.suit
    }

    /// Returns the Jack behaviour of this card, or `None` for any other rank.
    pub fn jack_kind(&self) -> Option<JackKind> {
        match (self.rank, self.suit) {
            (Rank::Jack, Suit::Hearts | Suit::Spades) => Some(JackKind::OneEyed),
            (Rank::Jack, Suit::Diamonds | Suit::Clubs) => Some(JackKind::TwoEyed),
            _ => None,
        }
    }

    /// Whether this card is a Jack of any kind.
    pub fn is_jack(&self) -> bool {
        self.rank == Rank::Jack
    }

    /// Iterates over the 52 cards of one standard deck, suit by suit.
    pub fn standard_deck() -> impl Iterator<Item = Card> {
        Suit::iter().flat_map(|suit| Rank::iter().map(move |rank| Card::new(rank, suit)))
    }
}

impl std::fmt::Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.rank.label(), self.suit.symbol())
    }
}

/// A card code that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid card code: {:?}", code)]
pub struct CardParseError {
    /// The offending input.
    #[error(not(source))]
    pub code: String,
}

impl FromStr for Card {
    type Err = CardParseError;

    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CardParseError {
            code: s.to_string(),
        };
        let trimmed = s.trim();
        let suit_char = trimmed.chars().last().ok_or_else(invalid)?;
        let suit = Suit::from_char(suit_char).ok_or_else(invalid)?;
        let label = &trimmed[..trimmed.len() - suit_char.len_utf8()];
        let rank = Rank::from_label(label).ok_or_else(invalid)?;
        Ok(Card::new(rank, suit))
    }
}

impl TryFrom<String> for Card {
    type Error = CardParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Card> for String {
    fn from(card: Card) -> Self {
        card.to_string()
    }
}
