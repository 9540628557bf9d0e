//! Verse Code Decoder
//!
//! Timing annotation lines carry a short code addressing what the marker starts:
//!
//! ```text
//! ""       continuation: next phrase of the current verse
//! "12"     verse 12
//! "12b"    verse 12, phrase 1 (bijective base-26 letters: a=0 .. z=25, aa=26 ..)
//! "12b_3"  verse 12, phrase 1, third word of that phrase
//! "10-11"  verse bridge 10 through 11
//! ```
//!
//! Decoding a code into an absolute word offset needs the phrase layout of the
//! verse and a cursor carried across markers, see [`CursorState`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::core::VerseNumber;

static VERSE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)(?:([a-z]+)(?:_(\d+))?)?$").expect("Invalid verse code regex")
});

static BRIDGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("Invalid bridge code regex"));

// =============================================================================
// Letter Codes
// =============================================================================

/// Decodes a bijective base-26 phrase code (`a`=0, `z`=25, `aa`=26, `zz`=701)
///
/// Returns `None` for empty input, characters outside `a-z`, or overflow.
pub fn letters_to_number(letters: &str) -> Option<usize> {
    if letters.is_empty() {
        return None;
    }

    let mut value: usize = 0;
    for byte in letters.bytes() {
        if !byte.is_ascii_lowercase() {
            return None;
        }
        let digit = (byte - b'a') as usize + 1;
        value = value.checked_mul(26)?.checked_add(digit)?;
    }
    Some(value - 1)
}

/// Encodes a phrase index as bijective base-26 letters
pub fn number_to_letters(mut number: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'a' + (number % 26) as u8);
        if number < 26 {
            break;
        }
        number = number / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

// =============================================================================
// Verse Codes
// =============================================================================

/// A decoded timing code
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum VerseCode {
    /// Blank (or unrecognized) code: next phrase of the current verse
    Continuation,
    /// Plain verse number
    Verse { verse: VerseNumber },
    /// Verse with a phrase index and optional 1-based word within the phrase
    Phrase {
        verse: VerseNumber,
        phrase: usize,
        word: Option<usize>,
    },
    /// Inclusive verse range narrated as one take
    Bridge {
        start: VerseNumber,
        end: VerseNumber,
    },
}

impl VerseCode {
    /// Decodes a raw code; anything outside the grammar decodes to a continuation
    pub fn parse(code: &str) -> Self {
        let code = code.trim().to_ascii_lowercase();
        if code.is_empty() {
            return Self::Continuation;
        }

        if let Some(caps) = BRIDGE_CODE.captures(&code) {
            let start = caps[1].parse::<VerseNumber>().ok();
            let end = caps[2].parse::<VerseNumber>().ok();
            return match (start, end) {
                (Some(start), Some(end)) if start <= end => Self::Bridge { start, end },
                _ => {
                    debug!("Malformed verse bridge '{}', treating as continuation", code);
                    Self::Continuation
                }
            };
        }

        let Some(caps) = VERSE_CODE.captures(&code) else {
            debug!("Unrecognized verse code '{}', treating as continuation", code);
            return Self::Continuation;
        };

        let Ok(verse) = caps[1].parse::<VerseNumber>() else {
            debug!("Verse number out of range in '{}'", code);
            return Self::Continuation;
        };

        let Some(letters) = caps.get(2) else {
            return Self::Verse { verse };
        };

        let Some(phrase) = letters_to_number(letters.as_str()) else {
            debug!("Phrase letters out of range in '{}'", code);
            return Self::Continuation;
        };

        let word = caps.get(3).and_then(|w| w.as_str().parse::<usize>().ok());
        Self::Phrase {
            verse,
            phrase,
            word,
        }
    }

    /// The verse this code addresses (first verse for a bridge)
    pub fn verse(&self) -> Option<VerseNumber> {
        match self {
            Self::Continuation => None,
            Self::Verse { verse } | Self::Phrase { verse, .. } => Some(*verse),
            Self::Bridge { start, .. } => Some(*start),
        }
    }

    /// Whether the code addresses the given verse
    pub fn covers(&self, verse: VerseNumber) -> bool {
        match self {
            Self::Continuation => false,
            Self::Verse { verse: v } | Self::Phrase { verse: v, .. } => *v == verse,
            Self::Bridge { start, end } => (*start..=*end).contains(&verse),
        }
    }

    /// Whether a marker with this code continues the given single verse
    pub fn continues(&self, verse: VerseNumber) -> bool {
        match self {
            Self::Continuation => true,
            Self::Verse { verse: v } | Self::Phrase { verse: v, .. } => *v == verse,
            Self::Bridge { .. } => false,
        }
    }

    pub fn is_bridge(&self) -> bool {
        matches!(self, Self::Bridge { .. })
    }
}

/// Canonical code text: lowercase letters, no redundant parts
impl fmt::Display for VerseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuation => Ok(()),
            Self::Verse { verse } => write!(f, "{}", verse),
            Self::Phrase {
                verse,
                phrase,
                word: Some(word),
            } => write!(f, "{}{}_{}", verse, number_to_letters(*phrase), word),
            Self::Phrase { verse, phrase, .. } => {
                write!(f, "{}{}", verse, number_to_letters(*phrase))
            }
            Self::Bridge { start, end } => write!(f, "{}-{}", start, end),
        }
    }
}

// =============================================================================
// Cursor State
// =============================================================================

/// Cursor carried across the timing entries of one chapter
///
/// `current_phrase` is `None` right after entering a verse, before any phrase
/// was addressed. `running_word_count` is always the number of words in the
/// phrases before `current_phrase`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorState {
    /// Next timing entry to look at
    pub index: usize,
    /// Verse the markers currently belong to
    pub current_verse: Option<VerseNumber>,
    /// Phrase the last marker addressed
    pub current_phrase: Option<usize>,
    /// Words in all phrases before the current one
    pub running_word_count: usize,
}

impl CursorState {
    /// Starts walking a new verse, keeping the entry index
    pub fn enter_verse(self, verse: VerseNumber) -> Self {
        Self {
            index: self.index,
            current_verse: Some(verse),
            current_phrase: None,
            running_word_count: 0,
        }
    }

    /// Moves the entry index
    pub fn at_index(self, index: usize) -> Self {
        Self { index, ..self }
    }

    /// Moves to `phrase`, adjusting the running word count
    ///
    /// Moving backwards subtracts the words of the phrases stepped over, so a
    /// corrected (out of order) code never pushes later offsets forward.
    pub fn seek_phrase(self, phrase: usize, phrase_word_counts: &[usize]) -> Self {
        let current = self.current_phrase.unwrap_or(0);
        let running_word_count = if phrase >= current {
            self.running_word_count + words_between(phrase_word_counts, current, phrase)
        } else {
            debug!(
                "Phrase index went back from {} to {}, rolling back word count",
                current, phrase
            );
            self.running_word_count
                .saturating_sub(words_between(phrase_word_counts, phrase, current))
        };

        Self {
            current_phrase: Some(phrase),
            running_word_count,
            ..self
        }
    }

    /// Resolves one marker code to an absolute word offset in the current verse
    ///
    /// Returns the next state and the offset, clamped to the verse's word count.
    pub fn advance(self, code: &VerseCode, phrase_word_counts: &[usize]) -> (Self, usize) {
        let total_words: usize = phrase_word_counts.iter().sum();

        let (state, offset) = match code {
            VerseCode::Continuation => {
                let state = self.seek_phrase(self.next_phrase(), phrase_word_counts);
                (state, state.running_word_count)
            }
            VerseCode::Verse { verse } if self.current_verse == Some(*verse) => {
                let state = self.seek_phrase(self.next_phrase(), phrase_word_counts);
                (state, state.running_word_count)
            }
            VerseCode::Verse { verse } | VerseCode::Bridge { start: verse, .. } => {
                let state = self.enter_verse(*verse).seek_phrase(0, phrase_word_counts);
                (state, 0)
            }
            VerseCode::Phrase {
                verse,
                phrase,
                word,
            } => {
                let state = if self.current_verse == Some(*verse) {
                    self
                } else {
                    self.enter_verse(*verse)
                };
                let state = state.seek_phrase(*phrase, phrase_word_counts);
                let within = word.map(|w| w.saturating_sub(1)).unwrap_or(0);
                (state, state.running_word_count + within)
            }
        };

        (state, offset.min(total_words))
    }

    fn next_phrase(&self) -> usize {
        self.current_phrase.map(|p| p + 1).unwrap_or(0)
    }
}

/// Words in phrases `from..to`; phrases past the end count as empty
fn words_between(phrase_word_counts: &[usize], from: usize, to: usize) -> usize {
    phrase_word_counts
        .iter()
        .skip(from)
        .take(to.saturating_sub(from))
        .sum()
}

// =============================================================================
// Tests
// =============================================================================
