//! Phrase Segmenter
//!
//! Splits verse text into phrases on a configurable delimiter set. The phrase
//! layout is what timing codes such as `3b_2` address.

use tracing::debug;

/// Default delimiter specification used when a project does not configure one
pub const DEFAULT_PHRASE_DELIMITERS: &str = ". , ; : ! ?";

/// Whitespace characters matched by the `\s` token
const WHITESPACE_CHARS: [char; 6] = [' ', '\t', '\n', '\r', '\u{000B}', '\u{000C}'];

/// Parsed phrase delimiter set
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct PhraseDelimiters {
    chars: Vec<char>,
}

impl PhraseDelimiters {
    /// Parses a space separated delimiter specification
    ///
    /// Tokens are a literal character, `\s` for whitespace, or `\uXXXX`.
    /// A multi-character token that is not an escape contributes each of its
    /// characters.
    pub fn parse(spec: &str) -> Self {
        let mut chars = Vec::new();

        for token in spec.split_whitespace() {
            if token == "\\s" {
                chars.extend(WHITESPACE_CHARS);
                continue;
            }

            if let Some(hex) = token.strip_prefix("\\u") {
                match u32::from_str_radix(hex, 16).ok().and_then(char::from_u32) {
                    Some(c) if hex.len() == 4 => {
                        chars.push(c);
                        continue;
                    }
                    _ => debug!("Malformed unicode escape '{}', keeping literally", token),
                }
            }

            chars.extend(token.chars());
        }

        let mut unique = Vec::with_capacity(chars.len());
        for c in chars {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }

        Self { chars: unique }
    }

    /// Delimiter characters in specification order
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Splits text into trimmed, non-empty phrases
    pub fn split(&self, text: &str) -> Vec<String> {
        let Some(&target) = self.chars.last() else {
            let whole = text.trim();
            return if whole.is_empty() {
                Vec::new()
            } else {
                vec![whole.to_string()]
            };
        };

        let normalized: String = text
            .chars()
            .map(|c| if self.chars.contains(&c) { target } else { c })
            .collect();

        normalized
            .split(target)
            .map(str::trim)
            .filter(|phrase| !phrase.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Number of whitespace separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Word count of each phrase of `text`, aligned with [`PhraseDelimiters::split`]
///
/// Words are the whitespace separated tokens of the whole text, the same
/// words captions are generated from. A token belongs to the phrase holding
/// its first non-delimiter character. A token made only of delimiters belongs
/// to the phrase before it, or to the first phrase when it leads the text.
/// Whenever the text has a phrase the counts sum to [`word_count`].
pub fn phrase_word_counts(delimiters: &PhraseDelimiters, text: &str) -> Vec<usize> {
    if delimiters.is_empty() {
        return match word_count(text) {
            0 => Vec::new(),
            count => vec![count],
        };
    }

    let is_delimiter = |c: char| delimiters.chars.contains(&c);
    let mut counts: Vec<usize> = Vec::new();
    let mut leading = 0;
    let mut pending_break = false;
    let mut in_token = false;
    let mut token_placed = false;

    // Trailing space closes the last token
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_whitespace() {
            if in_token && !token_placed {
                match counts.last_mut() {
                    Some(count) => *count += 1,
                    None => leading += 1,
                }
            }
            in_token = false;
            token_placed = false;
            pending_break |= is_delimiter(c) && !counts.is_empty();
            continue;
        }

        in_token = true;
        if is_delimiter(c) {
            pending_break |= !counts.is_empty();
            continue;
        }

        if counts.is_empty() {
            counts.push(std::mem::take(&mut leading));
        } else if pending_break {
            counts.push(0);
        }
        pending_break = false;

        if !token_placed {
            if let Some(count) = counts.last_mut() {
                *count += 1;
            }
            token_placed = true;
        }
    }

    counts
}
