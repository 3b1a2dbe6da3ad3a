//! Token matching: locate shared substrings between a newer and an older text.
//!
//! The matcher is greedy and never backtracks. Starting at the front of the
//! newer text it looks for the longest prefix that occurs anywhere in the
//! remaining older text, takes its leftmost occurrence, and moves both texts
//! past it. When not even a minimum-length prefix can be found, only the newer
//! text advances by one character.

use serde::{Deserialize, Serialize};

/// Shortest substring the matcher will ever accept as a token.
pub const DEFAULT_MIN_TOKEN_LEN: usize = 3;

/// A substring shared by both texts.
///
/// Positions and size are counted in `char`s.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenMatch {
    /// Offset of the token in the newer text.
    pub newer_pos: usize,
    /// Offset of the token in the older text.
    pub older_pos: usize,
    /// Token length.
    pub size: usize,
}

impl TokenMatch {
    /// Offset just past the token in the newer text.
    pub fn newer_end(&self) -> usize {
        self.newer_pos + self.size
    }

    /// Offset just past the token in the older text.
    pub fn older_end(&self) -> usize {
        self.older_pos + self.size
    }
}

/// Diff engine parameterised by the minimum token length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffEngine {
    min_token_len: usize,
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self {
            min_token_len: DEFAULT_MIN_TOKEN_LEN,
        }
    }
}

impl DiffEngine {
    /// Create an engine with the given minimum token length.
    ///
    /// A length of zero is raised to one; an empty token would never advance
    /// the matcher.
    pub fn new(min_token_len: usize) -> Self {
        Self {
            min_token_len: min_token_len.max(1),
        }
    }

    /// The minimum token length in `char`s.
    pub fn min_token_len(&self) -> usize {
        self.min_token_len
    }

    /// Find the ordered, non-overlapping tokens of `newer` that also occur in `older`.
    ///
    /// The result is strictly increasing in both `newer_pos` and `older_pos`,
    /// and every token is at least [`min_token_len`](Self::min_token_len) long.
    pub fn token_matches(&self, newer: &str, older: &str) -> Vec<TokenMatch> {
        let newer: Vec<char> = newer.chars().collect();
        let older: Vec<char> = older.chars().collect();
        self.match_chars(&newer, &older)
    }

    pub(crate) fn match_chars(&self, newer: &[char], older: &[char]) -> Vec<TokenMatch> {
        let mut matches = Vec::new();
        let mut newer_at = 0;
        let mut older_at = 0;

        while newer.len() - newer_at >= self.min_token_len {
            match self.longest_prefix(&newer[newer_at..], &older[older_at..]) {
                Some((pos, size)) => {
                    matches.push(TokenMatch {
                        newer_pos: newer_at,
                        older_pos: older_at + pos,
                        size,
                    });
                    newer_at += size;
                    older_at += pos + size;
                }
                // Only the newer side moves on a miss.
                None => newer_at += 1,
            }
        }

        matches
    }

    /// Longest prefix of `newer` found in `older`, as `(position, size)`.
    ///
    /// The position is the leftmost occurrence at the final size. Any
    /// occurrence of a longer prefix is also an occurrence of the shorter one,
    /// so each growth step resumes searching from the previous hit.
    fn longest_prefix(&self, newer: &[char], older: &[char]) -> Option<(usize, usize)> {
        let mut best = None;
        let mut from = 0;
        let mut size = self.min_token_len;

        while size <= newer.len() {
            match find(&older[from..], &newer[..size]) {
                Some(offset) => {
                    from += offset;
                    best = Some((from, size));
                    size += 1;
                }
                None => break,
            }
        }

        best
    }
}

/// Leftmost occurrence of `needle` in `haystack`.
fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
