//! Diff building: turn token matches into replace-operations.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::token::DiffEngine;

/// A single replace-operation against the newer text.
///
/// Replaces the `size` chars starting at `start` with `substitution`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiffOp {
    /// Offset (in chars) into the newer text.
    pub start: usize,
    /// Number of chars to replace.
    pub size: usize,
    /// Replacement text taken from the older text.
    pub substitution: String,
}

impl DiffOp {
    /// Create a replace-operation.
    pub fn new(start: usize, size: usize, substitution: impl Into<String>) -> Self {
        Self {
            start,
            size,
            substitution: substitution.into(),
        }
    }

    /// Returns `true` if applying this operation would not change anything.
    pub fn is_noop(&self) -> bool {
        self.size == 0 && self.substitution.is_empty()
    }
}

impl DiffEngine {
    /// Compute the operations that regenerate `older` from `newer`.
    ///
    /// Operations come out ordered by strictly descending `start`, which is
    /// the order [`apply_diff`](crate::apply_diff) requires: each splice only
    /// touches text to the right of every offset still to be applied.
    /// Identical texts yield an empty list.
    pub fn diff(&self, newer: &str, older: &str) -> Vec<DiffOp> {
        let newer_chars: Vec<char> = newer.chars().collect();
        let older_chars: Vec<char> = older.chars().collect();
        let matches = self.match_chars(&newer_chars, &older_chars);

        let Some(first) = matches.first() else {
            if newer == older {
                return Vec::new();
            }
            return vec![DiffOp::new(0, newer_chars.len(), older)];
        };

        let mut ops = Vec::with_capacity(matches.len() + 1);

        for (i, token) in matches.iter().enumerate().rev() {
            let (newer_next, older_next) = matches
                .get(i + 1)
                .map_or((newer_chars.len(), older_chars.len()), |next| {
                    (next.newer_pos, next.older_pos)
                });
            let op = DiffOp {
                start: token.newer_end(),
                size: newer_next - token.newer_end(),
                substitution: older_chars[token.older_end()..older_next].iter().collect(),
            };
            if !op.is_noop() {
                ops.push(op);
            }
        }

        let leading = DiffOp {
            start: 0,
            size: first.newer_pos,
            substitution: older_chars[..first.older_pos].iter().collect(),
        };
        if !leading.is_noop() {
            ops.push(leading);
        }

        trace!(tokens = matches.len(), ops = ops.len(), "diff built");
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn diff(newer: &str, older: &str) -> Vec<DiffOp> {
        DiffEngine::default().diff(newer, older)
    }

    #[test]
    fn identical_texts_produce_no_ops() {
        assert!(diff("", "").is_empty());
        assert!(diff("ab", "ab").is_empty());
        assert!(diff(r#"{"title":"X"}"#, r#"{"title":"X"}"#).is_empty());
    }

    #[test]
    fn unrelated_texts_replace_everything() {
        assert_eq!(
            diff("totally different", "11111"),
            vec![DiffOp::new(0, 17, "11111")]
        );
    }

    #[test]
    fn short_texts_without_tokens_replace_everything() {
        assert_eq!(diff("ab", "ba"), vec![DiffOp::new(0, 2, "ba")]);
        assert_eq!(diff("", "abc"), vec![DiffOp::new(0, 0, "abc")]);
        assert_eq!(diff("abc", ""), vec![DiffOp::new(0, 3, "")]);
    }

    #[test]
    fn trailing_insertion() {
        let newer = r#"["A","B","C"]"#;
        let older = r#"["A","B"]"#;
        // Whole of `["A","B"` matches, the rest of newer is dropped.
        assert_eq!(diff(newer, older), vec![DiffOp::new(8, 5, "]")]);
    }

    #[test]
    fn leading_region_is_last() {
        let ops = diff("aaa bbb ccc", "bbb");
        assert_eq!(ops, vec![DiffOp::new(7, 4, ""), DiffOp::new(0, 4, "")]);
    }

    #[test]
    fn ops_are_strictly_descending() {
        let ops = diff(
            "our reveals now are ended, these our actors were all spirits",
            "forget our reveals, they were not.",
        );
        assert!(!ops.is_empty());
        for pair in ops.windows(2) {
            assert!(pair[0].start > pair[1].start);
        }
    }

    #[test]
    fn noop_detection() {
        assert!(DiffOp::new(4, 0, "").is_noop());
        assert!(!DiffOp::new(4, 1, "").is_noop());
        assert!(!DiffOp::new(4, 0, "x").is_noop());
    }

    #[test]
    fn serde_field_names() {
        let op = DiffOp::new(3, 2, "xy");
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"start":3,"size":2,"substitution":"xy"}"#);
    }

    proptest! {
        #[test]
        fn starts_strictly_descend(
            newer in "[ab \"{}]{0,48}",
            older in "[ab \"{}]{0,48}",
            min_token_len in 1usize..5,
        ) {
            let ops = DiffEngine::new(min_token_len).diff(&newer, &older);
            for pair in ops.windows(2) {
                prop_assert!(pair[0].start > pair[1].start, "{:?}", ops);
            }
            prop_assert!(ops.iter().all(|op| !op.is_noop()));
        }
    }
}
