use crate::tokenizer::Tokenizer;
use crate::turn::{Role, Turn};
use tracing::debug;

/// Ordered history of turns for one conversation.
///
/// Grows by [`Transcript::append`] and shrinks only through [`Transcript::replace_prefix`] or [`Transcript::clear`].
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Token count of every turn's content joined by single spaces
    pub fn size_estimate(&self, tokenizer: &dyn Tokenizer) -> usize {
        let full_text = self
            .turns
            .iter()
            .map(Turn::content)
            .collect::<Vec<_>>()
            .join(" ");
        tokenizer.count_tokens(&full_text)
    }

    /// Index of the first turn kept when retaining the last `retain` turns.
    ///
    /// The boundary never lands on a tool result: it moves back to the
    /// assistant turn that requested it so request and result stay together.
    pub fn split_for_condensation(&self, retain: usize) -> usize {
        let len = self.turns.len();
        let base = len.saturating_sub(retain);
        let mut split = base;
        while split > 0 && split < len && self.turns[split].role() == Role::Tool {
            split -= 1;
        }
        if split != base {
            debug!(base, split, "Moved condensation boundary off tool results");
        }
        split
    }

    /// Replaces `turns[..split]` with `summary`, returning how many turns were removed.
    ///
    /// A zero `split` leaves the transcript untouched.
    pub fn replace_prefix(&mut self, split: usize, summary: Turn) -> usize {
        if split == 0 {
            return 0;
        }
        let split = split.min(self.turns.len());
        self.turns.splice(..split, std::iter::once(summary)).count()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::WordTokenizer;
    use crate::turn::ActionRequest;
    use serde_json::json;

    fn chat(n: usize) -> Transcript {
        let mut transcript = Transcript::new();
        for i in 0..n {
            if i % 2 == 0 {
                transcript.append(Turn::user(format!("user message {i}")));
            } else {
                transcript.append(Turn::assistant(format!("assistant reply {i}")));
            }
        }
        transcript
    }

    #[test]
    fn test_size_estimate_is_monotonic() {
        let mut transcript = Transcript::new();
        let mut previous = transcript.size_estimate(&WordTokenizer);
        assert_eq!(previous, 0);
        for text in ["hello", "", "book a room for two", "thanks"] {
            transcript.append(Turn::user(text));
            let current = transcript.size_estimate(&WordTokenizer);
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, 7);
    }

    #[test]
    fn test_split_keeps_last_k() {
        let transcript = chat(10);
        assert_eq!(transcript.split_for_condensation(2), 8);
        assert_eq!(transcript.split_for_condensation(10), 0);
        assert_eq!(transcript.split_for_condensation(25), 0);
    }

    #[test]
    fn test_split_does_not_strand_tool_results() {
        let mut transcript = chat(4);
        let first = ActionRequest::new("a", "find_event_by_name", json!({"name": "sync"}));
        let second = ActionRequest::new("b", "get_current_date_time", json!({}));
        transcript.append(Turn::assistant_with_actions(
            "",
            vec![first.clone(), second.clone()],
        ));
        transcript.append(Turn::tool_result(&first, "[]"));
        transcript.append(Turn::tool_result(&second, "2025-01-01 10:00"));

        // A two turn window would start on the first tool result
        let split = transcript.split_for_condensation(2);
        assert_eq!(split, 4);
        assert!(transcript.turns()[split].has_action_requests());
    }

    #[test]
    fn test_replace_prefix() {
        let mut transcript = chat(10);
        let before: Vec<Turn> = transcript.turns()[8..].to_vec();

        let removed = transcript.replace_prefix(8, Turn::summary("the gist"));

        assert_eq!(removed, 8);
        assert_eq!(transcript.len(), 3);
        assert!(transcript.turns()[0].is_summary());
        assert_eq!(&transcript.turns()[1..], before.as_slice());
    }

    #[test]
    fn test_replace_prefix_zero_is_noop() {
        let mut transcript = chat(3);
        assert_eq!(transcript.replace_prefix(0, Turn::summary("unused")), 0);
        assert_eq!(transcript.len(), 3);
        assert!(!transcript.turns()[0].is_summary());
    }
}
