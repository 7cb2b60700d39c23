use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub query: String,
    /// Model answer, or the user-facing error message when the request failed.
    pub response: String,
    pub at: DateTime<Utc>,
}

/// Ordered query/response pairs for one session. Turns are only appended or
/// removed by index; the order is the conversation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn append_turn(&mut self, query: impl Into<String>, response: impl Into<String>) -> &ChatTurn {
        self.turns.push(ChatTurn { query: query.into(), response: response.into(), at: Utc::now() });
        &self.turns[self.turns.len() - 1]
    }

    pub fn remove_at(&mut self, index: usize) -> Option<ChatTurn> {
        (index < self.turns.len()).then(|| self.turns.remove(index))
    }

    /// Absolute index of the turn shown at position `displayed` in a
    /// most-recent-first listing.
    pub fn displayed_to_absolute(&self, displayed: usize) -> Option<usize> {
        self.turns.len().checked_sub(1)?.checked_sub(displayed)
    }

    pub fn remove_displayed(&mut self, displayed: usize) -> Option<ChatTurn> {
        let index = self.displayed_to_absolute(displayed)?;
        self.remove_at(index)
    }

    /// Turns most recent first, paired with their display position.
    pub fn recent_first(&self) -> impl Iterator<Item = (usize, &ChatTurn)> {
        self.turns.iter().rev().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abc() -> Transcript {
        let mut t = Transcript::new();
        for q in ["a", "b", "c"] {
            t.append_turn(q, format!("answer {q}"));
        }
        t
    }

    fn queries(t: &Transcript) -> Vec<&str> {
        t.turns().iter().map(|turn| turn.query.as_str()).collect()
    }

    #[test]
    fn append_keeps_order() {
        let t = abc();
        assert_eq!(queries(&t), ["a", "b", "c"]);
        assert_eq!(t.last().unwrap().response, "answer c");
    }

    #[test]
    fn deleting_first_displayed_removes_newest() {
        let mut t = abc();
        let removed = t.remove_displayed(0).unwrap();
        assert_eq!(removed.query, "c");
        assert_eq!(queries(&t), ["a", "b"]);
    }

    #[test]
    fn deleting_last_displayed_removes_oldest() {
        let mut t = abc();
        assert_eq!(t.remove_displayed(2).unwrap().query, "a");
        assert_eq!(queries(&t), ["b", "c"]);
    }

    #[test]
    fn displayed_positions_match_listing() {
        let t = abc();
        for (displayed, turn) in t.recent_first() {
            let abs = t.displayed_to_absolute(displayed).unwrap();
            assert_eq!(&t.turns()[abs], turn);
        }
    }

    #[test]
    fn out_of_range_leaves_transcript_alone() {
        let mut t = abc();
        assert!(t.remove_displayed(3).is_none());
        assert!(t.remove_at(3).is_none());
        assert_eq!(t.len(), 3);

        let mut empty = Transcript::new();
        assert!(empty.remove_displayed(0).is_none());
        assert_eq!(empty.displayed_to_absolute(0), None);
    }

    #[test]
    fn remove_at_uses_absolute_index() {
        let mut t = abc();
        assert_eq!(t.remove_at(1).unwrap().query, "b");
        assert_eq!(queries(&t), ["a", "c"]);
    }
}
