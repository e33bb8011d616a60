//! Bounded recent-turn window.

use std::collections::VecDeque;
use vitalis_protocol::Turn;

/// The most recent turns of a conversation in fast-access form.
///
/// Derived state: rebuilt from the last N persisted turns, never
/// independently durable. Appending beyond capacity evicts the oldest
/// turn in O(1).
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    capacity: usize,
    turns: VecDeque<Turn>,
}

impl MemoryWindow {
    /// Create an empty window with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            turns: VecDeque::with_capacity(capacity.max(1)),
        }
    }

    /// Rebuild a window from persisted turns, keeping only the newest
    /// `capacity` entries. Input must be in chronological order.
    pub fn rebuild(capacity: usize, turns: Vec<Turn>) -> Self {
        let mut window = Self::new(capacity);
        for turn in turns {
            window.push(turn);
        }
        window
    }

    /// Append a turn, evicting the oldest when full.
    pub fn push(&mut self, turn: Turn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Number of turns currently held.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// True when the window holds no turns.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Window capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate turns oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Render the newest `max_turns` as `role: text` lines for prompts.
    pub fn render(&self, max_turns: usize) -> String {
        let skip = self.turns.len().saturating_sub(max_turns);
        self.turns
            .iter()
            .skip(skip)
            .map(|turn| format!("{}: {}", turn.role.as_str(), turn.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryWindow;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;
    use vitalis_protocol::{Role, Turn};

    fn turn(conversation_id: Uuid, text: &str) -> Turn {
        Turn::new(conversation_id, Role::User, text)
    }

    #[test]
    fn push_evicts_oldest_at_capacity() {
        let conversation_id = Uuid::new_v4();
        let mut window = MemoryWindow::new(3);
        for text in ["one", "two", "three", "four"] {
            window.push(turn(conversation_id, text));
        }
        assert_eq!(window.len(), 3);
        let texts: Vec<&str> = window.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["two", "three", "four"]);
    }

    #[test]
    fn rebuild_keeps_newest_turns_in_order() {
        let conversation_id = Uuid::new_v4();
        let turns: Vec<Turn> = ["a", "b", "c", "d", "e"]
            .iter()
            .map(|text| turn(conversation_id, text))
            .collect();
        let window = MemoryWindow::rebuild(2, turns);
        let texts: Vec<&str> = window.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["d", "e"]);
    }

    #[test]
    fn render_limits_to_newest_turns() {
        let conversation_id = Uuid::new_v4();
        let mut window = MemoryWindow::new(5);
        window.push(turn(conversation_id, "first"));
        window.push(Turn::new(conversation_id, Role::Assistant, "second"));
        assert_eq!(window.render(1), "assistant: second");
        assert_eq!(window.render(10), "user: first\nassistant: second");
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut window = MemoryWindow::new(0);
        window.push(turn(Uuid::new_v4(), "only"));
        window.push(turn(Uuid::new_v4(), "kept"));
        assert_eq!(window.len(), 1);
    }
}
