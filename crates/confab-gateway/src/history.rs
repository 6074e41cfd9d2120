//! Conversation transcript: positional turns with role inferred from parity

/// Role of a turn within the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role of the turn at `index`: even positions are user turns
    pub fn at(index: usize) -> Role {
        if index % 2 == 0 {
            Role::User
        } else {
            Role::Assistant
        }
    }

    /// Wire name of this role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Ordered sequence of turns for one provider selection.
///
/// The length is even whenever no request is in flight; during a request the
/// trailing user turn has no assistant counterpart yet. Pushes must alternate
/// user/assistant accordingly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    turns: Vec<String>,
}

impl Transcript {
    /// Create an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of turns, including a pending user turn
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript holds no turns
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Whether the last turn is a user turn still awaiting its answer
    pub fn has_pending_user(&self) -> bool {
        self.turns.len() % 2 == 1
    }

    /// Append a user turn
    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(text.into());
    }

    /// Append the assistant turn completing the pending exchange
    pub fn push_assistant(&mut self, text: impl Into<String>) {
        self.turns.push(text.into());
    }

    /// All turns in submission order
    pub fn turns(&self) -> &[String] {
        &self.turns
    }

    /// Turns excluding a trailing pending user turn
    pub fn completed(&self) -> &[String] {
        let len = self.turns.len();
        if len % 2 == 1 {
            &self.turns[..len - 1]
        } else {
            &self.turns
        }
    }

    /// Completed (question, answer) exchanges in submission order
    pub fn exchanges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.completed()
            .chunks(2)
            .map(|pair| (pair[0].as_str(), pair[1].as_str()))
    }

    /// Iterate turns with their positional roles
    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.turns
            .iter()
            .enumerate()
            .map(|(i, text)| (Role::at(i), text.as_str()))
    }

    /// Drop all turns
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript_of(turns: &[&str]) -> Transcript {
        let mut t = Transcript::new();
        for (i, turn) in turns.iter().enumerate() {
            if i % 2 == 0 {
                t.push_user(*turn);
            } else {
                t.push_assistant(*turn);
            }
        }
        t
    }

    #[test]
    fn test_roles_alternate_from_user() {
        let t = transcript_of(&["q1", "a1", "q2", "a2"]);
        let roles: Vec<Role> = t.iter().map(|(role, _)| role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[test]
    fn test_pending_user_turn_excluded_from_completed() {
        let t = transcript_of(&["q1", "a1", "q2"]);
        assert!(t.has_pending_user());
        assert_eq!(t.completed(), ["q1".to_string(), "a1".to_string()]);
    }

    #[test]
    fn test_even_transcript_is_fully_completed() {
        let t = transcript_of(&["q1", "a1"]);
        assert!(!t.has_pending_user());
        assert_eq!(t.completed().len(), 2);
    }

    #[test]
    fn test_exchanges_pair_in_order() {
        let t = transcript_of(&["q1", "a1", "q2", "a2", "q3"]);
        let pairs: Vec<(&str, &str)> = t.exchanges().collect();
        assert_eq!(pairs, vec![("q1", "a1"), ("q2", "a2")]);
    }

    #[test]
    fn test_clear_empties() {
        let mut t = transcript_of(&["q1", "a1"]);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.exchanges().count(), 0);
    }
}
