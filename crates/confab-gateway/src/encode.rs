//! Context encoding: serialize prior turns into a provider's `state` parameter

use serde::Serialize;

use crate::history::{Role, Transcript};
use crate::provider::{Provider, StateFormat};

/// One transcript entry for providers that take a role-tagged history
#[derive(Serialize)]
struct TaggedTurn<'m> {
    role: &'m str,
    content: &'m str,
}

/// One completed exchange for providers that take question/answer pairs
#[derive(Serialize)]
struct Exchange<'m> {
    question: &'m str,
    answer: &'m str,
}

/// Build the `state` query parameter for the next request, or `None` when the
/// provider has nothing to continue from.
///
/// Only completed turns are encoded; a trailing pending user turn (already
/// visible in the conversation, but unanswered) never appears in the payload.
/// The transcript is read, never mutated, and encoding cannot fail.
pub fn encode_state(
    provider: Provider,
    transcript: &Transcript,
    continuation: Option<&str>,
) -> Option<String> {
    match provider.state_format() {
        StateFormat::ContinuationToken => continuation.map(str::to_owned),
        StateFormat::RoleTagged => {
            let turns = transcript.completed();
            if turns.is_empty() {
                return None;
            }
            let entries: Vec<TaggedTurn<'_>> = turns
                .iter()
                .enumerate()
                .map(|(i, content)| TaggedTurn {
                    role: Role::at(i).as_str(),
                    content,
                })
                .collect();
            serde_json::to_string(&entries).ok()
        }
        StateFormat::QuestionAnswer => {
            let pairs: Vec<Exchange<'_>> = transcript
                .exchanges()
                .map(|(question, answer)| Exchange { question, answer })
                .collect();
            if pairs.is_empty() {
                return None;
            }
            serde_json::to_string(&pairs).ok()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    /// Transcript of `n` turns where the last one is pending when `n` is odd
    fn transcript(n: usize) -> Transcript {
        let mut t = Transcript::new();
        for i in 0..n {
            if i % 2 == 0 {
                t.push_user(format!("question {}", i / 2 + 1));
            } else {
                t.push_assistant(format!("answer {}", i / 2 + 1));
            }
        }
        t
    }

    #[test]
    fn test_role_tagged_omitted_without_prior_turns() {
        let t = transcript(1);
        assert_eq!(encode_state(Provider::DeepAi, &t, None), None);
        assert_eq!(encode_state(Provider::Ava, &Transcript::new(), None), None);
    }

    #[test]
    fn test_role_tagged_excludes_pending_turn() {
        // Two completed turns plus the pending prompt: exactly two entries.
        let t = transcript(3);
        let state = encode_state(Provider::DeepAi, &t, None).unwrap();
        let entries: Vec<Value> = serde_json::from_str(&state).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["role"], "user");
        assert_eq!(entries[0]["content"], "question 1");
        assert_eq!(entries[1]["role"], "assistant");
        assert_eq!(entries[1]["content"], "answer 1");
    }

    #[test]
    fn test_role_tagged_alternates_for_any_history() {
        for n in 1..8 {
            let t = transcript(n);
            match encode_state(Provider::Ava, &t, None) {
                None => assert!(t.completed().is_empty()),
                Some(state) => {
                    let entries: Vec<Value> = serde_json::from_str(&state).unwrap();
                    assert_eq!(entries.len(), t.completed().len());
                    for (i, entry) in entries.iter().enumerate() {
                        let expected = if i % 2 == 0 { "user" } else { "assistant" };
                        assert_eq!(entry["role"], expected);
                    }
                }
            }
        }
    }

    #[test]
    fn test_question_answer_pairs_count() {
        for n in 1..8 {
            let t = transcript(n);
            match encode_state(Provider::You, &t, None) {
                None => assert!(t.exchanges().count() == 0),
                Some(state) => {
                    let pairs: Vec<Value> = serde_json::from_str(&state).unwrap();
                    assert_eq!(pairs.len(), t.completed().len() / 2);
                }
            }
        }
    }

    #[test]
    fn test_question_answer_pairs_ordered() {
        let t = transcript(5);
        let state = encode_state(Provider::You, &t, None).unwrap();
        let pairs: Vec<Value> = serde_json::from_str(&state).unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0]["question"], "question 1");
        assert_eq!(pairs[0]["answer"], "answer 1");
        assert_eq!(pairs[1]["question"], "question 2");
        assert_eq!(pairs[1]["answer"], "answer 2");
    }

    #[test]
    fn test_question_answer_is_pure_json() {
        // The payload is the pair transcript alone, with no token prefixed.
        let t = transcript(3);
        let state = encode_state(Provider::You, &t, Some("chat-1234")).unwrap();
        assert!(state.starts_with('['));
        assert!(serde_json::from_str::<Vec<Value>>(&state).is_ok());
    }

    #[test]
    fn test_continuation_token_verbatim() {
        let t = transcript(3);
        let state = encode_state(Provider::Bai, &t, Some("msg-42"));
        assert_eq!(state.as_deref(), Some("msg-42"));
    }

    #[test]
    fn test_continuation_token_omitted_before_first_capture() {
        let t = transcript(3);
        assert_eq!(encode_state(Provider::Bai, &t, None), None);
    }

    #[test]
    fn test_token_ignored_by_transcript_formats() {
        let t = transcript(1);
        // A stale token alone never produces state for transcript providers.
        assert_eq!(encode_state(Provider::DeepAi, &t, Some("msg-42")), None);
        assert_eq!(encode_state(Provider::You, &t, Some("msg-42")), None);
    }
}
