//! Provider identifiers and their state-continuation conventions

use serde::{Deserialize, Serialize};

/// Upstream providers reachable through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ava,
    Bai,
    DeepAi,
    You,
}

/// How a provider expects prior conversation state to be serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFormat {
    /// The most recent continuation token, verbatim
    ContinuationToken,
    /// JSON array of `{role, content}` entries over completed turns
    RoleTagged,
    /// JSON array of `{question, answer}` pairs over completed exchanges
    QuestionAnswer,
}

impl Provider {
    /// All known providers, in display order
    pub const ALL: [Provider; 4] = [
        Provider::Ava,
        Provider::Bai,
        Provider::DeepAi,
        Provider::You,
    ];

    /// Wire identifier used in the `provider` query parameter
    pub fn id(&self) -> &'static str {
        match self {
            Provider::Ava => "ava",
            Provider::Bai => "bai",
            Provider::DeepAi => "deepai",
            Provider::You => "you",
        }
    }

    /// Human-readable name for this provider
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Ava => "Ava (gpt-3.5-turbo)",
            Provider::Bai => "BAI (gpt-3.5)",
            Provider::DeepAi => "DeepAI (gpt-3)",
            Provider::You => "You",
        }
    }

    /// Look up a provider by its wire identifier
    pub fn from_id(id: &str) -> Option<Provider> {
        Provider::ALL.iter().copied().find(|p| p.id() == id)
    }

    /// The state serialization this provider expects
    pub fn state_format(&self) -> StateFormat {
        match self {
            Provider::Ava | Provider::DeepAi => StateFormat::RoleTagged,
            Provider::Bai => StateFormat::ContinuationToken,
            Provider::You => StateFormat::QuestionAnswer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_round_trips() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_id(provider.id()), Some(provider));
        }
    }

    #[test]
    fn test_from_id_unknown() {
        assert_eq!(Provider::from_id("gpt4all"), None);
        assert_eq!(Provider::from_id(""), None);
    }

    #[test]
    fn test_state_formats() {
        assert_eq!(Provider::Ava.state_format(), StateFormat::RoleTagged);
        assert_eq!(Provider::DeepAi.state_format(), StateFormat::RoleTagged);
        assert_eq!(Provider::Bai.state_format(), StateFormat::ContinuationToken);
        assert_eq!(Provider::You.state_format(), StateFormat::QuestionAnswer);
    }
}
