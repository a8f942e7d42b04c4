use crate::models::{MessageRole, Provider};
use serde::Deserialize;
use serde_valid::Validate;
use std::str::FromStr;

/// One complete snapshot of a conversation, as pushed by the agent.
/// Treated as an ordered, full replacement of the conversation's messages.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SyncForm {
    #[validate(min_length = 1)]
    pub provider: String,
    #[validate(min_length = 1)]
    pub external_id: String,
    #[validate(max_length = 500)]
    pub title: Option<String>,
    #[validate(max_length = 2000)]
    pub url: Option<String>,
    #[validate]
    pub messages: Vec<SyncMessageForm>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SyncMessageForm {
    pub role: MessageRole,
    pub content: String,
    #[validate(minimum = 0)]
    pub index: i64,
}

impl SyncForm {
    /// Provider strings arrive from an untrusted client; anything outside
    /// the supported set is a 400, not a 500.
    pub fn parse_provider(&self) -> Result<Provider, String> {
        Provider::from_str(&self.provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_payload() {
        let form: SyncForm = serde_json::from_str(
            r#"{
                "provider": "chatgpt",
                "externalId": "abc",
                "title": "Greetings",
                "url": "https://chatgpt.com/c/abc",
                "messages": [
                    {"role": "user", "content": "Hi", "index": 0},
                    {"role": "assistant", "content": "Hello!", "index": 1}
                ]
            }"#,
        )
        .expect("payload should deserialize");

        assert_eq!(form.external_id, "abc");
        assert_eq!(form.messages.len(), 2);
        assert_eq!(form.messages[1].role, MessageRole::Assistant);
        assert!(form.validate().is_ok());
        assert_eq!(form.parse_provider().unwrap(), Provider::Chatgpt);
    }

    #[test]
    fn missing_external_id_fails_deserialization() {
        let result = serde_json::from_str::<SyncForm>(
            r#"{"provider": "chatgpt", "messages": []}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn empty_external_id_fails_validation() {
        let form: SyncForm = serde_json::from_str(
            r#"{"provider": "chatgpt", "externalId": "", "messages": []}"#,
        )
        .unwrap();
        assert!(form.validate().is_err());
    }

    #[test]
    fn unknown_provider_is_rejected_on_parse() {
        let form: SyncForm = serde_json::from_str(
            r#"{"provider": "copilot", "externalId": "abc", "messages": []}"#,
        )
        .unwrap();
        assert!(form.parse_provider().is_err());
    }
}
