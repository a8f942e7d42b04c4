use crate::models::Provider;
use serde::Deserialize;
use serde_valid::Validate;
use std::str::FromStr;

/// Toggle request for one message, addressed by snapshot position.
/// Positions are the only message reference that survives a re-sync.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkToggleForm {
    #[validate(min_length = 1)]
    pub provider: String,
    #[validate(min_length = 1)]
    pub external_id: String,
    #[validate(minimum = 0)]
    pub message_index: i64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkStatusForm {
    #[validate(min_length = 1)]
    pub provider: String,
    #[validate(min_length = 1)]
    pub external_id: String,
}

impl BookmarkToggleForm {
    pub fn parse_provider(&self) -> Result<Provider, String> {
        Provider::from_str(&self.provider)
    }
}

impl BookmarkStatusForm {
    pub fn parse_provider(&self) -> Result<Provider, String> {
        Provider::from_str(&self.provider)
    }
}
