use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chat sources the extension knows how to capture.
#[derive(sqlx::Type, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(rename_all = "lowercase", type_name = "varchar")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Chatgpt,
    Claude,
    Gemini,
    Grok,
    Perplexity,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Chatgpt => "chatgpt",
            Provider::Claude => "claude",
            Provider::Gemini => "gemini",
            Provider::Grok => "grok",
            Provider::Perplexity => "perplexity",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "chatgpt" => Ok(Provider::Chatgpt),
            "claude" => Ok(Provider::Claude),
            "gemini" => Ok(Provider::Gemini),
            "grok" => Ok(Provider::Grok),
            "perplexity" => Ok(Provider::Perplexity),
            other => Err(format!("unknown provider: {}", other)),
        }
    }
}
