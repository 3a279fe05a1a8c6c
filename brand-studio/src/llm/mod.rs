//! Model access: the Gemini REST client, retry policy, JSON extraction, and a scripted model.

pub mod gemini;
pub mod mock;
pub mod retry;

pub use gemini::{GEMINI_API_BASE, GeminiClient, GeminiFailure};
pub use mock::ScriptedLlm;
pub use retry::{
    RetryConfig, RetryDecision, execute_with_retry, is_retryable_rpc_status,
    is_retryable_status_code,
};

use brand_core::{BrandError, Result};
use serde::de::DeserializeOwned;

/// Parses a model reply as JSON, tolerating Markdown code fences and
/// leading or trailing prose around a single object.
pub fn parse_json_reply<T: DeserializeOwned>(stage: &str, text: &str) -> Result<T> {
    let body = extract_json(text)
        .ok_or_else(|| BrandError::malformed(stage, "reply contains no JSON object"))?;
    serde_json::from_str(body).map_err(|e| BrandError::malformed(stage, e.to_string()))
}

fn extract_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    let unfenced = match trimmed.strip_prefix("```") {
        Some(rest) => {
            let rest = rest.strip_prefix("json").unwrap_or(rest);
            rest.rsplit_once("```").map(|(inner, _)| inner).unwrap_or(rest).trim()
        }
        None => trimmed,
    };
    let start = unfenced.find('{')?;
    let end = unfenced.rfind('}')?;
    (start < end).then(|| &unfenced[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Reply {
        value: u32,
    }

    #[test]
    fn test_plain_and_fenced_json() {
        let plain: Reply = parse_json_reply("test", r#"{"value": 1}"#).unwrap();
        assert_eq!(plain, Reply { value: 1 });

        let fenced: Reply = parse_json_reply("test", "```json\n{\"value\": 2}\n```").unwrap();
        assert_eq!(fenced, Reply { value: 2 });

        let chatty: Reply = parse_json_reply("test", "Sure! {\"value\": 3} Hope it helps").unwrap();
        assert_eq!(chatty, Reply { value: 3 });
    }

    #[test]
    fn test_malformed_reply() {
        let err = parse_json_reply::<Reply>("generation", "no json here").unwrap_err();
        assert!(err.is_malformed_output());

        let err = parse_json_reply::<Reply>("generation", r#"{"other": 1}"#).unwrap_err();
        assert!(matches!(
            err,
            BrandError::MalformedOutput { ref stage, .. } if stage == "generation"
        ));
    }
}
