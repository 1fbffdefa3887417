use super::request::EnrichmentRequest;
use super::EnrichmentError;
use async_trait::async_trait;
use serde_json::Value;

/// External service turning collected tiles into recommendations.
///
/// Returns the raw reply; its shape is validated when merged so a
/// structurally wrong reply degrades to "no recommendations".
#[async_trait]
pub trait RecommendationService: Send + Sync {
    async fn recommend(&self, request: &EnrichmentRequest) -> Result<Value, EnrichmentError>;
}

/// Remove a surrounding Markdown code fence (with or without a language tag)
pub fn strip_markdown_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string on the opening fence line
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
}

/// Parse a text reply that may be wrapped in a code fence
pub fn parse_model_reply(text: &str) -> Result<Value, EnrichmentError> {
    let body = strip_markdown_fence(text);
    if body.is_empty() {
        return Err(EnrichmentError::InvalidResponse("empty reply".to_string()));
    }
    serde_json::from_str(body).map_err(|e| EnrichmentError::InvalidResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_fence_variants() {
        assert_eq!(strip_markdown_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_markdown_fence("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_markdown_fence("  {\"b\": 2} "), "{\"b\": 2}");
    }

    #[test]
    fn test_parse_model_reply() {
        let reply = "```json\n{\"tiles\": []}\n```";
        assert_eq!(parse_model_reply(reply).unwrap(), json!({"tiles": []}));

        let err = parse_model_reply("Sorry, I cannot help").unwrap_err();
        assert!(matches!(err, EnrichmentError::InvalidResponse(_)));
        assert!(parse_model_reply("```\n```").is_err());
    }
}
