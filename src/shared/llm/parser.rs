use lazy_static::lazy_static;
use regex::Regex;

use super::LlmResponse;

lazy_static! {
    /// `,}` and `,]` left behind by models
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();

    /// `"a" + "b"` style concatenation
    static ref STRING_CONCAT_RE: Regex = Regex::new(r#""\s*\+\s*""#).unwrap();
}

/// Pull the JSON object out of a model reply.
///
/// Accepts a ```json fenced block, a bare fenced block, a reply that is only JSON,
/// or JSON surrounded by prose (first `{` to last `}`).
pub fn extract_json_string(text: &str) -> Result<String, String> {
    if let Some(after) = text.split("```json").nth(1) {
        return after
            .split("```")
            .next()
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "Unterminated ```json block".to_string());
    }

    if let Some(start) = text.find("```") {
        let fenced = &text[start + 3..];
        if let Some(newline) = fenced.find('\n') {
            let body = &fenced[newline + 1..];
            if let Some(end) = body.find("```") {
                return Ok(body[..end].trim().to_string());
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => Ok(text[start..=end].to_string()),
        (None, _) => Err("No JSON object found in response".to_string()),
        _ => Err("Invalid JSON boundaries in response".to_string()),
    }
}

fn apply_quick_fixes(json_str: &str) -> String {
    let joined = STRING_CONCAT_RE.replace_all(json_str, "");
    TRAILING_COMMA_RE.replace_all(&joined, "$1").to_string()
}

fn repair_json(json_str: &str) -> Option<String> {
    let options = llm_json::RepairOptions::default();
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        llm_json::repair_json(json_str, &options)
    }));

    match result {
        Ok(Ok(repaired)) => Some(repaired),
        Ok(Err(e)) => {
            tracing::debug!("JSON repair failed: {:?}", e);
            None
        }
        Err(_) => {
            tracing::warn!("JSON repair panicked");
            None
        }
    }
}

fn try_parse<T: LlmResponse>(text: &str) -> Result<T, String> {
    let json_str = extract_json_string(text)?;

    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    if let Ok(parsed) = serde_json::from_str::<T>(&apply_quick_fixes(&json_str)) {
        tracing::debug!("Model JSON parsed after quick fixes");
        return Ok(parsed);
    }

    if let Some(repaired) = repair_json(&json_str) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("Model JSON parsed after repair");
            return Ok(parsed);
        }
    }

    Err(format!(
        "Unparseable model output: {}",
        json_str.chars().take(200).collect::<String>()
    ))
}

/// Parse model output into `T`, returning `T::default()` marked as a fallback
/// when every repair strategy fails.
pub fn parse_with_fallback<T: LlmResponse>(text: &str) -> T {
    match try_parse::<T>(text) {
        Ok(parsed) => parsed,
        Err(error_msg) => {
            tracing::warn!("Model output parsing failed, using fallback: {}", error_msg);
            let mut fallback = T::default();
            fallback.mark_as_fallback(error_msg);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    fn default_true() -> bool {
        true
    }

    #[derive(Debug, Default, Deserialize, JsonSchema)]
    struct KeywordSuggestions {
        keywords: Vec<String>,
        #[serde(default = "default_true")]
        #[schemars(skip)]
        parsed: bool,
        #[serde(default)]
        #[schemars(skip)]
        error: Option<String>,
    }

    impl LlmResponse for KeywordSuggestions {
        fn mark_as_fallback(&mut self, error_message: String) {
            self.parsed = false;
            self.error = Some(error_message);
        }

        fn is_success(&self) -> bool {
            self.parsed
        }
    }

    #[test]
    fn test_extract_from_json_fence() {
        let reply = "Sure!\n```json\n{\"keywords\": [\"bakery\"]}\n```\nAnything else?";
        assert_eq!(
            extract_json_string(reply).unwrap(),
            r#"{"keywords": ["bakery"]}"#
        );
    }

    #[test]
    fn test_extract_from_bare_fence() {
        let reply = "```\n{\"keywords\": []}\n```";
        assert_eq!(extract_json_string(reply).unwrap(), r#"{"keywords": []}"#);
    }

    #[test]
    fn test_extract_embedded_in_prose() {
        let reply = "Result: {\"keywords\": [\"cafe\"]} hope this helps";
        assert_eq!(
            extract_json_string(reply).unwrap(),
            r#"{"keywords": ["cafe"]}"#
        );
    }

    #[test]
    fn test_extract_without_json_fails() {
        assert!(extract_json_string("I cannot help with that.").is_err());
    }

    #[test]
    fn test_quick_fixes_trailing_comma_and_concat() {
        let fixed = apply_quick_fixes(r#"{"keywords": ["best " + "coffee",],}"#);
        let parsed: KeywordSuggestions = serde_json::from_str(&fixed).unwrap();
        assert_eq!(parsed.keywords, vec!["best coffee".to_string()]);
    }

    #[test]
    fn test_parse_with_fallback_success() {
        let parsed: KeywordSuggestions =
            parse_with_fallback(r#"{"keywords": ["florist", "flowers near me"]}"#);
        assert!(parsed.is_success());
        assert_eq!(parsed.keywords.len(), 2);
    }

    #[test]
    fn test_parse_with_fallback_marks_failure() {
        let parsed: KeywordSuggestions = parse_with_fallback("no structured data here");
        assert!(!parsed.is_success());
        assert!(parsed.keywords.is_empty());
        assert!(parsed.error.is_some());
    }
}
