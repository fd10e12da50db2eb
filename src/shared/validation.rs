use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for BCP 47 style language tags accepted by the AI endpoints
    /// - Valid: "en", "id", "en-US", "pt-BR"
    /// - Invalid: "EN", "english", "en_US", "en-us", ""
    pub static ref LANGUAGE_TAG_REGEX: Regex = Regex::new(r"^[a-z]{2,3}(?:-[A-Z]{2})?$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_tag_regex_valid() {
        assert!(LANGUAGE_TAG_REGEX.is_match("en"));
        assert!(LANGUAGE_TAG_REGEX.is_match("id"));
        assert!(LANGUAGE_TAG_REGEX.is_match("en-US"));
        assert!(LANGUAGE_TAG_REGEX.is_match("pt-BR"));
        assert!(LANGUAGE_TAG_REGEX.is_match("fil"));
    }

    #[test]
    fn test_language_tag_regex_invalid() {
        assert!(!LANGUAGE_TAG_REGEX.is_match("EN")); // uppercase language
        assert!(!LANGUAGE_TAG_REGEX.is_match("english")); // full name
        assert!(!LANGUAGE_TAG_REGEX.is_match("en_US")); // underscore
        assert!(!LANGUAGE_TAG_REGEX.is_match("en-us")); // lowercase region
        assert!(!LANGUAGE_TAG_REGEX.is_match("")); // empty
    }
}
