use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use super::EndpointCategory;
use crate::core::error::AppError;

/// Quota for one endpoint category: at most `max_requests` per fixed `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub category: EndpointCategory,
    pub window: Duration,
    pub max_requests: u32,
}

impl RateLimitPolicy {
    pub fn new(
        category: EndpointCategory,
        window: Duration,
        max_requests: u32,
    ) -> Result<Self, String> {
        if window.as_secs() == 0 || window.subsec_nanos() != 0 {
            return Err(format!(
                "{}: window must be a whole number of seconds greater than zero",
                category
            ));
        }
        if max_requests == 0 {
            return Err(format!("{}: max requests must be at least 1", category));
        }

        Ok(Self {
            category,
            window,
            max_requests,
        })
    }

    pub fn window_secs(&self) -> u64 {
        self.window.as_secs()
    }

    /// Fixed window containing `now`: `[start, start + window)`.
    pub fn window_bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        let window = self.window_secs() as i64;
        let now_secs = now.timestamp();
        let start_secs = now_secs - now_secs.rem_euclid(window);

        let start = DateTime::from_timestamp(start_secs, 0).unwrap_or(now);
        let end = start + chrono::Duration::seconds(window);
        (start, end)
    }
}

/// Static mapping from endpoint category to its quota.
///
/// A category missing from the table cannot be gated: checks against it fail
/// with a configuration error rather than allowing the request.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyTable {
    policies: BTreeMap<EndpointCategory, RateLimitPolicy>,
}

impl PolicyTable {
    /// Quotas tuned to model cost: competitor analysis is the most expensive call
    pub fn defaults() -> Self {
        let policies = [
            (EndpointCategory::GenerateReply, 60, 10),
            (EndpointCategory::GeneratePost, 60, 5),
            (EndpointCategory::AnalyzeCompetitor, 3600, 3),
        ]
        .into_iter()
        .map(|(category, window_secs, max_requests)| {
            (
                category,
                RateLimitPolicy {
                    category,
                    window: Duration::from_secs(window_secs),
                    max_requests,
                },
            )
        })
        .collect();

        Self { policies }
    }

    pub fn from_policies(
        policies: impl IntoIterator<Item = RateLimitPolicy>,
    ) -> Result<Self, String> {
        let mut table = BTreeMap::new();
        for policy in policies {
            if table.insert(policy.category, policy).is_some() {
                return Err(format!("duplicate policy for '{}'", policy.category));
            }
        }
        Ok(Self { policies: table })
    }

    /// Parse overrides on top of the defaults.
    ///
    /// Format: `category=max/window_secs` entries separated by commas, e.g.
    /// `generate-post=5/60,analyze-competitor=off`. `off` removes the category
    /// from the table.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut table = Self::defaults();
        let mut seen = Vec::new();

        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (tag, value) = entry
                .split_once('=')
                .ok_or_else(|| format!("expected 'category=max/window_secs', got '{}'", entry))?;

            let category: EndpointCategory = tag.trim().parse().map_err(|e: AppError| e.to_string())?;
            if seen.contains(&category) {
                return Err(format!("'{}' is configured more than once", category));
            }
            seen.push(category);

            let value = value.trim();
            if value.eq_ignore_ascii_case("off") {
                table.policies.remove(&category);
                continue;
            }

            let (max, window) = value
                .split_once('/')
                .ok_or_else(|| format!("{}: expected 'max/window_secs', got '{}'", category, value))?;
            let max_requests = max
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("{}: invalid max requests '{}'", category, max))?;
            let window_secs = window
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("{}: invalid window '{}'", category, window))?;

            let policy =
                RateLimitPolicy::new(category, Duration::from_secs(window_secs), max_requests)?;
            table.policies.insert(category, policy);
        }

        Ok(table)
    }

    pub fn get(&self, category: EndpointCategory) -> Option<&RateLimitPolicy> {
        self.policies.get(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RateLimitPolicy> {
        self.policies.values()
    }

    /// Fail fast at startup when a gated category has no policy.
    pub fn ensure_covers(&self, categories: &[EndpointCategory]) -> Result<(), AppError> {
        let missing: Vec<&str> = categories
            .iter()
            .filter(|c| !self.policies.contains_key(c))
            .map(|c| c.as_str())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Configuration(format!(
                "No rate limit policy configured for gated categories: {}",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(window_secs: u64, max: u32) -> RateLimitPolicy {
        RateLimitPolicy::new(
            EndpointCategory::GeneratePost,
            Duration::from_secs(window_secs),
            max,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_cover_every_category() {
        let table = PolicyTable::defaults();
        assert!(table.ensure_covers(&EndpointCategory::ALL).is_ok());
        assert_eq!(
            table.get(EndpointCategory::GeneratePost).unwrap().max_requests,
            5
        );
    }

    #[test]
    fn test_parse_overrides_defaults() {
        let table = PolicyTable::parse("generate-post=20/120, generate-reply = 3/30").unwrap();

        let post = table.get(EndpointCategory::GeneratePost).unwrap();
        assert_eq!(post.max_requests, 20);
        assert_eq!(post.window_secs(), 120);

        let reply = table.get(EndpointCategory::GenerateReply).unwrap();
        assert_eq!(reply.max_requests, 3);

        // Untouched categories keep their defaults
        assert_eq!(
            table.get(EndpointCategory::AnalyzeCompetitor),
            PolicyTable::defaults().get(EndpointCategory::AnalyzeCompetitor)
        );
    }

    #[test]
    fn test_parse_off_removes_category() {
        let table = PolicyTable::parse("analyze-competitor=off").unwrap();
        assert!(table.get(EndpointCategory::AnalyzeCompetitor).is_none());

        let err = table
            .ensure_covers(&[EndpointCategory::AnalyzeCompetitor])
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_parse_rejects_bad_entries() {
        assert!(PolicyTable::parse("generate-image=5/60").is_err());
        assert!(PolicyTable::parse("generate-post=5").is_err());
        assert!(PolicyTable::parse("generate-post=0/60").is_err());
        assert!(PolicyTable::parse("generate-post=5/0").is_err());
        assert!(PolicyTable::parse("generate-post=five/60").is_err());
        assert!(PolicyTable::parse("generate-post=5/60,generate-post=6/60").is_err());
        assert!(PolicyTable::parse("generate-post").is_err());
    }

    #[test]
    fn test_from_policies_rejects_duplicates() {
        assert!(PolicyTable::from_policies([policy(60, 5), policy(30, 1)]).is_err());
    }

    #[test]
    fn test_window_bounds_align_to_window() {
        let policy = policy(60, 5);
        let now = DateTime::from_timestamp(1_700_000_125, 0).unwrap();

        let (start, end) = policy.window_bounds(now);
        assert_eq!(start.timestamp(), 1_700_000_100);
        assert_eq!(end.timestamp(), 1_700_000_160);
        assert!(start <= now && now < end);
    }

    #[test]
    fn test_window_bounds_on_boundary_start_new_window() {
        let policy = policy(60, 5);
        let now = DateTime::from_timestamp(1_700_000_160, 0).unwrap();

        let (start, _) = policy.window_bounds(now);
        assert_eq!(start, now);
    }
}
