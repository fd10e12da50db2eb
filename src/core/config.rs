use std::env;
use std::time::Duration;

use crate::features::rate_limits::models::PolicyTable;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub rate_limit: RateLimitConfig,
    pub usage: UsageConfig,
    pub ai: AiProviderConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    pub jwks_url: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Where rate limit counters live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterBackend {
    Postgres,
    Redis,
    /// Single process only. Counters are lost on restart and not shared between replicas.
    Memory,
}

impl std::str::FromStr for CounterBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "redis" => Ok(Self::Redis),
            "memory" => Ok(Self::Memory),
            other => Err(format!(
                "RATE_LIMIT_BACKEND must be one of postgres, redis, memory (got '{}')",
                other
            )),
        }
    }
}

/// Rate limiting for the AI endpoints
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub backend: CounterBackend,
    /// Required when `backend` is `Redis`
    pub redis_url: Option<String>,
    /// Namespace for counter keys in the shared store
    pub key_prefix: String,
    pub policies: PolicyTable,
    /// Upper bound on a single counter store round trip
    pub store_timeout: Duration,
    /// When false, a denied attempt hands its unit back to the window
    pub count_denied_attempts: bool,
    /// How often expired Postgres counters are purged
    pub purge_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct UsageConfig {
    pub channel_capacity: usize,
    pub batch_size: usize,
}

/// OpenAI-compatible chat completion provider
#[derive(Debug, Clone)]
pub struct AiProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            rate_limit: RateLimitConfig::from_env()?,
            usage: UsageConfig::from_env()?,
            ai: AiProviderConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_env("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_env("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_env(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_env("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_env("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let issuer = env::var("AUTH_ISSUER")
            .map_err(|_| "AUTH_ISSUER environment variable is required".to_string())?;

        let audience = env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "authenticated".to_string());

        // Hosted auth providers publish keys under the well-known path by default
        let jwks_url = env::var("AUTH_JWKS_URL").unwrap_or_else(|_| {
            format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/'))
        });

        let jwks_cache_ttl_secs =
            parse_env("JWKS_CACHE_TTL", Self::DEFAULT_JWKS_CACHE_TTL_SECS)?;
        let jwt_leeway_secs = parse_env("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            issuer,
            audience,
            jwks_url,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title =
            env::var("SWAGGER_TITLE").unwrap_or_else(|_| "GMB Dashboard API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "AI endpoints for the Google Business Profile dashboard".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl RateLimitConfig {
    const DEFAULT_KEY_PREFIX: &'static str = "gmb:ai-rl";
    const DEFAULT_STORE_TIMEOUT_MS: u64 = 500;
    const DEFAULT_PURGE_INTERVAL_SECS: u64 = 300; // 5 minutes

    pub fn from_env() -> Result<Self, String> {
        let backend = env::var("RATE_LIMIT_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<CounterBackend>()?;

        let redis_url = env::var("REDIS_URL").ok().filter(|s| !s.is_empty());
        if backend == CounterBackend::Redis && redis_url.is_none() {
            return Err("REDIS_URL must be set when RATE_LIMIT_BACKEND=redis".to_string());
        }

        let key_prefix = env::var("RATE_LIMIT_KEY_PREFIX")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Self::DEFAULT_KEY_PREFIX.to_string());

        let policies = match env::var("AI_RATE_LIMITS") {
            Ok(raw) if !raw.trim().is_empty() => {
                PolicyTable::parse(&raw).map_err(|e| format!("Invalid AI_RATE_LIMITS: {}", e))?
            }
            _ => PolicyTable::defaults(),
        };

        let store_timeout_ms =
            parse_env_nonzero("RATE_LIMIT_STORE_TIMEOUT_MS", Self::DEFAULT_STORE_TIMEOUT_MS)?;
        let count_denied_attempts = parse_env("RATE_LIMIT_COUNT_DENIED", true)?;
        let purge_interval_secs = parse_env_nonzero(
            "RATE_LIMIT_PURGE_INTERVAL_SECS",
            Self::DEFAULT_PURGE_INTERVAL_SECS,
        )?;

        Ok(Self {
            backend,
            redis_url,
            key_prefix,
            policies,
            store_timeout: Duration::from_millis(store_timeout_ms),
            count_denied_attempts,
            purge_interval: Duration::from_secs(purge_interval_secs),
        })
    }
}

impl UsageConfig {
    const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
    const DEFAULT_BATCH_SIZE: usize = 50;

    pub fn from_env() -> Result<Self, String> {
        let channel_capacity =
            parse_env("USAGE_LOG_CHANNEL_CAPACITY", Self::DEFAULT_CHANNEL_CAPACITY)?;
        let batch_size = parse_env("USAGE_LOG_BATCH_SIZE", Self::DEFAULT_BATCH_SIZE)?;

        if channel_capacity == 0 || batch_size == 0 {
            return Err(
                "USAGE_LOG_CHANNEL_CAPACITY and USAGE_LOG_BATCH_SIZE must be at least 1"
                    .to_string(),
            );
        }

        Ok(Self {
            channel_capacity,
            batch_size,
        })
    }
}

impl AiProviderConfig {
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let base_url = env::var("AI_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let api_key = env::var("AI_API_KEY")
            .map_err(|_| "AI_API_KEY environment variable is required".to_string())?;

        let model = env::var("AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let request_timeout_secs =
            parse_env("AI_REQUEST_TIMEOUT_SECS", Self::DEFAULT_REQUEST_TIMEOUT_SECS)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }
}

/// Read an optional variable, falling back to `default` when unset
fn parse_env<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid value (got '{}')", key, raw)),
        _ => Ok(default),
    }
}

/// Like [`parse_env`] for durations and sizes where zero is meaningless
fn parse_env_nonzero(key: &str, default: u64) -> Result<u64, String> {
    match parse_env(key, default)? {
        0 => Err(format!("{} must be at least 1", key)),
        value => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_backend_parse() {
        assert_eq!("postgres".parse::<CounterBackend>(), Ok(CounterBackend::Postgres));
        assert_eq!(" Redis ".parse::<CounterBackend>(), Ok(CounterBackend::Redis));
        assert_eq!("memory".parse::<CounterBackend>(), Ok(CounterBackend::Memory));
        assert!("memcached".parse::<CounterBackend>().is_err());
    }

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("GMB_TEST_DEFINITELY_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_nonzero_rejects_zero() {
        std::env::set_var("GMB_TEST_NONZERO_ZERO", "0");
        let err = parse_env_nonzero("GMB_TEST_NONZERO_ZERO", 300).unwrap_err();
        assert!(err.contains("GMB_TEST_NONZERO_ZERO"));

        std::env::set_var("GMB_TEST_NONZERO_SET", " 15 ");
        assert_eq!(parse_env_nonzero("GMB_TEST_NONZERO_SET", 300), Ok(15));
        assert_eq!(parse_env_nonzero("GMB_TEST_NONZERO_UNSET", 300), Ok(300));
    }

    #[test]
    fn test_rate_limit_config_rejects_zero_intervals() {
        for key in ["RATE_LIMIT_PURGE_INTERVAL_SECS", "RATE_LIMIT_STORE_TIMEOUT_MS"] {
            std::env::set_var("RATE_LIMIT_BACKEND", "memory");
            std::env::set_var(key, "0");
            let err = RateLimitConfig::from_env().unwrap_err();
            std::env::remove_var(key);
            assert!(err.contains(key), "unexpected error: {}", err);
        }
        std::env::remove_var("RATE_LIMIT_BACKEND");
    }

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert_eq!(swagger.credentials(), None);

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials(), Some("admin:secret".to_string()));
    }
}
