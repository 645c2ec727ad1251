use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

/// S3/MinIO bucket used for uploaded food photos.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Hosted model credentials. A missing key leaves that client disabled; calls
/// through it fail with `AiError::NotConfigured` instead of at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_thinking_budget: u32,
    pub chat_api_key: Option<String>,
    pub chat_base_url: String,
    pub chat_model: String,
    pub mistral_api_key: Option<String>,
    pub mistral_base_url: String,
    pub mistral_model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanConfig {
    pub validator_threshold: f64,
    pub similarity_threshold: f64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            validator_threshold: 0.3,
            similarity_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
    pub scan: ScanConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: env_or("JWT_ISSUER", "nutrisense"),
            audience: env_or("JWT_AUDIENCE", "nutrisense-users"),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let storage = StorageConfig {
            endpoint: std::env::var("MINIO_ENDPOINT")?,
            bucket: env_or("MINIO_BUCKET", "food-images"),
            access_key: std::env::var("MINIO_ACCESS_KEY")?,
            secret_key: std::env::var("MINIO_SECRET_KEY")?,
            region: env_or("MINIO_REGION", "us-east-1"),
        };
        let ai = AiConfig {
            gemini_api_key: env_opt("GEMINI_API_KEY").or_else(|| env_opt("GOOGLE_API_KEY")),
            gemini_model: env_or("GEMINI_MODEL", "gemini-2.5-pro"),
            gemini_thinking_budget: env_parse(
                "GEMINI_THINKING_BUDGET",
                crate::ai::DEFAULT_THINKING_BUDGET,
            ),
            chat_api_key: env_opt("DEEPSEEK_API_KEY"),
            chat_base_url: env_or("DEEPSEEK_BASE_URL", "https://api.deepseek.com"),
            chat_model: env_or("DEEPSEEK_MODEL", "deepseek-chat"),
            mistral_api_key: env_opt("MISTRAL_API_KEY"),
            mistral_base_url: env_or("MISTRAL_BASE_URL", "https://api.mistral.ai/v1"),
            mistral_model: env_or("MISTRAL_MODEL", "pixtral-12b-2409"),
            request_timeout_secs: env_parse("AI_REQUEST_TIMEOUT_SECS", 60),
        };
        let defaults = ScanConfig::default();
        let scan = ScanConfig {
            validator_threshold: env_parse("SCAN_VALIDATOR_THRESHOLD", defaults.validator_threshold),
            similarity_threshold: env_parse(
                "SCAN_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            ),
        };
        Ok(Self {
            database_url,
            jwt,
            storage,
            ai,
            scan,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
