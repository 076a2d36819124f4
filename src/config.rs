use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the food/restaurant CSV dataset
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Optional JSON file overriding the built-in category code tables
    #[serde(default)]
    pub category_tables_path: Option<String>,

    /// Redis connection URL; saved items are kept in memory when unset
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Generative-language API key; the chat endpoint is disabled when unset
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    /// Generative-language API base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Generative-language model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of recommendations returned when the caller does not pass `k`
    #[serde(default = "default_recommendations")]
    pub default_recommendations: usize,

    /// Upper bound accepted for `k`
    #[serde(default = "default_max_recommendations")]
    pub max_recommendations: usize,

    /// Requests allowed per client address in each window; 0 disables the limit
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,

    /// Rate-limit window length in seconds
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,
}

fn default_catalog_path() -> String {
    "data/food_with_restaurants.csv".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_recommendations() -> usize {
    5
}

fn default_max_recommendations() -> usize {
    50
}

fn default_rate_limit_requests() -> u32 {
    10
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Address the HTTP listener binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_environment() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.catalog_path, "data/food_with_restaurants.csv");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.gemini_api_key, None);
        assert_eq!(config.default_recommendations, 5);
        assert_eq!(config.rate_limit_requests, 10);
        assert_eq!(config.rate_limit_window_secs, 60);
        assert_eq!(config.bind_address(), "127.0.0.1:3001");
    }

    #[test]
    fn test_overrides() {
        let vars = vec![
            ("PORT".to_string(), "8080".to_string()),
            ("REDIS_URL".to_string(), "redis://cache:6379".to_string()),
            ("DEFAULT_RECOMMENDATIONS".to_string(), "10".to_string()),
            ("RATE_LIMIT_REQUESTS".to_string(), "0".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(config.default_recommendations, 10);
        assert_eq!(config.rate_limit_requests, 0);
    }
}
