use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub generation: GenerationConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub base_url: String,
    pub token: String,
    pub warehouse_id: String,
    pub parent_path: String,
}

#[derive(Clone, Debug)]
pub struct GenerationConfig {
    /// Caller-side poll cap; advertised in progress responses so UIs can
    /// stop polling without the server killing the worker.
    pub max_poll_attempts: u32,
    pub poll_interval_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let get = |key: &str, default: &str| -> String {
            env::var(key).unwrap_or_else(|_| default.to_string())
        };
        let require = |key: &str| -> anyhow::Result<String> {
            env::var(key).map_err(|_| anyhow::anyhow!("missing required env var {key}"))
        };

        Ok(Self {
            server: ServerConfig {
                host: get("DASHGEN_HOST", "0.0.0.0"),
                port: get("DASHGEN_PORT", "8080").parse()?,
            },
            llm: LlmConfig {
                base_url: get("LLM_BASE_URL", "https://api.openai.com/v1"),
                api_key: require("LLM_API_KEY")?,
                model: get("LLM_MODEL", "gpt-4o"),
            },
            store: StoreConfig {
                base_url: require("DASHBOARD_STORE_URL")?,
                token: require("DASHBOARD_STORE_TOKEN")?,
                warehouse_id: require("DASHBOARD_WAREHOUSE_ID")?,
                parent_path: get("DASHBOARD_PARENT_PATH", "/Shared"),
            },
            generation: GenerationConfig {
                max_poll_attempts: get("GENERATION_MAX_POLLS", "300").parse()?,
                poll_interval_ms: get("GENERATION_POLL_INTERVAL_MS", "500").parse()?,
            },
        })
    }
}
