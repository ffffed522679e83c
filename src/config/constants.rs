pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_MODEL: &str = "minimax/minimax-m2:free";
pub const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

pub const DEFAULT_MAX_ITERATIONS_PER_GATE: u32 = 50;
pub const DEFAULT_WORKER_POOL_SIZE: usize = 4;
pub const DEFAULT_STAGE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BACKOFF_MS: u64 = 500;

/// Crew roles whose persona text may be overridden from the config file.
pub const KNOWN_ROLES: &[&str] = &[
    "collector",
    "validator",
    "optimizer",
    "architect",
    "engineer",
    "reviewer",
];
