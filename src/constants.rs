// Defaults, overridable through the environment (or a .env file).

use std::env;

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_PORT: u16 = 9900;

lazy_static::lazy_static! {
    pub static ref CATALOG_PATH: String = env::var("NAVIGATOR_CATALOG").unwrap_or_else(|_| "data/services.json".to_string());
    pub static ref MODEL: String = env::var("NAVIGATOR_MODEL").unwrap_or_else(|_| "qwen2.5:14b".to_string());
    pub static ref MODEL_COMMAND: String = env::var("NAVIGATOR_COMMAND").unwrap_or_else(|_| "ollama".to_string());
    // Whitespace-separated arguments placed between the command and the model name.
    pub static ref MODEL_COMMAND_ARGS: Vec<String> = env::var("NAVIGATOR_COMMAND_ARGS")
        .map(|raw| raw.split_whitespace().map(str::to_string).collect())
        .unwrap_or_else(|_| vec!["run".to_string()]);
    pub static ref TIMEOUT_SECS: u64 = env::var("NAVIGATOR_TIMEOUT_SECS")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    pub static ref BACKEND: String = env::var("NAVIGATOR_BACKEND").unwrap_or_else(|_| "cli".to_string());
    pub static ref OLLAMA_URL: String = env::var("OLLAMA_URL").unwrap_or_else(|_| "http://127.0.0.1:11434".to_string());
}
