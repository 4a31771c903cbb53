use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub ai_base_url: String,
    pub ai_model: String,
    pub ai_temperature: f64,
    pub ai_max_tokens: u32,
    pub ai_request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            groq_api_key: get_env("GROQ_API_KEY")?,
            ai_base_url: get_env_or("AI_BASE_URL", "https://api.groq.com/openai/v1"),
            ai_model: get_env_or("AI_MODEL", "gemma2-9b-it"),
            ai_temperature: get_env_parse_or("AI_TEMPERATURE", 0.7)?,
            ai_max_tokens: get_env_parse_or("AI_MAX_TOKENS", 2000)?,
            ai_request_timeout_secs: get_env_parse_or("AI_REQUEST_TIMEOUT_SECS", 120)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
