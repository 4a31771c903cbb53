pub mod config;
pub mod dto;
pub mod error;
pub mod models;
pub mod services;

use crate::config::Config;
use crate::error::Result;
use crate::services::generator::AiQuestionGenerator;
use crate::services::notification::TracingSink;
use crate::services::provider::{GenerationConfig, GroqClient};
use crate::services::wizard::WizardController;
use std::sync::Arc;
use std::time::Duration;

/// Wires a wizard against the real Groq provider and the logging
/// notification sink.
pub fn build_wizard(config: &Config) -> Result<WizardController> {
    let provider = Arc::new(GroqClient::new(config)?);
    let generator = AiQuestionGenerator::new(
        provider,
        GenerationConfig::from_config(config),
        Duration::from_secs(config.ai_request_timeout_secs),
    );
    Ok(WizardController::new(generator, Arc::new(TracingSink)))
}
