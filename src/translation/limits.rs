/*!
 * Context window and timeout limits per model.
 */

use log::warn;
use std::time::Duration;

use crate::app_config::OpenAIConfig;

/// Model used when an unknown model name is configured
pub const FALLBACK_MODEL: &str = "gpt-3.5-turbo";

/// Timeout used for models outside the table
const UNOFFICIAL_TIMEOUT_SECS: u64 = 300;

/// Limits of one model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLimits {
    /// Context window in tokens
    pub token_limit: usize,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ModelLimits {
    const fn new(token_limit: usize, timeout_secs: u64) -> Self {
        Self {
            token_limit,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

/// Limits of a model from the built-in table
pub fn known_limits(model: &str) -> Option<ModelLimits> {
    match model {
        "gpt-3.5-turbo" | "gpt-3.5-turbo-0613" | "gpt-3.5-turbo-0301" => {
            Some(ModelLimits::new(4096, 120))
        }
        "gpt-3.5-turbo-16k" | "gpt-3.5-turbo-16k-0613" | "gpt-3.5-turbo-16k-0301" => {
            Some(ModelLimits::new(16384, 240))
        }
        "gpt-4" | "gpt-4-0613" | "gpt-4-0314" => Some(ModelLimits::new(8192, 300)),
        "gpt-4-32k" | "gpt-4-32k-0613" | "gpt-4-32k-0314" => Some(ModelLimits::new(32768, 750)),
        _ => None,
    }
}

/// Resolve the limits that apply to the configured model
///
/// Unofficial models use the configured context limit. Unknown official models
/// fall back to the limits of `FALLBACK_MODEL`. A non-zero `timeout_secs`
/// always wins.
pub fn resolve_limits(config: &OpenAIConfig) -> ModelLimits {
    let mut limits = if config.unofficial_model {
        ModelLimits::new(config.context_limit, UNOFFICIAL_TIMEOUT_SECS)
    } else {
        match known_limits(&config.model) {
            Some(limits) => limits,
            None => {
                warn!(
                    "Model '{}' is not in the limits table, using the limits of {}",
                    config.model, FALLBACK_MODEL
                );
                ModelLimits::new(4096, 120)
            }
        }
    };

    if config.timeout_secs > 0 {
        limits.timeout = Duration::from_secs(config.timeout_secs);
    }

    limits
}
