use std::sync::Arc;
use std::time::{Duration, Instant};

use idea_validator_core::{
    normalize, prompt, IdeaSubmission, ListPolicy, ValidationResult, ValidatorError,
    ValidatorResult, MAX_IDEA_CHARS,
};
use tracing::{info, warn};

use crate::config::DaemonConfig;
use crate::llm::{CompletionClient, CompletionOptions};

/// One idea in, one validated result out. Holds no per-request state.
pub struct ValidationService {
    client: Arc<dyn CompletionClient>,
    options: CompletionOptions,
    timeout: Duration,
    policy: ListPolicy,
}

impl ValidationService {
    pub fn new(client: Arc<dyn CompletionClient>, config: &DaemonConfig) -> Self {
        Self {
            client,
            options: CompletionOptions::from(config),
            timeout: config.request_timeout,
            policy: config.list_policy,
        }
    }

    /// Checks the input, calls the model under the configured timeout and
    /// normalizes the reply. Input and credential problems are reported
    /// before any remote call is made.
    pub async fn validate(&self, submission: IdeaSubmission) -> ValidatorResult<ValidationResult> {
        let idea = submission.idea.trim();
        if idea.is_empty() {
            return Err(ValidatorError::InvalidInput(
                "아이디어를 입력해주세요.".to_string(),
            ));
        }
        let idea_chars = idea.chars().count();
        if idea_chars > MAX_IDEA_CHARS {
            return Err(ValidatorError::InvalidInput(format!(
                "아이디어는 {MAX_IDEA_CHARS}자 이내로 입력해주세요. (현재 {idea_chars}자)"
            )));
        }
        if !self.client.is_configured() {
            return Err(ValidatorError::Configuration(
                "OPENAI_API_KEY is not set".to_string(),
            ));
        }

        let input = prompt::full_input(idea);
        info!(
            idea_chars,
            prompt_chars = input.chars().count(),
            model = %self.options.model,
            "calling model"
        );

        let started = Instant::now();
        // Dropping the call future on expiry aborts the in-flight HTTP request.
        let reply = match tokio::time::timeout(self.timeout, self.client.complete(&input, &self.options)).await {
            Ok(reply) => reply?,
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "model call timed out; request aborted");
                return Err(ValidatorError::Timeout(self.timeout.as_secs()));
            }
        };
        info!(
            reply_chars = reply.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model replied"
        );

        normalize(&reply, self.policy)
    }
}
