use std::net::SocketAddr;
use std::time::Duration;

use idea_validator_core::ListPolicy;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Clone)]
pub struct DaemonConfig {
    pub listen: SocketAddr,

    /// Absent keys are reported per request, not at startup.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub web_search: bool,

    /// Upper bound on one remote model call.
    pub request_timeout: Duration,
    pub list_policy: ListPolicy,

    /// Adds diagnostic `details` to error responses.
    pub dev_mode: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([127, 0, 0, 1], 3000)),
            openai_api_key: None,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            web_search: true,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            list_policy: ListPolicy::Strict,
            dev_mode: false,
        }
    }
}

// Hand-written so the API key never reaches the logs.
impl std::fmt::Debug for DaemonConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DaemonConfig")
            .field("listen", &self.listen)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field("openai_base_url", &self.openai_base_url)
            .field("model", &self.model)
            .field("web_search", &self.web_search)
            .field("request_timeout", &self.request_timeout)
            .field("list_policy", &self.list_policy)
            .field("dev_mode", &self.dev_mode)
            .finish()
    }
}
