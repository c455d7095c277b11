use thiserror::Error;

/// Every failure a validation request can end in.
///
/// `Display` is the English diagnostic (logs, `details`); [`ValidatorError::user_message`]
/// is what end users see.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// Carries the message shown to the user.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("remote service rejected the credential")]
    AuthFailure,

    #[error("remote service rate limit exceeded")]
    RateLimitExceeded,

    #[error("remote request error: {0}")]
    RemoteRequest(String),

    #[error("malformed model response: {message}")]
    MalformedResponse {
        message: String,
        /// First characters of the raw reply, for logs only.
        head: String,
        /// Last characters of the raw reply, for logs only.
        tail: String,
    },

    #[error("schema violation: {0}")]
    SchemaViolation(String),

    #[error("remote call timed out after {0}s")]
    Timeout(u64),

    #[error("export error: {0}")]
    Export(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Generic(String),
}

pub type ValidatorResult<T> = Result<T, ValidatorError>;

impl ValidatorError {
    /// Stable machine-readable kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Configuration(_) => "configuration_error",
            Self::AuthFailure => "auth_failure",
            Self::RateLimitExceeded => "rate_limit_exceeded",
            Self::RemoteRequest(_) => "remote_request_error",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::SchemaViolation(_) => "schema_violation",
            Self::Timeout(_) => "timeout",
            Self::Export(_) => "export_error",
            Self::Io(_) => "io_error",
            Self::Generic(_) => "generic_failure",
        }
    }

    /// HTTP status the request boundary answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::Timeout(_) => 504,
            _ => 500,
        }
    }

    /// Fixed message shown to end users. Never contains diagnostics, except the
    /// remote service's own message for rejected requests.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::Configuration(_) => "OpenAI API 키가 설정되지 않았습니다.".to_string(),
            Self::AuthFailure => "OpenAI API 키가 유효하지 않습니다.".to_string(),
            Self::RateLimitExceeded => {
                "API 요청 한도를 초과했습니다. 잠시 후 다시 시도해주세요.".to_string()
            }
            Self::RemoteRequest(msg) => format!("OpenAI API 요청 오류: {msg}"),
            Self::MalformedResponse { .. } | Self::SchemaViolation(_) => {
                "AI 응답 형식이 올바르지 않습니다.".to_string()
            }
            Self::Timeout(_) => "요청 시간이 초과되었습니다. 다시 시도해주세요.".to_string(),
            Self::Export(_) | Self::Io(_) => "보고서 파일을 생성하지 못했습니다.".to_string(),
            Self::Generic(_) => "아이디어 검증 중 오류가 발생했습니다.".to_string(),
        }
    }
}
