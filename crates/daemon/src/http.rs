use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use idea_validator_core::{
    api::{ErrorBody, VALIDATE_PATH},
    IdeaSubmission, ValidationResult, ValidatorError,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Instrument;
use ulid::Ulid;

use crate::service::ValidationService;

#[derive(Clone)]
pub struct AppState {
    svc: Arc<ValidationService>,
    dev_mode: bool,
}

pub fn router(svc: Arc<ValidationService>, dev_mode: bool) -> Router {
    let state = AppState { svc, dev_mode };
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            VALIDATE_PATH,
            post(validate_idea).fallback(method_not_allowed),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn validate_idea(
    State(st): State<AppState>,
    body: Result<Json<IdeaSubmission>, JsonRejection>,
) -> Result<Json<ValidationResult>, AppError> {
    let request_id = Ulid::new();
    let span = tracing::info_span!("validate_idea", %request_id);
    let dev_mode = st.dev_mode;

    async move {
        let Json(submission) = body.map_err(|e| {
            tracing::warn!(error = %e, "rejected request body");
            ValidatorError::InvalidInput("요청 본문이 올바른 JSON이 아닙니다.".to_string())
        })?;
        let result = st.svc.validate(submission).await?;
        tracing::info!("idea validated");
        Ok::<_, ValidatorError>(Json(result))
    }
    .instrument(span)
    .await
    .map_err(|err| AppError { err, dev_mode })
}

async fn method_not_allowed() -> Response {
    let body = ErrorBody {
        error: "Method Not Allowed".to_string(),
        code: "method_not_allowed".to_string(),
        details: None,
    };
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}

#[derive(Debug)]
pub struct AppError {
    err: ValidatorError,
    dev_mode: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = self.err.code(), error = %self.err, "request failed");
        } else {
            tracing::warn!(code = self.err.code(), error = %self.err, "request rejected");
        }
        let body = ErrorBody {
            error: self.err.user_message(),
            code: self.err.code().to_string(),
            details: self.dev_mode.then(|| self.err.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
