// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the interview REST API.
//!
//! Every handler answers with an [`ApiEnvelope`]. Failures are converted
//! through [`ApiError`], which maps [`MockviewError`] variants to status codes.

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use mockview_core::MockviewError;
use mockview_core::types::{AudioFormat, InterviewStyle};
use mockview_interview::{ProviderHealth, TurnInput};

use crate::connections::{ConnectionInfo, ConnectionStats};
use crate::server::GatewayState;

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiEnvelope<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T: Serialize> ApiEnvelope<T> {
    pub fn success(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            status: "success",
            message: message.into(),
            data,
            timestamp: Utc::now(),
        })
    }
}

/// Error envelope body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub status: String,
    pub message: String,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// A [`MockviewError`] on its way to an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    error: MockviewError,
    debug: bool,
}

impl ApiError {
    pub fn new(error: MockviewError, debug: bool) -> Self {
        Self { error, debug }
    }

    pub fn status_code(&self) -> StatusCode {
        status_for(&self.error)
    }
}

/// Status code for an error variant.
pub fn status_for(error: &MockviewError) -> StatusCode {
    match error {
        MockviewError::InvalidAudio { .. } | MockviewError::InvalidInput(_) => {
            StatusCode::BAD_REQUEST
        }
        MockviewError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        MockviewError::TurnInProgress(_)
        | MockviewError::FollowUpLimitReached { .. }
        | MockviewError::NoHistory(_) => StatusCode::CONFLICT,
        MockviewError::Provider { .. }
        | MockviewError::Transcription { .. }
        | MockviewError::Schema { .. } => StatusCode::BAD_GATEWAY,
        MockviewError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (message, error_code) = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.error, "request failed with internal error");
            ("Internal server error".to_string(), "internal_error")
        } else {
            tracing::debug!(error = %self.error, %status, "request rejected");
            (self.error.to_string(), self.error.error_code())
        };

        let body = ErrorBody {
            status: "error".into(),
            message,
            error_code: error_code.into(),
            details: self.debug.then(|| format!("{:?}", self.error)),
            timestamp: Utc::now(),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiEnvelope<T>>, ApiError>;

impl GatewayState {
    fn fail(&self, error: MockviewError) -> ApiError {
        ApiError::new(error, self.debug)
    }
}

/// Parses a JSON body, treating an empty body as `T::default()`.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, MockviewError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| MockviewError::InvalidInput(format!("invalid request body: {e}")))
}

fn parse_style(style: Option<&str>) -> Result<Option<InterviewStyle>, MockviewError> {
    style
        .map(|s| {
            s.parse::<InterviewStyle>().map_err(|_| {
                MockviewError::InvalidInput(format!(
                    "unknown interview style `{s}` (expected formal, casual or campus)"
                ))
            })
        })
        .transpose()
}

/// Request body for `POST /interview/start`.
#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

/// Request body for `POST /interview/{id}/answer` and `/follow-up`.
#[derive(Debug, Default, Deserialize)]
pub struct AnswerRequest {
    #[serde(default, alias = "text")]
    pub answer: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Request body for `POST /interview/{id}/report`.
#[derive(Debug, Default, Deserialize)]
pub struct ReportRequestBody {
    #[serde(default)]
    pub candidate_name: Option<String>,
}

/// Response body for the health endpoints.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub providers: ProviderHealth,
    pub active_sessions: usize,
    pub active_connections: usize,
}

/// GET /health, GET /api/v1/health
pub async fn get_health(State(state): State<GatewayState>) -> Json<ApiEnvelope<HealthResponse>> {
    let providers = state.coordinator.provider_health().await;
    let status = if providers.is_healthy() { "healthy" } else { "degraded" };
    ApiEnvelope::success(
        "Service is running",
        HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            uptime_secs: state.started.elapsed().as_secs(),
            providers,
            active_sessions: state.coordinator.sessions().len(),
            active_connections: state.connections.active_count(),
        },
    )
}

/// POST /api/v1/interview/start
pub async fn start_interview(
    State(state): State<GatewayState>,
    body: Bytes,
) -> ApiResult<mockview_interview::StartedInterview> {
    let request: StartRequest = parse_body(&body).map_err(|e| state.fail(e))?;
    let style = parse_style(request.style.as_deref()).map_err(|e| state.fail(e))?;
    let started = state
        .coordinator
        .start(request.session_id.as_deref(), style)
        .await;
    Ok(ApiEnvelope::success("Interview session started", started))
}

/// GET /api/v1/interview/{id}/status
pub async fn get_status(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> ApiResult<mockview_interview::InterviewStatus> {
    let status = state
        .coordinator
        .status(&session_id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success("Interview status", status))
}

/// GET /api/v1/interview/{id}/question
pub async fn get_question(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> ApiResult<mockview_interview::CurrentQuestion> {
    let question = state
        .coordinator
        .current_question(&session_id)
        .await
        .map_err(|e| state.fail(e))?;
    let message = if question.completed {
        "Interview completed"
    } else {
        "Current question"
    };
    Ok(ApiEnvelope::success(message, question))
}

/// POST /api/v1/interview/{id}/answer
pub async fn submit_answer(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> ApiResult<mockview_interview::TurnOutcome> {
    let request: AnswerRequest = parse_body(&body).map_err(|e| state.fail(e))?;
    let mut input = TurnInput::text(request.answer);
    if let Some(context) = request.context {
        input = input.with_context(context);
    }
    let outcome = state
        .coordinator
        .process_turn(&session_id, input)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success("Answer processed", outcome))
}

/// Fields of an audio upload.
struct AudioUpload {
    bytes: Vec<u8>,
    format: AudioFormat,
    context: Option<String>,
}

/// Reads the `audio` (or `file`) part plus optional `format` and `context` parts.
///
/// The format comes from the `format` part, else the file name extension,
/// else `wav`.
async fn read_audio_upload(
    state: &GatewayState,
    mut multipart: Multipart,
) -> Result<AudioUpload, MockviewError> {
    let invalid = |e: axum::extract::multipart::MultipartError| MockviewError::InvalidInput(
        format!("invalid multipart body: {e}"),
    );

    let mut bytes = None;
    let mut declared = None;
    let mut file_extension = None;
    let mut context = None;

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio" | "file") => {
                file_extension = field
                    .file_name()
                    .and_then(|name| name.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_string());
                bytes = Some(field.bytes().await.map_err(invalid)?.to_vec());
            }
            Some("format") => declared = Some(field.text().await.map_err(invalid)?),
            Some("context") => {
                context = Some(field.text().await.map_err(invalid)?).filter(|c| !c.trim().is_empty())
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| MockviewError::InvalidAudio {
        reason: "missing `audio` file field".into(),
    })?;
    let format = state.coordinator.recognizer().parse_format(
        declared
            .as_deref()
            .or(file_extension.as_deref())
            .unwrap_or("wav"),
    )?;

    Ok(AudioUpload {
        bytes,
        format,
        context,
    })
}

/// POST /api/v1/interview/{id}/audio
pub async fn submit_audio(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<mockview_interview::TurnOutcome> {
    let upload = read_audio_upload(&state, multipart)
        .await
        .map_err(|e| state.fail(e))?;
    let mut input = TurnInput::audio(upload.bytes, upload.format);
    if let Some(context) = upload.context {
        input = input.with_context(context);
    }
    let outcome = state
        .coordinator
        .process_turn(&session_id, input)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success("Audio answer processed", outcome))
}

/// POST /api/v1/interview/{id}/transcribe
pub async fn transcribe(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    multipart: Multipart,
) -> ApiResult<mockview_interview::Transcription> {
    let upload = read_audio_upload(&state, multipart)
        .await
        .map_err(|e| state.fail(e))?;
    let transcription = state
        .coordinator
        .transcribe(&session_id, upload.bytes, upload.format)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success("Audio transcribed", transcription))
}

/// POST /api/v1/interview/{id}/follow-up
pub async fn request_follow_up(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> ApiResult<mockview_interview::ManualFollowUp> {
    let request: AnswerRequest = parse_body(&body).map_err(|e| state.fail(e))?;
    let follow_up = state
        .coordinator
        .request_follow_up(&session_id, &request.answer, request.context.as_deref())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success("Follow-up generated", follow_up))
}

/// POST /api/v1/interview/{id}/next
pub async fn next_question(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> ApiResult<mockview_interview::AdvanceOutcome> {
    let advanced = state
        .coordinator
        .advance(&session_id)
        .await
        .map_err(|e| state.fail(e))?;
    let message = if advanced.completed {
        "Interview completed"
    } else {
        "Moved to next question"
    };
    Ok(ApiEnvelope::success(message, advanced))
}

/// POST /api/v1/interview/{id}/complete
pub async fn complete_interview(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> ApiResult<mockview_interview::InterviewStatus> {
    let status = state
        .coordinator
        .complete(&session_id)
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success("Interview completed", status))
}

/// POST /api/v1/interview/{id}/report
pub async fn generate_report(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    body: Bytes,
) -> ApiResult<mockview_interview::SavedReport> {
    let request: ReportRequestBody = parse_body(&body).map_err(|e| state.fail(e))?;
    let saved = state
        .coordinator
        .generate_report(&session_id, request.candidate_name.as_deref())
        .await
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success("Interview report generated", saved))
}

/// DELETE /api/v1/interview/{id}
pub async fn reset_interview(
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
) -> ApiResult<serde_json::Value> {
    state
        .coordinator
        .reset(&session_id)
        .map_err(|e| state.fail(e))?;
    Ok(ApiEnvelope::success(
        "Interview session reset",
        serde_json::json!({ "session_id": session_id }),
    ))
}

/// GET /api/v1/ws/stats
pub async fn get_ws_stats(State(state): State<GatewayState>) -> Json<ApiEnvelope<ConnectionStats>> {
    ApiEnvelope::success("WebSocket statistics", state.connections.stats())
}

/// GET /api/v1/ws/connections
pub async fn get_ws_connections(
    State(state): State<GatewayState>,
) -> Json<ApiEnvelope<Vec<ConnectionInfo>>> {
    ApiEnvelope::success("Active WebSocket connections", state.connections.connections())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn status_mapping_follows_error_taxonomy() {
        let cases = [
            (MockviewError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                MockviewError::InvalidAudio { reason: "x".into() },
                StatusCode::BAD_REQUEST,
            ),
            (MockviewError::SessionNotFound("s".into()), StatusCode::NOT_FOUND),
            (MockviewError::TurnInProgress("s".into()), StatusCode::CONFLICT),
            (MockviewError::NoHistory("s".into()), StatusCode::CONFLICT),
            (
                MockviewError::FollowUpLimitReached {
                    session_id: "s".into(),
                    question_index: 0,
                },
                StatusCode::CONFLICT,
            ),
            (MockviewError::provider("down"), StatusCode::BAD_GATEWAY),
            (
                MockviewError::Timeout {
                    duration: Duration::from_secs(1),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (MockviewError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, expected) in cases {
            assert_eq!(status_for(&error), expected, "{error}");
        }
    }

    #[test]
    fn empty_body_parses_as_default() {
        let request: StartRequest = parse_body(&Bytes::from_static(b"  ")).unwrap();
        assert!(request.session_id.is_none());
    }

    #[test]
    fn answer_accepts_text_alias() {
        let request: AnswerRequest =
            parse_body(&Bytes::from_static(br#"{"text": "hi", "context": "c"}"#)).unwrap();
        assert_eq!(request.answer, "hi");
        assert_eq!(request.context.as_deref(), Some("c"));
    }

    #[test]
    fn malformed_body_is_invalid_input() {
        let err = parse_body::<AnswerRequest>(&Bytes::from_static(b"{")).unwrap_err();
        assert!(matches!(err, MockviewError::InvalidInput(_)));
    }

    #[test]
    fn unknown_style_is_rejected() {
        assert!(parse_style(Some("pirate")).is_err());
        assert_eq!(parse_style(Some("Casual")).unwrap(), Some(InterviewStyle::Casual));
        assert_eq!(parse_style(None).unwrap(), None);
    }
}
