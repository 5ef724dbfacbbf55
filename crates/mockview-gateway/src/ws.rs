// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket interview channel.
//!
//! Every frame is a JSON object `{type, session_id, timestamp, data}`.
//!
//! Client -> Server:
//! ```json
//! {"type": "connect", "data": {"interview_style": "casual"}}
//! {"type": "text_input", "data": {"text": "I led the migration...", "context": null}}
//! {"type": "audio_input", "data": {"audio_data": "<base64>", "audio_format": "webm"}}
//! {"type": "ping"}
//! {"type": "disconnect"}
//! ```
//!
//! Server -> Client: `connected`, `ai_response`, `transcription`, `error`,
//! `pong` and `status`.

use std::net::SocketAddr;

use axum::{
    Extension,
    extract::{
        ConnectInfo, Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use mockview_core::MockviewError;
use mockview_core::types::InterviewStyle;
use mockview_interview::{InterviewQuestion, StartedInterview, Transcription, TurnInput, TurnOutcome};

use crate::server::GatewayState;

/// Outbound frames buffered per connection.
const OUTBOUND_BUFFER: usize = 64;

/// Room for the JSON envelope around a base64 audio payload.
const FRAME_OVERHEAD_BYTES: usize = 16 * 1024;

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientFrame {
    Connect {
        interview_style: Option<InterviewStyle>,
    },
    TextInput {
        text: String,
        context: Option<String>,
    },
    AudioInput {
        audio: Vec<u8>,
        format: String,
        context: Option<String>,
    },
    Ping,
    Disconnect,
}

/// Why an inbound frame was rejected.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Message validation failed: {0}")]
    Validation(String),
}

impl FrameError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::UnknownType(_) => "unknown_message_type",
            Self::Validation(_) => "validation_error",
        }
    }
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Default, Deserialize)]
struct ConnectData {
    #[serde(default)]
    interview_style: Option<String>,
}

#[derive(Deserialize)]
struct TextInputData {
    text: String,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Deserialize)]
struct AudioInputData {
    audio_data: String,
    #[serde(default = "default_audio_format")]
    audio_format: String,
    #[serde(default)]
    context: Option<String>,
}

fn default_audio_format() -> String {
    "wav".to_string()
}

fn data<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, FrameError> {
    serde_json::from_value(value).map_err(|e| FrameError::Validation(e.to_string()))
}

impl ClientFrame {
    /// Decodes a raw text frame.
    pub fn parse(raw: &str) -> Result<Self, FrameError> {
        let frame: RawFrame = serde_json::from_str(raw)?;
        let data_value = frame.data;
        let kind = frame.kind.unwrap_or_default();

        match kind.as_str() {
            "connect" => {
                let connect: ConnectData = if data_value.is_null() {
                    ConnectData::default()
                } else {
                    data(data_value)?
                };
                let interview_style = connect
                    .interview_style
                    .map(|s| {
                        s.parse::<InterviewStyle>()
                            .map_err(|_| FrameError::Validation(format!("unknown interview style `{s}`")))
                    })
                    .transpose()?;
                Ok(Self::Connect { interview_style })
            }
            "text_input" => {
                let input: TextInputData = data(data_value)?;
                Ok(Self::TextInput {
                    text: input.text,
                    context: input.context,
                })
            }
            "audio_input" => {
                let input: AudioInputData = data(data_value)?;
                let audio = BASE64
                    .decode(input.audio_data.trim())
                    .map_err(|e| FrameError::Validation(format!("audio_data is not valid base64: {e}")))?;
                Ok(Self::AudioInput {
                    audio,
                    format: input.audio_format,
                    context: input.context,
                })
            }
            "ping" => Ok(Self::Ping),
            "disconnect" => Ok(Self::Disconnect),
            _ => Err(FrameError::UnknownType(kind)),
        }
    }
}

/// Payload of `connected`.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedData {
    pub status: &'static str,
    pub version: &'static str,
    pub session_id: String,
    pub interview_style: InterviewStyle,
    pub question: Option<InterviewQuestion>,
    pub question_index: usize,
    pub total_questions: usize,
    pub resumed: bool,
}

impl From<StartedInterview> for ConnectedData {
    fn from(started: StartedInterview) -> Self {
        Self {
            status: "connected",
            version: env!("CARGO_PKG_VERSION"),
            session_id: started.session_id,
            interview_style: started.style,
            question: started.question,
            question_index: started.question_index,
            total_questions: started.total_questions,
            resumed: started.resumed,
        }
    }
}

/// Payload of `error`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorData {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Payload of `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusData {
    pub status: &'static str,
    pub interview_style: InterviewStyle,
}

/// Payload of `pong`.
#[derive(Debug, Clone, Serialize)]
pub struct PongData {
    pub timestamp: DateTime<Utc>,
}

/// Outbound frame contents.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerPayload {
    Connected(ConnectedData),
    AiResponse(Box<TurnOutcome>),
    Transcription(Transcription),
    Error(ErrorData),
    Pong(PongData),
    Status(StatusData),
}

impl ServerPayload {
    pub fn frame_error(error: &FrameError) -> Self {
        Self::Error(ErrorData {
            error: error.code(),
            message: error.to_string(),
            details: None,
        })
    }

    /// Error payload for a failed turn. Internal details are only exposed in debug mode.
    pub fn processing_error(error: &MockviewError, debug: bool) -> Self {
        let code = match error {
            MockviewError::InvalidInput(_) | MockviewError::InvalidAudio { .. } => "validation_error",
            _ => "processing_error",
        };
        let message = match error {
            MockviewError::Internal(_) | MockviewError::Storage { .. } => {
                "Failed to process message".to_string()
            }
            other => other.to_string(),
        };
        Self::Error(ErrorData {
            error: code,
            message,
            details: debug.then(|| format!("{error:?}")),
        })
    }
}

/// A complete outbound frame.
#[derive(Debug, Clone, Serialize)]
pub struct ServerFrame {
    #[serde(flatten)]
    pub payload: ServerPayload,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ServerFrame {
    pub fn new(session_id: &str, payload: ServerPayload) -> Self {
        Self {
            payload,
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// GET /api/v1/ws
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
) -> Response {
    upgrade(ws, state, None, connect_info)
}

/// GET /api/v1/ws/{id}
pub async fn ws_session_handler(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    Path(session_id): Path<String>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
) -> Response {
    upgrade(ws, state, Some(session_id), connect_info)
}

fn upgrade(
    ws: WebSocketUpgrade,
    state: GatewayState,
    session_id: Option<String>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
) -> Response {
    let client_address = connect_info
        .map(|Extension(ConnectInfo(addr))| addr.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let max_frame = state.max_upload_bytes.div_ceil(3) * 4 + FRAME_OVERHEAD_BYTES;

    ws.max_message_size(max_frame)
        .on_upgrade(move |socket| handle_socket(socket, state, session_id, client_address))
}

/// Runs one connection until the client leaves or the heartbeat closes it.
///
/// Turns run as separate tasks so pings are answered while a model call is
/// in flight. The session outlives the connection.
async fn handle_socket(
    socket: WebSocket,
    state: GatewayState,
    session_id: Option<String>,
    client_address: String,
) {
    let started = state.coordinator.start(session_id.as_deref(), None).await;
    let session_id = started.session_id.clone();
    let registration = state
        .connections
        .register(&session_id, &client_address, started.style);

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<ServerPayload>(OUTBOUND_BUFFER);

    let sender_task = tokio::spawn({
        let connections = state.connections.clone();
        let session_id = session_id.clone();
        async move {
            while let Some(payload) = rx.recv().await {
                let frame = ServerFrame::new(&session_id, payload);
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "failed to encode websocket frame");
                        continue;
                    }
                };
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
                connections.record_sent(&session_id);
            }
            let _ = ws_sender.send(Message::Close(None)).await;
        }
    });

    let _ = tx.send(ServerPayload::Connected(started.into())).await;

    let mut tasks = JoinSet::new();
    loop {
        let message = tokio::select! {
            _ = registration.cancel.cancelled() => {
                debug!(session_id = %session_id, "connection closed by server");
                break;
            }
            message = ws_receiver.next() => message,
        };
        let Some(Ok(message)) = message else {
            break;
        };

        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        state.connections.record_received(&session_id);

        let frame = match ClientFrame::parse(&text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "rejected websocket frame");
                state.connections.record_error();
                let _ = tx.send(ServerPayload::frame_error(&e)).await;
                continue;
            }
        };

        if !dispatch(&state, &session_id, frame, &mut tasks, &tx).await {
            break;
        }

        // Reap finished tasks so the set does not grow for long connections.
        while tasks.try_join_next().is_some() {}
    }

    // Turns commit only after their last await, so aborting leaves sessions consistent.
    tasks.abort_all();
    drop(tx);
    state
        .connections
        .unregister(&session_id, &registration.connection_id);
    let _ = sender_task.await;
}

/// Handles one client frame. Returns `false` when the client asked to leave.
///
/// Anything that waits on the session lock runs in `tasks`, so the receive
/// loop keeps answering pings while a turn holds the session.
async fn dispatch(
    state: &GatewayState,
    session_id: &str,
    frame: ClientFrame,
    tasks: &mut JoinSet<()>,
    tx: &mpsc::Sender<ServerPayload>,
) -> bool {
    match frame {
        ClientFrame::Ping => {
            let _ = tx
                .send(ServerPayload::Pong(PongData {
                    timestamp: Utc::now(),
                }))
                .await;
        }
        ClientFrame::Disconnect => return false,
        ClientFrame::Connect { interview_style } => {
            let (state, session_id, tx) = (state.clone(), session_id.to_string(), tx.clone());
            tasks.spawn(async move {
                let payload = configure(&state, &session_id, interview_style).await;
                let _ = tx.send(payload).await;
            });
        }
        ClientFrame::TextInput { text, context } => {
            let mut input = TurnInput::text(text);
            if let Some(context) = context {
                input = input.with_context(context);
            }
            tasks.spawn(run_turn(state.clone(), session_id.to_string(), input, tx.clone()));
        }
        ClientFrame::AudioInput {
            audio,
            format,
            context,
        } => match state.coordinator.recognizer().parse_format(&format) {
            Ok(format) => {
                let mut input = TurnInput::audio(audio, format);
                if let Some(context) = context {
                    input = input.with_context(context);
                }
                tasks.spawn(run_turn(state.clone(), session_id.to_string(), input, tx.clone()));
            }
            Err(e) => {
                state.connections.record_error();
                let _ = tx
                    .send(ServerPayload::processing_error(&e, state.debug))
                    .await;
            }
        },
    }
    true
}

/// Applies a `connect` frame to the session and the connection record.
async fn configure(
    state: &GatewayState,
    session_id: &str,
    interview_style: Option<InterviewStyle>,
) -> ServerPayload {
    let style = interview_style.unwrap_or(state.coordinator.default_style());
    match state.coordinator.set_style(session_id, style).await {
        Ok(()) => {
            state.connections.set_style(session_id, style);
            ServerPayload::Status(StatusData {
                status: "configuration_updated",
                interview_style: style,
            })
        }
        Err(e) => {
            state.connections.record_error();
            ServerPayload::processing_error(&e, state.debug)
        }
    }
}

/// Processes one turn and queues its frames. Audio turns send the transcript first.
async fn run_turn(
    state: GatewayState,
    session_id: String,
    input: TurnInput,
    tx: mpsc::Sender<ServerPayload>,
) {
    match state.coordinator.process_turn(&session_id, input).await {
        Ok(outcome) => {
            if let Some(transcription) = outcome.transcription.clone() {
                let _ = tx.send(ServerPayload::Transcription(transcription)).await;
            }
            let _ = tx.send(ServerPayload::AiResponse(Box::new(outcome))).await;
        }
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "websocket turn failed");
            state.connections.record_error();
            let _ = tx
                .send(ServerPayload::processing_error(&e, state.debug))
                .await;
        }
    }
}
