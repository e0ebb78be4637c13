//! Session API server.
//!
//! Hosts one [`SessionController`] per browser session, in memory only.
//! Each controller sits behind its own mutex, held across its outbound call,
//! so a session never has two questions in flight. The session map lock is
//! only held long enough to look a controller up.
//!
//! A snapshot (`GET /api/sessions/{id}`) taken while a question is in flight
//! waits for the answer, up to the endpoint timeout. A reset during that
//! window is refused with 409 instead. Sessions unused for the idle timeout
//! are dropped by a background sweep.
//!
//! Endpoints:
//! - POST /api/sessions - Create a session
//! - GET /api/sessions/{id} - Transcript snapshot
//! - DELETE /api/sessions/{id} - Drop a session
//! - POST /api/sessions/{id}/messages - Ask a question
//! - POST /api/sessions/{id}/retry - Re-send the unanswered question
//! - DELETE /api/sessions/{id}/transcript - Clear history and conversation ID
//! - GET /api/samples - Starter questions

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tower_http::cors::CorsLayer;
use tracing::info;
use uuid::Uuid;

use crate::chat::{samples, ApiError, RagClient, SampleQuestion, SessionController};
use crate::config::ChatConfig;
use crate::models::{SessionState, Turn};

/// Sessions unused for this long are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Bounds on how often the idle sweep runs.
const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

type SharedController = Arc<Mutex<SessionController>>;

/// A live session and when a request last touched it.
struct SessionSlot {
    controller: SharedController,
    last_used: Instant,
}

/// Shared server state.
pub struct ServerState {
    /// Template client cloned into every new session.
    client: RagClient,
    /// How long a session may sit unused before the sweep drops it.
    idle_timeout: Duration,
    /// Live sessions keyed by id.
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
}

impl ServerState {
    pub fn new(client: RagClient) -> Self {
        Self {
            client,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub const fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    async fn create(&self) -> Uuid {
        let id = Uuid::now_v7();
        let slot = SessionSlot {
            controller: Arc::new(Mutex::new(SessionController::new(self.client.clone()))),
            last_used: Instant::now(),
        };
        self.sessions.write().await.insert(id, slot);
        id
    }

    /// Look a session up and mark it as used.
    async fn get(&self, id: Uuid) -> Result<SharedController, ServerError> {
        let mut sessions = self.sessions.write().await;
        let slot = sessions
            .get_mut(&id)
            .ok_or(ServerError::SessionNotFound(id))?;
        slot.last_used = Instant::now();
        Ok(slot.controller.clone())
    }

    async fn remove(&self, id: Uuid) -> Result<(), ServerError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(drop)
            .ok_or(ServerError::SessionNotFound(id))
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions idle past the timeout. Sessions with a call in flight are kept.
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, slot| {
            slot.last_used.elapsed() < self.idle_timeout || slot.controller.try_lock().is_err()
        });
        before - sessions.len()
    }
}

/// Run [`ServerState::evict_idle`] periodically until the task is aborted.
pub fn spawn_idle_sweeper(state: Arc<ServerState>) -> JoinHandle<()> {
    let period = (state.idle_timeout() / 2).clamp(MIN_SWEEP_PERIOD, MAX_SWEEP_PERIOD);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately.
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = state.evict_idle().await;
            if evicted > 0 {
                info!(evicted, "dropped idle sessions");
            }
        }
    })
}

// === Request/Response Types ===

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub state: SessionState,
    pub conversation_id: Option<String>,
    pub message_count: usize,
    pub transcript: Vec<Turn>,
}

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub turn: Turn,
    pub conversation_id: Option<String>,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors surfaced by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("session {0} not found")]
    SessionNotFound(Uuid),
    #[error("session {0} is waiting for an answer")]
    SessionBusy(Uuid),
    /// Malformed path or body, as reported by the extractor.
    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },
    #[error(transparent)]
    Chat(#[from] ApiError),
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for ServerError {
    fn from(rejection: PathRejection) -> Self {
        Self::InvalidRequest {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::SessionBusy(_) => StatusCode::CONFLICT,
            Self::InvalidRequest { status, .. } => *status,
            Self::Chat(ApiError::EmptyQuestion) => StatusCode::BAD_REQUEST,
            Self::Chat(ApiError::NothingToRetry) => StatusCode::CONFLICT,
            Self::Chat(ApiError::Transport(_)) => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// === Server Lifecycle ===

/// Build the API router around `state`.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/{id}", get(get_session).delete(delete_session))
        .route("/api/sessions/{id}/messages", post(post_message))
        .route("/api/sessions/{id}/retry", post(retry_message))
        .route(
            "/api/sessions/{id}/transcript",
            axum::routing::delete(reset_transcript),
        )
        .route("/api/samples", get(list_samples))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server and run until Ctrl-C.
pub async fn start_server(
    config: &ChatConfig,
    addr: SocketAddr,
    idle_timeout: Duration,
) -> Result<()> {
    if idle_timeout.is_zero() {
        bail!("Idle timeout must be greater than zero");
    }

    let state = Arc::new(ServerState::new(config.client()?).with_idle_timeout(idle_timeout));
    let sweeper = spawn_idle_sweeper(state.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, endpoint = %config.endpoint, ?idle_timeout, "session API listening");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");
    sweeper.abort();
    served?;

    info!("session API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed.
        std::future::pending::<()>().await;
    }
}

// === Handlers ===

type SessionPath = Result<Path<Uuid>, PathRejection>;
type MessageBody = Result<Json<MessageRequest>, JsonRejection>;

async fn create_session(
    State(state): State<Arc<ServerState>>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let session_id = state.create().await;
    info!(%session_id, "session created");
    (StatusCode::CREATED, Json(CreateSessionResponse { session_id }))
}

async fn get_session(
    State(state): State<Arc<ServerState>>,
    path: SessionPath,
) -> Result<Json<SessionSnapshot>, ServerError> {
    let Path(id) = path?;
    let controller = state.get(id).await?;
    let controller = controller.lock().await;

    Ok(Json(SessionSnapshot {
        session_id: id,
        state: controller.state(),
        conversation_id: controller.conversation_id().map(String::from),
        message_count: controller.message_count(),
        transcript: controller.transcript().to_vec(),
    }))
}

async fn delete_session(
    State(state): State<Arc<ServerState>>,
    path: SessionPath,
) -> Result<StatusCode, ServerError> {
    let Path(id) = path?;
    state.remove(id).await?;
    info!(session_id = %id, "session dropped");
    Ok(StatusCode::NO_CONTENT)
}

async fn post_message(
    State(state): State<Arc<ServerState>>,
    path: SessionPath,
    body: MessageBody,
) -> Result<Json<MessageResponse>, ServerError> {
    let Path(id) = path?;
    let Json(req) = body?;
    let controller = state.get(id).await?;
    let mut controller = controller.lock().await;

    let turn = controller.submit(&req.question).await?;
    Ok(Json(respond(turn, &controller)))
}

async fn retry_message(
    State(state): State<Arc<ServerState>>,
    path: SessionPath,
) -> Result<Json<MessageResponse>, ServerError> {
    let Path(id) = path?;
    let controller = state.get(id).await?;
    let mut controller = controller.lock().await;

    let turn = controller.retry().await?;
    Ok(Json(respond(turn, &controller)))
}

async fn reset_transcript(
    State(state): State<Arc<ServerState>>,
    path: SessionPath,
) -> Result<StatusCode, ServerError> {
    let Path(id) = path?;
    let controller = state.get(id).await?;
    let mut controller = controller
        .try_lock()
        .map_err(|_| ServerError::SessionBusy(id))?;
    controller.reset();
    Ok(StatusCode::NO_CONTENT)
}

async fn list_samples() -> Json<Vec<SampleQuestion>> {
    Json(samples().collect())
}

fn respond(turn: Turn, controller: &SessionController) -> MessageResponse {
    MessageResponse {
        turn,
        conversation_id: controller.conversation_id().map(String::from),
        message_count: controller.message_count(),
    }
}
