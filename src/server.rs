use std::{
    sync::{Arc, Mutex},
    time::Instant,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    error::{EngineError, ValidationError},
    game::{GameStage, replay},
    model::{MoveGenerator, SamplingConfig},
    sampler::select_move,
};

pub type SharedState = Arc<AppState>;

/// Process-wide service state: the loaded generator behind a mutex (ort
/// sessions take `&mut` to run) plus request-independent configuration.
pub struct AppState {
    generator: Mutex<Box<dyn MoveGenerator>>,
    sampling: SamplingConfig,
    model_name: String,
    allowed_origins: Vec<String>,
    started: Instant,
}

impl AppState {
    pub fn new(
        generator: Box<dyn MoveGenerator>,
        sampling: SamplingConfig,
        model_name: impl Into<String>,
        allowed_origins: Vec<String>,
    ) -> SharedState {
        Arc::new(Self {
            generator: Mutex::new(generator),
            sampling,
            model_name: model_name.into(),
            allowed_origins,
            started: Instant::now(),
        })
    }
}

// =========================================================================
// Wire types
// =========================================================================

#[derive(Deserialize)]
pub struct MoveRequest {
    pub moves: Vec<String>,
}

#[derive(Serialize)]
pub struct MoveResponse {
    pub model_move: String,
    pub game_over: bool,
    pub result: Option<String>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_ready: bool,
    pub model: String,
    pub version: &'static str,
    pub uptime: u64,
}

// =========================================================================
// Errors
// =========================================================================

/// HTTP-facing error: client faults map to 400 with a machine-readable
/// code, engine faults to 500.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    Engine(String),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Validation(err @ ValidationError::MalformedMove(_)) => {
                (StatusCode::BAD_REQUEST, "malformed_move", err.to_string())
            }
            ApiError::Validation(err @ ValidationError::IllegalMove(_)) => {
                (StatusCode::BAD_REQUEST, "illegal_move", err.to_string())
            }
            ApiError::Engine(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "engine",
                message.clone(),
            ),
        };
        let body = Json(serde_json::json!({ "error": message, "code": code }));
        (status, body).into_response()
    }
}

// =========================================================================
// Handlers
// =========================================================================

/// GET /health — readiness probe. The model is loaded before the
/// listener binds, so an answering server is a ready server.
pub async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_ready: true,
        model: state.model_name.clone(),
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started.elapsed().as_secs(),
    })
}

/// POST /api/model-move — validate the supplied history, then either
/// report the finished game or ask the model for the next move.
pub async fn model_move(
    State(state): State<SharedState>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    match replay(&request.moves)? {
        GameStage::Finished(outcome) => {
            info!(result = outcome.as_str(), "history ends a finished game");
            Ok(Json(MoveResponse {
                model_move: String::new(),
                game_over: true,
                result: Some(outcome.as_str().to_string()),
            }))
        }
        GameStage::Ongoing(pos) => {
            let worker_state = state.clone();
            let history = request.moves;
            let chosen = tokio::task::spawn_blocking(move || {
                let mut generator = worker_state.generator.lock().unwrap();
                select_move(generator.as_mut(), &pos, &history, &worker_state.sampling)
            })
            .await
            .map_err(|err| ApiError::Engine(err.to_string()))??;

            Ok(Json(MoveResponse {
                model_move: chosen,
                game_over: false,
                result: None,
            }))
        }
    }
}

// =========================================================================
// Router
// =========================================================================

pub fn router(state: SharedState) -> Router {
    let cors = cors_layer(&state.allowed_origins);
    Router::new()
        .route("/health", get(health))
        .route("/api/model-move", post(model_move))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::legal_uci_moves;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use shakmaty::Chess;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct StubGenerator {
        output: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl MoveGenerator for StubGenerator {
        fn generate(&mut self, _prompt: &str, _cfg: &SamplingConfig) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.to_string())
        }
    }

    fn test_app(output: &'static str) -> (Router, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let state = AppState::new(
            Box::new(StubGenerator {
                output,
                calls: calls.clone(),
            }),
            SamplingConfig::default(),
            "stub-model",
            vec!["http://localhost:5173".to_string()],
        );
        (router(state), calls)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn move_request(body: &str) -> Request<Body> {
        Request::post("/api/model-move")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_returns_200() {
        let (app, _) = test_app("e2e4");
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model_ready"], true);
        assert_eq!(json["model"], "stub-model");
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let (app, _) = test_app("e2e4");
        let resp = app
            .oneshot(Request::get("/nonexistent").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fresh_game_gets_a_model_move() {
        let (app, calls) = test_app("e2e4");
        let resp = app.oneshot(move_request(r#"{"moves": []}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["model_move"], "e2e4");
        assert_eq!(json["game_over"], false);
        assert!(json["result"].is_null());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn noncompliant_model_still_yields_a_legal_move() {
        let (app, calls) = test_app("pure commentary, no move");
        let resp = app.oneshot(move_request(r#"{"moves": []}"#)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let chosen = json["model_move"].as_str().unwrap().to_string();
        assert!(legal_uci_moves(&Chess::default()).contains(&chosen));
        assert_eq!(calls.load(Ordering::SeqCst), 12);
    }

    #[tokio::test]
    async fn malformed_token_is_a_400() {
        let (app, calls) = test_app("e2e4");
        let resp = app
            .oneshot(move_request(r#"{"moves": ["banana"]}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["code"], "malformed_move");
        assert!(json["error"].as_str().unwrap().contains("banana"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn illegal_move_is_a_400() {
        let (app, calls) = test_app("e2e4");
        let resp = app
            .oneshot(move_request(r#"{"moves": ["e2e5"]}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["code"], "illegal_move");
        assert!(json["error"].as_str().unwrap().contains("e2e5"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn finished_game_skips_the_model() {
        let (app, calls) = test_app("e2e4");
        let resp = app
            .oneshot(move_request(
                r#"{"moves": ["f2f3", "e7e5", "g2g4", "d8h4"]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["model_move"], "");
        assert_eq!(json["game_over"], true);
        assert_eq!(json["result"], "0-1");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn cors_preflight_allows_the_frontend_origin() {
        let (app, _) = test_app("e2e4");
        let resp = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/model-move")
                    .header("Origin", "http://localhost:5173")
                    .header("Access-Control-Request-Method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("access-control-allow-origin").is_some());
    }
}
