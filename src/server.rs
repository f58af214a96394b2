use crate::{
    config::Config,
    errors::{AppError, AppResult},
    files,
    orders::OrderStore,
    resolver::{self, ResolveError},
    security,
    validate::ReadRequest,
};
use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, Path as UrlPath, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::{path::PathBuf, sync::Arc, time::Instant};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    /// Canonical root, fixed for the life of the process.
    pub root: Arc<PathBuf>,
    pub orders: Arc<OrderStore>,
}

impl AppState {
    pub fn new(cfg: Config, root: PathBuf, orders: OrderStore) -> Self {
        Self {
            cfg: Arc::new(cfg),
            root: Arc::new(root),
            orders: Arc::new(orders),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadResponse {
    pub path: String,
    pub content: String,
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr: std::net::SocketAddr =
        format!("{}:{}", state.cfg.server.bind_addr, state.cfg.server.port)
            .parse()
            .context("parsing bind address")?;
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let limit_bytes = state.cfg.limits.max_request_kb * 1024;
    let mut router = Router::new()
        .route("/healthz", get(health))
        .route("/read", post(read))
        .route("/setup-sample", post(setup_sample))
        .route("/", get(whoami))
        .route("/whoami", get(whoami))
        .route("/orders/:id", get(order));
    if state.cfg.demo.insecure_routes {
        tracing::warn!("insecure demo route /read-no-validate is enabled");
        router = router.route("/read-no-validate", post(read_no_validate));
    }
    router
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(limit_bytes))
        .layer(middleware::from_fn(security::security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn fallback() -> AppError {
    AppError::NotFound
}

async fn read(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let started = Instant::now();
    let request_id = uuid::Uuid::new_v4().to_string();
    let outcome = read_resolved(&state, body).await;
    let code = match &outcome {
        Ok(_) => "OK",
        Err(e) => e.code(),
    };
    audit(&request_id, "/read", code, started.elapsed().as_millis() as u64);
    match outcome {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn read_resolved(
    state: &AppState,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<ReadResponse> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let req = ReadRequest::from_json(&body)?;
    let full = resolver::resolve(&state.root, &req.filename).map_err(|e| {
        if e == ResolveError::TraversalDetected {
            tracing::debug!(attempted = %req.filename, "traversal rejected");
        }
        e
    })?;
    let content = files::read_text(&full).await?;
    Ok(ReadResponse {
        path: full.to_string_lossy().into_owned(),
        content,
    })
}

/// UNSAFE demo route. Only mounted when `demo.insecure_routes` is set.
async fn read_no_validate(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let filename = body
        .ok()
        .and_then(|Json(v)| v.get("filename").and_then(|f| f.as_str()).map(str::to_string))
        .unwrap_or_default();
    let joined = resolver::resolve_unchecked(&state.root, &filename);
    tracing::warn!(path = %joined.display(), "unchecked read");
    match files::read_unchecked(&joined).await {
        Ok(content) => (
            StatusCode::OK,
            Json(ReadResponse {
                path: joined.to_string_lossy().into_owned(),
                content,
            }),
        )
            .into_response(),
        Err(files::ReadError::NotFound) => {
            let e = AppError::NotFound;
            (
                e.status(),
                Json(json!({
                    "error": e.code(),
                    "message": e.public_message(),
                    "path": joined.to_string_lossy(),
                })),
            )
                .into_response()
        }
        Err(e) => AppError::Internal(format!("unchecked read: {e}")).into_response(),
    }
}

async fn setup_sample(State(state): State<AppState>) -> Response {
    match files::write_samples(&state.root).await {
        Ok(written) => {
            tracing::info!(count = written.len(), "samples written");
            (
                StatusCode::OK,
                Json(json!({"ok": true, "base": state.root.to_string_lossy()})),
            )
                .into_response()
        }
        Err(e) => AppError::Internal(format!("setup failed: {e}")).into_response(),
    }
}

async fn whoami(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let user = security::require_user(&headers, &state.orders)?;
    Ok(Json(json!({"message": "Access Control API", "currentUser": user})).into_response())
}

async fn order(
    State(state): State<AppState>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<String>,
) -> AppResult<Response> {
    let user = security::require_user(&headers, &state.orders)?;
    let order_id: u64 = id.parse().map_err(|_| AppError::NotFound)?;
    let order = state.orders.order_for(user, order_id).map_err(|e| {
        if matches!(e, AppError::Forbidden) {
            tracing::info!(user_id = user.id, order_id, "cross-user order access denied");
        }
        e
    })?;
    Ok(Json(order).into_response())
}

fn audit(request_id: &str, route: &str, code: &str, duration_ms: u64) {
    tracing::info!(
        request_id = request_id,
        route = route,
        code = code,
        duration_ms = duration_ms,
        "audit"
    );
}
