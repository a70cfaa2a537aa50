use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use parking_lot::{Mutex, RwLock};
use search_core::corpus::{index_documents, load_documents, InputDoc};
use search_core::tokenizer::split_into_words;
use search_core::{
    remove_duplicates, DocId, Document, DocumentStatus, ExecutionPolicy, RequestQueue,
    SearchConfig, SearchError, SearchServer,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

type ApiError = (StatusCode, String);

/// Startup settings; the binary fills them from flags and the environment.
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub corpus: Option<PathBuf>,
    pub stop_words: String,
    pub config: SearchConfig,
    pub admin_token: Option<String>,
    pub cors_allow_origin: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub policy: ExecutionPolicy,
}

#[derive(Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<Document>,
}

#[derive(Deserialize)]
pub struct MatchParams {
    pub q: String,
    pub id: DocId,
    #[serde(default)]
    pub policy: ExecutionPolicy,
}

#[derive(Serialize, Deserialize)]
pub struct MatchResponse {
    pub doc_id: DocId,
    pub words: Vec<String>,
    pub status: DocumentStatus,
}

#[derive(Deserialize)]
pub struct PolicyParams {
    #[serde(default)]
    pub policy: ExecutionPolicy,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RwLock<SearchServer>>,
    pub requests: Arc<Mutex<RequestQueue>>,
    pub admin_token: Option<String>,
}

pub fn build_app(options: AppOptions) -> Result<Router> {
    let mut engine = SearchServer::with_config(split_into_words(&options.stop_words), options.config)?;
    if let Some(path) = &options.corpus {
        let docs = load_documents(path)?;
        index_documents(&mut engine, &docs)?;
    }
    tracing::info!(documents = engine.document_count(), "search engine ready");

    let app_state = AppState {
        engine: Arc::new(RwLock::new(engine)),
        requests: Arc::new(Mutex::new(RequestQueue::new())),
        admin_token: options.admin_token,
    };

    // CORS: comma-separated allow list, or Any when unset/empty
    let cors = match options.cors_allow_origin {
        Some(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        None => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/match", get(match_handler))
        .route("/stats", get(stats_handler))
        .route("/doc/:doc_id", get(doc_handler).delete(remove_handler))
        .route("/index/batch", post(index_batch))
        .route("/index/dedup", post(index_dedup))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let results = state
        .engine
        .read()
        .find_top_documents_by_status_with(params.policy, &params.q, params.status)
        .map_err(search_error)?;
    state.requests.lock().record(&results);
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        results,
    }))
}

pub async fn match_handler(
    State(state): State<AppState>,
    Query(params): Query<MatchParams>,
) -> Result<Json<MatchResponse>, ApiError> {
    let engine = state.engine.read();
    let (words, status) = engine
        .match_document_with(params.policy, &params.q, params.id)
        .map_err(search_error)?;
    Ok(Json(MatchResponse {
        doc_id: params.id,
        words: words.into_iter().map(str::to_string).collect(),
        status,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Json<serde_json::Value> {
    let engine = state.engine.read();
    let frequencies: BTreeMap<&str, f64> = engine
        .word_frequencies(doc_id)
        .iter()
        .map(|(word, freq)| (word.as_ref(), *freq))
        .collect();
    Json(serde_json::json!({ "doc_id": doc_id, "frequencies": frequencies }))
}

pub async fn stats_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let document_count = state.engine.read().document_count();
    let no_result_requests = state.requests.lock().no_result_requests();
    Json(serde_json::json!({
        "document_count": document_count,
        "no_result_requests": no_result_requests,
    }))
}

// --- Admin endpoints ---
async fn remove_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(doc_id): Path<DocId>,
    Query(params): Query<PolicyParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let mut engine = state.engine.write();
    let existed = engine.contains(doc_id);
    engine.remove_document_with(params.policy, doc_id);
    Ok(Json(serde_json::json!({ "doc_id": doc_id, "removed": existed })))
}

/// Adds documents in order; on the first rejection the earlier ones stay indexed.
async fn index_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(docs): Json<Vec<InputDoc>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let mut engine = state.engine.write();
    for (added, doc) in docs.iter().enumerate() {
        if let Err(err) = engine.add_document(doc.id, &doc.text, doc.status, &doc.ratings) {
            let (status, msg) = search_error(err);
            return Err((status, format!("document {} (after {added} added): {msg}", doc.id)));
        }
    }
    Ok(Json(serde_json::json!({
        "added": docs.len(),
        "document_count": engine.document_count(),
    })))
}

async fn index_dedup(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, ApiError> {
    authorize(&state, &headers)?;
    let removed = remove_duplicates(&mut state.engine.write());
    Ok(Json(serde_json::json!({ "removed": removed })))
}

fn search_error(err: SearchError) -> ApiError {
    let status = match err {
        SearchError::UnknownDocument(_) => StatusCode::NOT_FOUND,
        SearchError::InvalidId(_) | SearchError::InvalidWord(_) | SearchError::InvalidQuery(_) => {
            StatusCode::BAD_REQUEST
        }
    };
    (status, err.to_string())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
