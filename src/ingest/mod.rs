//! HTTP ingestion service for pose landmark frames.
//!
//! The retention store is owned by [`CollectorState`] and handed to handlers
//! through `web::Data`, never through ambient globals; append and eviction
//! happen inside a single lock scope so each request mutates the store
//! atomically.

pub mod page;
pub mod store;

use std::sync::Mutex;

use actix_web::dev::Server;
use actix_web::http::{header, Method};
use actix_web::{web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::pose::Landmark;
use crate::protocol::{format_timestamp, ErrorBody, HealthResponse, IngestAck, PoseDataResponse};
use page::MONITOR_HTML;
use store::RetentionStore;

/// Maximum accepted JSON body size.
const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Default entry count for read-back queries.
const DEFAULT_LIMIT: usize = 10;

/// Shared collector state injected into every handler.
pub struct CollectorState {
    store: Mutex<RetentionStore>,
}

impl CollectorState {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(RetentionStore::new()),
        }
    }
}

impl Default for CollectorState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct PoseDataQuery {
    /// Kept as a raw string so non-numeric values fall back to the default
    /// instead of failing extraction.
    limit: Option<String>,
}

fn validation_error() -> HttpResponse {
    HttpResponse::BadRequest()
        .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .json(ErrorBody {
            error: "Invalid landmarks data".to_string(),
            message: "Landmarks must be an array".to_string(),
        })
}

fn ingest_fault() -> HttpResponse {
    HttpResponse::InternalServerError()
        .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .json(ErrorBody {
            error: "Internal server error".to_string(),
            message: "Failed to process pose landmarks".to_string(),
        })
}

async fn ingest_landmarks(state: web::Data<CollectorState>, body: web::Bytes) -> HttpResponse {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(_) => {
            warn!("rejected pose landmarks: body is not valid JSON");
            return validation_error();
        }
    };

    let items = match payload.get("landmarks").and_then(Value::as_array) {
        Some(items) => items,
        None => {
            warn!("rejected pose landmarks: missing or non-array landmarks field");
            return validation_error();
        }
    };

    let landmarks: Vec<Landmark> = match items
        .iter()
        .map(|v| serde_json::from_value(v.clone()))
        .collect::<Result<_, _>>()
    {
        Ok(landmarks) => landmarks,
        Err(_) => {
            warn!("rejected pose landmarks: malformed landmark element");
            return validation_error();
        }
    };

    let now = Utc::now();
    let timestamp = payload
        .get("timestamp")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format_timestamp(now));
    let session_id = payload
        .get("sessionId")
        .and_then(Value::as_str)
        .unwrap_or("default")
        .to_string();

    let count = landmarks.len();
    let id = match state.store.lock() {
        Ok(mut store) => store.append(
            landmarks,
            timestamp.clone(),
            session_id.clone(),
            format_timestamp(now),
        ),
        Err(_) => return ingest_fault(),
    };

    info!("received pose landmarks: count={count} session={session_id} timestamp={timestamp}");

    HttpResponse::Ok()
        .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .json(IngestAck {
            success: true,
            message: "Pose landmarks received successfully".to_string(),
            id,
        })
}

async fn pose_data(
    state: web::Data<CollectorState>,
    query: web::Query<PoseDataQuery>,
) -> HttpResponse {
    let limit = query
        .limit
        .as_deref()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_LIMIT);

    let store = match state.store.lock() {
        Ok(store) => store,
        Err(_) => {
            return HttpResponse::InternalServerError()
                .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
                .json(ErrorBody {
                    error: "Internal server error".to_string(),
                    message: "Failed to retrieve pose data".to_string(),
                })
        }
    };

    HttpResponse::Ok()
        .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .json(PoseDataResponse {
            total: store.len(),
            data: store.recent(limit),
        })
}

async fn health(state: web::Data<CollectorState>) -> HttpResponse {
    let stored_entries = match state.store.lock() {
        Ok(store) => store.len(),
        Err(_) => {
            return HttpResponse::InternalServerError()
                .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
                .finish()
        }
    };

    HttpResponse::Ok()
        .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: format_timestamp(Utc::now()),
            stored_entries,
        })
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .body(MONITOR_HTML)
}

async fn preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .append_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .append_header((header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"))
        .append_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .finish()
}

/// Route table, shared by the server and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/pose-landmarks", web::post().to(ingest_landmarks))
        .route("/pose-landmarks", web::method(Method::OPTIONS).to(preflight))
        .route("/pose-data", web::get().to(pose_data))
        .route("/health", web::get().to(health));
}

/// Bind and return the collector server. The caller awaits it.
pub fn run_server(state: web::Data<CollectorState>, host: &str, port: u16) -> Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::PayloadConfig::new(JSON_BODY_LIMIT))
            .configure(configure)
    })
    .bind((host, port))
    .with_context(|| format!("failed to bind {host}:{port}"))?
    .run();

    info!("collector listening on {host}:{port}");
    Ok(server)
}
