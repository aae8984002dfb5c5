use std::sync::Arc;

use axum::extract::{Query as QueryString, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use layers::{LayerSet, Query, QueryParams};
use serde_json::Value;
use streaming::{ERROR_CODE_DEFAULT, error_response, shape_page};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

#[derive(Clone)]
pub struct AppState {
    pub layers: Arc<LayerSet>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::OPTIONS]);

    Router::new()
        .route("/", get(get_pois))
        .route("/porpoise", get(get_pois))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_pois(
    State(state): State<AppState>,
    QueryString(params): QueryString<QueryParams>,
) -> Response {
    let layers = state.layers.clone();
    let body = match tokio::task::spawn_blocking(move || respond(&layers, &params)).await {
        Ok(body) => body,
        Err(err) => {
            error!("request task failed: {err}");
            error_response("", ERROR_CODE_DEFAULT, None)
        }
    };
    Json(body).into_response()
}

/// Answers one request. Failures become an error payload, never a transport error.
pub fn respond(layers: &LayerSet, params: &QueryParams) -> Value {
    let requested = params.layer_name.as_deref().unwrap_or_default();
    let query = match Query::from_params(params) {
        Ok(query) => query,
        Err(err) => {
            warn!("rejected request for layer {requested:?}: {err}");
            return error_response(requested, ERROR_CODE_DEFAULT, Some(&err.to_string()));
        }
    };
    let layer = match layers.get(&query.layer_name) {
        Ok(layer) => layer,
        Err(err) => {
            warn!("rejected request: {err}");
            return error_response(requested, ERROR_CODE_DEFAULT, Some(&err.to_string()));
        }
    };
    let page = match layer.page(&query) {
        Ok(page) => page,
        Err(err) => {
            error!("layer {} failed: {err}", layer.name());
            return error_response(layer.name(), ERROR_CODE_DEFAULT, Some(&err.to_string()));
        }
    };
    match shape_page(layer.name(), &page) {
        Ok(body) => body,
        Err(err) => {
            error!("response serialization failed: {err}");
            error_response(layer.name(), ERROR_CODE_DEFAULT, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use layers::{LayerSet, QueryParams};
    use streaming::{MemorySessionStore, SessionLocks};

    use super::respond;
    use crate::config::ServerConfig;

    fn museum_layers(dir: &Path, rows: usize) -> LayerSet {
        let mut text = String::from("id\tlat\tlon\ttitle\n");
        for i in 1..=rows {
            text.push_str(&format!("{i}\t48.158\t11.5787\tpoi {i}\n"));
        }
        std::fs::write(dir.join("museum.txt"), text).expect("write");
        let config = ServerConfig::from_json(
            r#"{"layers": [{"name": "museum", "connector": "flat", "source": "museum.txt"}]}"#,
        )
        .expect("config");
        config
            .build_layers(
                dir,
                Arc::new(MemorySessionStore::new(8)),
                Arc::new(SessionLocks::new(2)),
            )
            .expect("layers")
    }

    fn params(layer: &str) -> QueryParams {
        QueryParams {
            user_id: Some("user".to_string()),
            layer_name: Some(layer.to_string()),
            lat: Some("48.158".to_string()),
            lon: Some("11.5787".to_string()),
            radius: Some("100".to_string()),
            ..QueryParams::default()
        }
    }

    #[test]
    fn serves_a_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let set = museum_layers(dir.path(), 2);
        let body = respond(&set, &params("museum"));
        assert_eq!(body["errorCode"], 0);
        assert_eq!(body["layer"], "museum");
        assert_eq!(body["hotspots"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["nextPageKey"], "");
    }

    #[test]
    fn pages_follow_next_page_key() {
        let dir = tempfile::tempdir().expect("tempdir");
        let set = museum_layers(dir.path(), 300);
        let first = respond(&set, &params("museum"));
        assert_eq!(first["morePages"], true);
        assert_eq!(first["nextPageKey"], "1");

        let mut next = params("museum");
        next.page_key = Some("1".to_string());
        let second = respond(&set, &next);
        assert_eq!(second["hotspots"].as_array().map(Vec::len), Some(44));
        assert_eq!(second["morePages"], false);
    }

    #[test]
    fn validation_errors_become_error_payloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let set = museum_layers(dir.path(), 1);

        let mut missing = params("museum");
        missing.lat = None;
        let body = respond(&set, &missing);
        assert_eq!(body["errorCode"], 20);
        assert_eq!(body["errorString"], "Missing parameter: lat");
        assert_eq!(body["hotspots"], serde_json::json!([]));

        let body = respond(&set, &params("zoo"));
        assert_eq!(body["errorCode"], 20);
        assert_eq!(body["layer"], "zoo");
        assert_eq!(body["errorString"], "Unknown layer in request: zoo");
    }

    #[test]
    fn storage_errors_become_error_payloads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let set = museum_layers(dir.path(), 1);
        std::fs::write(dir.path().join("museum.txt"), "").expect("truncate");
        let body = respond(&set, &params("museum"));
        assert_eq!(body["errorCode"], 20);
        assert_eq!(body["errorString"], "File not readable or empty");
    }
}
