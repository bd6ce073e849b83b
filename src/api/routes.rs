//! Router wiring for the console: JSON API plus the embedded single page.

use axum::{
  body::Body,
  http::{header, StatusCode},
  response::{IntoResponse, Response},
  routing::{get, post},
  Router,
};
use rust_embed::Embed;
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers::{self, ApiState};

/// Embedded console page.
#[derive(Embed)]
#[folder = "web-ui"]
struct Assets;

async fn index_handler() -> impl IntoResponse {
  serve_static("index.html")
}

fn serve_static(path: &str) -> Response {
  match Assets::get(path) {
    Some(content) => {
      let mime = mime_guess::from_path(path).first_or_octet_stream();
      Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime.as_ref())
        .body(Body::from(content.data.into_owned()))
        .unwrap()
    }
    None => Response::builder()
      .status(StatusCode::NOT_FOUND)
      .body(Body::from("Not Found"))
      .unwrap(),
  }
}

async fn fallback_handler(uri: axum::http::Uri) -> impl IntoResponse {
  let path = uri.path();
  if path.starts_with("/api/") {
    return Response::builder()
      .status(StatusCode::NOT_FOUND)
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"error":"Not Found"}"#))
      .unwrap();
  }

  let path = path.trim_start_matches('/');
  serve_static(if path.is_empty() { "index.html" } else { path })
}

/// Create the console router with all routes.
pub fn create_router(state: ApiState) -> Router {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  Router::new()
    .route("/health", get(handlers::health_check))
    // Node
    .route("/api/accounts", get(handlers::list_accounts))
    // Sources and compilation
    .route("/api/sources", post(handlers::upload_sources))
    .route("/api/artifacts", get(handlers::get_artifacts))
    // Deployment and interaction
    .route("/api/deploy", post(handlers::deploy))
    .route("/api/contract", get(handlers::get_contract))
    .route("/api/call", post(handlers::call_function))
    // The single page
    .route("/", get(index_handler))
    .fallback(fallback_handler)
    .with_state(state)
    .layer(cors)
}
