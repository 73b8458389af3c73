use axum::{middleware, routing::get, Json, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::rate_limit;
use crate::state::AppState;

/// Assemble the full application router. All domain routes live under
/// `/api`; the health check sits at the root.
pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .merge(crate::daily_log::router())
        .merge(crate::users::router())
        .merge(crate::reports::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::api_guard,
        ))
        .merge(
            crate::catalog::router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit::relaxed_guard,
            )),
        )
        .merge(crate::auth::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
