use axum::Router;
use axum::BoxError;
use axum::error_handling::HandleErrorLayer;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower::timeout::TimeoutLayer;
use tower::timeout::error::Elapsed;
use tower_http::trace::TraceLayer;

use crate::net::error::{self, GeneralKind};
use crate::net::layer;
use crate::state::ArcShared;

mod handle;

async fn handle_error(error: BoxError) -> error::Error {
    if error.is::<Elapsed>() {
        error::Error::api(GeneralKind::Timeout)
    } else {
        error::Error::new()
            .context("unhandled service error")
            .source(error)
    }
}

pub fn routes(state: &ArcShared) -> Router {
    Router::new()
        .route("/health", get(handle::health::get))
        .route("/list", get(handle::list::get))
        .route("/files/:file_id/content", get(handle::files::content::get))
        .route("/write", post(handle::write::post))
        .fallback(handle::not_found)
        .method_not_allowed_fallback(handle::method_not_allowed)
        .layer(ServiceBuilder::new()
            .layer(layer::request_id::RIDLayer::new())
            .layer(TraceLayer::new_for_http()
                .make_span_with(layer::trace::make_span_with)
                .on_request(layer::trace::on_request)
                .on_response(layer::trace::on_response)
                .on_failure(layer::trace::on_failure))
            .layer(HandleErrorLayer::new(handle_error))
            .layer(TimeoutLayer::new(state.timeout())))
        .with_state(state.clone())
}
