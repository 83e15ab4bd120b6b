#![forbid(unsafe_code)]

use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tracing::{debug, warn};

use crate::control;
use crate::render::{render, Rendered};
use crate::router::classify;
use crate::rpc::rpc_handler;
use crate::state::{lock_state, AppContext};

pub const RPC_PATH: &str = "/rpc";
pub const CONTROL_PREFIX: &str = "/__control";

/// Backend mock on the fallback, RPC objects on `/rpc`, control under `/__control`.
pub fn build_app(ctx: AppContext) -> Router {
    Router::new()
        .route(RPC_PATH, post(rpc_handler))
        .nest(CONTROL_PREFIX, control::routes())
        .fallback(serve_backend)
        .with_state(ctx)
}

async fn serve_backend(State(ctx): State<AppContext>, method: Method, uri: Uri) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    let route = classify(&method, path);
    let rendered = match lock_state(&ctx.state) {
        Ok(mut state) => render(&route, &mut state),
        Err(err) => {
            warn!(error = %err, "backend request rejected");
            Rendered::error(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    };
    debug!(%method, path, status = rendered.status.as_u16(), "backend request served");
    if rendered.stop_requested {
        ctx.shutdown.request();
    }
    rendered.into_response()
}
