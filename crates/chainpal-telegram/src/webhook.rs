//! HTTP endpoint receiving Telegram webhook POSTs.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::{debug, error, info};

use chainpal_core::dispatcher::Dispatcher;

use crate::wire;

pub fn webhook_router(path: &str, dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route(path, post(receive_update).fallback(method_not_allowed))
        .with_state(dispatcher)
}

pub async fn serve_webhook(
    bind_addr: &str,
    path: &str,
    dispatcher: Arc<Dispatcher>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!(addr = %listener.local_addr()?, %path, "webhook listening");
    axum::serve(listener, webhook_router(path, dispatcher)).await?;
    Ok(())
}

fn ok() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "message": "OK" })))
}

// Telegram redelivers on non-2xx, so anything we cannot act on is acknowledged.
async fn receive_update(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let update = match serde_json::from_slice::<wire::Update>(&body) {
        Ok(u) => u,
        Err(e) => {
            debug!(error = %e, "ignoring undecodable update");
            return ok();
        }
    };
    let Some(incoming) = update.into_incoming() else {
        debug!("ignoring update without text or callback");
        return ok();
    };

    match dispatcher.handle(incoming).await {
        Ok(()) => ok(),
        Err(e) => {
            error!(error = %e, "update handling failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal Server Error" })),
            )
        }
    }
}

async fn method_not_allowed(method: Method) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        format!("Method {method} Not Allowed"),
    )
}
