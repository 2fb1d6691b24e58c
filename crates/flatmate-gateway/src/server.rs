// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the API.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use flatmate_chat::ChatService;
use flatmate_config::{FlatmateConfig, ServerConfig};
use flatmate_core::FlatmateError;
use flatmate_negotiation::NegotiationService;
use flatmate_notify::NotificationAggregator;
use flatmate_tenant::TenantRegistry;

use crate::handlers::{chat, health, notifications, offers};
use crate::session::require_session;

/// State for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    pub start_time: Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub registry: Arc<TenantRegistry>,
    pub chat: Arc<ChatService>,
    pub notifications: NotificationAggregator,
    pub offers: NegotiationService,
    pub health: HealthState,
    /// Upper bound on buffered request bodies.
    pub max_body_bytes: usize,
}

impl GatewayState {
    pub fn new(registry: Arc<TenantRegistry>, config: &FlatmateConfig) -> Self {
        Self {
            registry,
            chat: Arc::new(ChatService::new(config.chat.clone())),
            notifications: NotificationAggregator::new(),
            offers: NegotiationService::new(),
            health: HealthState {
                start_time: Instant::now(),
            },
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Build the full router.
///
/// - GET /health (public)
/// - /chat/*, /notifications/*, /property/{listing_id}/negotiate* (session required)
pub fn build_router(state: GatewayState) -> Router {
    let body_limit = state.max_body_bytes;

    let public_routes = Router::new()
        .route("/health", get(health::get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/chat/send", post(chat::send))
        .route("/chat/send-bulk", post(chat::send_bulk))
        .route("/chat/messages/{chat_id}", get(chat::messages))
        .route("/chat/list", get(chat::list))
        .route("/chat/status/{property_id}", get(chat::status))
        .route("/notifications", get(notifications::list))
        .route("/notifications/read", post(notifications::mark_read))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/property/{listing_id}/negotiate", post(offers::submit))
        .route(
            "/property/{listing_id}/negotiate/status",
            get(offers::status),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), FlatmateError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| FlatmateError::Internal(format!("failed to bind {addr}: {e}")))?;

    tracing::info!("API server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| FlatmateError::Internal(format!("server error: {e}")))?;

    tracing::info!("API server stopped");
    Ok(())
}
