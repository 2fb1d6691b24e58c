// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant selection and session authentication.
//!
//! The tenant is named by the `appName` query parameter, then an `appName`
//! field in a JSON body, then the `x-app-name` header; with none of them the
//! default tenant is used. The session token is read from the tenant's
//! cookie, falling back to `Authorization: Bearer`.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use flatmate_core::{Caller, FlatmateError, Namespace};
use flatmate_tenant::TenantHandle;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Header naming the tenant when neither query nor body does.
pub const APP_NAME_HEADER: &str = "x-app-name";

/// The authenticated caller and the tenant they act in.
#[derive(Clone)]
pub struct RequestContext {
    pub tenant: Arc<TenantHandle>,
    pub caller: Caller,
}

impl RequestContext {
    pub fn namespace(&self) -> &Namespace {
        self.tenant.namespace()
    }

    pub fn uid(&self) -> &str {
        &self.caller.uid
    }
}

#[derive(Debug, Default, Deserialize)]
struct AppSelector {
    #[serde(rename = "appName")]
    app_name: Option<String>,
}

/// Middleware that resolves the tenant and verifies the caller's session.
pub async fn require_session(
    State(state): State<GatewayState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let (app_name, mut request) = select_tenant(request, state.max_body_bytes).await?;
    let tenant = state.registry.resolve(app_name.as_deref()).await?;

    let jar = CookieJar::from_headers(request.headers());
    let token = jar
        .get(tenant.cookie_name())
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            request
                .headers()
                .typed_get::<Authorization<Bearer>>()
                .map(|auth| auth.token().to_string())
        });
    let Some(token) = token else {
        debug!(
            tenant = %tenant.name(),
            path = %request.uri().path(),
            cookie = %tenant.cookie_name(),
            "no session credential"
        );
        return Err(FlatmateError::Unauthenticated(
            "no session cookie found, please log in again".to_string(),
        )
        .into());
    };

    let caller = tenant.verifier().verify(&token).await?;
    request
        .extensions_mut()
        .insert(RequestContext { tenant, caller });
    Ok(next.run(request).await)
}

/// Find the requested tenant name, buffering a JSON body to look inside it.
async fn select_tenant(
    request: Request,
    limit: usize,
) -> Result<(Option<String>, Request), ApiError> {
    if let Ok(Query(selector)) = Query::<AppSelector>::try_from_uri(request.uri()) {
        if let Some(name) = non_empty(selector.app_name) {
            return Ok((Some(name), request));
        }
    }

    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    let request = if is_json {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, limit).await.map_err(|_| {
            FlatmateError::Validation(format!("request body exceeds {limit} bytes"))
        })?;
        let from_body = serde_json::from_slice::<Value>(&bytes)
            .ok()
            .and_then(|v| v.get("appName").and_then(Value::as_str).map(str::to_string));
        let request = Request::from_parts(parts, Body::from(bytes));
        if let Some(name) = non_empty(from_body) {
            return Ok((Some(name), request));
        }
        request
    } else {
        request
    };

    let from_header = request
        .headers()
        .get(APP_NAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Ok((non_empty(from_header), request))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
