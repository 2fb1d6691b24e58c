// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `flatmate serve` command implementation.
//!
//! Builds the tenant registry, resolves the default tenant eagerly so bad
//! credentials fail at startup rather than on the first request, and runs
//! the HTTP gateway until SIGINT or SIGTERM.

use std::sync::Arc;

use flatmate_config::FlatmateConfig;
use flatmate_core::FlatmateError;
use flatmate_gateway::{start_server, GatewayState};
use flatmate_tenant::TenantRegistry;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Runs the `flatmate serve` command.
pub async fn run_serve(config: FlatmateConfig) -> Result<(), FlatmateError> {
    init_tracing(&config.server.log_level);

    info!(
        tenants = config.tenants.len(),
        default_tenant = %config.default_tenant,
        strict_quota = config.chat.strict_quota,
        "starting flatmate serve"
    );

    let registry = Arc::new(TenantRegistry::new(&config));
    match registry.resolve(None).await {
        Ok(tenant) => info!(tenant = %tenant.name(), "default tenant ready"),
        Err(e) => {
            error!(error = %e, "default tenant failed to initialize");
            return Err(e);
        }
    }

    let state = GatewayState::new(registry, &config);
    let cancel = install_signal_handler();
    start_server(&config.server, state, cancel).await?;

    info!("flatmate serve stopped");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to the
/// flatmate crates and everything else logs at `warn`.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    // try_init: a subscriber may already be installed in tests.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn default_directives(log_level: &str) -> String {
    format!("flatmate={log_level},warn")
}

/// Installs handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either arrives.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler, relying on Ctrl+C");
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT (Ctrl+C), initiating shutdown");
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("received SIGINT (Ctrl+C), initiating shutdown");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, initiating shutdown");
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("received Ctrl+C, initiating shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatmate_config::TenantConfig;

    #[test]
    fn directives_scope_level_to_flatmate() {
        assert_eq!(default_directives("debug"), "flatmate=debug,warn");
    }

    #[tokio::test]
    async fn serve_refuses_tenant_without_credentials() {
        let mut tenant = TenantConfig::named("zz-nocreds");
        tenant.backend = flatmate_config::StoreBackend::Memory;
        let config = FlatmateConfig {
            default_tenant: "zz-nocreds".to_string(),
            tenants: vec![tenant],
            ..FlatmateConfig::default()
        };
        let err = run_serve(config).await.unwrap_err();
        assert!(matches!(err, FlatmateError::TenantUnavailable { .. }));
    }
}
