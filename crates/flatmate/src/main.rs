// SPDX-FileCopyrightText: 2026 Flatmate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flatmate - multi-tenant messaging backend for a flat-sharing app.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flatmate_config::FlatmateConfig;
use flatmate_tenant::TenantRegistry;

/// Flatmate - multi-tenant messaging backend.
#[derive(Parser, Debug)]
#[command(name = "flatmate", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server.
    Serve,
    /// Print the effective configuration with secrets redacted.
    Config,
    /// Mint a session token for a user (development tooling).
    Token {
        /// Tenant to sign for. Defaults to the configured default tenant.
        #[arg(long)]
        tenant: Option<String>,
        /// User id the token identifies.
        #[arg(long)]
        uid: String,
        /// Optional email carried in the token.
        #[arg(long)]
        email: Option<String>,
        /// Lifetime in seconds.
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => flatmate_config::load_and_validate_path(path),
        None => flatmate_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            flatmate_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let outcome = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Config) => print_config(&config),
        Some(Commands::Token {
            tenant,
            uid,
            email,
            ttl_secs,
        }) => {
            mint_token(
                &config,
                tenant.as_deref(),
                &uid,
                email.as_deref(),
                Duration::from_secs(ttl_secs),
            )
            .await
        }
        None => {
            println!("flatmate: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Render `config` as TOML with every session secret replaced.
fn redacted_toml(config: &FlatmateConfig) -> Result<String, flatmate_core::FlatmateError> {
    let mut shown = config.clone();
    for tenant in &mut shown.tenants {
        if tenant.session_secret.is_some() {
            tenant.session_secret = Some("[redacted]".to_string());
        }
    }
    toml::to_string_pretty(&shown)
        .map_err(|e| flatmate_core::FlatmateError::Config(format!("cannot render config: {e}")))
}

fn print_config(config: &FlatmateConfig) -> Result<(), flatmate_core::FlatmateError> {
    print!("{}", redacted_toml(config)?);
    Ok(())
}

async fn mint_token(
    config: &FlatmateConfig,
    tenant: Option<&str>,
    uid: &str,
    email: Option<&str>,
    ttl: Duration,
) -> Result<(), flatmate_core::FlatmateError> {
    let registry = Arc::new(TenantRegistry::new(config));
    let handle = registry.resolve(tenant).await?;
    let token = handle.sessions().issue(uid, email, ttl)?;
    println!("{token}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flatmate_config::TenantConfig;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_token_command() {
        let cli = Cli::parse_from(["flatmate", "token", "--uid", "u1", "--ttl-secs", "60"]);
        match cli.command {
            Some(Commands::Token { uid, ttl_secs, tenant, .. }) => {
                assert_eq!(uid, "u1");
                assert_eq!(ttl_secs, 60);
                assert!(tenant.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn printed_config_hides_secrets() {
        let mut tenant = TenantConfig::named("flatmate");
        tenant.session_secret = Some("hunter2".to_string());
        let config = FlatmateConfig {
            tenants: vec![tenant],
            ..FlatmateConfig::default()
        };
        let rendered = redacted_toml(&config).unwrap();
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[redacted]"));
        assert!(rendered.contains("message_quota = 5"));
    }
}
