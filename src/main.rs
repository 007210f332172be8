//! Policy Gateway
//!
//! An authorization gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────────┐
//!                     │                     POLICY GATEWAY                        │
//!                     │                                                           │
//!   config.toml ──────┼─▶ lifecycle::startup ──▶ providers ──▶ orchestrator       │
//!                     │                                            │              │
//!                     │                                            ▼              │
//!                     │                                   RuleTable (ArcSwap)     │
//!                     │                                            │              │
//!   Client Request ───┼─▶ http::server ──▶ middleware::security ◀──┘              │
//!                     │                        │             │                    │
//!                     │                   allowed        security event           │
//!                     │                        │             │                    │
//!                     │                        ▼             ▼                    │
//!   Client Response ◀─┼──────────── echo handler    handler::SecurityResponder    │
//!                     │                                      │                    │
//!                     │                                      ▼                    │
//!                     │                              events::EventPublisher       │
//!                     └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use policy_gateway::config::{load_config, ConfigWatcher, GatewayConfig};
use policy_gateway::lifecycle::{signals, startup, Shutdown};
use policy_gateway::observability::{logging, metrics};
use policy_gateway::security::Verdict;
use policy_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "policy-gateway", version)]
#[command(about = "Authorization policy gateway", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve traffic (default)
    Serve {
        /// Reload the policy when the config file changes
        #[arg(long)]
        watch: bool,
    },
    /// Print the compiled rule table as JSON
    Rules,
    /// Show which rule a request would hit
    Check {
        /// HTTP method, e.g. GET
        method: String,
        /// Request path, e.g. /orders/42
        path: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to load {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => GatewayConfig::default(),
    };

    let result = match cli.command.unwrap_or(Commands::Serve { watch: false }) {
        Commands::Serve { watch } => serve(config, cli.config.filter(|_| watch)).await,
        Commands::Rules => print_rules(&config),
        Commands::Check { method, path } => check(&config, &method, &path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn serve(config: GatewayConfig, watch: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    logging::init(&config.observability.log_level);
    tracing::info!("policy-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        listener_budget_ms = config.events.listener_budget_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(&config)?;

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, updates) = match watch {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(&path);
            (Some(watcher.run()?), Some(updates))
        }
        None => (None, None),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);
    server.run(listener, updates, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn print_rules(config: &GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let table = startup::build_rule_table(&config.security)?;
    println!("{}", serde_json::to_string_pretty(&table.describe())?);
    Ok(())
}

fn check(config: &GatewayConfig, method: &str, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let table = startup::build_rule_table(&config.security)?;
    let method = method.to_ascii_uppercase();
    let report = match table.decide(&method, path) {
        Verdict::Matched(entry) => serde_json::json!({
            "method": method,
            "path": path,
            "verdict": "matched",
            "pattern": entry.pattern.to_string(),
            "access": entry.access,
            "provider": entry.origin.to_string(),
            "priority": entry.priority,
        }),
        verdict => serde_json::json!({
            "method": method,
            "path": path,
            "verdict": verdict.label(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
