//! Switchyard (v1)
//!
//! Serves the demo application through the dispatcher.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (axum fallback, layers)
//!                         │
//!                         ▼
//!                     http::request (method override, input)
//!                         │
//!                         ▼
//!                     routing::Dispatcher ──▶ middleware chain ──▶ handler / controller
//!                         │
//!     Client Response     ▼
//!     ◀────────────── Outcome / Error → status
//!
//!     Cross-cutting: config, observability (tracing, metrics), lifecycle (shutdown)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use switchyard::config::{load_config, SwitchyardConfig};
use switchyard::observability::{logging, metrics};
use switchyard::routing::Dispatcher;
use switchyard::{app, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "HTTP router and dispatcher", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the application (default)
    Serve,
    /// Print the route table in registration order
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SwitchyardConfig::default(),
    };

    logging::init(&config.observability);

    let dispatcher = app::build_dispatcher();
    if let Err(errors) = dispatcher.validate() {
        for error in &errors {
            tracing::error!(error = %error, "Invalid route definition");
        }
        return Err(format!("{} invalid route definition(s)", errors.len()).into());
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Routes => print_routes(&dispatcher),
        Commands::Serve => serve(config, dispatcher).await?,
    }

    Ok(())
}

async fn serve(
    config: SwitchyardConfig,
    dispatcher: Dispatcher,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("switchyard v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        routes = dispatcher.table().len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        // Address validated at load time.
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    let signal = shutdown.clone();
    tokio::spawn(async move { signal.trigger_on_ctrl_c().await });

    HttpServer::new(config, Arc::new(dispatcher))
        .run(listener, receiver)
        .await?;

    Ok(())
}

fn print_routes(dispatcher: &Dispatcher) {
    println!("{:<8} {:<24} {:<16} {:<28} MIDDLEWARE", "METHOD", "PATH", "NAME", "HANDLER");
    for route in dispatcher.table().routes() {
        let middleware: Vec<String> = route.middleware().iter().map(|m| m.label()).collect();
        println!(
            "{:<8} {:<24} {:<16} {:<28} {}",
            route.method().as_str(),
            route.template(),
            route.name().unwrap_or("-"),
            route.handler().to_string(),
            middleware.join(", ")
        );
    }
}
