use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use clap::{Parser, Subcommand};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use supabase_gateway::config::{Settings, DEFAULT_PORT};
use supabase_gateway::db::SupabaseClient;
use supabase_gateway::mcp::{self, McpServer};
use supabase_gateway::state::AppState;

#[derive(Parser)]
#[command(name = "supabase-gateway")]
#[command(about = "Read-only gateway to a Supabase project's public schema", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT, global = true)]
    port: u16,
}

#[derive(Clone, Copy, Subcommand)]
enum Command {
    /// Serve the REST interface over HTTP (default)
    Serve,
    /// Speak line-delimited JSON-RPC 2.0 on stdin/stdout
    Stdio,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Serve);

    // stdout carries the JSON-RPC frames in stdio mode, so logs go to stderr.
    init_tracing(matches!(command, Command::Stdio));

    let settings = Settings::from_env()?;
    let client = SupabaseClient::new(&settings.supabase_url, settings.supabase_key.clone())?;
    tracing::info!(url = %settings.supabase_url, "backing client ready");
    let state = AppState::new(Arc::new(client), settings.defaults);

    match command {
        Command::Serve => serve_http(state, cli.port).await,
        Command::Stdio => {
            let server = McpServer::new(state);
            mcp::serve(&server, tokio::io::stdin(), tokio::io::stdout()).await?;
            Ok(())
        }
    }
}

fn init_tracing(to_stderr: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    let json = std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json");
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
    match (json, to_stderr) {
        (true, true) => builder.json().with_writer(std::io::stderr).init(),
        (true, false) => builder.json().init(),
        (false, true) => builder.with_writer(std::io::stderr).init(),
        (false, false) => builder.init(),
    }
}

async fn serve_http(state: AppState, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(86_400));

    let nosniff: SetResponseHeaderLayer<HeaderValue> = SetResponseHeaderLayer::overriding(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    let app = supabase_gateway::create_router(state)
        .layer(cors)
        .layer(nosniff)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CompressionLayer::new());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Supabase gateway listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("failed to install SIGTERM handler: {}", e);
                ctrl_c.await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await;
    }
    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
