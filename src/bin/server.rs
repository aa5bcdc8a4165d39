use std::{
    env::{self},
    error::Error,
    fs::OpenOptions,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::Duration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use finity::{
    AdvisorClient, AdvisorConfig, AppState, DEFAULT_ADVISOR_MODEL, DEFAULT_ADVISOR_TIMEOUT,
    DEFAULT_ADVISOR_URL,
    build_router, graceful_shutdown, logging_middleware,
};

/// The REST API server for Finity.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "FINITY_DB_PATH", default_value = "finity.db")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "FINITY_PORT", default_value_t = 3000)]
    port: u16,

    /// The IP address to listen on.
    #[arg(short, long, env = "FINITY_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    address: IpAddr,

    /// The base URL of the generative-language API.
    #[arg(long, env = "FINITY_ADVISOR_URL", default_value = DEFAULT_ADVISOR_URL)]
    advisor_url: String,

    /// The model that gives savings advice.
    #[arg(long, env = "FINITY_ADVISOR_MODEL", default_value = DEFAULT_ADVISOR_MODEL)]
    advisor_model: String,

    /// How many seconds to wait for the advisor before giving up.
    #[arg(long, env = "FINITY_ADVISOR_TIMEOUT_SECS", default_value_t = DEFAULT_ADVISOR_TIMEOUT.as_secs())]
    advisor_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    setup_logging()?;

    let args = Args::parse();

    let addr = SocketAddr::new(args.address, args.port);

    let secret =
        env::var("SECRET").map_err(|_| "The environment variable 'SECRET' must be set")?;
    let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();

    let advisor_config = AdvisorConfig::new(
        &api_key,
        &args.advisor_url,
        &args.advisor_model,
        Duration::from_secs(args.advisor_timeout_secs),
    )
    .map_err(|error| format!("Invalid advisor settings (check GEMINI_API_KEY): {error}"))?;
    let advisor = AdvisorClient::new(advisor_config)?;

    let conn = Connection::open(&args.db_path)?;
    let state = AppState::new(conn, &secret, advisor)?;

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging() -> Result<(), Box<dyn Error>> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .map_err(|error| format!("Could not create log file: {error}"))?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .try_init()?;

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged where they are converted into responses.
        .on_failure(());

    router.layer(tracing_layer)
}

#[cfg(test)]
mod server_tests {
    use clap::Parser;
    use finity::DEFAULT_ADVISOR_TIMEOUT;

    use super::Args;

    #[test]
    fn advisor_timeout_defaults_to_library_default() {
        let args = Args::try_parse_from(["server"]).unwrap();

        assert_eq!(args.advisor_timeout_secs, DEFAULT_ADVISOR_TIMEOUT.as_secs());
    }
}
