use std::{convert::Infallible, path::PathBuf, sync::Arc};

use console_input::console_input_thread;
use context::{ManagerContext, ManagerContextRef};
use crisis::{error::ConfigError, GameConfig, Notice};
use llm::Credentials;
use tokio::sync::{mpsc, RwLock};
use tracing::{error, info, warn};
use warp::{reject::Rejection, Filter};

mod command;
mod console_input;
mod context;
mod export;
mod handler;
mod llm;
mod ws;

type Result<T> = std::result::Result<T, Rejection>;

const CONFIG_VAR: &str = "CRISIS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "crisis.json";
const PORT: u16 = 9080;

fn load_config() -> std::result::Result<GameConfig, ConfigError> {
    let path = std::env::var(CONFIG_VAR).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    match GameConfig::load(&path) {
        Ok(config) => {
            info!(path = %path.display(), "loaded game config");
            Ok(config)
        }
        Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "no config file, using defaults");
            Ok(GameConfig::default())
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid game config");
            std::process::exit(1);
        }
    };
    let credentials = match Credentials::from_env() {
        Ok(credentials) => credentials,
        Err(e) => {
            error!(error = %e, "cannot start without credentials");
            std::process::exit(1);
        }
    };

    let (notice_tx, notice_rx) = mpsc::unbounded_channel();
    let context = ManagerContext::new(config, credentials, notice_tx);
    let context_ref = Arc::new(RwLock::new(context));

    relay_notices(notice_rx, context_ref.clone());
    console_input_thread(context_ref.clone(), tokio::runtime::Handle::current());

    let api_routes = warp::path("api").and(
        warp::path("health").and_then(handler::health_handler)
            .or(warp::path("ws")
                .and(warp::ws())
                .and(with_context(context_ref.clone()))
                .and_then(handler::ws_handler))
    );
    let routes = api_routes.with(warp::cors().allow_any_origin());

    info!("starting emergency response manager");
    println!("   Local:   http://127.0.0.1:{}", PORT);
    if let Ok(local_ip) = local_ip_address::local_ip() {
        println!("   Network: http://{}:{}", local_ip, PORT);
    }
    println!("   Type `start` to begin the emergency response mission");

    if let Err(e) = std::net::TcpListener::bind(("0.0.0.0", PORT)) {
        error!(port = PORT, error = %e, "failed to bind, is another manager running?");
        std::process::exit(1);
    }

    warp::serve(routes).run(([0, 0, 0, 0], PORT)).await;
}

/// Forwards game notices to the log and every connected frontend.
fn relay_notices(mut notices: mpsc::UnboundedReceiver<Notice>, context_ref: ManagerContextRef) {
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            let text = notice.to_string();
            info!(target: "relay", "{text}");
            context_ref.read().await.broadcast(&text);
        }
    });
}

fn with_context(context_ref: ManagerContextRef) -> impl Filter<Extract = (ManagerContextRef,), Error = Infallible> + Clone {
    warp::any().map(move || context_ref.clone())
}
