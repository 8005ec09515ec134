use std::sync::{Arc, Mutex};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::infrastructure::bootstrap::build_state;
use crate::infrastructure::config::{AppConfig, DEFAULT_CONFIG_FILE};
use crate::interfaces::http::{add_log, start_server, LogEntry};

const CONFIG_PATH_VAR: &str = "TABSIGHT_CONFIG";

fn config_path() -> String {
    std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn to_io_error(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

pub async fn run() -> std::io::Result<()> {
    let _ = dotenvy::dotenv();

    let path = config_path();
    let config = match AppConfig::load(&path) {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info");
            error!(error = %err, config_path = %path, "Failed to load configuration");
            return Err(to_io_error(err));
        }
    };
    init_tracing(&config.log_filter);

    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));
    let state = build_state(&config, &logs).map_err(to_io_error)?;

    let (host, port) = config.bind_address();
    info!(host = %host, port, "Starting HTTP server");
    add_log(
        &logs,
        "INFO",
        "HttpApi",
        &format!("Listening on {}:{}", host, port),
    );

    start_server(Arc::new(state), logs, (host, port))?.await
}
