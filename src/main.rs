use std::sync::Arc;
use tokio::sync::Notify;

use bird_mdm::config::{AppState, Config};
use bird_mdm::{cgi, logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Config file path without extension, "config" by default
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config".to_string());
    let cfg = Config::load_from(&config_path)?;

    let is_cgi = cgi::is_cgi_environment();
    logger::init(&cfg, is_cgi)?;

    let state = Arc::new(AppState::new(&cfg, is_cgi)?);

    if is_cgi {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(cgi::run(state))?;
        return Ok(());
    }

    // Worker thread count follows the workers setting, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg, state))
}

async fn async_main(cfg: Config, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;

    let missing = state.dispatcher.artifacts().missing();
    if !missing.is_empty() {
        logger::log_warning(&format!(
            "Missing artifacts in '{}': {}",
            cfg.service.resource_dir,
            missing
                .iter()
                .map(|e| e.artifact_name())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    // Connections are served with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await
}
