//! coi-serve: static file server for cross-origin isolated pages
//!
//! Serves the current directory over HTTP/1.1 and sets
//! `Cross-Origin-Opener-Policy: same-origin` and
//! `Cross-Origin-Embedder-Policy: require-corp` on every response, which
//! `SharedArrayBuffer` and threaded WebAssembly need.
//!
//! ```text
//! coi-serve [port] [bind_address]
//! coi-serve 8080
//! coi-serve 3000 0.0.0.0
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod error;
mod handler;
mod http;
mod logger;
mod server;
#[cfg(test)]
mod test_support;

use error::StartupError;

fn main() -> ExitCode {
    logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            logger::log_startup_failure(&err);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), StartupError> {
    let cfg = config::Config::from_args(std::env::args().skip(1))?;

    let root = std::env::current_dir().map_err(|source| StartupError::Root {
        path: PathBuf::from("."),
        source,
    })?;
    let state = config::AppState::new(&root).map_err(|source| StartupError::Root {
        path: root.clone(),
        source,
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(StartupError::Runtime)?;

    let result = runtime.block_on(async_main(cfg, Arc::new(state)));
    // In-flight connections are abandoned, not drained
    runtime.shutdown_background();
    result
}

async fn async_main(cfg: config::Config, state: Arc<config::AppState>) -> Result<(), StartupError> {
    let listener = server::bind(&cfg.server).await?;

    match listener.local_addr() {
        Ok(local_addr) => logger::log_server_start(&cfg.server, &local_addr, &state.root),
        Err(e) => logger::log_warning(&format!("Could not read bound address: {e}")),
    }

    server::run(listener, state, server::shutdown_signal()).await;
    logger::log_shutdown();
    Ok(())
}
