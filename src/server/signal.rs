// Signal handling module
//
// - SIGINT:  Shutdown (Ctrl+C)
// - SIGTERM: Shutdown (Unix only)

use crate::logger;

/// Resolve when the process is asked to stop
///
/// A handler that fails to register is logged and then never fires; the
/// other one keeps working.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                logger::log_error(&format!("Failed to register SIGTERM handler: {e}"));
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => logger::log_signal("SIGINT"),
        () = terminate => logger::log_signal("SIGTERM"),
    }
}
