use console::Term;
use tokio_util::sync::CancellationToken;

/// Set up the Ctrl+C handler for graceful shutdown.
///
/// The first Ctrl+C cancels `token`, letting in-flight repositories finish.
/// A second one exits immediately with status 130.
pub(crate) fn setup_shutdown_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }

        let is_tty = Term::stderr().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing current repositories...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing current repositories");
        }

        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(130);
        }
    });
}
