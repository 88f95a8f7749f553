//! Ctrl-C / SIGTERM handling for a running correlation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

/// Shared flag the history walks poll between commits.
pub type CancelFlag = Arc<AtomicBool>;

/// Create a cancel flag and register OS signal handlers.
///
/// On SIGTERM or SIGINT (Ctrl+C), the flag is set to `true`.
pub fn setup_signal_handlers() -> CancelFlag {
    let flag = Arc::new(AtomicBool::new(false));
    let flag_clone = flag.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    warn!(error = %e, "failed to register SIGTERM handler");
                    if ctrl_c.await.is_ok() {
                        info!("received SIGINT (Ctrl+C), cancelling");
                        flag_clone.store(true, Ordering::SeqCst);
                    }
                    return;
                }
            };

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), cancelling");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, cancelling");
                }
            }
        }

        #[cfg(not(unix))]
        {
            if ctrl_c.await.is_err() {
                warn!("failed to listen for Ctrl+C");
                return;
            }
            info!("received Ctrl+C, cancelling");
        }

        flag_clone.store(true, Ordering::SeqCst);
    });

    flag
}
