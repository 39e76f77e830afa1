// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graceful shutdown coordination with signal handling.
//!
//! Installs handlers for SIGTERM and SIGINT (Ctrl+C), triggering a
//! [`CancellationToken`] that the session engine monitors: a cancelled
//! token suppresses auto-reconnect scheduling so tenants wind down instead
//! of fighting the shutdown.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use courier_core::TenantId;

use crate::engine::SessionEngine;

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received. The signal handler task runs in the background until then.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Disconnect every known tenant session, keeping credentials so sessions
/// resume silently on the next start.
pub async fn drain_sessions(engine: &SessionEngine) {
    let tenants = engine.registry().tenants();
    if tenants.is_empty() {
        info!("no active sessions to drain");
        return;
    }

    info!(count = tenants.len(), "disconnecting tenant sessions");
    for tenant in tenants {
        let tenant = TenantId::new(tenant);
        engine.disconnect(&tenant).await;
    }
    warn!("all tenant sessions disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn install_signal_handler_returns_token() {
        let token = install_signal_handler();
        // Token should not be cancelled yet.
        assert!(!token.is_cancelled());
        // Cancel it manually to clean up the background task.
        token.cancel();
    }
}
