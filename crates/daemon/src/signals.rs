// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OS signal handling: SIGINT/SIGTERM cancel the scheduler's root token for
//! a graceful drain; a second signal during the drain forces an immediate
//! exit (spec §3 supplemented feature, §4.10).

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Wait for the first SIGINT/SIGTERM or an externally triggered
/// cancellation, then cancel `cancel` and return so the caller can drain.
/// A second signal arriving during that drain forces an immediate exit
/// with status 1, watched for on a detached background task.
pub async fn wait_for_shutdown(cancel: CancellationToken) {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(error = %e, "failed to install SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
        _ = cancel.cancelled() => return,
    }
    cancel.cancel();

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
        tracing::warn!("received second termination signal during shutdown, forcing exit");
        std::process::exit(1);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_token_starts_uncancelled() {
        let cancel = CancellationToken::new();
        assert!(!cancel.is_cancelled());
    }
}
