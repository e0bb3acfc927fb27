use anyhow::Result;

/// Resolve on the first termination signal (SIGTERM, SIGINT or Ctrl+C).
pub async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("shutdown: SIGTERM received"),
            _ = sigint.recv() => tracing::info!("shutdown: SIGINT received"),
        }
        Ok(())
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        tracing::info!("shutdown: Ctrl+C received");
        Ok(())
    }
}

/// Like [`wait_for_shutdown`], but never fails: if signal handlers cannot be
/// installed it falls back to `ctrl_c()`.
pub async fn shutdown_signal() {
    if let Err(e) = wait_for_shutdown().await {
        tracing::warn!(
            error = %e,
            "shutdown: primary waiter failed; falling back to ctrl_c()"
        );
        let _ = tokio::signal::ctrl_c().await;
    }
}
