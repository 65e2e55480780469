pub mod analyze;
pub mod capture;
pub mod check;
pub mod gif;
pub mod init;
pub mod watch;

/// Resolves when the user presses Ctrl+C.
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
