pub mod assessment;
pub mod catalog;
pub mod guidance;
pub mod health;

use crate::error::AppError;

/// Run a store call on the blocking pool; persistence does file I/O.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> readiness_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(result)
}
