use std::future::Future;

use theframe_core::FrameResult;
use tracing::warn;

/// Run `attempt`, running it once more if it failed with a connection reset.
///
/// Every other failure, including a reset on the second try, is returned as is.
pub async fn retry_on_reset<T, F, Fut>(operation: &str, mut attempt: F) -> FrameResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FrameResult<T>>,
{
    match attempt().await {
        Err(e) if e.is_connection_reset() => {
            warn!(operation, error = %e, "Connection reset, retrying once");
            attempt().await
        }
        other => other,
    }
}
