//! Deadline wrapper for browser operations
//!
//! CDP calls can stall forever when a page never fires its load event or the
//! browser stops answering, so every navigation and collector wait goes
//! through `with_page_timeout`.

use anyhow::Result;
use log::debug;
use std::future::Future;
use std::time::Duration;

/// Run `operation` with a deadline of `timeout_secs` seconds
///
/// An elapsed deadline becomes an error naming `operation_name`; errors from
/// the operation itself are passed through unchanged.
pub async fn with_page_timeout<F, T>(
    operation: F,
    timeout_secs: u64,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(Duration::from_secs(timeout_secs), operation).await {
        Ok(result) => result,
        Err(_) => {
            debug!("{operation_name} exceeded {timeout_secs}s");
            Err(anyhow::anyhow!(
                "{operation_name} timed out after {timeout_secs} seconds"
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn elapsed_deadline_names_the_operation() {
        let err = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            },
            0,
            "Navigation",
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Navigation timed out"));
    }

    #[tokio::test]
    async fn operation_error_passes_through() {
        let err = with_page_timeout(async { Err::<(), _>(anyhow::anyhow!("boom")) }, 5, "Load")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
