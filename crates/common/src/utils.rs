//! Utility functions for the Unified Orchestrator
//!
//! This module provides utility functions used throughout the workspace.

use std::time::{Duration, Instant};
use std::future::Future;
use tokio::time::timeout;
use crate::error::{Error, Result};

/// Formats a duration into a human-readable string
///
/// # Examples
///
/// ```
/// use common::utils::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
/// assert_eq!(format_duration(Duration::from_millis(100)), "100ms");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs == 0 {
        let millis = duration.subsec_millis();
        if millis == 0 {
            let micros = duration.subsec_micros();
            return format!("{}µs", micros);
        }
        return format!("{}ms", millis);
    }

    let days = total_secs / (24 * 60 * 60);
    let hours = (total_secs % (24 * 60 * 60)) / (60 * 60);
    let minutes = (total_secs % (60 * 60)) / 60;
    let seconds = total_secs % 60;

    let mut result = String::new();

    if days > 0 {
        result.push_str(&format!("{}d ", days));
    }

    if hours > 0 || !result.is_empty() {
        result.push_str(&format!("{}h ", hours));
    }

    if minutes > 0 || !result.is_empty() {
        result.push_str(&format!("{}m ", minutes));
    }

    result.push_str(&format!("{}s", seconds));

    result
}

/// Executes a future with a timeout
///
/// # Examples
///
/// ```
/// use common::utils::execute_with_timeout;
/// use std::time::Duration;
///
/// let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
/// let value = rt.block_on(execute_with_timeout(
///     async { Ok::<_, common::Error>(42) },
///     Duration::from_secs(1),
///     "example operation",
/// )).unwrap();
/// assert_eq!(value, 42);
/// ```
pub async fn execute_with_timeout<T, F>(
    future: F,
    duration: Duration,
    operation_name: &str,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(Error::Timeout(format!("Operation '{}' timed out after {}",
                                            operation_name,
                                            format_duration(duration)))),
    }
}

/// Measures the execution time of an async operation
pub async fn measure_execution_time_async<T, F>(future: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let result = future.await;
    (result, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_micros(5)), "5µs");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[tokio::test]
    async fn test_execute_with_timeout_expires() {
        let result: Result<()> = execute_with_timeout(
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            },
            Duration::from_millis(10),
            "slow hook",
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert!(err.to_string().contains("slow hook"));
    }

    #[tokio::test]
    async fn test_measure_execution_time() {
        let (value, elapsed) = measure_execution_time_async(async { 7 }).await;
        assert_eq!(value, 7);
        assert!(elapsed < Duration::from_secs(1));
    }
}
