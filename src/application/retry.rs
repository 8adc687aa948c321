//! Bounded retry for writes that embed a freshly generated SKU.

use std::future::Future;
use std::num::NonZeroU32;

use tracing::warn;

use crate::application::repos::{RepoError, constraints};

/// Runs `attempt` until it succeeds, fails with anything other than a SKU
/// collision, or `max_attempts` is exhausted. Each call must generate a new
/// SKU; the attempt number starts at 1.
pub async fn retry_on_sku_collision<T, F, Fut>(
    max_attempts: NonZeroU32,
    mut attempt: F,
) -> Result<T, RepoError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, RepoError>>,
{
    let max_attempts = max_attempts.get();
    let mut current = 1;
    loop {
        match attempt(current).await {
            Err(err) if err.is_duplicate_of(constraints::VARIANT_SKU) && current < max_attempts => {
                warn!(
                    target = "catalog::application::retry",
                    attempt = current,
                    max_attempts,
                    "Generated SKU collided; retrying with a new one"
                );
                current += 1;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn sku_collision() -> RepoError {
        RepoError::Duplicate {
            constraint: constraints::VARIANT_SKU.to_string(),
        }
    }

    fn attempts(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).expect("non-zero")
    }

    #[tokio::test]
    async fn retries_until_a_fresh_sku_sticks() {
        let calls = AtomicU32::new(0);
        let result = retry_on_sku_collision(attempts(5), |n| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(sku_collision())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.expect("third attempt succeeds"), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_the_last_attempt() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_on_sku_collision(attempts(2), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(sku_collision()) }
        })
        .await;

        assert!(result.expect_err("exhausted").is_duplicate_of(constraints::VARIANT_SKU));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn other_conflicts_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_on_sku_collision(attempts(5), |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(RepoError::Duplicate {
                    constraint: constraints::VARIANT_COMBINATION.to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
