//! Bounded-concurrency batch execution.
//!
//! Every phase funnels its fetch+extract work through this module: N
//! independent tasks run over a bounded pool of in-flight futures
//! (`futures::stream::buffer_unordered`), per-item failures are logged and
//! excluded, and the only shared state is the stream's own result collection.
//!
//! Two collection modes are provided:
//! - [`concurrent_map`]: unordered; results arrive in completion order.
//!   Used where the caller deduplicates and ordering is irrelevant.
//! - [`concurrent_map_indexed`]: index-stable; results are tagged with their
//!   originating index and re-sorted into submission order before being
//!   returned, and a progress callback observes `(completed, total)` after
//!   every completion. Counts are monotonic no matter which items finish
//!   first.
//!
//! [`run_with_retry`] layers the per-entity retry policy on top: keys missing
//! from the first batch are retried exactly once as a second bounded batch,
//! and keys still missing afterwards are returned to the caller for
//! reporting.

use crate::error::Result;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info, warn};

/// Run `f` over `items` with at most `max_workers` in flight, collecting
/// successful results in completion order.
///
/// A failing item is logged with its index (the error itself carries the page
/// identity) and excluded; it never aborts the batch.
pub async fn concurrent_map<T, R, F, Fut>(items: Vec<T>, max_workers: usize, f: F) -> Vec<R>
where
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let task = f(item, index);
            async move { (index, task.await) }
        })
        .buffer_unordered(max_workers.max(1))
        .filter_map(|(index, outcome)| async move {
            match outcome {
                Ok(result) => Some(result),
                Err(e) => {
                    error!(index, error = %e, "Task failed; excluding item from batch");
                    None
                }
            }
        })
        .collect()
        .await
}

/// Run `f` over `items` with at most `max_workers` in flight, returning
/// successful results re-sorted into the original submission order.
///
/// `progress` is invoked with `(completed, total)` after every completion,
/// including failed ones, so callers observe monotonically increasing counts
/// independent of completion order.
pub async fn concurrent_map_indexed<T, R, F, Fut>(
    items: Vec<T>,
    max_workers: usize,
    f: F,
    progress: impl Fn(usize, usize),
) -> Vec<R>
where
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let total = items.len();
    let completed = AtomicUsize::new(0);

    let mut tagged: Vec<(usize, Result<R>)> = stream::iter(items.into_iter().enumerate())
        .map(|(index, item)| {
            let task = f(item, index);
            async move { (index, task.await) }
        })
        .buffer_unordered(max_workers.max(1))
        .inspect(|_| {
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            progress(done, total);
        })
        .collect()
        .await;

    tagged.sort_by_key(|(index, _)| *index);
    tagged
        .into_iter()
        .filter_map(|(index, outcome)| match outcome {
            Ok(result) => Some(result),
            Err(e) => {
                error!(index, error = %e, "Task failed; excluding item from batch");
                None
            }
        })
        .collect()
}

/// Index-stable batch with the retry-once policy.
///
/// Items whose key is missing from the first batch's results are submitted
/// again as one more bounded batch. Returns the combined results plus the
/// keys that failed both attempts; those are reported by the caller and stay
/// absent from the phase output.
pub async fn run_with_retry<T, R, K, F, Fut>(
    items: Vec<T>,
    max_workers: usize,
    f: F,
    item_key: impl Fn(&T) -> K,
    result_key: impl Fn(&R) -> K,
    progress: impl Fn(usize, usize),
) -> (Vec<R>, Vec<K>)
where
    T: Clone,
    K: Hash + Eq,
    F: Fn(T, usize) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let mut results = concurrent_map_indexed(items.clone(), max_workers, &f, &progress).await;
    let done: HashSet<K> = results.iter().map(&result_key).collect();
    let failed: Vec<T> = items
        .into_iter()
        .filter(|item| !done.contains(&item_key(item)))
        .collect();
    if failed.is_empty() {
        return (results, Vec::new());
    }

    warn!(count = failed.len(), "Retrying failed items once");
    let recovered = concurrent_map_indexed(failed.clone(), max_workers, &f, &progress).await;
    let recovered_keys: HashSet<K> = recovered.iter().map(&result_key).collect();
    let unrecovered: Vec<K> = failed
        .iter()
        .map(&item_key)
        .filter(|key| !recovered_keys.contains(key))
        .collect();
    results.extend(recovered);
    (results, unrecovered)
}

/// Progress callback that reports completion counts through the log.
pub fn log_progress(label: &'static str) -> impl Fn(usize, usize) {
    move |completed, total| {
        let percent = if total == 0 {
            100.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        info!(completed, total, percent = format!("{percent:.1}"), "{label} progress");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn parse_err(message: &str) -> Error {
        Error::Parsing(message.to_string())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_index_stable_order_under_inverse_latency() {
        // a slowest, c fastest: completion order is the reverse of submission
        // order, yet the collected results must come back as [a, b, c].
        let items = vec![("a", 120u64), ("b", 60u64), ("c", 5u64)];
        let observed = Arc::new(Mutex::new(Vec::new()));
        let observed_in_callback = Arc::clone(&observed);

        let results = concurrent_map_indexed(
            items,
            3,
            |(name, delay), _index| async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(name)
            },
            move |completed, total| {
                observed_in_callback.lock().unwrap().push((completed, total));
            },
        )
        .await;

        assert_eq!(results, vec!["a", "b", "c"]);
        // Progress counts are monotonic regardless of completion order.
        assert_eq!(
            *observed.lock().unwrap(),
            vec![(1, 3), (2, 3), (3, 3)]
        );
    }

    #[tokio::test]
    async fn test_failure_is_isolated_and_excluded() {
        let results = concurrent_map(vec![1u32, 2, 3], 2, |n, _index| async move {
            if n == 2 {
                Err(parse_err("boom"))
            } else {
                Ok(n * 10)
            }
        })
        .await;

        let mut sorted = results.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![10, 30]);
        // Never more results than submitted items.
        assert!(results.len() <= 3);
    }

    #[tokio::test]
    async fn test_indexed_failure_leaves_order_intact() {
        let results = concurrent_map_indexed(
            vec!["x", "y", "z"],
            2,
            |name, _index| async move {
                if name == "y" {
                    Err(parse_err("bad page"))
                } else {
                    Ok(name)
                }
            },
            |_completed, _total| {},
        )
        .await;

        assert_eq!(results, vec!["x", "z"]);
    }

    #[tokio::test]
    async fn test_retry_once_bound() {
        // An always-failing item is attempted at most twice and never
        // appears in the final output.
        let attempts = Arc::new(AtomicUsize::new(0));
        let (results, unrecovered) = run_with_retry(
            vec!["bad"],
            2,
            |item, _index| {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<&str, _>(parse_err(item))
                }
            },
            |item| item.to_string(),
            |result: &&str| result.to_string(),
            |_completed, _total| {},
        )
        .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(results.is_empty());
        assert_eq!(unrecovered, vec!["bad".to_string()]);
    }

    #[tokio::test]
    async fn test_retry_recovers_transient_failure() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let (results, unrecovered) = run_with_retry(
            vec!["flaky", "good"],
            2,
            |item, _index| {
                let attempts = Arc::clone(&attempts);
                async move {
                    if item == "flaky" && attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(parse_err("first attempt fails"))
                    } else {
                        Ok(item)
                    }
                }
            },
            |item| item.to_string(),
            |result: &&str| result.to_string(),
            |_completed, _total| {},
        )
        .await;

        assert!(unrecovered.is_empty());
        let mut sorted = results.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["flaky", "good"]);
    }
}
