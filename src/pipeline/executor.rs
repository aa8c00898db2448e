//! Bounded fan-out over a batch with an absolute deadline.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, warn};

/// Results of one bounded fan-out, indexed by input position.
#[derive(Debug)]
pub struct BoundedRun<T> {
    /// `None` where the task did not finish (deadline or abort).
    pub results: Vec<Option<T>>,
    /// Whether the deadline cut the run short.
    pub deadline_hit: bool,
}

impl<T> BoundedRun<T> {
    pub fn completed(&self) -> usize {
        self.results.iter().filter(|r| r.is_some()).count()
    }
}

/// Runs `task(input)` for every input with at most `limit` in flight.
///
/// Results are re-associated by input index, never by completion order.
/// When `deadline` passes, every unfinished task is aborted and its slot
/// stays `None`. A panicking task also leaves its slot `None`.
pub async fn run_bounded<I, T, F, Fut>(
    inputs: Vec<I>,
    limit: usize,
    deadline: Instant,
    task: F,
) -> BoundedRun<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let total = inputs.len();
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut set = JoinSet::new();

    for (idx, input) in inputs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let fut = task(input);
        set.spawn(async move {
            // The semaphore is never closed, so acquisition only fails on abort.
            let _permit = semaphore.acquire_owned().await.ok();
            (idx, fut.await)
        });
    }

    let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
    let mut deadline_hit = false;

    loop {
        match timeout_at(deadline, set.join_next()).await {
            Ok(Some(Ok((idx, value)))) => results[idx] = Some(value),
            Ok(Some(Err(e))) => {
                warn!(error = %e, "Bounded task failed to complete");
            }
            Ok(None) => break,
            Err(_) => {
                deadline_hit = true;
                set.abort_all();
                break;
            }
        }
    }

    let run = BoundedRun {
        results,
        deadline_hit,
    };

    debug!(
        total,
        completed = run.completed(),
        deadline_hit,
        limit,
        "Bounded fan-out finished"
    );

    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn test_results_follow_input_order() {
        // Later inputs finish first; slots must still line up with inputs.
        let inputs: Vec<u64> = vec![40, 30, 20, 10, 0];
        let run = run_bounded(inputs, 8, far_deadline(), |ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms * 2
        })
        .await;

        assert!(!run.deadline_hit);
        assert_eq!(
            run.results,
            vec![Some(80), Some(60), Some(40), Some(20), Some(0)]
        );
    }

    #[tokio::test]
    async fn test_concurrency_limit_is_respected() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let run = run_bounded((0..12).collect::<Vec<_>>(), 3, far_deadline(), |i| {
            let in_flight = Arc::clone(&in_flight);
            let peak = Arc::clone(&peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                i
            }
        })
        .await;

        assert_eq!(run.completed(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_deadline_aborts_unfinished_tasks() {
        let deadline = Instant::now() + Duration::from_millis(50);
        let run = run_bounded(vec![0u64, 5_000], 4, deadline, |ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms
        })
        .await;

        assert!(run.deadline_hit);
        assert_eq!(run.results, vec![Some(0), None]);
    }

    #[tokio::test]
    async fn test_panicking_task_leaves_empty_slot() {
        let run = run_bounded(vec![1u32, 2, 3], 2, far_deadline(), |i| async move {
            if i == 2 {
                panic!("boom");
            }
            i
        })
        .await;

        assert!(!run.deadline_hit);
        assert_eq!(run.results, vec![Some(1), None, Some(3)]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let run = run_bounded(Vec::<u8>::new(), 4, far_deadline(), |i| async move { i }).await;
        assert!(run.results.is_empty());
        assert!(!run.deadline_hit);
    }
}
