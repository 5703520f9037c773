//! Bounded-concurrency dispatch with ordered reassembly.
//!
//! Archive tasks run in parallel up to a concurrency cap, finish in whatever
//! order the network allows, and land back in request order. Progress is
//! reported in completion order, once per finished archive.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::fetch::{CancelToken, FetchError};

/// Callback invoked after each archive settles, with `(completed, total)`.
/// Counts are monotonically increasing and end at `total`.
pub type ProgressObserver = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Fans archive work out over a semaphore and gathers results by index.
pub struct Scheduler {
    concurrency: NonZeroUsize,
    on_progress: Option<ProgressObserver>,
}

impl Scheduler {
    pub fn new(concurrency: NonZeroUsize) -> Self {
        Self {
            concurrency,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, observer: ProgressObserver) -> Self {
        self.on_progress = Some(observer);
        self
    }

    pub const fn concurrency(&self) -> NonZeroUsize {
        self.concurrency
    }

    /// Run `work` over every item with at most `concurrency` in flight.
    ///
    /// The returned vector lines up with `items` one-to-one regardless of
    /// completion order. Items that never start because of cancellation
    /// settle as [`FetchError::cancelled`]; a panicked task settles as an
    /// internal error instead of poisoning the run.
    pub async fn run<T, R, F, Fut>(
        &self,
        items: Vec<T>,
        cancel: &CancelToken,
        work: F,
    ) -> Vec<Result<R, FetchError>>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FetchError>> + Send + 'static,
    {
        let total = items.len();
        let mut slots: Vec<Option<Result<R, FetchError>>> = Vec::with_capacity(total);
        slots.resize_with(total, || None);

        let semaphore = Arc::new(Semaphore::new(self.concurrency.get()));
        let work = Arc::new(work);
        let mut tasks = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&semaphore);
            let work = Arc::clone(&work);
            let cancel = cancel.clone();

            tasks.spawn(async move {
                if cancel.is_cancelled() {
                    return (index, Err(FetchError::cancelled()));
                }

                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (index, Err(FetchError::internal("scheduler semaphore closed")));
                    }
                };

                // A cancel may have landed while this task queued for a permit.
                if cancel.is_cancelled() {
                    return (index, Err(FetchError::cancelled()));
                }

                (index, work(item).await)
            });
        }

        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            completed += 1;

            match joined {
                Ok((index, result)) => {
                    if let Some(slot) = slots.get_mut(index) {
                        *slot = Some(result);
                    }
                }
                Err(join_error) => {
                    tracing::error!(error = %join_error, "archive task aborted");
                }
            }

            if let Some(observer) = &self.on_progress {
                observer(completed, total);
            }
        }

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    Err(FetchError::internal(
                        "archive task terminated without reporting a result",
                    ))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    fn concurrency(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[tokio::test]
    async fn results_line_up_with_request_order() {
        let scheduler = Scheduler::new(concurrency(4));
        let cancel = CancelToken::new();

        // Later items finish sooner, so completion order inverts request order.
        let results = scheduler
            .run(vec![4u64, 3, 2, 1], &cancel, |value| async move {
                tokio::time::sleep(Duration::from_millis(value * 10)).await;
                Ok::<u64, FetchError>(value * 100)
            })
            .await;

        let values: Vec<u64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![400, 300, 200, 100]);
    }

    #[tokio::test]
    async fn in_flight_work_never_exceeds_the_cap() {
        let scheduler = Scheduler::new(concurrency(2));
        let cancel = CancelToken::new();

        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let probe_in_flight = Arc::clone(&in_flight);
        let probe_high_water = Arc::clone(&high_water);

        let results = scheduler
            .run(vec![(); 8], &cancel, move |_| {
                let in_flight = Arc::clone(&probe_in_flight);
                let high_water = Arc::clone(&probe_high_water);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), FetchError>(())
                }
            })
            .await;

        assert_eq!(results.len(), 8);
        assert!(high_water.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn progress_counts_are_monotonic_and_end_at_total() {
        let observed = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&observed);

        let scheduler = Scheduler::new(concurrency(3)).with_progress(Arc::new(
            move |completed, total| {
                sink.lock().unwrap().push((completed, total));
            },
        ));
        let cancel = CancelToken::new();

        scheduler
            .run(vec![30u64, 10, 20, 5, 15], &cancel, |value| async move {
                tokio::time::sleep(Duration::from_millis(value)).await;
                Ok::<u64, FetchError>(value)
            })
            .await;

        let calls = observed.lock().unwrap().clone();
        assert_eq!(calls.len(), 5);
        for (i, (completed, total)) in calls.iter().enumerate() {
            assert_eq!(*completed, i + 1);
            assert_eq!(*total, 5);
        }
    }

    #[tokio::test]
    async fn pre_cancelled_run_settles_every_item_as_cancelled() {
        let scheduler = Scheduler::new(concurrency(2));
        let cancel = CancelToken::new();
        cancel.cancel();

        let results = scheduler
            .run(vec![(); 3], &cancel, |_| async move {
                Ok::<(), FetchError>(())
            })
            .await;

        assert_eq!(results.len(), 3);
        for result in results {
            let error = result.unwrap_err();
            assert_eq!(error.kind(), crate::fetch::FetchErrorKind::Cancelled);
        }
    }
}
