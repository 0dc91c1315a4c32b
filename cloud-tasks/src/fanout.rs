//! Bounded-parallel task submission. A controller hands over every payload
//! and a submit closure; the engine keeps ten submissions in flight, drains
//! results in chunks and tallies failures. A single failed submission never
//! aborts the run and never disappears: each one is logged with the payload's
//! identity, and the caller gets the final count.

use std::fmt::Display;
use std::future::Future;

use futures::StreamExt;
use futures::stream;
use tracing::error;
use tracing::info;

/// Concurrent submissions in flight.
pub const SUBMIT_CONCURRENCY: usize = 10;
/// Completed submissions are drained and tallied in chunks of this size.
pub const CHUNK_SIZE: usize = 10_000;

/// What happened to a batch of submissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub submitted: usize,
    pub errors: usize,
}

impl SubmitReport {
    pub fn all_ok(&self) -> bool {
        self.errors == 0
    }
}

/// Submits every payload with bounded parallelism. `label` names a payload in
/// failure logs; `submit` performs one submission.
pub async fn submit_all<T, L, F, Fut, E>(payloads: Vec<T>, label: L, submit: F) -> SubmitReport
where
    L: Fn(&T) -> String,
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut results = stream::iter(payloads.into_iter().map(|payload| {
        let name = label(&payload);
        let fut = submit(payload);
        async move { (name, fut.await) }
    }))
    .buffer_unordered(SUBMIT_CONCURRENCY)
    .chunks(CHUNK_SIZE);

    let mut report = SubmitReport::default();
    while let Some(chunk) = results.next().await {
        for (name, result) in chunk {
            match result {
                Ok(()) => report.submitted += 1,
                Err(err) => {
                    report.errors += 1;
                    error!(payload = %name, "task creation failed: {err}");
                }
            }
        }
    }

    if report.all_ok() {
        info!(submitted = report.submitted, "all tasks created");
    } else {
        error!(
            errors = report.errors,
            submitted = report.submitted,
            "errors occurred during task creation"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn reports_zero_errors_when_everything_lands() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let report = submit_all(
            (0..100).collect::<Vec<i32>>(),
            |n| n.to_string(),
            move |_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), std::io::Error>(())
                }
            },
        )
        .await;
        assert_eq!(report, SubmitReport { submitted: 100, errors: 0 });
        assert_eq!(calls.load(Ordering::SeqCst), 100);
    }

    #[tokio::test]
    async fn a_single_failure_is_counted_not_fatal() {
        let report = submit_all(
            (0..50).collect::<Vec<i32>>(),
            |n| n.to_string(),
            |n| async move {
                if n == 17 {
                    Err(std::io::Error::other("transient"))
                } else {
                    Ok(())
                }
            },
        )
        .await;
        assert_eq!(report.submitted, 49);
        assert_eq!(report.errors, 1);
        assert!(!report.all_ok());
    }

    #[tokio::test]
    async fn concurrency_stays_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let in_flight_ref = in_flight.clone();
        let peak_ref = peak.clone();
        let report = submit_all(
            (0..200).collect::<Vec<i32>>(),
            |n| n.to_string(),
            move |_| {
                let in_flight = in_flight_ref.clone();
                let peak = peak_ref.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::task::yield_now().await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<(), std::io::Error>(())
                }
            },
        )
        .await;

        assert_eq!(report.submitted, 200);
        assert!(peak.load(Ordering::SeqCst) <= SUBMIT_CONCURRENCY);
    }

    #[tokio::test]
    async fn empty_input_is_a_clean_no_op() {
        let report = submit_all(Vec::<i32>::new(), |n| n.to_string(), |_| async {
            Ok::<(), std::io::Error>(())
        })
        .await;
        assert_eq!(report, SubmitReport::default());
    }
}
