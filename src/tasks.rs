//! Background task queue.
//!
//! Batch deletes and CSV imports run after the response is sent. A submitted
//! job gets a `task_id` straight away; the receipt only means "scheduled".
//! Failures are logged and counted, never reported back to the client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use tokio::sync::mpsc;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use studentdb_core::AppError;

type BoxedJob = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

struct QueuedJob {
    id: Uuid,
    kind: &'static str,
    job: BoxedJob,
    _guard: InFlightGuard,
}

/// Decrements the in-flight counter even if the job panics.
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Clone, Debug)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<QueuedJob>,
    in_flight: Arc<AtomicUsize>,
}

impl TaskQueue {
    /// Starts the dispatcher. Must be called inside a Tokio runtime.
    pub fn start() -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<QueuedJob>();

        tokio::spawn(async move {
            while let Some(queued) = receiver.recv().await {
                let span = info_span!("background_task", task_id = %queued.id, kind = queued.kind);
                tokio::spawn(run_job(queued).instrument(span));
            }
        });

        Self {
            sender,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Schedules `job` and returns its id.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the dispatcher has stopped.
    pub fn submit<F>(&self, kind: &'static str, job: F) -> Result<Uuid, AppError>
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let id = Uuid::new_v4();
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let queued = QueuedJob {
            id,
            kind,
            job: Box::pin(job),
            _guard: InFlightGuard(self.in_flight.clone()),
        };

        self.sender
            .send(queued)
            .map_err(|_| AppError::internal(anyhow::anyhow!("Task queue is not running")))?;

        info!(task_id = %id, kind, "Background task scheduled");
        counter!("background_tasks_submitted_total", "kind" => kind).increment(1);

        Ok(id)
    }

    /// Jobs submitted but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Waits until every submitted job has finished.
    pub async fn wait_idle(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

async fn run_job(queued: QueuedJob) {
    let QueuedJob {
        kind, job, _guard, ..
    } = queued;
    let start = Instant::now();

    let status = match job.await {
        Ok(()) => {
            info!(elapsed_ms = %start.elapsed().as_millis(), "Background task completed");
            "success"
        }
        Err(e) => {
            error!(error = ?e, "Background task failed");
            "failure"
        }
    };

    counter!("background_tasks_total", "kind" => kind, "status" => status).increment(1);
    histogram!("background_task_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}
