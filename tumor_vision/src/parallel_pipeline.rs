use crate::detector::Detector;
use crate::error::VisionError;
use crate::pipeline::{AnalysisPipeline, Report};
use futures::future::join_all;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// One scan to analyse and where to send the outcome.
pub struct AnalysisTask {
    pub source: PathBuf,
    pub result_sender: oneshot::Sender<Result<Report, VisionError>>,
}

/// Round-robin pool of analysis workers. Must be created inside a tokio runtime.
pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new<D: Detector + 'static>(pipeline: Arc<AnalysisPipeline<D>>, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        // Dispatcher: hands tasks to workers in turn. Exits (and so closes every
        // worker queue) once all task senders are dropped.
        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    warn!("Worker {worker_idx} is gone; dropping task");
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        let mut workers = Vec::with_capacity(worker_count);
        for (worker_id, mut worker_receiver) in worker_receivers.into_iter().enumerate() {
            let worker_pipeline = Arc::clone(&pipeline);

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    debug!("Worker {worker_id} analysing {}", task.source.display());
                    let pipeline = Arc::clone(&worker_pipeline);
                    let source = task.source;
                    // Analysis is CPU-bound; keep it off the async executor.
                    let result = tokio::task::spawn_blocking(move || pipeline.analyze_path(&source))
                        .await
                        .unwrap_or(Err(VisionError::WorkerPool("analysis task panicked")));
                    let _ = task.result_sender.send(result);
                }
            });

            workers.push(worker);
        }

        Self { task_sender, workers }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub async fn analyze(&self, source: PathBuf) -> Result<Report, VisionError> {
        let (result_sender, result_receiver) = oneshot::channel();

        let task = AnalysisTask { source, result_sender };

        self.task_sender
            .send(task)
            .map_err(|_| VisionError::WorkerPool("Failed to send task to worker pool"))?;

        result_receiver
            .await
            .map_err(|_| VisionError::WorkerPool("Failed to receive result from worker"))?
    }

    /// Stops accepting work and waits for every worker to drain its queue.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// The outcome for one input of a batch.
pub struct BatchItem {
    pub source: PathBuf,
    pub result: Result<Report, VisionError>,
}

/// Analyses many scans concurrently on a `WorkerPool`.
pub struct BatchAnalyzer {
    worker_pool: WorkerPool,
}

impl BatchAnalyzer {
    /// `worker_count` of `None` uses one worker per logical CPU.
    pub fn new<D: Detector + 'static>(pipeline: Arc<AnalysisPipeline<D>>, worker_count: Option<usize>) -> Self {
        let worker_count = worker_count.unwrap_or_else(num_cpus::get);
        Self {
            worker_pool: WorkerPool::new(pipeline, worker_count),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    /// Results come back in the same order as `sources`.
    pub async fn analyze_all(&self, sources: Vec<PathBuf>) -> Vec<BatchItem> {
        let pending = sources.into_iter().map(|source| async move {
            let result = self.worker_pool.analyze(source.clone()).await;
            BatchItem { source, result }
        });
        join_all(pending).await
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
