//! Recognition pool: a fixed set of prepared workers behind one job queue.
//!
//! Workers pull from a shared unbounded queue, so each job goes to whichever
//! worker is free. Results come back on a per-job channel; completion order
//! across concurrent submissions is not defined.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::RecognitionError;
use super::job::{ImageLike, Job, JobKind, JobOutput, JobPayload};
use super::worker::{prepare_worker, RecognitionWorker, WorkerFactory};

/// Default number of workers in a pool.
pub const DEFAULT_POOL_WORKERS: usize = 4;

/// Default recognition language.
pub const DEFAULT_LANGUAGE: &str = "eng";

/// What to do when some workers fail to come up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PoolStartup {
    /// Any preparation failure fails the whole pool.
    #[default]
    AllOrNothing,
    /// Keep the workers that came up, as long as there are at least `min_workers`.
    Degraded { min_workers: usize },
}

impl PoolStartup {
    fn required(&self, requested: usize) -> usize {
        match self {
            PoolStartup::AllOrNothing => requested,
            PoolStartup::Degraded { min_workers } => (*min_workers).clamp(1, requested.max(1)),
        }
    }
}

/// Configuration for a recognition pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub workers: usize,
    pub language: String,
    pub startup: PoolStartup,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_POOL_WORKERS,
            language: DEFAULT_LANGUAGE.to_string(),
            startup: PoolStartup::default(),
        }
    }
}

struct QueuedJob {
    job: Job,
    reply: oneshot::Sender<Result<JobOutput, RecognitionError>>,
}

type SharedQueue = Arc<Mutex<mpsc::UnboundedReceiver<QueuedJob>>>;

/// Pool of prepared recognition workers.
pub struct RecognitionPool {
    sender: RwLock<Option<mpsc::UnboundedSender<QueuedJob>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
    ready: usize,
    config: PoolConfig,
}

impl RecognitionPool {
    /// Create and prepare workers, then start serving jobs.
    ///
    /// Workers are prepared one after another. Only fully prepared workers
    /// join the pool; how many must succeed is set by [`PoolStartup`].
    pub async fn start(
        factory: &dyn WorkerFactory,
        config: PoolConfig,
    ) -> Result<Self, RecognitionError> {
        let requested = config.workers;
        let required = config.startup.required(requested);

        let mut prepared: Vec<(usize, Box<dyn RecognitionWorker>)> = Vec::with_capacity(requested);
        let mut failures = Vec::new();

        for index in 0..requested {
            let mut worker = factory.create_worker(index);
            match prepare_worker(index, worker.as_mut(), &config.language).await {
                Ok(()) => {
                    debug!("Worker {} ready ({})", index, config.language);
                    prepared.push((index, worker));
                }
                Err(e) => {
                    warn!("{}", e);
                    worker.terminate().await;
                    failures.push(e.to_string());
                    if config.startup == PoolStartup::AllOrNothing {
                        break;
                    }
                }
            }
        }

        if prepared.len() < required || prepared.is_empty() {
            for (_, worker) in prepared.iter_mut() {
                worker.terminate().await;
            }
            return Err(RecognitionError::PoolStartup {
                started: prepared.len(),
                requested,
                required,
                failures,
            });
        }

        if !failures.is_empty() {
            warn!(
                "Recognition pool degraded: {} of {} worker(s) ready",
                prepared.len(),
                requested
            );
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let queue: SharedQueue = Arc::new(Mutex::new(rx));
        let ready = prepared.len();

        let handles = prepared
            .into_iter()
            .map(|(index, worker)| tokio::spawn(worker_loop(index, worker, queue.clone())))
            .collect();

        info!(
            "Recognition pool started with {} worker(s) ({})",
            ready, config.language
        );

        Ok(Self {
            sender: RwLock::new(Some(tx)),
            handles: Mutex::new(handles),
            ready,
            config,
        })
    }

    /// Number of workers that were prepared and joined the pool.
    pub fn ready_workers(&self) -> usize {
        self.ready
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Submit a job and wait for its result.
    pub async fn submit_job(
        &self,
        kind: JobKind,
        payload: JobPayload,
    ) -> Result<JobOutput, RecognitionError> {
        let job = Job::new(kind, payload)?;
        let (reply, result) = oneshot::channel();

        {
            let sender = self.sender.read().await;
            let sender = sender.as_ref().ok_or(RecognitionError::PoolClosed)?;
            sender
                .send(QueuedJob { job, reply })
                .map_err(|_| RecognitionError::PoolClosed)?;
        }

        result.await.map_err(|_| RecognitionError::WorkerLost)?
    }

    pub async fn recognize(&self, image: ImageLike) -> Result<JobOutput, RecognitionError> {
        self.submit_job(JobKind::Recognize, JobPayload::Image(image))
            .await
    }

    pub async fn detect(&self, image: ImageLike) -> Result<JobOutput, RecognitionError> {
        self.submit_job(JobKind::Detect, JobPayload::Image(image))
            .await
    }

    /// Apply parameters on whichever worker takes the job.
    pub async fn configure(
        &self,
        parameters: BTreeMap<String, String>,
    ) -> Result<JobOutput, RecognitionError> {
        self.submit_job(JobKind::Configure, JobPayload::Parameters(parameters))
            .await
    }

    /// Stop accepting jobs, let queued jobs finish, and terminate workers.
    pub async fn shutdown(&self) {
        self.sender.write().await.take();

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                warn!("Recognition worker task ended abnormally: {}", e);
            }
        }
        info!("Recognition pool shut down");
    }
}

async fn worker_loop(index: usize, mut worker: Box<dyn RecognitionWorker>, queue: SharedQueue) {
    loop {
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(QueuedJob { job, reply }) = next else {
            break;
        };

        let kind = job.kind();
        debug!("Worker {} running {} job", index, kind);

        let result = worker.run(job).await;
        if let Err(ref e) = result {
            warn!("Worker {} {} job failed: {}", index, kind, e);
        }
        // The submitter may have gone away; the result is dropped then.
        let _ = reply.send(result);
    }

    worker.terminate().await;
    debug!("Worker {} stopped", index);
}
