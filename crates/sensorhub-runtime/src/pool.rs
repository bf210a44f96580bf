use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use sensorhub_frame::{BulkJob, BulkJobKind, JobService};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Executes bulk jobs. One method per job kind; each runs on the blocking
/// pool and may do bus I/O.
pub trait BulkJobHandler: Send + Sync + 'static {
    fn dump_state(&self, job: &BulkJob) -> Result<()>;

    fn read_library_blob(&self, job: &BulkJob) -> Result<()>;

    fn send_library_blob(&self, job: &BulkJob) -> Result<()>;

    fn stream_pcm(&self, job: &BulkJob) -> Result<()>;

    fn noop(&self, _job: &BulkJob) -> Result<()> {
        Ok(())
    }
}

fn run_job(handler: &dyn BulkJobHandler, job: &BulkJob) -> Result<()> {
    match job.kind {
        BulkJobKind::DumpState => handler.dump_state(job),
        BulkJobKind::ReadLibraryBlob => handler.read_library_blob(job),
        BulkJobKind::SendLibraryBlob => handler.send_library_blob(job),
        BulkJobKind::StreamPcm => handler.stream_pcm(job),
        BulkJobKind::Noop => handler.noop(job),
    }
}

/// Handler that only logs what it was asked to do.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingBulkHandler;

impl LoggingBulkHandler {
    fn log(job: &BulkJob) -> Result<()> {
        info!(
            session = %job.session,
            job = job.kind.name(),
            bulk_type = %job.bulk_type,
            length = job.length,
            address = job.address,
            "bulk job"
        );
        Ok(())
    }
}

impl BulkJobHandler for LoggingBulkHandler {
    fn dump_state(&self, job: &BulkJob) -> Result<()> {
        Self::log(job)
    }

    fn read_library_blob(&self, job: &BulkJob) -> Result<()> {
        Self::log(job)
    }

    fn send_library_blob(&self, job: &BulkJob) -> Result<()> {
        Self::log(job)
    }

    fn stream_pcm(&self, job: &BulkJob) -> Result<()> {
        Self::log(job)
    }
}

#[derive(Default)]
struct Counters {
    in_flight: AtomicUsize,
    completed: AtomicU64,
    failed: AtomicU64,
    idle: Notify,
}

/// Job service backed by tokio's blocking pool.
#[derive(Clone)]
pub struct TaskPool {
    handle: Handle,
    handler: Arc<dyn BulkJobHandler>,
    counters: Arc<Counters>,
}

impl TaskPool {
    pub fn new(handle: Handle, handler: Arc<dyn BulkJobHandler>) -> Self {
        Self {
            handle,
            handler,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Pool on the runtime of the calling context.
    pub fn current(handler: Arc<dyn BulkJobHandler>) -> Result<Self> {
        Ok(Self::new(Handle::try_current()?, handler))
    }

    pub fn in_flight(&self) -> usize {
        self.counters.in_flight.load(Ordering::Acquire)
    }

    pub fn completed(&self) -> u64 {
        self.counters.completed.load(Ordering::Acquire)
    }

    pub fn failed(&self) -> u64 {
        self.counters.failed.load(Ordering::Acquire)
    }

    /// Wait until no job is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let idle = self.counters.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl JobService for TaskPool {
    fn submit(&self, job: BulkJob) {
        self.counters.in_flight.fetch_add(1, Ordering::AcqRel);
        let handler = Arc::clone(&self.handler);
        let counters = Arc::clone(&self.counters);

        debug!(job = job.kind.name(), "spawning bulk job");
        self.handle.spawn_blocking(move || {
            match run_job(&*handler, &job) {
                Ok(()) => {
                    counters.completed.fetch_add(1, Ordering::AcqRel);
                }
                Err(err) => {
                    counters.failed.fetch_add(1, Ordering::AcqRel);
                    warn!(job = job.kind.name(), error = %err, "bulk job failed");
                }
            }
            if counters.in_flight.fetch_sub(1, Ordering::AcqRel) == 1 {
                counters.idle.notify_waiters();
            }
        });
    }
}

impl std::fmt::Debug for TaskPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("in_flight", &self.in_flight())
            .field("completed", &self.completed())
            .field("failed", &self.failed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use sensorhub_frame::BulkType;

    use super::*;
    use crate::error::RuntimeError;

    #[derive(Default)]
    struct Recording(Mutex<Vec<&'static str>>);

    impl Recording {
        fn record(&self, name: &'static str) -> Result<()> {
            self.0.lock().unwrap().push(name);
            Ok(())
        }
    }

    impl BulkJobHandler for Recording {
        fn dump_state(&self, _job: &BulkJob) -> Result<()> {
            self.record("dump_state")
        }

        fn read_library_blob(&self, _job: &BulkJob) -> Result<()> {
            self.record("read_library_blob")
        }

        fn send_library_blob(&self, _job: &BulkJob) -> Result<()> {
            self.record("send_library_blob")
        }

        fn stream_pcm(&self, job: &BulkJob) -> Result<()> {
            Err(RuntimeError::Job {
                kind: job.kind.name(),
                reason: "pcm device busy".into(),
            })
        }
    }

    fn job(bulk_type: BulkType) -> BulkJob {
        BulkJob {
            bulk_type,
            kind: bulk_type.job_kind(),
            length: 64,
            address: 0x100,
            session: Arc::from("hub0"),
        }
    }

    #[tokio::test]
    async fn runs_each_kind_through_its_method() {
        let handler = Arc::new(Recording::default());
        let pool = TaskPool::current(handler.clone()).unwrap();

        for bulk_type in BulkType::ALL {
            pool.submit(job(bulk_type));
        }
        pool.wait_idle().await;

        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.completed(), 5);
        assert_eq!(pool.failed(), 1);

        let mut seen = handler.0.lock().unwrap().clone();
        seen.sort_unstable();
        assert_eq!(
            seen,
            vec![
                "dump_state",
                "read_library_blob",
                "send_library_blob",
                "send_library_blob"
            ]
        );
    }

    #[tokio::test]
    async fn idle_pool_returns_immediately() {
        let pool = TaskPool::current(Arc::new(LoggingBulkHandler)).unwrap();
        pool.wait_idle().await;
        assert_eq!(pool.completed(), 0);
    }

    #[test]
    fn current_requires_a_runtime() {
        assert!(matches!(
            TaskPool::current(Arc::new(LoggingBulkHandler)),
            Err(RuntimeError::NoRuntime(_))
        ));
    }
}
