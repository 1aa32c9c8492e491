//! Where acquisitions run.

use std::sync::Arc;

/// A boxed acquisition job.
pub type BuildJob = Box<dyn FnOnce() + Send + 'static>;

/// Runs acquisition jobs off the caller's tick.
pub trait BuildExecutor: Send + Sync {
    fn spawn(&self, job: BuildJob);
}

/// Runs jobs on Rayon, either the global pool or a dedicated one.
#[derive(Clone, Default)]
pub struct RayonExecutor {
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl RayonExecutor {
    /// Use Rayon's global pool.
    pub fn global() -> Self {
        Self { pool: None }
    }

    /// Dedicated pool so builds never compete with other Rayon work.
    pub fn with_threads(num_threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("nav-build-{i}"))
            .build()?;
        Ok(Self { pool: Some(Arc::new(pool)) })
    }
}

impl BuildExecutor for RayonExecutor {
    fn spawn(&self, job: BuildJob) {
        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }
}

/// Runs the job immediately on the calling thread.  The first query for a
/// region then returns `None` but the surface is ready on the next one.
#[derive(Copy, Clone, Debug, Default)]
pub struct InlineExecutor;

impl BuildExecutor for InlineExecutor {
    fn spawn(&self, job: BuildJob) {
        job();
    }
}
