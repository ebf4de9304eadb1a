use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::launcher::Launcher;
use crate::subjob::Subjob;

/// A fixed-size pool of workers. Each worker takes one [Subjob] at a time;
/// workers share nothing but the filesystem
pub struct Queue {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl Queue {
    pub fn new(workers: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("subjob-worker-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// run every subjob on the pool and return their results in the same
    /// order as `subjobs`. a failing subjob doesn't stop the others
    pub fn drain(
        &self,
        subjobs: &[Subjob],
        launcher: &Launcher,
    ) -> Vec<Result<()>> {
        let total: usize = subjobs.iter().map(|s| s.cmds.len()).sum();
        tracing::info!(subjobs = subjobs.len(), total, "launching");
        for sj in subjobs {
            tracing::info!(subjob = sj.index, jobs = sj.cmds.len(), "queued");
        }
        self.pool.install(|| {
            subjobs
                .par_iter()
                .with_max_len(1)
                .map(|sj| {
                    let res = sj.run(launcher);
                    if let Err(e) = &res {
                        tracing::error!(
                            subjob = sj.index,
                            error = %e,
                            "subjob failed"
                        );
                    }
                    res
                })
                .collect()
        })
    }
}

/// collapse the results from [Queue::drain] into a single error if anything
/// failed
pub fn check(results: Vec<Result<()>>) -> Result<()> {
    let total = results.len();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        return Err(Error::Subjobs { failed, total });
    }
    Ok(())
}
