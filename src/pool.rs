use std::sync::Arc;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::warn;

use crate::deadline::CancelToken;
use crate::engine::{DeliverabilityEngine, VerifyError};
use crate::report::{ValidationJob, VerificationResult};

/// Fixed-size pool running independent verifications in parallel.
///
/// Results come back in job order. Cancelling the pool token aborts every
/// in-flight and pending verification; those jobs are reported as `ERROR`.
pub struct VerifierPool {
    engine: Arc<DeliverabilityEngine>,
    pool: ThreadPool,
    cancel: CancelToken,
}

impl VerifierPool {
    pub fn new(engine: Arc<DeliverabilityEngine>, workers: usize) -> Result<Self, VerifyError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|index| format!("mailprobe-worker-{index}"))
            .build()
            .map_err(VerifyError::pool)?;
        Ok(Self {
            engine,
            pool,
            cancel: CancelToken::new(),
        })
    }

    pub fn engine(&self) -> &Arc<DeliverabilityEngine> {
        &self.engine
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn verify_batch(&self, jobs: Vec<ValidationJob>) -> Vec<VerificationResult> {
        self.pool
            .install(|| jobs.into_par_iter().map(|job| self.verify_job(&job)).collect())
    }

    pub fn verify_emails<I, S>(&self, emails: I) -> Vec<VerificationResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verify_batch(emails.into_iter().map(ValidationJob::new).collect())
    }

    fn verify_job(&self, job: &ValidationJob) -> VerificationResult {
        match self.engine.verify_with_token(&job.email, self.cancel.clone()) {
            Ok(verdict) => VerificationResult::from_verdict(job, verdict),
            Err(err) => {
                warn!(job_id = %job.job_id, email = %job.email, error = %err, "verification aborted");
                VerificationResult::from_error(job, &err)
            }
        }
    }
}
