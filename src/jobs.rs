//! In-memory job registry.
//!
//! Decouples job creation from stream consumption: a submission returns an
//! opaque id immediately, and the query is read back when the client opens
//! the corresponding stream. Entries are bounded by age and by count, with
//! eviction swept on every submission, so the registry cannot grow without
//! bound in a long-running process.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Submitted, stream not yet opened.
    Queued,
    /// A stream has been opened for this job.
    Processing,
}

/// A registered, not-yet-streamed query.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub query: String,
    pub created_at: DateTime<Utc>,
    pub status: JobStatus,
}

/// Registry of pending jobs keyed by generated id.
pub struct JobRegistry {
    ttl: Duration,
    max_pending: usize,
    jobs: Mutex<HashMap<String, Job>>,
}

impl JobRegistry {
    pub fn new(ttl_secs: u64, max_pending: usize) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            max_pending,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    /// Registers `query` and returns a fresh job id. Does not start any
    /// work. Expired and over-capacity entries are evicted first.
    pub fn submit(&self, query: &str) -> String {
        let mut jobs = self.jobs.lock().expect("job registry lock poisoned");
        let now = Utc::now();

        jobs.retain(|_, job| now - job.created_at < self.ttl);

        while jobs.len() >= self.max_pending {
            let oldest = jobs
                .values()
                .min_by_key(|job| job.created_at)
                .map(|job| job.id.clone());
            match oldest {
                Some(id) => {
                    tracing::warn!("job registry full, evicting oldest job {}", id);
                    jobs.remove(&id);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4().to_string();
        jobs.insert(
            id.clone(),
            Job {
                id: id.clone(),
                query: query.to_string(),
                created_at: now,
                status: JobStatus::Queued,
            },
        );
        id
    }

    /// Pure read; `None` for unknown or already-evicted ids.
    pub fn lookup(&self, id: &str) -> Option<Job> {
        self.jobs
            .lock()
            .expect("job registry lock poisoned")
            .get(id)
            .cloned()
    }

    /// Marks a job as processing when its stream opens. Returns the updated
    /// job, or `None` if the id is unknown.
    pub fn mark_processing(&self, id: &str) -> Option<Job> {
        let mut jobs = self.jobs.lock().expect("job registry lock poisoned");
        let job = jobs.get_mut(id)?;
        job.status = JobStatus::Processing;
        Some(job.clone())
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("job registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
