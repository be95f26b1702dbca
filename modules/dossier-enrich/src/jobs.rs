//! Job lifecycle for background enrichment runs.
//!
//! A submission either returns a cached profile straight away, joins a
//! run already in flight for the same identity, or creates a fresh job
//! and spawns a supervised task for it. Job records move from
//! `processing` to exactly one terminal state; terminal transitions are
//! first-wins, a second writer leaves the record alone.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use dossier_common::error::DossierError;
use dossier_common::types::{JobRecord, JobStatus, ProfileInput};

use crate::cache::{keys, CacheStore, Namespace};
use crate::deps::EnrichDeps;
use crate::pipeline::run_enrichment;

/// How long the in-flight marker may outlive its job before a new
/// submission stops deferring to it.
const INFLIGHT_TTL: Duration = Duration::from_secs(3600);

/// What a submission call hands back to the transport layer.
#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub job_id: Uuid,
    pub status: JobStatus,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

pub struct JobManager {
    cache: Arc<dyn CacheStore>,
    deps: EnrichDeps,
    /// Job records expire before cached results do, so a live record
    /// never points at an evicted result.
    job_ttl: Duration,
    result_ttl: Duration,
    tasks: Mutex<HashMap<Uuid, JoinHandle<()>>>,
}

impl JobManager {
    pub fn new(
        cache: Arc<dyn CacheStore>,
        deps: EnrichDeps,
        job_ttl: Duration,
        result_ttl: Duration,
    ) -> Self {
        Self {
            cache,
            deps,
            job_ttl,
            result_ttl,
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Submit a profile for enrichment.
    ///
    /// A cached result short-circuits with `complete` under a fresh
    /// `job_id` and no background work. A processing job for the same
    /// identity is joined instead of duplicated. Otherwise a new job
    /// record is written and a detached task runs the pipeline.
    pub async fn submit(&self, input: &ProfileInput) -> SubmitOutcome {
        let identity_key = keys::identity_key(input);

        match self.cache.get(Namespace::Result, &identity_key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Value>(&raw) {
                Ok(result) => {
                    info!(candidate = %input.display_name(), "Returning cached profile");
                    return SubmitOutcome {
                        job_id: Uuid::new_v4(),
                        status: JobStatus::Complete,
                        cached: true,
                        result: Some(result),
                    };
                }
                Err(_) => warn!("Discarding undecodable cached profile"),
            },
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Result cache read failed"),
        }

        if let Some(job_id) = self.running_job_for(&identity_key).await {
            info!(%job_id, "Joining in-flight job for the same identity");
            return SubmitOutcome {
                job_id,
                status: JobStatus::Processing,
                cached: false,
                result: None,
            };
        }

        let job_id = Uuid::new_v4();
        // Record first, marker second: a reader who sees the marker
        // must be able to load the record it points at.
        let record = JobRecord::processing(identity_key.as_str());
        write_job_record(&self.cache, job_id, &record, self.job_ttl).await;
        if let Err(e) = self
            .cache
            .set(Namespace::Inflight, &identity_key, &job_id.to_string(), INFLIGHT_TTL)
            .await
        {
            warn!(error = %e, "Failed to write in-flight marker");
        }

        self.spawn_job(job_id, identity_key, input.clone()).await;
        info!(%job_id, candidate = %input.display_name(), "Started enrichment job");

        SubmitOutcome {
            job_id,
            status: JobStatus::Processing,
            cached: false,
            result: None,
        }
    }

    /// Load a job record, expired and unknown ids both read as absent.
    pub async fn status(&self, job_id: Uuid) -> Result<JobRecord, DossierError> {
        let raw = self
            .cache
            .get(Namespace::Job, &job_id.to_string())
            .await
            .map_err(|e| DossierError::Cache(e.to_string()))?
            .ok_or_else(|| DossierError::JobNotFound(job_id.to_string()))?;
        serde_json::from_str(&raw).map_err(|_| {
            warn!(%job_id, "Discarding undecodable job record");
            DossierError::JobNotFound(job_id.to_string())
        })
    }

    /// Drop the cached result for this identity so the next submission
    /// reprocesses from scratch. Returns whether a live entry was removed.
    pub async fn invalidate(&self, input: &ProfileInput) -> Result<bool, DossierError> {
        let identity_key = keys::identity_key(input);
        self.cache
            .delete(Namespace::Result, &identity_key)
            .await
            .map_err(|e| DossierError::Cache(e.to_string()))
    }

    /// Block until the named job's background task has finished.
    /// Returns false for jobs this manager is not tracking.
    pub async fn wait(&self, job_id: Uuid) -> bool {
        let handle = self.tasks.lock().await.remove(&job_id);
        match handle {
            Some(handle) => match handle.await {
                Ok(()) => true,
                Err(e) => {
                    warn!(%job_id, error = %e, "Job supervisor task failed");
                    false
                }
            },
            None => false,
        }
    }

    /// The in-flight marker points at a job still processing, if any.
    async fn running_job_for(&self, identity_key: &str) -> Option<Uuid> {
        let raw = match self.cache.get(Namespace::Inflight, identity_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "In-flight marker read failed");
                return None;
            }
        };
        let job_id = raw.parse::<Uuid>().ok()?;
        match self.status(job_id).await {
            Ok(record) if record.status == JobStatus::Processing => Some(job_id),
            // Stale marker: the job finished or its record expired.
            _ => None,
        }
    }

    /// Run the pipeline on a detached task pair: the inner task does the
    /// work, the outer one observes its outcome (including a panic) and
    /// writes the terminal record.
    async fn spawn_job(&self, job_id: Uuid, identity_key: String, input: ProfileInput) {
        let cache = Arc::clone(&self.cache);
        let deps = self.deps.clone();
        let job_ttl = self.job_ttl;
        let result_ttl = self.result_ttl;

        let supervisor = tokio::spawn(async move {
            let task = tokio::spawn(async move { run_enrichment(&deps, &input).await });
            match task.await {
                Ok(Ok(result)) => {
                    finish_complete(&cache, job_id, &identity_key, result, job_ttl, result_ttl)
                        .await;
                }
                Ok(Err(e)) => {
                    warn!(%job_id, error = %e, "Enrichment pipeline failed");
                    finish_error(&cache, job_id, &identity_key, &e.to_string(), job_ttl).await;
                }
                Err(e) => {
                    warn!(%job_id, error = %e, "Enrichment task aborted");
                    finish_error(
                        &cache,
                        job_id,
                        &identity_key,
                        &format!("Enrichment task aborted: {e}"),
                        job_ttl,
                    )
                    .await;
                }
            }
        });

        let mut tasks = self.tasks.lock().await;
        tasks.retain(|_, handle| !handle.is_finished());
        tasks.insert(job_id, supervisor);
    }
}

async fn finish_complete(
    cache: &Arc<dyn CacheStore>,
    job_id: Uuid,
    identity_key: &str,
    result: Value,
    job_ttl: Duration,
    result_ttl: Duration,
) {
    match serde_json::to_string(&result) {
        Ok(payload) => {
            if let Err(e) = cache
                .set(Namespace::Result, identity_key, &payload, result_ttl)
                .await
            {
                warn!(error = %e, "Result cache write failed");
            }
        }
        Err(e) => warn!(error = %e, "Enrichment result not serializable"),
    }
    write_terminal(cache, job_id, JobRecord::complete(identity_key, result), job_ttl).await;
    clear_inflight(cache, identity_key).await;
    info!(%job_id, "Enrichment job complete");
}

async fn finish_error(
    cache: &Arc<dyn CacheStore>,
    job_id: Uuid,
    identity_key: &str,
    message: &str,
    job_ttl: Duration,
) {
    write_terminal(cache, job_id, JobRecord::error(identity_key, message), job_ttl).await;
    clear_inflight(cache, identity_key).await;
}

/// First terminal transition wins. A record already read back as
/// complete or error stays untouched.
async fn write_terminal(
    cache: &Arc<dyn CacheStore>,
    job_id: Uuid,
    record: JobRecord,
    job_ttl: Duration,
) {
    match cache.get(Namespace::Job, &job_id.to_string()).await {
        Ok(Some(raw)) => {
            if let Ok(existing) = serde_json::from_str::<JobRecord>(&raw) {
                if existing.status.is_terminal() {
                    warn!(%job_id, status = %existing.status, "Job already terminal, keeping the earlier state");
                    return;
                }
            }
        }
        Ok(None) => {}
        Err(e) => warn!(%job_id, error = %e, "Job record read failed before terminal write"),
    }
    write_job_record(cache, job_id, &record, job_ttl).await;
}

async fn write_job_record(
    cache: &Arc<dyn CacheStore>,
    job_id: Uuid,
    record: &JobRecord,
    job_ttl: Duration,
) {
    match serde_json::to_string(record) {
        Ok(payload) => {
            if let Err(e) = cache
                .set(Namespace::Job, &job_id.to_string(), &payload, job_ttl)
                .await
            {
                warn!(%job_id, error = %e, "Job record write failed");
            }
        }
        Err(e) => warn!(%job_id, error = %e, "Job record not serializable"),
    }
}

async fn clear_inflight(cache: &Arc<dyn CacheStore>, identity_key: &str) {
    if let Err(e) = cache.delete(Namespace::Inflight, identity_key).await {
        warn!(error = %e, "Failed to clear in-flight marker");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::MemoryCacheStore;
    use serde_json::json;

    const TTL: Duration = Duration::from_secs(60);

    async fn read_record(cache: &Arc<dyn CacheStore>, job_id: Uuid) -> JobRecord {
        let raw = cache
            .get(Namespace::Job, &job_id.to_string())
            .await
            .unwrap()
            .unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    #[tokio::test]
    async fn test_late_completion_does_not_overwrite_error() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
        let job_id = Uuid::new_v4();

        write_job_record(&cache, job_id, &JobRecord::processing("key"), TTL).await;
        finish_error(&cache, job_id, "key", "first failure", TTL).await;
        write_terminal(&cache, job_id, JobRecord::complete("key", json!({})), TTL).await;

        let record = read_record(&cache, job_id).await;
        assert_eq!(record.status, JobStatus::Error);
        assert_eq!(record.error.as_deref(), Some("first failure"));
    }

    #[tokio::test]
    async fn test_late_error_does_not_revert_completion() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
        let job_id = Uuid::new_v4();

        write_job_record(&cache, job_id, &JobRecord::processing("key"), TTL).await;
        finish_complete(&cache, job_id, "key", json!({"done": true}), TTL, TTL).await;
        write_terminal(&cache, job_id, JobRecord::error("key", "too late"), TTL).await;

        let record = read_record(&cache, job_id).await;
        assert_eq!(record.status, JobStatus::Complete);
        assert!(record.error.is_none());
    }

    #[tokio::test]
    async fn test_completion_fills_result_cache_and_clears_marker() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
        let job_id = Uuid::new_v4();
        cache
            .set(Namespace::Inflight, "key", &job_id.to_string(), TTL)
            .await
            .unwrap();

        write_job_record(&cache, job_id, &JobRecord::processing("key"), TTL).await;
        finish_complete(&cache, job_id, "key", json!({"basics": {}}), TTL, TTL).await;

        let cached = cache.get(Namespace::Result, "key").await.unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&cached.unwrap()).unwrap(),
            json!({"basics": {}})
        );
        assert!(cache.get(Namespace::Inflight, "key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_never_caches_a_result() {
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
        let job_id = Uuid::new_v4();

        write_job_record(&cache, job_id, &JobRecord::processing("key"), TTL).await;
        finish_error(&cache, job_id, "key", "provider exploded", TTL).await;

        assert!(cache.get(Namespace::Result, "key").await.unwrap().is_none());
        let record = read_record(&cache, job_id).await;
        assert_eq!(record.status, JobStatus::Error);
    }
}
