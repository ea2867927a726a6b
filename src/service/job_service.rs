// service/job_service.rs
use std::sync::Arc;

use crate::{
    models::jobmodel::{Job, JobApplication},
    service::{
        cache::{keys, QueryCache},
        error::ServiceError,
        resolver::{EventResolver, APPLICATION_CREATED, JOB_CREATED},
    },
    utils::address::normalize_address,
};

#[derive(Clone)]
pub struct JobService {
    resolver: EventResolver,
    cache: Arc<QueryCache>,
}

impl JobService {
    pub fn new(resolver: EventResolver, cache: Arc<QueryCache>) -> Self {
        Self { resolver, cache }
    }

    /// Every job ever announced, in any status, newest first.
    pub async fn list_jobs(&self) -> Result<Vec<Job>, ServiceError> {
        self.cache
            .get_or_fetch(keys::JOBS, self.cache.default_ttl(), || {
                self.resolver.resolve::<Job>(JOB_CREATED)
            })
            .await
    }

    /// Marketplace listings: only jobs whose status is `Open`.
    pub async fn open_listings(&self) -> Result<Vec<Job>, ServiceError> {
        let jobs = self.list_jobs().await?;
        Ok(jobs.into_iter().filter(Job::is_open).collect())
    }

    pub async fn get_job(&self, job_id: &str) -> Result<Job, ServiceError> {
        let job_id = normalize_address(job_id);
        let key = keys::job(&job_id);

        let job: Option<Job> = self
            .cache
            .get_or_fetch(&key, self.cache.default_ttl(), || self.resolver.fetch_one::<Job>(&job_id))
            .await?;

        job.ok_or(ServiceError::JobNotFound(job_id))
    }

    pub async fn jobs_posted_by(&self, address: &str) -> Result<Vec<Job>, ServiceError> {
        let poster = normalize_address(address);
        let jobs = self.list_jobs().await?;
        Ok(jobs.into_iter().filter(|job| job.posted_by == poster).collect())
    }

    /// Live applications for a job. Applications stamped with an older
    /// `job_version` belong to a since-edited listing and are left out.
    pub async fn job_applications(&self, job_id: &str) -> Result<Vec<JobApplication>, ServiceError> {
        let job = self.get_job(job_id).await?;
        let key = keys::applications(&job.id);

        let applications: Vec<JobApplication> = self
            .cache
            .get_or_fetch(&key, self.cache.default_ttl(), || async {
                let all = self.resolver.resolve::<JobApplication>(APPLICATION_CREATED).await?;
                Ok(all.into_iter().filter(|application| application.job_id == job.id).collect())
            })
            .await?;

        Ok(current_applications(&job, applications))
    }
}

/// Version fence: keep unversioned applications and those matching the job's
/// present version.
pub fn current_applications(job: &Job, applications: Vec<JobApplication>) -> Vec<JobApplication> {
    let total = applications.len();
    let current: Vec<JobApplication> = applications
        .into_iter()
        .filter(|application| application.is_current_for(job))
        .collect();

    if current.len() < total {
        tracing::debug!(
            "Job {}: {} stale applications fenced at version {}",
            job.id,
            total - current.len(),
            job.job_version
        );
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ledger::mock::MockLedger,
        models::jobmodel::fixtures::{application_fields, job_fields},
    };
    use serde_json::json;

    fn service(ledger: Arc<MockLedger>) -> JobService {
        JobService::new(
            EventResolver::new(ledger, "0xpkg".to_string(), 100),
            Arc::new(QueryCache::new(30)),
        )
    }

    fn seed_job(ledger: &MockLedger, id: &str, title: &str, status: u64, version: u64) {
        ledger.insert_object(id, "0xpkg::job::Job", job_fields(title, status, version));
        ledger.push_event("job", "0xpkg::job::JobCreated", json!({ "job_id": id }));
    }

    fn seed_application(ledger: &MockLedger, id: &str, job_id: &str, version: Option<u64>) {
        ledger.insert_object(id, "0xpkg::job::JobApplication", application_fields(job_id, version));
        ledger.push_event(
            "job",
            "0xpkg::job::JobApplicationCreated",
            json!({ "application_id": id, "job_id": job_id }),
        );
    }

    #[tokio::test]
    async fn test_open_listings_only_show_open_jobs() {
        let ledger = Arc::new(MockLedger::new());
        seed_job(&ledger, "0x1", "open", 0, 1);
        seed_job(&ledger, "0x2", "in progress", 1, 1);
        seed_job(&ledger, "0x3", "cancelled", 4, 1);

        let service = service(ledger);
        assert_eq!(service.list_jobs().await.unwrap().len(), 3);

        let open = service.open_listings().await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].title, "open");
    }

    #[tokio::test]
    async fn test_applications_are_version_fenced() {
        let ledger = Arc::new(MockLedger::new());
        seed_job(&ledger, "0xj1", "Indexer", 0, 2);
        seed_job(&ledger, "0xj2", "Other", 0, 1);
        seed_application(&ledger, "0xa1", "0xj1", Some(1));
        seed_application(&ledger, "0xa2", "0xj1", Some(2));
        seed_application(&ledger, "0xa3", "0xj1", None);
        seed_application(&ledger, "0xa4", "0xj2", Some(1));

        let applications = service(ledger).job_applications("0xJ1").await.unwrap();

        let ids: Vec<String> = applications.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![normalize_address("0xa2"), normalize_address("0xa3")]);
    }

    #[tokio::test]
    async fn test_missing_job_is_not_found() {
        let ledger = Arc::new(MockLedger::new());
        let result = service(ledger).get_job("0xdead").await;
        assert!(matches!(result, Err(ServiceError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_jobs_posted_by_normalizes_the_query() {
        let ledger = Arc::new(MockLedger::new());
        seed_job(&ledger, "0x1", "mine", 0, 1);

        let service = service(ledger);
        assert_eq!(service.jobs_posted_by("0xE1").await.unwrap().len(), 1);
        assert!(service.jobs_posted_by("0xe2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_is_cached_until_invalidated() {
        let ledger = Arc::new(MockLedger::new());
        seed_job(&ledger, "0x1", "first", 0, 1);
        let service = service(ledger.clone());

        service.list_jobs().await.unwrap();
        seed_job(&ledger, "0x2", "second", 0, 1);
        assert_eq!(service.list_jobs().await.unwrap().len(), 1);
        assert_eq!(ledger.multi_get_count(), 1);

        service.cache.invalidate(keys::JOBS).await;
        assert_eq!(service.list_jobs().await.unwrap().len(), 2);
    }
}
