// service/escrow_service.rs
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    models::{
        escrowmodel::{
            Escrow, EnrichedEscrow, EscrowStatus, EscrowTransition, NOT_AVAILABLE, UNKNOWN_JOB_DESCRIPTION, UNKNOWN_JOB_TITLE,
        },
        jobmodel::Job,
    },
    service::{
        cache::{keys, QueryCache},
        error::ServiceError,
        job_service::JobService,
        resolver::{EventResolver, ESCROW_CREATED},
    },
    utils::address::normalize_address,
};

/// Which side of an escrow the viewer is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowRole {
    Employer,
    Freelancer,
}

impl EscrowRole {
    pub fn matches(&self, escrow: &Escrow, identity: &str) -> bool {
        match self {
            EscrowRole::Employer => escrow.employer == identity,
            EscrowRole::Freelancer => escrow.freelancer == identity,
        }
    }
}

#[derive(Clone)]
pub struct EscrowService {
    resolver: EventResolver,
    cache: Arc<QueryCache>,
    job_service: Arc<JobService>,
}

impl EscrowService {
    pub fn new(resolver: EventResolver, cache: Arc<QueryCache>, job_service: Arc<JobService>) -> Self {
        Self {
            resolver,
            cache,
            job_service,
        }
    }

    pub async fn list_escrows(&self) -> Result<Vec<Escrow>, ServiceError> {
        self.cache
            .get_or_fetch(keys::ESCROWS, self.cache.default_ttl(), || {
                self.resolver.resolve::<Escrow>(ESCROW_CREATED)
            })
            .await
    }

    pub async fn get_escrow(&self, escrow_id: &str) -> Result<Escrow, ServiceError> {
        let escrow_id = normalize_address(escrow_id);
        self.resolver
            .fetch_one::<Escrow>(&escrow_id)
            .await?
            .ok_or(ServiceError::EscrowNotFound(escrow_id))
    }

    /// All escrows joined with every known job.
    pub async fn enriched_escrows(&self) -> Result<Vec<EnrichedEscrow>, ServiceError> {
        let (escrows, jobs) = tokio::try_join!(self.list_escrows(), self.job_service.list_jobs())?;
        Ok(enrich(escrows, &jobs))
    }

    /// Escrows where `identity` is the employer or the freelancer. Both views
    /// may contain the same escrow when someone hired themselves.
    pub async fn escrows_for(&self, identity: &str, role: EscrowRole) -> Result<Vec<EnrichedEscrow>, ServiceError> {
        let identity = normalize_address(identity);
        let (escrows, jobs) = tokio::try_join!(self.list_escrows(), self.job_service.list_jobs())?;

        let mine: Vec<Escrow> = escrows
            .into_iter()
            .filter(|escrow| role.matches(escrow, &identity))
            .collect();

        tracing::debug!("{} escrows for {} as {:?}", mine.len(), identity, role);
        Ok(enrich(mine, &jobs))
    }

    /// Reject a mutating action the escrow's current status does not allow.
    pub async fn check_transition(
        &self,
        escrow_id: &str,
        transition: EscrowTransition,
    ) -> Result<Escrow, ServiceError> {
        let escrow = self.get_escrow(escrow_id).await?;
        let from = escrow.status();
        let to = transition.to;
        if !transition.accepts(from) {
            if from.is_terminal() {
                tracing::warn!("Escrow {} is already {:?}", escrow.id, from);
            } else {
                tracing::warn!("Escrow {} cannot move from {:?} to {:?}", escrow.id, from, to);
            }
            return Err(ServiceError::InvalidEscrowTransition { from, to });
        }
        Ok(escrow)
    }
}

/// Join escrows to their jobs on `escrow.job_id == job.id`. An escrow whose
/// job is not in `jobs` keeps its place with placeholder job fields.
pub fn enrich(escrows: Vec<Escrow>, jobs: &[Job]) -> Vec<EnrichedEscrow> {
    let by_id: HashMap<&str, &Job> = jobs.iter().map(|job| (job.id.as_str(), job)).collect();

    escrows
        .into_iter()
        .map(|escrow| {
            let job = by_id.get(escrow.job_id.as_str()).copied();
            let status = escrow.status();
            let amount_display = escrow.display_amount();

            match job {
                Some(job) => EnrichedEscrow {
                    status,
                    amount_display,
                    job_title: job.title.clone(),
                    job_description: job.description.clone(),
                    job_location: job.location.clone(),
                    job_payment_type: job.payment_type.to_str().to_string(),
                    job_duration: job.display_duration(),
                    escrow,
                },
                None => {
                    tracing::debug!("Escrow {} references unknown job {}", escrow.id, escrow.job_id);
                    EnrichedEscrow {
                        status,
                        amount_display,
                        job_title: UNKNOWN_JOB_TITLE.to_string(),
                        job_description: UNKNOWN_JOB_DESCRIPTION.to_string(),
                        job_location: NOT_AVAILABLE.to_string(),
                        job_payment_type: NOT_AVAILABLE.to_string(),
                        job_duration: NOT_AVAILABLE.to_string(),
                        escrow,
                    }
                }
            }
        })
        .collect()
}
