use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    ledger::types::MoveObjectContent,
    models::{type_matches, FromMoveObject},
    utils::{
        address::normalize_address,
        currency::format_mist,
        move_decode::*,
    },
};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Fixed,
    Hourly,
    Monthly,
}

impl PaymentType {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentType::Fixed => "fixed",
            PaymentType::Hourly => "hourly",
            PaymentType::Monthly => "monthly",
        }
    }

    fn from_tag(tag: Option<EnumTag>) -> Self {
        match tag {
            Some(EnumTag::Index(1)) => PaymentType::Hourly,
            Some(EnumTag::Index(2)) => PaymentType::Monthly,
            Some(EnumTag::Name(name)) if name.eq_ignore_ascii_case("hourly") => PaymentType::Hourly,
            Some(EnumTag::Name(name)) if name.eq_ignore_ascii_case("monthly") => PaymentType::Monthly,
            _ => PaymentType::Fixed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Closed,
    Cancelled,
}

impl JobStatus {
    /// Unknown discriminants map to `Closed` so they never surface in listings.
    fn from_tag(tag: Option<EnumTag>) -> Self {
        match tag {
            Some(EnumTag::Index(0)) => JobStatus::Open,
            Some(EnumTag::Index(1)) => JobStatus::InProgress,
            Some(EnumTag::Index(2)) => JobStatus::Completed,
            Some(EnumTag::Index(4)) => JobStatus::Cancelled,
            Some(EnumTag::Name(name)) => match name.to_ascii_lowercase().replace('_', "").as_str() {
                "open" => JobStatus::Open,
                "inprogress" => JobStatus::InProgress,
                "completed" => JobStatus::Completed,
                "cancelled" | "canceled" => JobStatus::Cancelled,
                _ => JobStatus::Closed,
            },
            _ => JobStatus::Closed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SkillRequirement {
    pub name: String,
    pub years_experience: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub description: String,
    pub details: String,
    pub required_skills: Vec<SkillRequirement>,
    /// MIST
    pub price: u64,
    pub payment_type: PaymentType,
    pub duration_value: u64,
    pub duration_unit: String,
    pub location: String,
    pub location_required: bool,
    pub tags: Vec<String>,
    pub posted_by: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub job_version: u64,
}

impl Job {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }

    pub fn display_price(&self) -> String {
        format_mist(self.price)
    }

    pub fn display_duration(&self) -> String {
        if self.duration_unit.is_empty() {
            return self.duration_value.to_string();
        }
        format!("{} {}", self.duration_value, self.duration_unit)
    }
}

impl FromMoveObject for Job {
    fn from_move_object(content: &MoveObjectContent) -> Option<Self> {
        if !type_matches(&content.type_name, "Job") {
            return None;
        }
        let fields = struct_fields(&content.fields)?;

        let required_skills = decode_struct_array(field(fields, "required_skills"))
            .into_iter()
            .map(|skill| SkillRequirement {
                name: decode_string_or_empty(field(skill, "name")),
                years_experience: decode_u64_or_zero(field(skill, "years_experience")),
            })
            .collect();

        Some(Job {
            id: normalize_address(&content.object_id),
            title: decode_string_or_empty(field(fields, "title")),
            description: decode_string_or_empty(field(fields, "description")),
            details: decode_string_or_empty(field(fields, "details")),
            required_skills,
            price: decode_u64_or_zero(field(fields, "price")),
            payment_type: PaymentType::from_tag(decode_enum_tag(field(fields, "payment_type"))),
            duration_value: decode_u64_or_zero(field(fields, "duration_value")),
            duration_unit: decode_string_or_empty(field(fields, "duration_unit")),
            location: decode_string_or_empty(field(fields, "location")),
            location_required: decode_bool(field(fields, "location_required")),
            tags: decode_string_set(field(fields, "tags")),
            posted_by: decode_address(field(fields, "posted_by")).unwrap_or_default(),
            posted_at: decode_timestamp(field(fields, "posted_at")),
            status: JobStatus::from_tag(decode_enum_tag(field(fields, "status"))),
            job_version: decode_u64_or_zero(field(fields, "job_version")),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobApplication {
    pub id: String,
    pub applicant: String,
    pub job_id: String,
    /// `None` for applications written before jobs carried a version.
    pub job_version: Option<u64>,
    pub proposal: String,
    /// MIST
    pub proposed_price: u64,
    pub applied_at: Option<DateTime<Utc>>,
    pub estimated_delivery_ms: u64,
}

impl JobApplication {
    /// Current if unversioned or stamped with the job's present version.
    pub fn is_current_for(&self, job: &Job) -> bool {
        match self.job_version {
            None => true,
            Some(version) => version == job.job_version,
        }
    }
}

impl FromMoveObject for JobApplication {
    fn from_move_object(content: &MoveObjectContent) -> Option<Self> {
        if !type_matches(&content.type_name, "JobApplication") {
            return None;
        }
        let fields = struct_fields(&content.fields)?;

        // Older packages stored the version as Option<u64>.
        let version_field = field(fields, "job_version");
        let job_version = decode_u64(version_field).or_else(|| decode_optional_u64(version_field));

        Some(JobApplication {
            id: normalize_address(&content.object_id),
            applicant: decode_address(field(fields, "applicant")).unwrap_or_default(),
            job_id: decode_address(field(fields, "job_id")).unwrap_or_default(),
            job_version,
            proposal: decode_string_or_empty(field(fields, "proposal")),
            proposed_price: decode_u64_or_zero(field(fields, "proposed_price")),
            applied_at: decode_timestamp(field(fields, "applied_at")),
            estimated_delivery_ms: decode_u64_or_zero(field(fields, "estimated_delivery")),
        })
    }
}

#[cfg(test)]
pub mod fixtures {
    use serde_json::{json, Value};

    pub fn job_fields(title: &str, status: u64, version: u64) -> Value {
        json!({
            "id": { "id": "0x0" },
            "title": title,
            "description": { "bytes": "Ship the indexer" },
            "details": "Full details",
            "required_skills": [
                { "type": "0x1::job::Skill", "fields": { "name": "rust", "years_experience": "3" } },
                { "name": "move", "years_experience": "1" }
            ],
            "price": "2500000000",
            "payment_type": 1,
            "duration_value": "2",
            "duration_unit": "weeks",
            "location": "Remote",
            "location_required": false,
            "tags": ["backend", "sui", "backend"],
            "posted_by": "0xE1",
            "posted_at": "1700000000000",
            "status": status,
            "job_version": version.to_string()
        })
    }

    pub fn application_fields(job_id: &str, version: Option<u64>) -> Value {
        json!({
            "applicant": "0xc1",
            "job_id": job_id,
            "job_version": version.map(|v| json!(v.to_string())).unwrap_or(Value::Null),
            "proposal": "I can do it",
            "proposed_price": "2000000000",
            "applied_at": "1700000001000",
            "estimated_delivery": "604800000"
        })
    }
}
