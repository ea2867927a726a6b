use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    ledger::types::MoveObjectContent,
    models::{type_matches, FromMoveObject},
    utils::{
        address::normalize_address,
        move_decode::*,
    },
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub value: String,
    pub is_private: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LanguageSkill {
    pub language: String,
    pub proficiency: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub name: String,
    pub link: String,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CandidateProfile {
    pub name: String,
    pub bio: String,
    pub portfolio_links: Vec<String>,
    pub skills: Vec<String>,
    pub location: String,
    pub nationalities: Vec<String>,
    pub preferred_currency: String,
    pub picture_url: String,
    pub location_private: bool,
    pub nationalities_private: bool,
    pub contact_info: Vec<ContactInfo>,
    pub hourly_rate: u64,
    pub emergency_rate: Option<u64>,
    /// Hours.
    pub minimal_engagement_time: Option<u64>,
    pub languages: Vec<LanguageSkill>,
    pub education: Vec<Education>,
    pub certificates: Vec<Certificate>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EmployerProfile {
    pub name: String,
    pub bio: String,
    pub location: String,
    pub website: String,
    pub logo_url: String,
    pub contact_info: Vec<ContactInfo>,
    pub tax_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "profile_type", rename_all = "snake_case")]
pub enum ProfileKind {
    Candidate(CandidateProfile),
    Employer(EmployerProfile),
}

/// Privacy flags are carried through as-is; redaction happens at display time.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub owner: String,
    #[serde(flatten)]
    pub kind: ProfileKind,
}

impl Profile {
    pub fn is_candidate(&self) -> bool {
        matches!(self.kind, ProfileKind::Candidate(_))
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            ProfileKind::Candidate(candidate) => &candidate.name,
            ProfileKind::Employer(employer) => &employer.name,
        }
    }
}

fn decode_contact_info(value: &Value) -> Vec<ContactInfo> {
    decode_struct_array(value)
        .into_iter()
        .map(|entry| ContactInfo {
            value: decode_string_or_empty(field(entry, "value")),
            is_private: decode_bool(field(entry, "is_private")),
        })
        .collect()
}

fn decode_candidate(fields: &Map<String, Value>) -> CandidateProfile {
    CandidateProfile {
        name: decode_string_or_empty(field(fields, "name")),
        bio: decode_string_or_empty(field(fields, "bio")),
        portfolio_links: decode_string_list(field(fields, "portfolio_links")),
        skills: decode_string_set(field(fields, "skills")),
        location: decode_string_or_empty(field(fields, "location")),
        nationalities: decode_string_set(field(fields, "nationalities")),
        preferred_currency: decode_string_or_empty(field(fields, "preferred_currency")),
        picture_url: decode_string_or_empty(field(fields, "picture_url")),
        location_private: decode_bool(field(fields, "location_private")),
        nationalities_private: decode_bool(field(fields, "nationalities_private")),
        contact_info: decode_contact_info(field(fields, "contact_info")),
        hourly_rate: decode_u64_or_zero(field(fields, "hourly_rate")),
        emergency_rate: decode_optional_u64(field(fields, "emergency_rate")),
        minimal_engagement_time: decode_optional_u64(field(fields, "minimal_engagement_time")),
        languages: decode_struct_array(field(fields, "languages"))
            .into_iter()
            .map(|entry| LanguageSkill {
                language: decode_string_or_empty(field(entry, "language")),
                proficiency: decode_string_or_empty(field(entry, "proficiency")),
            })
            .collect(),
        education: decode_struct_array(field(fields, "education"))
            .into_iter()
            .map(|entry| Education {
                institution: decode_string_or_empty(field(entry, "institution")),
                degree: decode_string_or_empty(field(entry, "degree")),
                field_of_study: decode_string_or_empty(field(entry, "field_of_study")),
                start_date: decode_string_or_empty(field(entry, "start_date")),
                end_date: decode_option(field(entry, "end_date"))
                    .and_then(decode_wrapped_string)
                    .or_else(|| field(entry, "end_date").as_str().map(str::to_string)),
            })
            .collect(),
        certificates: decode_struct_array(field(fields, "certificates"))
            .into_iter()
            .map(|entry| Certificate {
                name: decode_string_or_empty(field(entry, "name")),
                link: decode_string_or_empty(field(entry, "link")),
                date: decode_string_or_empty(field(entry, "date")),
            })
            .collect(),
    }
}

fn decode_employer(fields: &Map<String, Value>) -> EmployerProfile {
    EmployerProfile {
        name: decode_string_or_empty(field(fields, "name")),
        bio: decode_string_or_empty(field(fields, "bio")),
        location: decode_string_or_empty(field(fields, "location")),
        website: decode_string_or_empty(field(fields, "website")),
        logo_url: decode_string_or_empty(field(fields, "logo_url")),
        contact_info: decode_contact_info(field(fields, "contact_info")),
        tax_id: decode_string_or_empty(field(fields, "tax_id")),
    }
}

/// `CandidateProfile` / `EmployerProfile` structs are told apart by type; a
/// generic `Profile` struct by its `profile_type` tag, then by which fields it has.
fn is_employer(type_name: &str, fields: &Map<String, Value>) -> Option<bool> {
    if type_matches(type_name, "EmployerProfile") {
        return Some(true);
    }
    if type_matches(type_name, "CandidateProfile") {
        return Some(false);
    }
    if !type_matches(type_name, "Profile") {
        return None;
    }

    match decode_enum_tag(field(fields, "profile_type")) {
        Some(EnumTag::Index(1)) => Some(true),
        Some(EnumTag::Index(_)) => Some(false),
        Some(EnumTag::Name(name)) => Some(name.eq_ignore_ascii_case("employer")),
        None => Some(fields.contains_key("tax_id") || fields.contains_key("website")),
    }
}

impl FromMoveObject for Profile {
    fn from_move_object(content: &MoveObjectContent) -> Option<Self> {
        let fields = struct_fields(&content.fields)?;
        let employer = is_employer(&content.type_name, fields)?;

        let kind = if employer {
            ProfileKind::Employer(decode_employer(fields))
        } else {
            ProfileKind::Candidate(decode_candidate(fields))
        };

        Some(Profile {
            id: normalize_address(&content.object_id),
            owner: decode_address(field(fields, "owner")).unwrap_or_default(),
            kind,
        })
    }
}

#[cfg(test)]
pub mod fixtures {
    use serde_json::{json, Value};

    pub fn candidate_fields(owner: &str, name: &str) -> Value {
        json!({
            "owner": owner,
            "name": name,
            "bio": { "fields": { "bytes": "Move developer" } },
            "portfolio_links": ["https://a.dev", "https://b.dev"],
            "skills": ["rust", "move"],
            "location": "Lagos",
            "nationalities": { "fields": { "contents": ["NG"] } },
            "preferred_currency": "SUI",
            "picture_url": "blob-pic",
            "location_private": true,
            "nationalities_private": false,
            "contact_info": [
                { "fields": { "value": "a@b.c", "is_private": true } },
                { "value": "@handle", "is_private": false }
            ],
            "hourly_rate": "50",
            "emergency_rate": { "fields": { "vec": ["80"] } },
            "minimal_engagement_time": { "vec": [] },
            "languages": [{ "fields": { "language": "English", "proficiency": "Native" } }],
            "education": [{ "fields": {
                "institution": "UNILAG",
                "degree": "BSc",
                "field_of_study": "CS",
                "start_date": "2015",
                "end_date": { "vec": ["2019"] }
            }}],
            "certificates": [{ "name": "Sui Dev", "link": "https://cert", "date": "2023" }]
        })
    }

    pub fn employer_fields(owner: &str, name: &str) -> Value {
        json!({
            "owner": owner,
            "name": name,
            "bio": "We hire",
            "location": "Remote",
            "website": "https://corp.example",
            "logo_url": "blob-logo",
            "contact_info": [],
            "tax_id": "TX-1"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use serde_json::json;

    fn content(type_name: &str, fields: Value) -> MoveObjectContent {
        MoveObjectContent {
            object_id: "0xp1".to_string(),
            type_name: type_name.to_string(),
            version: None,
            fields,
        }
    }

    #[test]
    fn test_decode_candidate() {
        let profile = Profile::from_move_object(&content(
            "0xpkg::profile::CandidateProfile",
            candidate_fields("0xC1", "Ada"),
        ))
        .unwrap();

        assert!(profile.is_candidate());
        assert_eq!(profile.owner, normalize_address("0xc1"));
        let ProfileKind::Candidate(candidate) = profile.kind else {
            panic!("expected candidate");
        };
        assert_eq!(candidate.bio, "Move developer");
        assert_eq!(candidate.nationalities, vec!["NG"]);
        assert_eq!(candidate.contact_info.len(), 2);
        assert!(candidate.contact_info[0].is_private);
        assert_eq!(candidate.emergency_rate, Some(80));
        assert_eq!(candidate.minimal_engagement_time, None);
        assert_eq!(candidate.education[0].end_date.as_deref(), Some("2019"));
        assert_eq!(candidate.certificates[0].name, "Sui Dev");
    }

    #[test]
    fn test_decode_employer_by_type_and_by_tag() {
        let by_type = Profile::from_move_object(&content(
            "0xpkg::profile::EmployerProfile",
            employer_fields("0xe1", "Corp"),
        ))
        .unwrap();
        assert!(!by_type.is_candidate());
        assert_eq!(by_type.name(), "Corp");

        let mut tagged = candidate_fields("0xc1", "Ada");
        tagged["profile_type"] = json!(1);
        let by_tag = Profile::from_move_object(&content("0xpkg::profile::Profile", tagged)).unwrap();
        assert!(!by_tag.is_candidate());

        let by_shape =
            Profile::from_move_object(&content("0xpkg::profile::Profile", employer_fields("0xe1", "Corp"))).unwrap();
        assert!(!by_shape.is_candidate());
    }

    #[test]
    fn test_unrelated_type_is_rejected() {
        assert!(Profile::from_move_object(&content("0xpkg::job::Job", employer_fields("0xe1", "x"))).is_none());
    }
}
