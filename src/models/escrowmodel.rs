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
pub enum EscrowStatus {
    Active,
    Delivered,
    Disputed,
    Released,
}

impl EscrowStatus {
    /// Status from the three raw flags, first match wins:
    /// dispute, then release, then a delivered-work pointer.
    pub fn derive(dispute_active: bool, released: bool, work_oid: Option<&str>) -> Self {
        if dispute_active {
            EscrowStatus::Disputed
        } else if released {
            EscrowStatus::Released
        } else if work_oid.map_or(false, |oid| !oid.is_empty()) {
            EscrowStatus::Delivered
        } else {
            EscrowStatus::Active
        }
    }

    /// Transitions the contract accepts from this status. `Delivered -> Delivered`
    /// is a re-submission replacing the work pointer.
    pub fn can_transition_to(&self, to: EscrowStatus) -> bool {
        matches!(
            (self, to),
            (EscrowStatus::Active, EscrowStatus::Delivered)
                | (EscrowStatus::Active, EscrowStatus::Disputed)
                | (EscrowStatus::Delivered, EscrowStatus::Delivered)
                | (EscrowStatus::Delivered, EscrowStatus::Released)
                | (EscrowStatus::Delivered, EscrowStatus::Disputed)
                | (EscrowStatus::Disputed, EscrowStatus::Released)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == EscrowStatus::Released
    }
}

/// A mutating escrow action: the statuses it may start from and where it leaves the escrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowTransition {
    pub from: &'static [EscrowStatus],
    pub to: EscrowStatus,
}

impl EscrowTransition {
    pub const DELIVER: EscrowTransition = EscrowTransition {
        from: &[EscrowStatus::Active, EscrowStatus::Delivered],
        to: EscrowStatus::Delivered,
    };
    pub const RELEASE: EscrowTransition = EscrowTransition {
        from: &[EscrowStatus::Delivered],
        to: EscrowStatus::Released,
    };
    pub const DISPUTE: EscrowTransition = EscrowTransition {
        from: &[EscrowStatus::Active, EscrowStatus::Delivered],
        to: EscrowStatus::Disputed,
    };
    pub const RESOLVE: EscrowTransition = EscrowTransition {
        from: &[EscrowStatus::Disputed],
        to: EscrowStatus::Released,
    };

    pub fn accepts(&self, status: EscrowStatus) -> bool {
        self.from.contains(&status) && status.can_transition_to(self.to)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Escrow {
    pub id: String,
    pub job_id: String,
    pub employer: String,
    pub freelancer: String,
    pub creator: String,
    /// MIST
    pub amount: u64,
    pub dispute_active: bool,
    pub released: bool,
    /// Blob id of the delivered work, once submitted.
    pub work_oid: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Escrow {
    pub fn status(&self) -> EscrowStatus {
        EscrowStatus::derive(self.dispute_active, self.released, self.work_oid.as_deref())
    }

    pub fn display_amount(&self) -> String {
        format_mist(self.amount)
    }
}

impl FromMoveObject for Escrow {
    fn from_move_object(content: &MoveObjectContent) -> Option<Self> {
        if !type_matches(&content.type_name, "Escrow") {
            return None;
        }
        let fields = struct_fields(&content.fields)?;

        // Balance<SUI> renders as a bare u64 string; older builds stored a plain `amount`.
        let amount = decode_u64(field(fields, "amount"))
            .or_else(|| decode_u64(field(fields, "balance")))
            .unwrap_or(0);

        let work_oid = decode_option(field(fields, "work_oid"))
            .and_then(decode_wrapped_string)
            .filter(|oid| !oid.is_empty());

        Some(Escrow {
            id: normalize_address(&content.object_id),
            job_id: decode_address(field(fields, "job_id")).unwrap_or_default(),
            employer: decode_address(field(fields, "employer")).unwrap_or_default(),
            freelancer: decode_address(field(fields, "freelancer")).unwrap_or_default(),
            creator: decode_address(field(fields, "creator")).unwrap_or_default(),
            amount,
            dispute_active: decode_bool(field(fields, "dispute_active")),
            released: decode_bool(field(fields, "released")),
            work_oid,
            created_at: decode_timestamp(field(fields, "created_at")),
        })
    }
}

/// Escrow joined with the display fields of its job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnrichedEscrow {
    #[serde(flatten)]
    pub escrow: Escrow,
    pub status: EscrowStatus,
    pub amount_display: String,
    pub job_title: String,
    pub job_description: String,
    pub job_location: String,
    pub job_payment_type: String,
    pub job_duration: String,
}

pub const UNKNOWN_JOB_TITLE: &str = "Unknown Job";
pub const UNKNOWN_JOB_DESCRIPTION: &str = "No description available.";
pub const NOT_AVAILABLE: &str = "N/A";


#[cfg(test)]
mod tests {
    use super::fixtures::escrow_fields;
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_derivation_table() {
        use EscrowStatus::*;
        let cases = [
            ((false, false, None), Active),
            ((false, false, Some("blob")), Delivered),
            ((false, true, None), Released),
            ((false, true, Some("blob")), Released),
            ((true, false, None), Disputed),
            ((true, false, Some("blob")), Disputed),
            ((true, true, None), Disputed),
            ((true, true, Some("blob")), Disputed),
        ];

        for ((dispute, released, work), expected) in cases {
            assert_eq!(
                EscrowStatus::derive(dispute, released, work),
                expected,
                "dispute={} released={} work={:?}",
                dispute,
                released,
                work
            );
        }
    }

    #[test]
    fn test_empty_work_pointer_is_not_delivered() {
        assert_eq!(EscrowStatus::derive(false, false, Some("")), EscrowStatus::Active);
    }

    #[test]
    fn test_transitions() {
        assert!(EscrowStatus::Active.can_transition_to(EscrowStatus::Delivered));
        assert!(EscrowStatus::Delivered.can_transition_to(EscrowStatus::Delivered));
        assert!(EscrowStatus::Disputed.can_transition_to(EscrowStatus::Released));
        assert!(!EscrowStatus::Active.can_transition_to(EscrowStatus::Released));
        assert!(!EscrowStatus::Released.can_transition_to(EscrowStatus::Disputed));
        assert!(EscrowStatus::Released.is_terminal());
    }

    fn decode(work_oid: Value) -> Escrow {
        Escrow::from_move_object(&MoveObjectContent {
            object_id: "0xe5".to_string(),
            type_name: "0xpkg::escrow::Escrow".to_string(),
            version: None,
            fields: escrow_fields("0xj1", "0xa", "0xb", work_oid),
        })
        .unwrap()
    }

    #[test]
    fn test_work_oid_encodings() {
        let wrapped = decode(json!({ "fields": { "vec": [{ "bytes": "blob-7" }] } }));
        let bare = decode(json!({ "vec": ["blob-7"] }));
        let struct_wrapped = decode(json!({ "fields": { "vec": [{ "fields": { "bytes": "blob-7" } }] } }));
        let absent = decode(Value::Null);
        let empty = decode(json!({ "fields": { "vec": [] } }));

        assert_eq!(wrapped.work_oid.as_deref(), Some("blob-7"));
        assert_eq!(bare.work_oid, wrapped.work_oid);
        assert_eq!(struct_wrapped.work_oid, wrapped.work_oid);
        assert_eq!(absent.work_oid, None);
        assert_eq!(empty.work_oid, None);
        assert_eq!(wrapped.status(), EscrowStatus::Delivered);
        assert_eq!(absent.status(), EscrowStatus::Active);
    }

    #[test]
    fn test_transitions_depend_on_the_action() {
        use EscrowStatus::*;

        assert!(EscrowTransition::RELEASE.accepts(Delivered));
        assert!(!EscrowTransition::RELEASE.accepts(Disputed));
        assert!(!EscrowTransition::RELEASE.accepts(Active));
        assert!(EscrowTransition::RESOLVE.accepts(Disputed));
        assert!(!EscrowTransition::RESOLVE.accepts(Delivered));
        assert!(EscrowTransition::DELIVER.accepts(Delivered));
        assert!(!EscrowTransition::DISPUTE.accepts(Disputed));
        assert!(!EscrowTransition::DISPUTE.accepts(Released));
    }

    #[test]
    fn test_escrow_parties_are_normalized() {
        let escrow = decode(Value::Null);
        assert_eq!(escrow.employer, normalize_address("0xA"));
        assert_eq!(escrow.amount, 3_000_000_000);
        assert_eq!(escrow.display_amount(), "3 SUI");
    }
}
