// models/verificationmodels.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(type_name = "verification_case_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CaseStatus {
    Pending,
    InProgress,
    Completed,
    Rejected,
    Disputed,
}

impl CaseStatus {
    pub fn to_str(&self) -> &str {
        match self {
            CaseStatus::Pending => "pending",
            CaseStatus::InProgress => "in-progress",
            CaseStatus::Completed => "completed",
            CaseStatus::Rejected => "rejected",
            CaseStatus::Disputed => "disputed",
        }
    }

    /// Pending and in-progress cases block new requests for the same property.
    pub fn is_open(&self) -> bool {
        matches!(self, CaseStatus::Pending | CaseStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CaseStatus::Completed | CaseStatus::Rejected)
    }

    /// Allowed status writes through the status-update operation.
    ///
    /// `in-progress -> in-progress` is accepted so an inspector can attach
    /// progress notes. Nothing leaves `completed` or `rejected`, and a
    /// closed case never becomes open again.
    pub fn can_transition_to(&self, next: CaseStatus) -> bool {
        use CaseStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Rejected)
                | (InProgress, InProgress)
                | (InProgress, Completed)
                | (InProgress, Rejected)
                | (InProgress, Disputed)
                | (Disputed, Completed)
                | (Disputed, Rejected)
        )
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "verification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn to_str(&self) -> &str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Verification fee in naira.
    pub fn fee(&self) -> i64 {
        match self {
            Priority::Low => 25_000,
            Priority::Medium => 50_000,
            Priority::High => 75_000,
            Priority::Urgent => 100_000,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn to_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[sqlx(rename = "payment_amount")]
    pub amount: i64,
    #[sqlx(rename = "payment_status")]
    pub status: PaymentStatus,
    #[sqlx(rename = "payment_reference")]
    pub reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn pending(amount: i64) -> Self {
        Payment {
            amount,
            status: PaymentStatus::Pending,
            reference: None,
            paid_at: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub documentation: i32,
    pub ownership: i32,
    pub legal: i32,
    pub physical: i32,
}

impl ScoreBreakdown {
    pub fn values(&self) -> [i32; 4] {
        [self.documentation, self.ownership, self.legal, self.physical]
    }
}

#[derive(Debug, Deserialize, Serialize, FromRow, Clone, Default, PartialEq)]
pub struct Score {
    #[sqlx(rename = "score_overall")]
    pub overall: Option<i32>,
    #[sqlx(rename = "score_breakdown")]
    pub breakdown: Option<Json<ScoreBreakdown>>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TimelineEntry {
    pub action: String,
    pub user: Uuid,
    pub timestamp: DateTime<Utc>,
    pub details: String,
}

impl TimelineEntry {
    pub fn new(action: impl Into<String>, user: Uuid, details: impl Into<String>) -> Self {
        TimelineEntry {
            action: action.into(),
            user,
            timestamp: Utc::now(),
            details: details.into(),
        }
    }
}

/// A single property's verification workflow instance.
///
/// `timeline` and `notes` are append-only. `version` increases by one on
/// every persisted change and guards against lost updates.
#[derive(Debug, Deserialize, Serialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct VerificationCase {
    pub id: Uuid,
    #[serde(rename = "property")]
    pub property_id: Uuid,
    pub requested_by: Uuid,
    pub assigned_to: Option<Uuid>,
    pub status: CaseStatus,
    pub priority: Priority,
    #[sqlx(flatten)]
    pub payment: Payment,
    #[sqlx(flatten)]
    pub score: Score,
    pub notes: Vec<String>,
    pub timeline: Json<Vec<TimelineEntry>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VerificationCase {
    pub fn new(property_id: Uuid, requested_by: Uuid, priority: Priority) -> Self {
        let now = Utc::now();
        VerificationCase {
            id: Uuid::new_v4(),
            property_id,
            requested_by,
            assigned_to: None,
            status: CaseStatus::Pending,
            priority,
            payment: Payment::pending(priority.fee()),
            score: Score::default(),
            notes: Vec::new(),
            timeline: Json(Vec::new()),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record(&mut self, entry: TimelineEntry) {
        self.updated_at = entry.timestamp;
        self.timeline.0.push(entry);
    }

    pub fn can_be_viewed_by(&self, caller_id: Uuid, caller_is_admin: bool) -> bool {
        caller_is_admin || self.requested_by == caller_id || self.assigned_to == Some(caller_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VerificationFilter {
    pub status: Option<CaseStatus>,
    pub priority: Option<Priority>,
    pub assigned_to: Option<Uuid>,
    pub requested_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub pending_verifications: i64,
    pub completed_verifications: i64,
    pub total_revenue: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_fee_table() {
        assert_eq!(Priority::Low.fee(), 25_000);
        assert_eq!(Priority::Medium.fee(), 50_000);
        assert_eq!(Priority::High.fee(), 75_000);
        assert_eq!(Priority::Urgent.fee(), 100_000);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_new_case_is_pending_with_fee() {
        let case = VerificationCase::new(Uuid::new_v4(), Uuid::new_v4(), Priority::High);
        assert_eq!(case.status, CaseStatus::Pending);
        assert_eq!(case.payment.status, PaymentStatus::Pending);
        assert_eq!(case.payment.amount, 75_000);
        assert!(case.timeline.0.is_empty());
        assert_eq!(case.version, 0);
    }

    #[test]
    fn test_status_transitions() {
        use CaseStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Disputed));
        assert!(Disputed.can_transition_to(Rejected));

        assert!(!Completed.can_transition_to(Pending));
        assert!(!Rejected.can_transition_to(InProgress));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Disputed.can_transition_to(InProgress));
        assert!(!InProgress.can_transition_to(Pending));
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&CaseStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let parsed: CaseStatus = serde_json::from_str("\"in-progress\"").unwrap();
        assert_eq!(parsed, CaseStatus::InProgress);
        assert_eq!(CaseStatus::InProgress.to_str(), "in-progress");
    }

    #[test]
    fn test_case_visibility() {
        let requester = Uuid::new_v4();
        let agent = Uuid::new_v4();
        let mut case = VerificationCase::new(Uuid::new_v4(), requester, Priority::Low);
        case.assigned_to = Some(agent);

        assert!(case.can_be_viewed_by(requester, false));
        assert!(case.can_be_viewed_by(agent, false));
        assert!(case.can_be_viewed_by(Uuid::new_v4(), true));
        assert!(!case.can_be_viewed_by(Uuid::new_v4(), false));
    }
}
