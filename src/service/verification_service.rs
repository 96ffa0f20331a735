// service/verification_service.rs
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    db::{PropertyExt, Store, UserExt, VerificationExt},
    dtos::Pagination,
    mail::mails,
    models::{
        propertymodel::VerificationSummary,
        usermodel::{Caller, UserRole},
        verificationmodels::{
            CaseStatus, PaymentStatus, Priority, ScoreBreakdown, TimelineEntry, VerificationCase,
            VerificationFilter,
        },
    },
    service::{
        error::ServiceError,
        notification_service::NotificationService,
        payment_provider::{reconcile_payment, PaymentGateway},
    },
    utils::currency::format_naira,
};

/// Input for a status change made by the assignee or an admin.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: CaseStatus,
    pub notes: Option<String>,
    pub score: Option<i32>,
    pub breakdown: Option<ScoreBreakdown>,
    pub expected_version: Option<i64>,
}

/// Drives a verification case from request to completion.
///
/// Every mutating operation appends exactly one timeline entry and is
/// persisted with a compare-and-swap on `version`, so a concurrent writer
/// makes the later call fail with a conflict instead of clobbering state.
#[derive(Clone)]
pub struct VerificationService {
    db_client: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: NotificationService,
    admin_phone: Option<String>,
    require_payment_before_assignment: bool,
}

impl VerificationService {
    pub fn new(
        db_client: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: NotificationService,
        admin_phone: Option<String>,
        require_payment_before_assignment: bool,
    ) -> Self {
        Self {
            db_client,
            gateway,
            notifications,
            admin_phone,
            require_payment_before_assignment,
        }
    }

    pub async fn request(
        &self,
        caller: Caller,
        property_id: Uuid,
        priority: Option<Priority>,
    ) -> Result<VerificationCase, ServiceError> {
        let priority = priority.unwrap_or_default();

        self.db_client
            .get_property(property_id)
            .await?
            .ok_or(ServiceError::NotFound("Property"))?;

        if self
            .db_client
            .get_open_verification_for_property(property_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::conflict("Verification already in progress"));
        }

        let mut case = VerificationCase::new(property_id, caller.id, priority);
        case.record(TimelineEntry::new(
            "Verification requested",
            caller.id,
            format!("{} priority verification requested", priority.to_str()),
        ));

        let case = self
            .db_client
            .create_verification(&case)
            .await?
            .ok_or_else(|| ServiceError::conflict("Verification already in progress"))?;

        info!(
            "Verification {} requested for property {} by {} ({} priority, fee {})",
            case.id,
            property_id,
            caller.id,
            priority.to_str(),
            case.payment.amount
        );

        Ok(case)
    }

    pub async fn submit_payment(
        &self,
        caller: Caller,
        verification_id: Uuid,
        reference: &str,
    ) -> Result<VerificationCase, ServiceError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ServiceError::validation("Payment reference is required"));
        }

        let mut case = self.load(verification_id).await?;

        if case.requested_by != caller.id {
            return Err(ServiceError::forbidden("Not authorized"));
        }
        if case.payment.status != PaymentStatus::Pending {
            return Err(ServiceError::conflict(format!(
                "Payment is already {}",
                case.payment.status.to_str()
            )));
        }
        if !case.status.is_open() {
            return Err(ServiceError::validation(format!(
                "Cannot pay for a {} verification",
                case.status.to_str()
            )));
        }

        if let Some(other) = self.db_client.get_verification_by_reference(reference).await? {
            if other.id != case.id {
                return Err(ServiceError::conflict(
                    "Payment reference has already been used",
                ));
            }
        }

        if let Err(e) =
            reconcile_payment(self.gateway.as_ref(), reference, case.payment.amount).await
        {
            warn!(
                "Payment reconciliation failed for verification {} (reference {}): {}",
                case.id, reference, e
            );
            return Err(ServiceError::Payment("Payment verification failed".to_string()));
        }

        let read_version = case.version;
        let now = Utc::now();
        case.payment.status = PaymentStatus::Paid;
        case.payment.reference = Some(reference.to_string());
        case.payment.paid_at = Some(now);
        case.status = CaseStatus::Pending;
        case.record(TimelineEntry::new(
            "Payment confirmed",
            caller.id,
            format!("Payment of {} confirmed", format_naira(case.payment.amount)),
        ));

        let case = self.persist(&case, read_version, None).await?;
        info!("Payment confirmed for verification {} by {}", case.id, caller.id);

        if let Some(admin_phone) = &self.admin_phone {
            self.notifications
                .send_sms(mails::payment_confirmed_sms(admin_phone, &case));
        }

        Ok(case)
    }

    pub async fn assign(
        &self,
        caller: Caller,
        verification_id: Uuid,
        agent_id: Uuid,
        expected_version: Option<i64>,
    ) -> Result<VerificationCase, ServiceError> {
        if !caller.is_admin() {
            return Err(ServiceError::forbidden("Not authorized"));
        }

        let mut case = self.load(verification_id).await?;
        check_version(&case, expected_version)?;

        if !case.status.is_open() {
            return Err(ServiceError::validation(format!(
                "Cannot assign a {} verification",
                case.status.to_str()
            )));
        }
        if self.require_payment_before_assignment && case.payment.status != PaymentStatus::Paid {
            return Err(ServiceError::validation(
                "Verification must be paid before assignment",
            ));
        }

        let agent = self
            .db_client
            .get_user(Some(agent_id), None, None, None)
            .await?
            .ok_or(ServiceError::NotFound("Agent"))?;
        if !matches!(agent.role, UserRole::Agent | UserRole::Admin) {
            return Err(ServiceError::validation(
                "Verifications can only be assigned to agents or admins",
            ));
        }

        let read_version = case.version;
        case.assigned_to = Some(agent.id);
        case.status = CaseStatus::InProgress;
        case.record(TimelineEntry::new(
            "Assigned to agent",
            caller.id,
            format!("Assigned to agent {}", agent.id),
        ));

        let case = self.persist(&case, read_version, None).await?;
        info!(
            "Verification {} assigned to {} by {}",
            case.id, agent.id, caller.id
        );

        Ok(case)
    }

    pub async fn update_status(
        &self,
        caller: Caller,
        verification_id: Uuid,
        update: StatusUpdate,
    ) -> Result<VerificationCase, ServiceError> {
        let mut case = self.load(verification_id).await?;

        if case.assigned_to != Some(caller.id) && !caller.is_admin() {
            return Err(ServiceError::forbidden("Not authorized"));
        }
        check_version(&case, update.expected_version)?;

        if !case.status.can_transition_to(update.status) {
            return Err(ServiceError::validation(format!(
                "Cannot change status from {} to {}",
                case.status.to_str(),
                update.status.to_str()
            )));
        }
        if update.breakdown.is_some() && update.score.is_none() {
            return Err(ServiceError::validation(
                "A score breakdown requires an overall score",
            ));
        }
        if update.score.is_some() && update.status != CaseStatus::Completed {
            return Err(ServiceError::validation(
                "A score can only be recorded when completing a verification",
            ));
        }

        let read_version = case.version;
        let note = update
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        case.status = update.status;
        if let Some(note) = &note {
            case.notes.push(note.clone());
        }
        if let Some(score) = update.score {
            case.score.overall = Some(score);
            case.score.breakdown = update.breakdown.map(sqlx::types::Json);
        }
        case.record(TimelineEntry::new(
            format!("Status updated to {}", update.status.to_str()),
            caller.id,
            note.unwrap_or_else(|| "Status updated".to_string()),
        ));

        // A completion without a score leaves the listing untouched.
        let summary = match (case.status, case.score.overall) {
            (CaseStatus::Completed, Some(score)) => Some(VerificationSummary {
                property_id: case.property_id,
                score,
                verified_by: caller.id,
                verified_at: case.updated_at,
            }),
            _ => None,
        };

        let case = self.persist(&case, read_version, summary.as_ref()).await?;
        info!(
            "Verification {} moved to {} by {}",
            case.id,
            case.status.to_str(),
            caller.id
        );
        if let Some(summary) = &summary {
            info!(
                "Property {} verified with score {}",
                summary.property_id, summary.score
            );
        }

        if case.status.is_terminal() {
            self.notify_requester(&case);
        }

        Ok(case)
    }

    pub async fn refund(
        &self,
        caller: Caller,
        verification_id: Uuid,
        reason: Option<String>,
        expected_version: Option<i64>,
    ) -> Result<VerificationCase, ServiceError> {
        if !caller.is_admin() {
            return Err(ServiceError::forbidden("Not authorized"));
        }

        let mut case = self.load(verification_id).await?;
        check_version(&case, expected_version)?;

        if case.payment.status != PaymentStatus::Paid {
            return Err(ServiceError::conflict(format!(
                "Only paid verifications can be refunded, payment is {}",
                case.payment.status.to_str()
            )));
        }

        let read_version = case.version;
        let details = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| format!("Refund of {} issued", format_naira(case.payment.amount)));

        case.payment.status = PaymentStatus::Refunded;
        case.record(TimelineEntry::new("Payment refunded", caller.id, details));

        let case = self.persist(&case, read_version, None).await?;
        info!("Payment refunded for verification {} by {}", case.id, caller.id);

        Ok(case)
    }

    pub async fn get(
        &self,
        caller: Caller,
        verification_id: Uuid,
    ) -> Result<VerificationCase, ServiceError> {
        let case = self.load(verification_id).await?;

        if !case.can_be_viewed_by(caller.id, caller.is_admin()) {
            return Err(ServiceError::forbidden("Not authorized"));
        }

        Ok(case)
    }

    pub async fn list_requested_by(
        &self,
        caller: Caller,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<VerificationCase>, Pagination), ServiceError> {
        let filter = VerificationFilter {
            requested_by: Some(caller.id),
            ..Default::default()
        };

        self.page(&filter, page, limit).await
    }

    /// Agents only ever see cases assigned to them; admins see everything.
    pub async fn list(
        &self,
        caller: Caller,
        mut filter: VerificationFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<VerificationCase>, Pagination), ServiceError> {
        match caller.role {
            UserRole::Admin => {}
            UserRole::Agent => filter.assigned_to = Some(caller.id),
            UserRole::User => return Err(ServiceError::forbidden("Not authorized")),
        }

        self.page(&filter, page, limit).await
    }

    async fn page(
        &self,
        filter: &VerificationFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<VerificationCase>, Pagination), ServiceError> {
        let verifications = self.db_client.get_verifications(filter, page, limit).await?;
        let total = self.db_client.get_verification_count(filter).await?;

        Ok((verifications, Pagination::new(page, limit, total)))
    }

    async fn load(&self, verification_id: Uuid) -> Result<VerificationCase, ServiceError> {
        self.db_client
            .get_verification(verification_id)
            .await?
            .ok_or(ServiceError::NotFound("Verification"))
    }

    async fn persist(
        &self,
        case: &VerificationCase,
        read_version: i64,
        summary: Option<&VerificationSummary>,
    ) -> Result<VerificationCase, ServiceError> {
        self.db_client
            .update_verification(case, read_version, summary)
            .await?
            .ok_or_else(|| {
                warn!("Stale write rejected for verification {}", case.id);
                ServiceError::stale()
            })
    }

    /// Looks up the requester and emails them on a background task.
    fn notify_requester(&self, case: &VerificationCase) -> JoinHandle<()> {
        let db_client = self.db_client.clone();
        let notifications = self.notifications.clone();
        let case = case.clone();

        tokio::spawn(async move {
            match db_client
                .get_user(Some(case.requested_by), None, None, None)
                .await
            {
                Ok(Some(requester)) => {
                    notifications
                        .send_email(mails::verification_closed_email(&requester.email, &case));
                }
                Ok(None) => warn!(
                    "Requester {} of verification {} no longer exists",
                    case.requested_by, case.id
                ),
                Err(e) => warn!(
                    "Could not load requester of verification {}: {}",
                    case.id, e
                ),
            }
        })
    }
}

fn check_version(case: &VerificationCase, expected: Option<i64>) -> Result<(), ServiceError> {
    match expected {
        Some(expected) if expected != case.version => Err(ServiceError::stale()),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_check() {
        let mut case = VerificationCase::new(Uuid::new_v4(), Uuid::new_v4(), Priority::Medium);
        case.version = 4;

        assert!(check_version(&case, None).is_ok());
        assert!(check_version(&case, Some(4)).is_ok());
        assert!(matches!(
            check_version(&case, Some(3)),
            Err(ServiceError::Conflict(_))
        ));
    }
}
