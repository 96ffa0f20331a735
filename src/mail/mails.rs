use crate::{
    models::verificationmodels::{CaseStatus, VerificationCase},
    service::notification_service::Notification,
};

pub fn phone_code_sms(phone: &str, code: &str) -> Notification {
    Notification::sms(phone, format!("Your PropertyVerify code is: {}", code))
}

pub fn payment_confirmed_sms(admin_phone: &str, case: &VerificationCase) -> Notification {
    Notification::sms(
        admin_phone,
        format!("New verification payment confirmed. ID: {}", case.id),
    )
}

/// Outcome email for the requester once a case is closed.
pub fn verification_closed_email(to_email: &str, case: &VerificationCase) -> Notification {
    let (subject, outcome) = match case.status {
        CaseStatus::Completed => ("Your property verification is complete", "completed"),
        _ => ("Your property verification was rejected", "rejected"),
    };

    let score_line = case
        .score
        .overall
        .map(|score| format!("Verification score: {}/100.", score))
        .unwrap_or_default();

    let text = format!(
        "Verification {} for property {} has been {}. {}",
        case.id, case.property_id, outcome, score_line
    );
    let html = format!(
        "<p>Verification <strong>{}</strong> for property {} has been <strong>{}</strong>.</p><p>{}</p>",
        case.id, case.property_id, outcome, score_line
    );

    Notification::email(to_email, subject, text.trim_end(), html)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::verificationmodels::Priority;

    #[test]
    fn test_closed_email_mentions_score() {
        let mut case = VerificationCase::new(Uuid::new_v4(), Uuid::new_v4(), Priority::High);
        case.status = CaseStatus::Completed;
        case.score.overall = Some(92);

        let mail = verification_closed_email("ada@example.com", &case);
        assert_eq!(mail.subject.as_deref(), Some("Your property verification is complete"));
        assert!(mail.body.contains("92/100"));
    }

    #[test]
    fn test_payment_sms_carries_case_id() {
        let case = VerificationCase::new(Uuid::new_v4(), Uuid::new_v4(), Priority::Low);
        let sms = payment_confirmed_sms("+2348000000000", &case);
        assert_eq!(
            sms.body,
            format!("New verification payment confirmed. ID: {}", case.id)
        );
    }
}
