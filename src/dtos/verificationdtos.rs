// dtos/verificationdtos.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::dtos::Pagination;
use crate::models::verificationmodels::{
    CaseStatus, Priority, ScoreBreakdown, VerificationCase, VerificationFilter,
};

pub const PAYMENT_INSTRUCTIONS: &str = "Proceed to payment to start verification";

fn validate_breakdown(breakdown: &ScoreBreakdown) -> Result<(), ValidationError> {
    if breakdown.values().iter().all(|v| (0..=100).contains(v)) {
        Ok(())
    } else {
        let mut err = ValidationError::new("breakdown");
        err.message = Some("Breakdown scores must be between 0 and 100".into());
        Err(err)
    }
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestVerificationDto {
    pub property_id: Uuid,
    pub priority: Option<Priority>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDto {
    #[validate(length(min = 1, max = 200, message = "Payment reference is required"))]
    pub payment_reference: String,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignDto {
    pub agent_id: Uuid,
    pub expected_version: Option<i64>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateDto {
    pub status: CaseStatus,

    #[validate(length(min = 1, max = 2000, message = "Notes must be between 1 and 2000 characters"))]
    pub notes: Option<String>,

    #[validate(range(min = 0, max = 100, message = "Score must be between 0 and 100"))]
    pub score: Option<i32>,

    #[validate(custom = "validate_breakdown")]
    pub breakdown: Option<ScoreBreakdown>,

    pub expected_version: Option<i64>,
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundDto {
    #[validate(length(max = 500, message = "Reason must be less than 500 characters"))]
    pub reason: Option<String>,
    pub expected_version: Option<i64>,
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerificationQueryDto {
    pub status: Option<CaseStatus>,
    pub priority: Option<Priority>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

impl VerificationQueryDto {
    pub fn filter(&self) -> VerificationFilter {
        VerificationFilter {
            status: self.status,
            priority: self.priority,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedVerificationDto {
    pub verification: VerificationCase,
    pub payment_amount: i64,
    pub payment_instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationListDto {
    pub verifications: Vec<VerificationCase>,
    pub pagination: Pagination,
}
