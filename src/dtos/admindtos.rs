// dtos/admindtos.rs
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::dtos::{userdtos::FilterUserDto, Pagination};
use crate::models::{
    propertymodel::{Property, PropertyVerificationStatus},
    usermodel::UserRole,
    verificationmodels::VerificationCase,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_agents: i64,
    pub total_properties: i64,
    pub verified_properties: i64,
    pub pending_verifications: i64,
    pub completed_verifications: i64,
    pub total_revenue: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentActivity {
    pub users: Vec<FilterUserDto>,
    pub properties: Vec<Property>,
    pub verifications: Vec<VerificationCase>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDto {
    pub stats: DashboardStats,
    pub recent_activity: RecentActivity,
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUserQueryDto {
    pub role: Option<UserRole>,
    #[validate(length(max = 100))]
    pub search: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserStatusDto {
    pub is_verified: Option<bool>,
    pub role: Option<UserRole>,
}

impl UpdateUserStatusDto {
    pub fn is_empty(&self) -> bool {
        self.is_verified.is_none() && self.role.is_none()
    }
}

#[derive(Validate, Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminPropertyQueryDto {
    pub state: Option<String>,
    pub status: Option<PropertyVerificationStatus>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserListDto {
    pub users: Vec<FilterUserDto>,
    pub pagination: Pagination,
}
