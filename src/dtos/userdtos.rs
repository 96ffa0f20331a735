use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::usermodel::{ProfileUpdate, SocialLinks, User, UserRole};

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+234[0-9]{10}$").expect("phone pattern is valid"));

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("Phone must match +234XXXXXXXXXX".into());
        Err(err)
    }
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(custom = "validate_phone")]
    pub phone: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    pub role: Option<UserRole>,

    pub referral_code: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginUserDto {
    #[validate(length(min = 1, message = "Email is required"), email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPhoneDto {
    #[validate(length(min = 6, max = 6, message = "Verification code must be 6 digits"))]
    pub verification_code: String,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProfileDto {
    #[validate(url(message = "Avatar must be a URL"))]
    pub avatar: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    #[validate(length(max = 1000, message = "Bio must be less than 1000 characters"))]
    pub bio: Option<String>,
}

#[derive(Validate, Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileDto {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,
    #[validate]
    pub profile: Option<ProfileDto>,
    pub social_links: Option<SocialLinks>,
}

impl UpdateProfileDto {
    pub fn into_update(self) -> ProfileUpdate {
        let profile = self.profile.unwrap_or_default();
        ProfileUpdate {
            name: self.name,
            avatar: profile.avatar,
            company: profile.company,
            location: profile.location,
            bio: profile.bio,
            social_links: self.social_links,
        }
    }
}

#[derive(Serialize, Deserialize, Validate, Debug, Default)]
pub struct RequestQueryDto {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterProfileDto {
    pub avatar: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub rating: f64,
    pub total_reviews: i32,
    pub properties_handled: i32,
}

/// Public view of a user: never carries the password hash or the phone code.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterUserDto {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub role: String,
    pub is_verified: bool,
    pub profile: FilterProfileDto,
    pub social_links: SocialLinks,
    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    pub total_referrals: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FilterUserDto {
    pub fn filter_user(user: &User) -> Self {
        FilterUserDto {
            id: user.id.to_string(),
            name: user.name.to_owned(),
            phone: user.phone.to_owned(),
            email: user.email.to_owned(),
            role: user.role.to_str().to_string(),
            is_verified: user.is_verified,
            profile: FilterProfileDto {
                avatar: user.avatar.clone(),
                company: user.company.clone(),
                location: user.location.clone(),
                bio: user.bio.clone(),
                rating: user.rating,
                total_reviews: user.total_reviews,
                properties_handled: user.properties_handled,
            },
            social_links: user.social_links.0.clone(),
            referral_code: user.referral_code.to_owned(),
            referred_by: user.referred_by,
            total_referrals: user.total_referrals,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    pub fn filter_users(users: &[User]) -> Vec<FilterUserDto> {
        users.iter().map(FilterUserDto::filter_user).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserData {
    pub user: FilterUserDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserWithTokenData {
    pub user: FilterUserDto,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponseDto<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_format() {
        assert!(validate_phone("+2348012345678").is_ok());
        assert!(validate_phone("08012345678").is_err());
        assert!(validate_phone("+234801234567").is_err());
        assert!(validate_phone("+23480123456789").is_err());
        assert!(validate_phone("+2348012345a78").is_err());
    }

    #[test]
    fn test_register_validation() {
        let dto = RegisterUserDto {
            name: "Ada Obi".to_string(),
            phone: "+2348012345678".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret123".to_string(),
            role: None,
            referral_code: None,
        };
        assert!(dto.validate().is_ok());

        let bad = RegisterUserDto {
            phone: "12345".to_string(),
            password: "123".to_string(),
            ..dto
        };
        let errors = bad.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("phone"));
        assert!(fields.contains_key("password"));
    }
}
