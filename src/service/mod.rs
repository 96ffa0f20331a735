pub mod error;
pub mod notification_service;
pub mod payment_provider;
pub mod referral;
pub mod verification_service;
