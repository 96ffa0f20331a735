pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod mail;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use db::Store;
use service::{
    notification_service::NotificationService, payment_provider::PaymentGateway,
    verification_service::VerificationService,
};

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn Store>,
    pub notifications: NotificationService,
    pub verification_service: VerificationService,
}

impl AppState {
    pub fn new(
        env: Config,
        db_client: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: NotificationService,
    ) -> Self {
        let verification_service = VerificationService::new(
            db_client.clone(),
            gateway,
            notifications.clone(),
            env.admin_phone.clone(),
            env.require_payment_before_assignment,
        );

        AppState {
            env,
            db_client,
            notifications,
            verification_service,
        }
    }
}
