#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::mpsc;
use uuid::Uuid;

use propertyverify::{
    config::Config,
    db::{PropertyExt, Store, UserExt, VerificationExt},
    dtos::propertydtos::CreatePropertyDto,
    models::{
        propertymodel::{
            AnalyticsCounter, Property, PropertySearchFilters, PropertyVerificationStatus,
            VerificationSummary,
        },
        usermodel::{NewUser, ProfileUpdate, SocialLinks, User, UserFilter, UserRole},
        verificationmodels::{
            CaseStatus, PaymentStatus, VerificationCase, VerificationFilter, VerificationStats,
        },
    },
    service::{
        notification_service::{Notification, NotificationChannel, NotificationError, NotificationService},
        payment_provider::{GatewayError, GatewayTransaction, PaymentGateway},
        verification_service::VerificationService,
    },
    utils::token,
    AppState,
};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const ADMIN_PHONE: &str = "+2348000000001";

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    properties: HashMap<Uuid, Property>,
    verifications: HashMap<Uuid, VerificationCase>,
}

/// In-memory `Store` with the same guarantees the Postgres schema gives:
/// one open case per property and compare-and-swap updates on `version`.
///
/// Two switches let tests stage races that the service cannot see coming:
/// a concurrent writer landing between read and write, and an open-case
/// lookup that misses a row the insert guard still catches.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    interleave_next_write: AtomicBool,
    hide_open_cases: AtomicBool,
}

fn page_of<T: Clone>(items: Vec<T>, page: u32, limit: u32) -> Vec<T> {
    let offset = (page.saturating_sub(1) * limit) as usize;
    items.into_iter().skip(offset).take(limit as usize).collect()
}

fn user_matches(user: &User, filter: &UserFilter) -> bool {
    if let Some(role) = filter.role {
        if user.role != role {
            return false;
        }
    }
    if let Some(search) = filter.search.as_deref() {
        let search = search.to_lowercase();
        return user.name.to_lowercase().contains(&search)
            || user.email.to_lowercase().contains(&search)
            || user.phone.contains(&search);
    }
    true
}

fn property_matches(property: &Property, filters: &PropertySearchFilters) -> bool {
    if filters.active_only && !property.is_active {
        return false;
    }
    if let Some(state) = filters.state.as_deref() {
        if property.state != state {
            return false;
        }
    }
    if let Some(city) = filters.city.as_deref() {
        if !property.city.to_lowercase().contains(&city.to_lowercase()) {
            return false;
        }
    }
    if let Some(status) = filters.verification_status {
        if property.verification.status != status {
            return false;
        }
    }
    if let Some(agent_id) = filters.agent_id {
        if property.agent_id != agent_id {
            return false;
        }
    }
    if let Some(min_price) = filters.min_price {
        if property.price < min_price {
            return false;
        }
    }
    if let Some(max_price) = filters.max_price {
        if property.price > max_price {
            return false;
        }
    }
    true
}

fn case_matches(case: &VerificationCase, filter: &VerificationFilter) -> bool {
    filter.status.map_or(true, |s| case.status == s)
        && filter.priority.map_or(true, |p| case.priority == p)
        && filter.assigned_to.map_or(true, |a| case.assigned_to == Some(a))
        && filter.requested_by.map_or(true, |r| case.requested_by == r)
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, name: &str, role: UserRole) -> User {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let user = User {
            id,
            name: name.to_string(),
            phone: format!("+234{:010}", id.as_u128() % 10_000_000_000),
            email: format!("{}@example.com", id.simple()),
            password: String::new(),
            role,
            is_verified: true,
            verification_code: None,
            avatar: None,
            company: None,
            location: None,
            bio: None,
            rating: 0.0,
            total_reviews: 0,
            properties_handled: 0,
            social_links: Json(SocialLinks::default()),
            referral_code: format!("REF{}", &id.simple().to_string()[..5]).to_uppercase(),
            referred_by: None,
            total_referrals: 0,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn insert_property(&self, agent_id: Uuid) -> Property {
        let dto: CreatePropertyDto = serde_json::from_value(serde_json::json!({
            "title": "Three bedroom flat in Lekki",
            "description": "Serviced flat with parking, close to the expressway",
            "address": "12 Admiralty Way",
            "state": "Lagos",
            "city": "Lekki",
            "propertyType": "apartment",
            "price": 45_000_000,
            "bedrooms": 3,
            "bathrooms": 3
        }))
        .unwrap();
        let property = dto.into_property(agent_id);
        self.tables
            .lock()
            .unwrap()
            .properties
            .insert(property.id, property.clone());
        property
    }

    pub fn property(&self, property_id: Uuid) -> Property {
        self.tables.lock().unwrap().properties[&property_id].clone()
    }

    pub fn verification(&self, verification_id: Uuid) -> VerificationCase {
        self.tables.lock().unwrap().verifications[&verification_id].clone()
    }

    /// The next `update_verification` first sees another writer bump the
    /// stored version.
    pub fn interleave_next_write(&self) {
        self.interleave_next_write.store(true, Ordering::SeqCst);
    }

    /// `get_open_verification_for_property` reports nothing from now on.
    pub fn hide_open_cases(&self) {
        self.hide_open_cases.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserExt for MemoryStore {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        phone: Option<&str>,
        referral_code: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let found = tables.users.iter().find(|u| {
            if let Some(id) = user_id {
                u.id == id
            } else if let Some(email) = email {
                u.email == email
            } else if let Some(phone) = phone {
                u.phone == phone
            } else if let Some(code) = referral_code {
                u.referral_code == code
            } else {
                false
            }
        });
        Ok(found.cloned())
    }

    async fn get_users(
        &self,
        filter: &UserFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<User>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| user_matches(u, filter))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(users, page, limit))
    }

    async fn get_user_count(&self, filter: &UserFilter) -> Result<i64, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().filter(|u| user_matches(u, filter)).count() as i64)
    }

    async fn save_user(&self, new_user: NewUser) -> Result<User, sqlx::Error> {
        let user = self.insert_user(&new_user.name, new_user.role);
        let mut tables = self.tables.lock().unwrap();
        if let Some(referrer) = new_user.referred_by {
            if let Some(r) = tables.users.iter_mut().find(|u| u.id == referrer) {
                r.total_referrals += 1;
            }
        }
        let stored = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(sqlx::Error::RowNotFound)?;
        stored.phone = new_user.phone;
        stored.email = new_user.email;
        stored.password = new_user.password;
        stored.verification_code = new_user.verification_code;
        stored.referral_code = new_user.referral_code;
        stored.referred_by = new_user.referred_by;
        stored.is_verified = new_user.is_verified;
        Ok(stored.clone())
    }

    async fn mark_phone_verified(&self, user_id: Uuid) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.is_verified = true;
        user.verification_code = None;
        Ok(user.clone())
    }

    async fn update_verification_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        user.verification_code = Some(code.to_string());
        Ok(user.clone())
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if update.bio.is_some() {
            user.bio = update.bio;
        }
        Ok(user.clone())
    }

    async fn update_user_status(
        &self,
        user_id: Uuid,
        is_verified: Option<bool>,
        role: Option<UserRole>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.users.iter_mut().find(|u| u.id == user_id).map(|user| {
            if let Some(is_verified) = is_verified {
                user.is_verified = is_verified;
            }
            if let Some(role) = role {
                user.role = role;
            }
            user.clone()
        }))
    }

    async fn increment_properties_handled(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == user_id) {
            user.properties_handled += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl PropertyExt for MemoryStore {
    async fn create_property(&self, property: &Property) -> Result<Property, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        tables.properties.insert(property.id, property.clone());
        Ok(property.clone())
    }

    async fn get_property(&self, property_id: Uuid) -> Result<Option<Property>, sqlx::Error> {
        Ok(self.tables.lock().unwrap().properties.get(&property_id).cloned())
    }

    async fn get_properties(
        &self,
        filters: &PropertySearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Property>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut properties: Vec<Property> = tables
            .properties
            .values()
            .filter(|p| property_matches(p, filters))
            .cloned()
            .collect();
        properties.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(properties, page, limit))
    }

    async fn get_property_count(
        &self,
        filters: &PropertySearchFilters,
    ) -> Result<i64, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .properties
            .values()
            .filter(|p| property_matches(p, filters))
            .count() as i64)
    }

    async fn update_property(&self, property: &Property) -> Result<Property, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .properties
            .get_mut(&property.id)
            .ok_or(sqlx::Error::RowNotFound)?;
        let verification = stored.verification.clone();
        let analytics = stored.analytics.clone();
        let images = stored.images.clone();
        *stored = property.clone();
        stored.verification = verification;
        stored.analytics = analytics;
        stored.images = images;
        Ok(stored.clone())
    }

    async fn update_property_images(
        &self,
        property_id: Uuid,
        images: Vec<String>,
    ) -> Result<Property, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let stored = tables
            .properties
            .get_mut(&property_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        stored.images = images;
        Ok(stored.clone())
    }

    async fn delete_property(&self, property_id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let has_open_case = tables
            .verifications
            .values()
            .any(|c| c.property_id == property_id && c.status.is_open());
        if has_open_case {
            return Ok(false);
        }
        Ok(tables.properties.remove(&property_id).is_some())
    }

    async fn increment_analytics(
        &self,
        property_id: Uuid,
        counter: AnalyticsCounter,
    ) -> Result<Option<Property>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.properties.get_mut(&property_id).map(|property| {
            let analytics = &mut property.analytics;
            match counter {
                AnalyticsCounter::Views => analytics.views += 1,
                AnalyticsCounter::Shares => analytics.shares += 1,
                AnalyticsCounter::Inquiries => analytics.inquiries += 1,
                AnalyticsCounter::Favorites => analytics.favorites += 1,
            }
            property.clone()
        }))
    }
}

#[async_trait]
impl VerificationExt for MemoryStore {
    async fn create_verification(
        &self,
        case: &VerificationCase,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        let has_open_case = tables
            .verifications
            .values()
            .any(|c| c.property_id == case.property_id && c.status.is_open());
        if has_open_case {
            return Ok(None);
        }
        tables.verifications.insert(case.id, case.clone());
        Ok(Some(case.clone()))
    }

    async fn get_verification(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .verifications
            .get(&verification_id)
            .cloned())
    }

    async fn get_open_verification_for_property(
        &self,
        property_id: Uuid,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        if self.hide_open_cases.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .verifications
            .values()
            .find(|c| c.property_id == property_id && c.status.is_open())
            .cloned())
    }

    async fn get_verification_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .verifications
            .values()
            .find(|c| c.payment.reference.as_deref() == Some(reference))
            .cloned())
    }

    async fn update_verification(
        &self,
        case: &VerificationCase,
        expected_version: i64,
        summary: Option<&VerificationSummary>,
    ) -> Result<Option<VerificationCase>, sqlx::Error> {
        let mut tables = self.tables.lock().unwrap();
        if self.interleave_next_write.swap(false, Ordering::SeqCst) {
            if let Some(stored) = tables.verifications.get_mut(&case.id) {
                stored.version += 1;
            }
        }
        let current_version = match tables.verifications.get(&case.id) {
            Some(stored) => stored.version,
            None => return Ok(None),
        };
        if current_version != expected_version {
            return Ok(None);
        }

        let mut updated = case.clone();
        updated.version = expected_version + 1;
        tables.verifications.insert(updated.id, updated.clone());

        if let Some(summary) = summary {
            if let Some(property) = tables.properties.get_mut(&summary.property_id) {
                property.verification.status = PropertyVerificationStatus::Verified;
                property.verification.score = summary.score;
                property.verification.last_verified = Some(summary.verified_at);
                property.verification.verified_by = Some(summary.verified_by);
            }
        }

        Ok(Some(updated))
    }

    async fn get_verifications(
        &self,
        filter: &VerificationFilter,
        page: u32,
        limit: u32,
    ) -> Result<Vec<VerificationCase>, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let mut cases: Vec<VerificationCase> = tables
            .verifications
            .values()
            .filter(|c| case_matches(c, filter))
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page_of(cases, page, limit))
    }

    async fn get_verification_count(
        &self,
        filter: &VerificationFilter,
    ) -> Result<i64, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .verifications
            .values()
            .filter(|c| case_matches(c, filter))
            .count() as i64)
    }

    async fn get_verification_stats(&self) -> Result<VerificationStats, sqlx::Error> {
        let tables = self.tables.lock().unwrap();
        let cases = tables.verifications.values();
        let mut stats = VerificationStats::default();
        for case in cases {
            match case.status {
                CaseStatus::Pending => stats.pending_verifications += 1,
                CaseStatus::Completed => stats.completed_verifications += 1,
                _ => {}
            }
            if case.payment.status == PaymentStatus::Paid {
                stats.total_revenue += case.payment.amount;
            }
        }
        Ok(stats)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> bool {
        true
    }
}

/// Answers lookups from a fixed table of references.
#[derive(Default)]
pub struct ScriptedGateway {
    transactions: Mutex<HashMap<String, GatewayTransaction>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeed(&self, reference: &str, amount_kobo: i64) {
        self.script(reference, "success", amount_kobo);
    }

    pub fn script(&self, reference: &str, status: &str, amount_kobo: i64) {
        self.transactions.lock().unwrap().insert(
            reference.to_string(),
            GatewayTransaction {
                status: status.to_string(),
                amount: amount_kobo,
            },
        );
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<GatewayTransaction, GatewayError> {
        self.calls.lock().unwrap().push(reference.to_string());
        self.transactions
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected("Transaction reference not found".to_string()))
    }
}

/// Forwards every delivered notification to the test through a channel.
pub struct RecordingChannel {
    name: &'static str,
    sender: mpsc::UnboundedSender<Notification>,
}

impl RecordingChannel {
    pub fn new(name: &'static str) -> (Arc<Self>, mpsc::UnboundedReceiver<Notification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { name, sender }), receiver)
    }
}

#[async_trait]
impl NotificationChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sender
            .send(notification.clone())
            .map_err(|e| NotificationError::Rejected(e.to_string()))
    }
}

/// Channel that always fails, to prove failures never reach the caller.
pub struct BrokenChannel;

#[async_trait]
impl NotificationChannel for BrokenChannel {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn send(&self, _notification: &Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Rejected("provider down".to_string()))
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/propertyverify_test".to_string(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.to_string(),
        jwt_maxage: 60,
        port: 0,
        allowed_origins: vec!["http://localhost:5173".to_string()],
        frontend_url: "https://propertyverify.ng".to_string(),
        paystack_secret_key: "sk_test".to_string(),
        paystack_base_url: "http://127.0.0.1:9".to_string(),
        admin_phone: Some(ADMIN_PHONE.to_string()),
        require_payment_before_assignment: false,
        smtp: None,
        sms: None,
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<ScriptedGateway>,
    pub sms: mpsc::UnboundedReceiver<Notification>,
    pub email: mpsc::UnboundedReceiver<Notification>,
    pub service: VerificationService,
    pub state: Arc<AppState>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(ScriptedGateway::new());
        let (sms_channel, sms) = RecordingChannel::new("sms-recording");
        let (email_channel, email) = RecordingChannel::new("email-recording");
        let notifications = NotificationService::new(sms_channel, Some(email_channel));

        let state = Arc::new(AppState::new(
            config,
            store.clone(),
            gateway.clone(),
            notifications,
        ));
        let service = state.verification_service.clone();

        Harness {
            store,
            gateway,
            sms,
            email,
            service,
            state,
        }
    }
}

pub fn bearer(user: &User) -> String {
    let token = token::create_token(&user.id.to_string(), JWT_SECRET.as_bytes(), 60).unwrap();
    format!("Bearer {}", token)
}
