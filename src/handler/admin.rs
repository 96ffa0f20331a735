use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{PropertyExt, UserExt, VerificationExt},
    dtos::{
        admindtos::{
            AdminPropertyQueryDto, AdminUserQueryDto, DashboardDto, DashboardStats,
            RecentActivity, UpdateUserStatusDto, UserListDto,
        },
        propertydtos::PropertyListDto,
        userdtos::{FilterUserDto, UserData},
        Pagination,
    },
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddleware},
    models::{
        propertymodel::{PropertySearchFilters, PropertyVerificationStatus},
        usermodel::{UserFilter, UserRole},
        verificationmodels::VerificationFilter,
    },
    AppState,
};

const RECENT_ACTIVITY_LIMIT: u32 = 5;

pub fn admin_handler() -> Router {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/users", get(get_users))
        .route("/users/:id/status", put(update_user_status))
        .route("/properties", get(get_properties))
        .layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Admin])
        }))
        .layer(middleware::from_fn(auth))
}

pub async fn get_dashboard(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let db = &app_state.db_client;

    let all_users = UserFilter::default();
    let agents = UserFilter {
        role: Some(UserRole::Agent),
        ..Default::default()
    };
    let all_properties = PropertySearchFilters::default();
    let verified_properties = PropertySearchFilters {
        verification_status: Some(PropertyVerificationStatus::Verified),
        ..Default::default()
    };

    let total_users = db.get_user_count(&all_users).await?;
    let total_agents = db.get_user_count(&agents).await?;
    let total_properties = db.get_property_count(&all_properties).await?;
    let verified_count = db.get_property_count(&verified_properties).await?;
    let verification_stats = db.get_verification_stats().await?;

    let recent_users = db.get_users(&all_users, 1, RECENT_ACTIVITY_LIMIT).await?;
    let recent_properties = db
        .get_properties(&all_properties, 1, RECENT_ACTIVITY_LIMIT)
        .await?;
    let recent_verifications = db
        .get_verifications(&VerificationFilter::default(), 1, RECENT_ACTIVITY_LIMIT)
        .await?;

    let dashboard = DashboardDto {
        stats: DashboardStats {
            total_users,
            total_agents,
            total_properties,
            verified_properties: verified_count,
            pending_verifications: verification_stats.pending_verifications,
            completed_verifications: verification_stats.completed_verifications,
            total_revenue: verification_stats.total_revenue,
        },
        recent_activity: RecentActivity {
            users: FilterUserDto::filter_users(&recent_users),
            properties: recent_properties,
            verifications: recent_verifications,
        },
    };

    Ok(Json(json!({
        "success": true,
        "data": dashboard
    })))
}

pub async fn get_users(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<AdminUserQueryDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = Pagination::window(query.page, query.limit);
    let filter = UserFilter {
        role: query.role,
        search: query.search.filter(|s| !s.trim().is_empty()),
    };

    let users = app_state.db_client.get_users(&filter, page, limit).await?;
    let total = app_state.db_client.get_user_count(&filter).await?;

    Ok(Json(json!({
        "success": true,
        "data": UserListDto {
            users: FilterUserDto::filter_users(&users),
            pagination: Pagination::new(page, limit, total),
        }
    })))
}

pub async fn update_user_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(admin): Extension<JWTAuthMiddleware>,
    WithRejection(Path(user_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateUserStatusDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    if body.is_empty() {
        return Err(HttpError::bad_request("Provide isVerified or role"));
    }

    let user = app_state
        .db_client
        .update_user_status(user_id, body.is_verified, body.role)
        .await?
        .ok_or_else(|| HttpError::not_found("User not found"))?;

    tracing::info!(
        "User {} updated by admin {} (verified: {}, role: {})",
        user.id,
        admin.user.id,
        user.is_verified,
        user.role.to_str()
    );

    Ok(Json(json!({
        "success": true,
        "message": "User updated",
        "data": UserData {
            user: FilterUserDto::filter_user(&user),
        }
    })))
}

pub async fn get_properties(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<AdminPropertyQueryDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = Pagination::window(query.page, query.limit);
    let filters = PropertySearchFilters {
        state: query.state,
        verification_status: query.status,
        ..Default::default()
    };

    let properties = app_state
        .db_client
        .get_properties(&filters, page, limit)
        .await?;
    let total = app_state.db_client.get_property_count(&filters).await?;

    Ok(Json(json!({
        "success": true,
        "data": PropertyListDto {
            properties,
            pagination: Pagination::new(page, limit, total),
        }
    })))
}
