use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dtos::{
        userdtos::RequestQueryDto,
        verificationdtos::{
            AssignDto, CreatedVerificationDto, PaymentDto, RefundDto, RequestVerificationDto,
            StatusUpdateDto, VerificationListDto, VerificationQueryDto, PAYMENT_INSTRUCTIONS,
        },
        Pagination,
    },
    error::HttpError,
    middleware::{auth, role_check, JWTAuthMiddleware},
    models::usermodel::UserRole,
    service::verification_service::StatusUpdate,
    AppState,
};

pub fn verification_handler() -> Router {
    let admin_only = Router::new()
        .route("/:id/assign", post(assign_verification))
        .route("/:id/refund", post(refund_verification))
        .layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Admin])
        }));

    let staff = Router::new()
        .route("/", get(list_verifications))
        .route("/:id/status", put(update_status))
        .layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
        }));

    Router::new()
        .route("/request", post(request_verification))
        .route("/my-verifications", get(my_verifications))
        .route("/:id", get(get_verification))
        .route("/:id/payment", post(submit_payment))
        .merge(admin_only)
        .merge(staff)
        .layer(middleware::from_fn(auth))
}

pub async fn request_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Json(body), _): WithRejection<Json<RequestVerificationDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let verification = app_state
        .verification_service
        .request(user.caller(), body.property_id, body.priority)
        .await?;

    let payment_amount = verification.payment.amount;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Verification request created",
            "data": CreatedVerificationDto {
                verification,
                payment_amount,
                payment_instructions: PAYMENT_INSTRUCTIONS.to_string(),
            }
        })),
    ))
}

pub async fn submit_payment(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(verification_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<PaymentDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let verification = app_state
        .verification_service
        .submit_payment(user.caller(), verification_id, &body.payment_reference)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment confirmed",
        "data": { "verification": verification }
    })))
}

pub async fn my_verifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Query(query), _): WithRejection<Query<RequestQueryDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = Pagination::window(query.page, query.limit);
    let (verifications, pagination) = app_state
        .verification_service
        .list_requested_by(user.caller(), page, limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": VerificationListDto { verifications, pagination }
    })))
}

pub async fn get_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(verification_id), _): WithRejection<Path<Uuid>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let verification = app_state
        .verification_service
        .get(user.caller(), verification_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": { "verification": verification }
    })))
}

pub async fn assign_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(verification_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<AssignDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let verification = app_state
        .verification_service
        .assign(
            user.caller(),
            verification_id,
            body.agent_id,
            body.expected_version,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Assigned successfully",
        "data": { "verification": verification }
    })))
}

pub async fn update_status(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(verification_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<StatusUpdateDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let update = StatusUpdate {
        status: body.status,
        notes: body.notes,
        score: body.score,
        breakdown: body.breakdown,
        expected_version: body.expected_version,
    };

    let verification = app_state
        .verification_service
        .update_status(user.caller(), verification_id, update)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Status updated",
        "data": { "verification": verification }
    })))
}

pub async fn refund_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(verification_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<RefundDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let verification = app_state
        .verification_service
        .refund(
            user.caller(),
            verification_id,
            body.reason,
            body.expected_version,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Payment refunded",
        "data": { "verification": verification }
    })))
}

pub async fn list_verifications(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Query(query), _): WithRejection<Query<VerificationQueryDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = Pagination::window(query.page, query.limit);
    let (verifications, pagination) = app_state
        .verification_service
        .list(user.caller(), query.filter(), page, limit)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": VerificationListDto { verifications, pagination }
    })))
}
