use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::{cookie::Cookie, WithRejection};
use serde_json::json;
use validator::Validate;

use crate::{
    db::UserExt,
    dtos::userdtos::{
        FilterUserDto, LoginUserDto, RegisterUserDto, UpdateProfileDto, UserData,
        UserResponseDto, UserWithTokenData, VerifyPhoneDto,
    },
    error::{ErrorMessage, HttpError},
    mail::mails,
    middleware::{auth, JWTAuthMiddleware},
    models::usermodel::{NewUser, User, UserRole},
    service::{
        error::ServiceError,
        referral::{generate_referral_code, generate_referral_link},
    },
    utils::{otp_generator::generate_otp, password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    let protected = Router::new()
        .route("/verify-phone", post(verify_phone))
        .route("/me", get(get_me))
        .route("/profile", put(update_profile))
        .route("/resend-verification", post(resend_verification))
        .layer(middleware::from_fn(auth));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .merge(protected)
}

fn issue_token(app_state: &AppState, user: &User) -> Result<String, HttpError> {
    token::create_token(
        &user.id.to_string(),
        app_state.env.jwt_secret.as_bytes(),
        app_state.env.jwt_maxage,
    )
    .map_err(HttpError::internal)
}

pub async fn register(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterUserDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let role = body.role.unwrap_or(UserRole::User);
    if role == UserRole::Admin {
        return Err(HttpError::bad_request("Role must be user or agent"));
    }

    let email = body.email.trim().to_lowercase();

    let by_email = app_state
        .db_client
        .get_user(None, Some(&email), None, None)
        .await?;
    let by_phone = app_state
        .db_client
        .get_user(None, None, Some(&body.phone), None)
        .await?;
    if by_email.is_some() || by_phone.is_some() {
        return Err(HttpError::bad_request(ErrorMessage::UserExists.to_string()));
    }

    // An unknown referral code is ignored rather than rejected.
    let mut referred_by = None;
    if let Some(code) = body.referral_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        match app_state.db_client.get_user(None, None, None, Some(code)).await? {
            Some(referrer) => referred_by = Some(referrer.id),
            None => tracing::debug!("Ignoring unknown referral code {}", code),
        }
    }

    let hashed_password = password::hash(&body.password)
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let verification_code = generate_otp();

    let user = app_state
        .db_client
        .save_user(NewUser {
            referral_code: generate_referral_code(&body.name),
            name: body.name.trim().to_string(),
            phone: body.phone,
            email,
            password: hashed_password,
            role,
            verification_code: Some(verification_code.clone()),
            referred_by,
            is_verified: false,
        })
        .await
        .map_err(|e| HttpError::from(ServiceError::from(e)))?;

    tracing::info!("User {} registered as {}", user.id, user.role.to_str());

    app_state
        .notifications
        .send_sms(mails::phone_code_sms(&user.phone, &verification_code));

    let token = issue_token(&app_state, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponseDto {
            success: true,
            message: Some("User registered. Verify your phone.".to_string()),
            data: UserWithTokenData {
                user: FilterUserDto::filter_user(&user),
                token,
            },
        }),
    ))
}

pub async fn verify_phone(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Json(body), _): WithRejection<Json<VerifyPhoneDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if user.user.verification_code.as_deref() != Some(body.verification_code.as_str()) {
        return Err(HttpError::bad_request("Invalid code"));
    }

    let user = app_state.db_client.mark_phone_verified(user.user.id).await?;
    tracing::info!("Phone verified for user {}", user.id);

    Ok(Json(UserResponseDto {
        success: true,
        message: Some("Phone verified".to_string()),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<LoginUserDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .get_user(None, Some(&body.email.trim().to_lowercase()), None, None)
        .await?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, &user.password)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::WrongCredentials.to_string()))?;

    if !password_matched {
        return Err(HttpError::unauthorized(
            ErrorMessage::WrongCredentials.to_string(),
        ));
    }

    let token = issue_token(&app_state, &user)?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(app_state.env.jwt_maxage))
        .http_only(true)
        .build();

    let body = Json(UserResponseDto {
        success: true,
        message: Some("Login successful".to_string()),
        data: UserWithTokenData {
            user: FilterUserDto::filter_user(&user),
            token,
        },
    });

    Ok(([(header::SET_COOKIE, cookie.to_string())], body))
}

pub async fn get_me(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    let referral_link =
        generate_referral_link(&app_state.env.frontend_url, &user.user.referral_code);

    Ok(Json(json!({
        "success": true,
        "data": {
            "user": FilterUserDto::filter_user(&user.user),
            "referralLink": referral_link,
        }
    })))
}

pub async fn update_profile(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .update_profile(user.user.id, body.into_update())
        .await?;

    Ok(Json(UserResponseDto {
        success: true,
        message: Some("Profile updated".to_string()),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    }))
}

pub async fn resend_verification(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
) -> Result<impl IntoResponse, HttpError> {
    if user.user.is_verified {
        return Err(HttpError::bad_request("Already verified"));
    }

    let code = generate_otp();
    let user = app_state
        .db_client
        .update_verification_code(user.user.id, &code)
        .await?;

    app_state
        .notifications
        .send_sms(mails::phone_code_sms(&user.phone, &code));

    Ok(Json(json!({
        "success": true,
        "message": "Code resent"
    })))
}
