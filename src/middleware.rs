use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::UserExt,
    error::{ErrorMessage, HttpError},
    models::usermodel::{Caller, User, UserRole},
    utils::token,
    AppState,
};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JWTAuthMiddleware {
    pub user: User,
}

impl JWTAuthMiddleware {
    pub fn caller(&self) -> Caller {
        Caller::from(&self.user)
    }
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty())
}

pub async fn auth(
    cookie_jar: CookieJar,
    Extension(app_state): Extension<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, HttpError> {
    // Bearer header is tried before the cookie.
    let candidates: Vec<String> = bearer_token(&req)
        .into_iter()
        .chain(cookie_jar.get("token").map(|cookie| cookie.value().to_string()))
        .collect();

    if candidates.is_empty() {
        return Err(HttpError::unauthorized(
            ErrorMessage::TokenNotProvided.to_string(),
        ));
    }

    let user_id = candidates
        .into_iter()
        .find_map(|token| token::decode_token(token, app_state.env.jwt_secret.as_bytes()).ok())
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user_id = uuid::Uuid::parse_str(&user_id)
        .map_err(|_| HttpError::unauthorized(ErrorMessage::InvalidToken.to_string()))?;

    let user = app_state
        .db_client
        .get_user(Some(user_id), None, None, None)
        .await
        .map_err(HttpError::from)?
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNoLongerExist.to_string()))?;

    req.extensions_mut().insert(JWTAuthMiddleware { user });

    Ok(next.run(req).await)
}

fn privileges_required(roles: &[UserRole]) -> String {
    let names: Vec<&str> = roles.iter().map(|role| role.to_str()).collect();
    let label = names.join(" or ");
    let mut chars = label.chars();
    let label = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => label.clone(),
    };
    format!("Access denied. {} privileges required.", label)
}

pub async fn role_check(
    req: Request,
    next: Next,
    required_roles: Vec<UserRole>,
) -> Result<impl IntoResponse, HttpError> {
    let user = req
        .extensions()
        .get::<JWTAuthMiddleware>()
        .ok_or_else(|| HttpError::unauthorized(ErrorMessage::UserNotAuthenticated.to_string()))?;

    if !required_roles.contains(&user.user.role) {
        return Err(HttpError::forbidden(privileges_required(&required_roles)));
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileges_message() {
        assert_eq!(
            privileges_required(&[UserRole::Admin]),
            "Access denied. Admin privileges required."
        );
        assert_eq!(
            privileges_required(&[UserRole::Agent, UserRole::Admin]),
            "Access denied. Agent or admin privileges required."
        );
    }
}
