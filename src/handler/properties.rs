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
    db::{PropertyExt, UserExt},
    dtos::{
        propertydtos::{
            AddImagesDto, CreatePropertyDto, PropertyListDto, PropertyQueryDto, RemoveImageDto,
            ShareLinkDto, UpdatePropertyDto,
        },
        userdtos::RequestQueryDto,
        Pagination,
    },
    error::{ErrorMessage, HttpError},
    middleware::{auth, role_check, JWTAuthMiddleware},
    models::{
        propertymodel::{AnalyticsCounter, Property, PropertySearchFilters},
        usermodel::UserRole,
    },
    service::error::ServiceError,
    AppState,
};

pub fn properties_handler() -> Router {
    let listing_management = Router::new()
        .route("/", post(create_property))
        .route("/:id", put(update_property).delete(delete_property))
        .route("/:id/images", post(add_images).delete(remove_image))
        .layer(middleware::from_fn(|req, next| {
            role_check(req, next, vec![UserRole::Agent, UserRole::Admin])
        }))
        .layer(middleware::from_fn(auth));

    let authenticated = Router::new()
        .route("/my", get(get_my_properties))
        .route("/:id/favorite", post(favorite_property))
        .route("/:id/inquire", post(inquire_property))
        .layer(middleware::from_fn(auth));

    Router::new()
        .route("/", get(get_properties))
        .route("/:id", get(get_property))
        .route("/:id/share", post(share_property))
        .merge(listing_management)
        .merge(authenticated)
}

async fn load_property(app_state: &AppState, property_id: Uuid) -> Result<Property, HttpError> {
    app_state
        .db_client
        .get_property(property_id)
        .await?
        .ok_or_else(|| HttpError::not_found("Property not found"))
}

/// Loads the listing and checks that the caller owns it or is an admin.
async fn load_owned_property(
    app_state: &AppState,
    user: &JWTAuthMiddleware,
    property_id: Uuid,
) -> Result<Property, HttpError> {
    let property = load_property(app_state, property_id).await?;

    if property.agent_id != user.user.id && user.user.role != UserRole::Admin {
        return Err(HttpError::forbidden(ErrorMessage::PermissionDenied.to_string()));
    }

    Ok(property)
}

async fn bump(
    app_state: &AppState,
    property_id: Uuid,
    counter: AnalyticsCounter,
) -> Result<Property, HttpError> {
    app_state
        .db_client
        .increment_analytics(property_id, counter)
        .await?
        .ok_or_else(|| HttpError::not_found("Property not found"))
}

pub async fn get_properties(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<PropertyQueryDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = Pagination::window(query.page, query.limit);
    let filters = query.into_filters();

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

pub async fn create_property(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Json(body), _): WithRejection<Json<CreatePropertyDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = body.into_property(user.user.id);
    let property = app_state
        .db_client
        .create_property(&property)
        .await
        .map_err(|e| HttpError::from(ServiceError::from(e)))?;

    app_state
        .db_client
        .increment_properties_handled(user.user.id)
        .await?;

    tracing::info!("Property {} created by {}", property.id, user.user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Property created",
            "data": { "property": property }
        })),
    ))
}

pub async fn get_my_properties(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Query(query), _): WithRejection<Query<RequestQueryDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    query
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let (page, limit) = Pagination::window(query.page, query.limit);
    let filters = PropertySearchFilters {
        agent_id: Some(user.user.id),
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

pub async fn get_property(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let property = bump(&app_state, property_id, AnalyticsCounter::Views).await?;

    Ok(Json(json!({
        "success": true,
        "data": { "property": property }
    })))
}

pub async fn update_property(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<UpdatePropertyDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let mut property = load_owned_property(&app_state, &user, property_id).await?;
    body.apply_to(&mut property);

    let property = app_state.db_client.update_property(&property).await?;
    tracing::info!("Property {} updated by {}", property.id, user.user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Property updated",
        "data": { "property": property }
    })))
}

pub async fn delete_property(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    load_owned_property(&app_state, &user, property_id).await?;

    if !app_state.db_client.delete_property(property_id).await? {
        return Err(HttpError::conflict(
            "Property has an open verification and cannot be deleted",
        ));
    }

    tracing::info!("Property {} deleted by {}", property_id, user.user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Property deleted"
    })))
}

pub async fn add_images(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<AddImagesDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let property = load_owned_property(&app_state, &user, property_id).await?;

    let new_images = body.cleaned();
    if new_images.is_empty() {
        return Err(HttpError::bad_request("No images uploaded"));
    }

    let mut images = property.images;
    images.extend(new_images);

    let property = app_state
        .db_client
        .update_property_images(property_id, images)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Images uploaded",
        "data": { "images": property.images }
    })))
}

pub async fn remove_image(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddleware>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
    WithRejection(Json(body), _): WithRejection<Json<RemoveImageDto>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    if body.filename.is_none() && body.url.is_none() {
        return Err(HttpError::bad_request("filename or url required"));
    }

    let property = load_owned_property(&app_state, &user, property_id).await?;

    let before = property.images.len();
    let images: Vec<String> = property
        .images
        .into_iter()
        .filter(|image| !body.matches(image))
        .collect();

    if images.len() == before {
        return Err(HttpError::not_found("Image not found on property"));
    }

    let property = app_state
        .db_client
        .update_property_images(property_id, images)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Image removed",
        "data": { "images": property.images }
    })))
}

pub async fn favorite_property(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let property = bump(&app_state, property_id, AnalyticsCounter::Favorites).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Property favorited",
        "data": { "favorites": property.analytics.favorites }
    })))
}

pub async fn inquire_property(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let property = bump(&app_state, property_id, AnalyticsCounter::Inquiries).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Inquiry recorded",
        "data": { "inquiries": property.analytics.inquiries }
    })))
}

pub async fn share_property(
    Extension(app_state): Extension<Arc<AppState>>,
    WithRejection(Path(property_id), _): WithRejection<Path<Uuid>, HttpError>,
) -> Result<impl IntoResponse, HttpError> {
    let property = bump(&app_state, property_id, AnalyticsCounter::Shares).await?;

    let share = ShareLinkDto::new(
        &app_state.env.frontend_url,
        property.id,
        &property.title,
        &property.description,
    );

    Ok(Json(json!({
        "success": true,
        "message": "Share updated",
        "data": share
    })))
}
