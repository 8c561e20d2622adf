use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{AuthenticatedUser, USER_NOT_FOUND};
use crate::db::normalize_username;
use crate::error::AppError;
use crate::AppState;

pub async fn list_users(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let users = state.auth_service.users().list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn show_user(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = normalize_username(&path.into_inner());

    match state.auth_service.users().get_user_by_username(&username).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Err(AppError::NotFound(USER_NOT_FOUND.into())),
    }
}

/// Behind the login gate.
pub async fn delete_user(
    path: web::Path<String>,
    caller: web::ReqData<AuthenticatedUser>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let username = normalize_username(&path.into_inner());
    let users = state.auth_service.users();

    let user = users
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(USER_NOT_FOUND.into()))?;

    if !users.delete_user(user.id).await? {
        // Removed by someone else between lookup and delete.
        return Err(AppError::NotFound(USER_NOT_FOUND.into()));
    }

    info!("User {} deleted by user {}", user.username, caller.id);
    Ok(HttpResponse::Ok().json(json!({ "message": "User deleted" })))
}

/// Behind the login gate. Reloads the record, since token claims may be stale.
pub async fn current_user(
    caller: web::ReqData<AuthenticatedUser>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    match state.auth_service.users().get_user_by_id(caller.id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => {
            warn!("Token for user {} outlived the account", caller.id);
            Err(AppError::NotFound(USER_NOT_FOUND.into()))
        }
    }
}
