use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::middleware::Next;
use actix_web::{web, Error, HttpMessage};
use tracing::{debug, warn};

use crate::auth::TokenService;
use crate::error::{AppError, AuthError};
use crate::AppState;

/// Pull the token out of the `Authorization` header. Accepts a raw token or `Bearer <token>`.
pub fn extract_token(req: &ServiceRequest) -> Result<&str, AuthError> {
    let value = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .unwrap_or(value)
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

fn authenticate(req: &ServiceRequest, tokens: &TokenService) -> Result<(), AuthError> {
    let token = extract_token(req)?;
    let user = tokens.verify(token)?;
    debug!("Authenticated user {} for {}", user.id, req.path());
    req.extensions_mut().insert(user);
    Ok(())
}

/// Middleware for routes that require login.
///
/// On success the verified [`AuthenticatedUser`](crate::auth::AuthenticatedUser) is
/// stored in the request extensions (read it with `web::ReqData`) and the wrapped
/// service's response is passed through untouched. On failure the wrapped service
/// is never called.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    let outcome = match req.app_data::<web::Data<AppState>>() {
        Some(state) => authenticate(&req, state.auth_service.tokens()).map_err(AppError::from),
        None => Err(AppError::InternalError("application state not configured".into())),
    };

    match outcome {
        Ok(()) => next
            .call(req)
            .await
            .map(ServiceResponse::map_into_left_body),
        Err(e) => {
            warn!("Rejected request to {}: {}", req.path(), e);
            Ok(req.error_response(e).map_into_right_body())
        }
    }
}
