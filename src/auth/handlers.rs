use actix_web::{web, HttpResponse};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::error::AppError;
use tracing::{info, error};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Decode a JSON body, answering 400 with `message` when it does not fit `T`.
pub fn parse_body<T: DeserializeOwned>(body: &[u8], message: &str) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| AppError::MalformedRequest(message.to_string()))
}

pub async fn login(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req: LoginRequest = parse_body(&body, "Invalid data")?;
    info!("Received login request for username: {}", req.username);

    match state.auth_service.authenticate(&req.username, &req.password).await {
        Ok(token) => {
            info!("Login successful for username: {}", req.username);
            Ok(HttpResponse::Ok().json(AuthResponse { token }))
        }
        Err(e) => {
            error!("Login failed for username: {}: {}", req.username, e);
            Err(e)
        }
    }
}

pub async fn register(
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req: RegisterRequest = parse_body(&body, "Wrong body")?;
    info!("Received registration request for username: {}", req.username);

    match state.auth_service.register(&req.username, &req.email, &req.password).await {
        Ok(user) => {
            info!("Registration successful for username: {}", user.username);
            Ok(HttpResponse::Created().json(user))
        }
        Err(e) => {
            error!("Registration failed for username: {}: {}", req.username, e);
            Err(e)
        }
    }
}
