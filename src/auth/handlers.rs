use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::AppError;
use crate::{with_deadline, AppState, Result};

const USERNAME_CHARS: (usize, usize) = (4, 32);
const PASSWORD_CHARS: (usize, usize) = (8, 64);

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<()> {
        check_length("username", &self.username, USERNAME_CHARS)?;
        check_length("password", &self.password, PASSWORD_CHARS)
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    req.validate()?;
    info!("Received registration request for username: {}", req.username);

    let user = with_deadline(
        state.config.server.request_timeout(),
        state.auth_service.register(&req.username, &req.password),
    )
    .await
    .map_err(|e| {
        error!("Registration failed for username: {}: {}", req.username, e);
        e
    })?;

    Ok(HttpResponse::Created().json(user))
}

pub async fn login(
    req: web::Json<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    info!("Received login request for username: {}", req.username);

    let token = with_deadline(
        state.config.server.request_timeout(),
        state.auth_service.login(&req.username, &req.password),
    )
    .await
    .map_err(|e| {
        error!("Login failed for username: {}: {}", req.username, e);
        e
    })?;

    info!("Login successful for username: {}", req.username);
    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}

fn check_length(field: &str, value: &str, (min, max): (usize, usize)) -> Result<()> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::ValidationError(format!(
            "{} must be between {} and {} characters",
            field, min, max
        )));
    }
    Ok(())
}
